//! QuestDB client adapter.
//!
//! The single seam between the tool handlers and QuestDB's two protocols:
//! SQL reads over HTTP (`/exec`) and writes over the line protocol. The write
//! sender is created lazily on the first insert and dropped by [`QuestDbClient::close`].

use crate::config::ConnectionDescriptor;
use crate::db::line::Row;
use crate::db::sender::LineSender;
use crate::error::{DbError, DbResult};
use crate::models::{InsertRecord, QueryFormat, QueryResponse, QueryResult};
use crate::tools::guard::{validate_identifier, validate_select};
use reqwest::Client;
use serde_json::{Map, Value as JsonValue};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// Introspection query listing every table.
pub const LIST_TABLES_QUERY: &str = "SELECT table_name FROM tables() ORDER BY table_name";

/// Introspection query describing one table's columns.
///
/// Only call with identifiers that passed [`validate_identifier`].
pub fn describe_table_query(table: &str) -> String {
    format!("SELECT * FROM table_columns('{}')", table)
}

pub struct QuestDbClient {
    descriptor: ConnectionDescriptor,
    http: Client,
    exec_url: Url,
    sender: Mutex<Option<LineSender>>,
}

impl QuestDbClient {
    /// Create a client. No connection is made until the first call.
    pub fn new(descriptor: ConnectionDescriptor) -> DbResult<Self> {
        let exec_url = Url::parse(&descriptor.base_url())
            .and_then(|base| base.join("/exec"))
            .map_err(|e| {
                DbError::config(format!(
                    "Invalid QuestDB address '{}': {}",
                    descriptor.addr(),
                    e
                ))
            })?;
        let http = Client::builder()
            .user_agent(concat!("questdb-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            descriptor,
            http,
            exec_url,
            sender: Mutex::new(None),
        })
    }

    /// True while a write sender is held.
    pub async fn has_sender(&self) -> bool {
        self.sender.lock().await.is_some()
    }

    /// Run a read-only query.
    ///
    /// The query must start with `SELECT`; anything else is rejected before
    /// a request is made.
    pub async fn query(&self, query: &str, format: QueryFormat) -> DbResult<QueryResponse> {
        validate_select(query)?;

        let mut request = self
            .http
            .get(self.exec_url.clone())
            .query(&[("query", query), ("fmt", format.as_param())]);
        if let Some(creds) = &self.descriptor.credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        debug!(query = %query, format = %format, "Executing query");
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(DbError::query_execution(status.as_u16(), body));
        }

        match format {
            QueryFormat::Json => Ok(QueryResponse::Json(QueryResult::parse(query, &body)?)),
            QueryFormat::Csv => Ok(QueryResponse::Csv(body)),
        }
    }

    /// Run a query expecting a JSON result.
    async fn query_json(&self, query: &str) -> DbResult<QueryResult> {
        match self.query(query, QueryFormat::Json).await? {
            QueryResponse::Json(result) => Ok(result),
            QueryResponse::Csv(_) => Err(DbError::internal("Expected a JSON query result")),
        }
    }

    /// Insert one record into `table` and flush it before returning.
    ///
    /// The table name is not checked against the identifier pattern; the line
    /// protocol carries it as data and QuestDB creates the table if needed.
    pub async fn insert(&self, table: &str, data: Map<String, JsonValue>) -> DbResult<()> {
        let record = InsertRecord::from_map(data)?;

        let mut row = Row::new(table);
        for (name, value) in record.fields {
            row.field(name, value);
        }
        row.at(record.timestamp);

        let mut slot = self.sender.lock().await;
        let sender = match slot.take() {
            Some(sender) => sender,
            None => {
                info!(addr = %self.descriptor.addr(), "Creating line protocol sender");
                LineSender::from_conf(&self.descriptor.sender_conf())?
            }
        };
        let sender = slot.insert(sender);

        if let Err(e) = write_row(sender, &row).await {
            // Drop the failed row so it is not resent with the next insert.
            warn!(table = %table, rows = sender.pending_rows(), "Discarding unsent rows");
            sender.discard_pending();
            return Err(e);
        }

        debug!(table = %table, "Row inserted");
        Ok(())
    }

    /// Names of all tables, in order.
    ///
    /// Returns an empty list when the result carries no usable dataset.
    pub async fn list_tables(&self) -> DbResult<Vec<String>> {
        let result = self.query_json(LIST_TABLES_QUERY).await?;

        let tables = result
            .dataset
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .map(|cell| match cell {
                JsonValue::String(name) => name,
                other => other.to_string(),
            })
            .collect();

        Ok(tables)
    }

    /// Column metadata for a table.
    pub async fn describe_table(&self, table: &str) -> DbResult<QueryResult> {
        validate_identifier(table)?;
        self.query_json(&describe_table_query(table)).await
    }

    /// Flush and drop the sender. Safe to call repeatedly.
    ///
    /// Failures are logged, never returned, and the sender slot is always
    /// cleared so the next insert starts a fresh sender.
    pub async fn close(&self) {
        let Some(mut sender) = self.sender.lock().await.take() else {
            return;
        };

        match sender.close().await {
            Ok(()) => info!("Line protocol sender closed"),
            Err(e) => warn!(error = %e, "Failed to close line protocol sender"),
        }
    }
}

async fn write_row(sender: &mut LineSender, row: &Row) -> DbResult<()> {
    sender.append(row).await?;
    sender.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client() -> QuestDbClient {
        QuestDbClient::new(ConnectionDescriptor::new("127.0.0.1", 1)).unwrap()
    }

    #[test]
    fn test_describe_table_query() {
        assert_eq!(
            describe_table_query("trades"),
            "SELECT * FROM table_columns('trades')"
        );
    }

    #[test]
    fn test_introspection_queries_pass_select_gate() {
        assert!(validate_select(LIST_TABLES_QUERY).is_ok());
        assert!(validate_select(&describe_table_query("trades")).is_ok());
    }

    #[tokio::test]
    async fn test_query_rejects_non_select_without_network() {
        let client = unreachable_client();
        let err = client
            .query("DROP TABLE trades", QueryFormat::Json)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::SafetyRejection { .. }));
    }

    #[tokio::test]
    async fn test_describe_table_rejects_bad_identifier() {
        let client = unreachable_client();
        let err = client.describe_table("x'); DROP").await.unwrap_err();
        assert!(matches!(err, DbError::InvalidIdentifier { .. }));
    }

    #[tokio::test]
    async fn test_close_without_sender_is_noop() {
        let client = unreachable_client();
        client.close().await;
        client.close().await;
        assert!(!client.has_sender().await);
    }

    #[tokio::test]
    async fn test_insert_bad_timestamp_creates_no_sender() {
        let client = unreachable_client();
        let data = serde_json::json!({"v": 1, "timestamp": "later"});
        let err = client
            .insert("t", data.as_object().unwrap().clone())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::TimestampParse { .. }));
        assert!(!client.has_sender().await);
    }
}
