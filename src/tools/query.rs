//! Query execution tool.
//!
//! This module implements the `query` MCP tool for running SELECT statements
//! against QuestDB's `/exec` endpoint. Anything that does not start with `SELECT`
//! is rejected before a request is made.

use crate::db::QuestDbClient;
use crate::error::DbResult;
use crate::mcp::ProtocolLogger;
use crate::models::{QueryColumn, QueryFormat, QueryResponse, QueryResult};
use crate::tools::envelope;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::info;

/// Input for the query tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryInput {
    /// SQL SELECT statement to execute
    pub query: String,
    /// Output format: "json" (default) returns structured rows, "csv" returns raw CSV text
    #[serde(default)]
    pub format: QueryFormat,
}

/// Structured output of the query tool.
///
/// json results carry `dataset`, `count` and `columns`; csv results carry `csv`.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct QueryOutput {
    /// The executed query
    pub query: String,
    /// Format the result was requested in
    pub format: QueryFormat,
    /// Result rows, each an ordered list of cell values (json only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset: Option<Vec<Vec<JsonValue>>>,
    /// Number of rows returned (json only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    /// Column names and QuestDB types, in result order (json only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<QueryColumn>>,
    /// Raw CSV text, header row included (csv only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv: Option<String>,
}

impl QueryOutput {
    pub fn csv(query: impl Into<String>, text: String) -> Self {
        Self {
            query: query.into(),
            format: QueryFormat::Csv,
            dataset: None,
            count: None,
            columns: None,
            csv: Some(text),
        }
    }
}

impl From<QueryResult> for QueryOutput {
    fn from(result: QueryResult) -> Self {
        let count = result.row_count();
        Self {
            query: result.query,
            format: QueryFormat::Json,
            dataset: Some(result.dataset.unwrap_or_default()),
            count: Some(count),
            columns: Some(result.columns),
            csv: None,
        }
    }
}

/// Handler for query execution.
pub struct QueryToolHandler {
    client: Arc<QuestDbClient>,
    logger: Arc<ProtocolLogger>,
}

impl QueryToolHandler {
    pub fn new(client: Arc<QuestDbClient>, logger: Arc<ProtocolLogger>) -> Self {
        Self { client, logger }
    }

    /// Run the query and shape its result.
    pub async fn query(&self, input: QueryInput) -> DbResult<QueryOutput> {
        let response = self.client.query(&input.query, input.format).await?;

        match response {
            QueryResponse::Json(result) => {
                let output = QueryOutput::from(result);
                info!(
                    count = output.count.unwrap_or(0),
                    columns = output.columns.as_ref().map_or(0, Vec::len),
                    "Query executed"
                );
                Ok(output)
            }
            QueryResponse::Csv(text) => {
                info!(bytes = text.len(), "Query executed (csv)");
                Ok(QueryOutput::csv(input.query, text))
            }
        }
    }

    /// Handle the query tool call. Failures become an error envelope.
    pub async fn call(&self, input: QueryInput) -> CallToolResult {
        let query = input.query.clone();
        match self.query(input).await {
            Ok(output) => match output.csv.clone() {
                Some(text) => envelope::structured_with_text(text, &output),
                None => envelope::structured(&output),
            },
            Err(e) => {
                self.logger
                    .error(
                        &format!("Query failed: {}", e),
                        json!({ "query": query }),
                    )
                    .await;
                envelope::error(&e)
            }
        }
    }
}
