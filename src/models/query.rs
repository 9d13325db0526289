//! Query-related data models.

use crate::error::{DbError, DbResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Response format requested from the `/exec` endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QueryFormat {
    /// Structured JSON result (default)
    #[default]
    Json,
    /// Raw CSV text
    Csv,
}

impl QueryFormat {
    /// Value of the `fmt` query parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for QueryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Column descriptor as returned by QuestDB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QueryColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

/// Parsed JSON result of a read query.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Echo of the executed query
    pub query: String,
    pub columns: Vec<QueryColumn>,
    /// Rows of untyped cells. None when the response has no usable dataset.
    pub dataset: Option<Vec<Vec<JsonValue>>>,
    pub count: Option<u64>,
    /// The full response body
    pub raw: JsonValue,
}

impl QueryResult {
    /// Build a result from a response body, tolerating missing or malformed fields.
    ///
    /// A `dataset` that is absent, not an array, or contains non-array rows is
    /// reported as `None` rather than failing the whole query.
    pub fn from_value(query: &str, raw: JsonValue) -> Self {
        let dataset = raw.get("dataset").and_then(JsonValue::as_array).and_then(|rows| {
            rows.iter()
                .map(|row| row.as_array().cloned())
                .collect::<Option<Vec<_>>>()
        });

        let columns = raw
            .get("columns")
            .and_then(JsonValue::as_array)
            .map(|cols| {
                cols.iter()
                    .filter_map(|c| serde_json::from_value::<QueryColumn>(c.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        let echoed = raw
            .get("query")
            .and_then(JsonValue::as_str)
            .unwrap_or(query)
            .to_string();

        Self {
            query: echoed,
            columns,
            dataset,
            count: raw.get("count").and_then(JsonValue::as_u64),
            raw,
        }
    }

    /// Parse a response body as JSON.
    pub fn parse(query: &str, body: &str) -> DbResult<Self> {
        let raw: JsonValue = serde_json::from_str(body).map_err(|e| {
            DbError::internal(format!("QuestDB returned a non-JSON response: {}", e))
        })?;
        Ok(Self::from_value(query, raw))
    }

    /// Row count as reported by the server, falling back to the dataset length.
    pub fn row_count(&self) -> u64 {
        self.count
            .unwrap_or_else(|| self.dataset.as_ref().map_or(0, |d| d.len() as u64))
    }
}

/// Result of the adapter's `query` operation.
#[derive(Debug, Clone)]
pub enum QueryResponse {
    Json(QueryResult),
    Csv(String),
}
