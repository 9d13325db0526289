//! Insert tool.
//!
//! Writes one record per call through the line-protocol sender. Column types are
//! inferred from the JSON values (strings become symbols); the optional
//! `timestamp` key sets the row's event time.

use crate::db::QuestDbClient;
use crate::error::DbResult;
use crate::mcp::ProtocolLogger;
use crate::tools::envelope;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};
use std::sync::Arc;
use tracing::info;

/// Input for the insert tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct InsertInput {
    /// Target table. Created by QuestDB on first write if it does not exist.
    pub table: String,
    /// Column values. Strings are stored as SYMBOL, integers as LONG, decimals as
    /// DOUBLE, booleans as BOOLEAN; nulls are skipped. The optional `timestamp` key
    /// (epoch milliseconds or a date string) sets the row time instead of a column.
    pub data: Map<String, JsonValue>,
}

/// Output from the insert tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct InsertOutput {
    pub success: bool,
    pub table: String,
    pub message: String,
}

/// Handler for inserts.
pub struct InsertToolHandler {
    client: Arc<QuestDbClient>,
    logger: Arc<ProtocolLogger>,
}

impl InsertToolHandler {
    pub fn new(client: Arc<QuestDbClient>, logger: Arc<ProtocolLogger>) -> Self {
        Self { client, logger }
    }

    pub async fn insert(&self, input: InsertInput) -> DbResult<InsertOutput> {
        let field_count = input.data.len();
        self.client.insert(&input.table, input.data).await?;

        info!(table = %input.table, fields = field_count, "Record inserted");

        Ok(InsertOutput {
            success: true,
            message: format!("Successfully inserted data into table '{}'", input.table),
            table: input.table,
        })
    }

    /// Handle the insert tool call. Failures become an error envelope.
    pub async fn call(&self, input: InsertInput) -> CallToolResult {
        let table = input.table.clone();
        match self.insert(input).await {
            Ok(output) => envelope::structured(&output),
            Err(e) => {
                self.logger
                    .error(&format!("Insert failed: {}", e), json!({ "table": table }))
                    .await;
                envelope::error(&e)
            }
        }
    }
}
