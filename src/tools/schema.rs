//! Schema introspection tools.
//!
//! This module implements the `list_tables` and `describe_table` MCP tools.

use crate::db::QuestDbClient;
use crate::error::DbResult;
use crate::mcp::ProtocolLogger;
use crate::tools::envelope;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::info;

/// Output from the list_tables tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ListTablesOutput {
    /// Table names in alphabetical order
    pub tables: Vec<String>,
    pub count: usize,
}

/// Input for the describe_table tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DescribeTableInput {
    /// Table name (letters, digits and underscores; must not start with a digit)
    pub table: String,
}

/// Output from the describe_table tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DescribeTableOutput {
    pub table: String,
    /// One row per column as returned by `table_columns()`, or the raw result if it had no rows
    pub columns: JsonValue,
}

/// Handler for schema introspection.
pub struct SchemaToolHandler {
    client: Arc<QuestDbClient>,
    logger: Arc<ProtocolLogger>,
}

impl SchemaToolHandler {
    pub fn new(client: Arc<QuestDbClient>, logger: Arc<ProtocolLogger>) -> Self {
        Self { client, logger }
    }

    pub async fn list_tables(&self) -> DbResult<ListTablesOutput> {
        let tables = self.client.list_tables().await?;
        let count = tables.len();
        info!(count, "Listed tables");
        Ok(ListTablesOutput { tables, count })
    }

    pub async fn describe_table(&self, input: DescribeTableInput) -> DbResult<DescribeTableOutput> {
        let result = self.client.describe_table(&input.table).await?;

        let columns = match result.dataset {
            Some(dataset) => json!(dataset),
            None => result.raw,
        };
        info!(table = %input.table, "Described table");

        Ok(DescribeTableOutput {
            table: input.table,
            columns,
        })
    }

    /// Handle the list_tables tool call.
    pub async fn call_list_tables(&self) -> CallToolResult {
        match self.list_tables().await {
            Ok(output) => envelope::structured(&output),
            Err(e) => {
                self.logger
                    .error(&format!("Listing tables failed: {}", e), json!({}))
                    .await;
                envelope::error(&e)
            }
        }
    }

    /// Handle the describe_table tool call.
    pub async fn call_describe_table(&self, input: DescribeTableInput) -> CallToolResult {
        let table = input.table.clone();
        match self.describe_table(input).await {
            Ok(output) => envelope::structured(&output),
            Err(e) => {
                self.logger
                    .error(
                        &format!("Describing table failed: {}", e),
                        json!({ "table": table }),
                    )
                    .await;
                envelope::error(&e)
            }
        }
    }
}
