//! MCP service implementation using rmcp.
//!
//! This module defines the QuestDbService struct with the four QuestDB tools
//! exposed via the MCP protocol using the rmcp framework's macros.
//! Tool failures are reported inside the result envelope (`isError: true`)
//! rather than as protocol errors.

use crate::db::QuestDbClient;
use crate::mcp::logging::ProtocolLogger;
use crate::tools::insert::{InsertInput, InsertOutput, InsertToolHandler};
use crate::tools::query::{QueryInput, QueryOutput, QueryToolHandler};
use crate::tools::schema::{
    DescribeTableInput, DescribeTableOutput, ListTablesOutput, SchemaToolHandler,
};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{
        CallToolResult, Implementation, JsonObject, ProtocolVersion, ServerCapabilities,
        ServerInfo,
    },
    schemars::JsonSchema,
    tool, tool_handler, tool_router,
};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct QuestDbService {
    /// Shared QuestDB client for all tool calls
    client: Arc<QuestDbClient>,
    /// Reports tool failures to the connected client, or locally
    logger: Arc<ProtocolLogger>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl QuestDbService {
    /// Create a new QuestDbService instance.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared QuestDB client adapter
    /// * `logger` - Shared protocol logger; the transport attaches the peer to it
    pub fn new(client: Arc<QuestDbClient>, logger: Arc<ProtocolLogger>) -> Self {
        let mut tool_router = Self::tool_router();
        attach_output_schema::<QueryOutput>(&mut tool_router, "query");
        attach_output_schema::<InsertOutput>(&mut tool_router, "insert");
        attach_output_schema::<ListTablesOutput>(&mut tool_router, "list_tables");
        attach_output_schema::<DescribeTableOutput>(&mut tool_router, "describe_table");

        Self {
            client,
            logger,
            tool_router,
        }
    }

    pub fn client(&self) -> &Arc<QuestDbClient> {
        &self.client
    }

    pub fn logger(&self) -> &Arc<ProtocolLogger> {
        &self.logger
    }

    /// Release the line-protocol sender. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.client.close().await;
    }
}

/// Declare `T`'s JSON schema as the output schema of a registered tool.
fn attach_output_schema<T: JsonSchema>(router: &mut ToolRouter<QuestDbService>, name: &str) {
    let schema: Option<JsonObject> = serde_json::to_value(rmcp::schemars::schema_for!(T))
        .ok()
        .and_then(|value| value.as_object().cloned());

    match (router.map.get_mut(name), schema) {
        (Some(route), Some(schema)) => {
            route.attr.output_schema = Some(Arc::new(schema));
        }
        _ => warn!(tool = name, "Could not attach output schema"),
    }
}

#[tool_router]
impl QuestDbService {
    #[tool(
        description = "Execute a read-only SQL SELECT query against QuestDB.\nOnly statements starting with SELECT are accepted.\nOutput format: \"json\" (default) returns columns, dataset and count; \"csv\" returns raw CSV text."
    )]
    async fn query(
        &self,
        Parameters(input): Parameters<QueryInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = QueryToolHandler::new(self.client.clone(), self.logger.clone());
        Ok(handler.call(input).await)
    }

    #[tool(
        description = "Insert one record into a QuestDB table using the InfluxDB line protocol.\nThe table is created automatically if it does not exist.\nStrings are stored as SYMBOL, integers as LONG, decimals as DOUBLE, booleans as BOOLEAN.\nAn optional `timestamp` field (epoch milliseconds or a date string) sets the row time; otherwise the server assigns it."
    )]
    async fn insert(
        &self,
        Parameters(input): Parameters<InsertInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = InsertToolHandler::new(self.client.clone(), self.logger.clone());
        Ok(handler.call(input).await)
    }

    #[tool(description = "List all tables in the QuestDB database, in alphabetical order.")]
    async fn list_tables(&self) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.client.clone(), self.logger.clone());
        Ok(handler.call_list_tables().await)
    }

    #[tool(
        description = "Describe the columns of a QuestDB table.\nReturns one entry per column with its name, type, and indexing details."
    )]
    async fn describe_table(
        &self,
        Parameters(input): Parameters<DescribeTableInput>,
    ) -> Result<CallToolResult, McpError> {
        let handler = SchemaToolHandler::new(self.client.clone(), self.logger.clone());
        Ok(handler.call_describe_table(input).await)
    }
}

#[tool_handler]
impl ServerHandler for QuestDbService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_logging()
                .build(),
            server_info: Implementation {
                name: "questdb-mcp-server".to_owned(),
                title: Some("QuestDB MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Tools for querying and ingesting time-series data in QuestDB.\n\
                \n\
                ## Workflow\n\
                1. Call `list_tables` to see what exists\n\
                2. Call `describe_table` to learn a table's columns and types\n\
                3. Use `query` with a SELECT statement to read data\n\
                4. Use `insert` to write a single record\n\
                \n\
                ## Notes\n\
                - `query` only accepts statements that start with SELECT\n\
                - `insert` creates the table on first write; string values become SYMBOL columns\n\
                - Pass `timestamp` in `data` as epoch milliseconds or an ISO-8601 string"
                    .to_string(),
            ),
        }
    }
}
