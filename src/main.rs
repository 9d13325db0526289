//! QuestDB MCP Server - Main entry point.
//!
//! This server provides MCP (Model Context Protocol) tools for AI assistants
//! to query and ingest time-series data in QuestDB over stdio.

use questdb_mcp_server::config::Config;
use questdb_mcp_server::db::QuestDbClient;
use questdb_mcp_server::mcp::{ProtocolLogger, QuestDbService};
use questdb_mcp_server::transport::{StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries the MCP protocol.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    init_tracing(&config);

    let descriptor = config.connection_descriptor();
    info!(
        questdb = %descriptor.addr(),
        auth = descriptor.credentials.is_some(),
        "Starting QuestDB MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let client = Arc::new(QuestDbClient::new(descriptor)?);
    let logger = Arc::new(ProtocolLogger::new());
    let service = QuestDbService::new(client, logger);

    let transport = StdioTransport::new(service);
    if let Err(e) = transport.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
