//! MCP server integration module.
//!
//! This module wires the QuestDB tool handlers into the rmcp framework and
//! provides the protocol-aware logger they report through.

pub mod logging;
pub mod service;

pub use logging::{LogLevel, LogSink, ProtocolLogger};
pub use service::QuestDbService;
