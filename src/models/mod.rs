//! Data models for the QuestDB MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod record;

// Re-export commonly used types
pub use query::{QueryColumn, QueryFormat, QueryResponse, QueryResult};
pub use record::{FieldValue, InsertRecord, RowTimestamp, TIMESTAMP_KEY, parse_timestamp};
