//! MCP tool implementations.
//!
//! This module contains the QuestDB tool handlers:
//! - `query`: Execute SELECT queries (json or csv)
//! - `insert`: Write one record through the line protocol
//! - `list_tables`: List tables in the database
//! - `describe_table`: Get column information for a table
//! - `guard`: Read-only and identifier checks applied before any request
//! - `envelope`: Uniform tool response shapes

pub mod envelope;
pub mod guard;
pub mod insert;
pub mod query;
pub mod schema;

pub use insert::{InsertInput, InsertOutput, InsertToolHandler};
pub use query::{QueryInput, QueryOutput, QueryToolHandler};
pub use schema::{DescribeTableInput, DescribeTableOutput, ListTablesOutput, SchemaToolHandler};
