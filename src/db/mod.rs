//! QuestDB access layer.
//!
//! This module provides:
//! - The client adapter used by every tool (`/exec` reads, line-protocol writes)
//! - Line protocol row encoding
//! - The ILP-over-HTTP sender with its flush policy

pub mod client;
pub mod line;
pub mod sender;

pub use client::{LIST_TABLES_QUERY, QuestDbClient, describe_table_query};
pub use line::{LineBuffer, Row};
pub use sender::{LineSender, SenderConfig};
