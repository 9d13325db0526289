//! Error types for the QuestDB MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Each variant maps to one failure class of a tool call, so handlers can turn any
//! of them into a readable message without inspecting the underlying cause.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid input: {message}")]
    Validation { message: String },

    #[error("Query rejected: {message}")]
    SafetyRejection { message: String },

    #[error(
        "Invalid table name '{identifier}': must start with a letter or underscore and contain only letters, digits and underscores"
    )]
    InvalidIdentifier { identifier: String },

    #[error("Invalid timestamp '{value}': expected epoch milliseconds or a date string")]
    TimestampParse { value: String },

    #[error("Query failed with status {status}: {body}")]
    QueryExecution { status: u16, body: String },

    #[error("Sender error: {message}")]
    Transport { message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a validation error for malformed tool input.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a safety rejection (query blocked before reaching the database).
    pub fn safety_rejection(message: impl Into<String>) -> Self {
        Self::SafetyRejection {
            message: message.into(),
        }
    }

    /// Create an invalid identifier error.
    pub fn invalid_identifier(identifier: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            identifier: identifier.into(),
        }
    }

    /// Create a timestamp parse error.
    pub fn timestamp_parse(value: impl Into<String>) -> Self {
        Self::TimestampParse {
            value: value.into(),
        }
    }

    /// Create a query execution error from a non-success HTTP response.
    pub fn query_execution(status: u16, body: impl Into<String>) -> Self {
        Self::QueryExecution {
            status,
            body: body.into(),
        }
    }

    /// Create a sender/transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for DbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            DbError::transport(format!("Failed to connect to QuestDB: {}", err))
        } else if err.is_timeout() {
            DbError::transport(format!("Request to QuestDB timed out: {}", err))
        } else {
            DbError::transport(format!("HTTP error: {}", err))
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
