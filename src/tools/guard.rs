//! Safety gates applied before any request reaches QuestDB.
//!
//! - [`validate_select`]: the `query` tool only runs statements that start with `SELECT`.
//! - [`validate_identifier`]: table names interpolated into generated SQL must match
//!   `^[A-Za-z_][A-Za-z0-9_]*$`.
//!
//! The SELECT check is lexical. It keeps obvious writes and DDL away from the
//! query tool; it is not a SQL parser.

use crate::error::{DbError, DbResult};

/// Validate that a query starts with `SELECT` (case-insensitive, surrounding whitespace ignored).
///
/// # Examples
///
/// ```
/// use questdb_mcp_server::tools::guard::validate_select;
///
/// assert!(validate_select("  select * from trades").is_ok());
/// assert!(validate_select("DROP TABLE trades").is_err());
/// ```
pub fn validate_select(query: &str) -> DbResult<()> {
    if is_select(query) {
        Ok(())
    } else {
        Err(DbError::safety_rejection(
            "Only SELECT queries are allowed. Use the insert tool to write data.",
        ))
    }
}

/// True if the trimmed query begins with `SELECT`, ignoring case.
pub fn is_select(query: &str) -> bool {
    query
        .trim()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("SELECT"))
}

/// True if `name` matches `^[A-Za-z_][A-Za-z0-9_]*$`.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Validate a table name before it is interpolated into SQL text.
pub fn validate_identifier(name: &str) -> DbResult<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(DbError::invalid_identifier(name))
    }
}
