//! Tool response envelopes.
//!
//! Every tool answers with `{content: [{type: "text", text}], structuredContent?, isError?}`.
//! Structured results carry the same payload as pretty-printed text for clients
//! that only render `content`.

use crate::error::DbError;
use rmcp::model::{CallToolResult, Content};
use serde::Serialize;

/// Structured success, mirrored as JSON text.
pub fn structured<T: Serialize>(output: &T) -> CallToolResult {
    match serde_json::to_value(output) {
        Ok(value) => {
            let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            with_structured(text, value)
        }
        Err(e) => error_message(format!("Failed to serialize tool output: {}", e)),
    }
}

/// Structured success whose text content is given as-is, e.g. raw CSV.
pub fn structured_with_text<T: Serialize>(text: impl Into<String>, output: &T) -> CallToolResult {
    match serde_json::to_value(output) {
        Ok(value) => with_structured(text.into(), value),
        Err(e) => error_message(format!("Failed to serialize tool output: {}", e)),
    }
}

fn with_structured(text: String, value: serde_json::Value) -> CallToolResult {
    let mut result = CallToolResult::success(vec![Content::text(text)]);
    result.structured_content = Some(value);
    result
}

/// Error envelope for a failed tool call.
pub fn error(err: &DbError) -> CallToolResult {
    error_message(err.to_string())
}

pub fn error_message(message: impl AsRef<str>) -> CallToolResult {
    CallToolResult::error(vec![Content::text(format!("Error: {}", message.as_ref()))])
}
