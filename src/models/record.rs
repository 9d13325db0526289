//! Insert record models and the value type-inference policy.
//!
//! Strings always become symbols; QuestDB's free-text STRING columns are never
//! produced by inference. Callers that need text columns must create the table
//! beforehand.

use crate::error::{DbError, DbResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Map, Value as JsonValue};

/// Reserved record key carrying the row's event time.
pub const TIMESTAMP_KEY: &str = "timestamp";

/// Layouts accepted for date strings without an offset. Interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// A single column value after type inference.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Indexed categorical string (QuestDB SYMBOL)
    Symbol(String),
    /// 64-bit integer (QuestDB LONG)
    Long(i64),
    /// 64-bit float (QuestDB DOUBLE)
    Double(f64),
    Boolean(bool),
}

impl FieldValue {
    /// Infer the column type of a JSON value. Returns None for null.
    pub fn infer(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(Self::Symbol(s.clone())),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self::Long(i))
                } else if let Some(f) = n.as_f64() {
                    Some(integral_f64(f).map_or(Self::Double(f), Self::Long))
                } else {
                    Some(Self::Symbol(n.to_string()))
                }
            }
            JsonValue::Bool(b) => Some(Self::Boolean(*b)),
            other => Some(Self::Symbol(other.to_string())),
        }
    }
}

/// `Some(i)` when `f` has no fractional part and fits in an i64.
fn integral_f64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// When a row is stamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTimestamp {
    /// Explicit event time in epoch milliseconds
    At(i64),
    /// Let the server assign the current time on ingestion
    Now,
}

/// Parse a record's `timestamp` value into epoch milliseconds.
///
/// Numbers are taken as epoch milliseconds (fractions truncated). Strings must be
/// RFC 3339, RFC 2822, or an ISO-like date/time without offset (read as UTC).
pub fn parse_timestamp(value: &JsonValue) -> DbResult<i64> {
    match value {
        JsonValue::Number(n) => {
            if let Some(ms) = n.as_i64() {
                return Ok(ms);
            }
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
                .ok_or_else(|| DbError::timestamp_parse(n.to_string()))
        }
        JsonValue::String(s) => {
            parse_date_string(s.trim()).ok_or_else(|| DbError::timestamp_parse(s.clone()))
        }
        other => Err(DbError::timestamp_parse(other.to_string())),
    }
}

fn parse_date_string(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Column data for one insert, split from its event time.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertRecord {
    /// Non-null fields in the order they were given
    pub fields: Vec<(String, FieldValue)>,
    pub timestamp: RowTimestamp,
}

impl InsertRecord {
    /// Split a JSON object into typed fields and a row timestamp.
    ///
    /// The `timestamp` key never becomes a column. Null values are skipped; a
    /// record left with no fields is rejected.
    pub fn from_map(mut data: Map<String, JsonValue>) -> DbResult<Self> {
        let timestamp = match data.shift_remove(TIMESTAMP_KEY) {
            None | Some(JsonValue::Null) => RowTimestamp::Now,
            Some(value) => RowTimestamp::At(parse_timestamp(&value)?),
        };

        let fields = data
            .into_iter()
            .filter_map(|(name, value)| FieldValue::infer(&value).map(|v| (name, v)))
            .collect::<Vec<_>>();

        if fields.is_empty() {
            return Err(DbError::validation("Record has no non-null fields"));
        }

        Ok(Self { fields, timestamp })
    }
}
