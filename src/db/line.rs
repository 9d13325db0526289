//! InfluxDB line protocol encoding.
//!
//! A [`Row`] is built for a single insert and appended to a [`LineBuffer`], which
//! holds newline-terminated rows until the sender flushes them:
//!
//! ```text
//! trades,symbol=BTC-USD,side=buy price=42000.5,amount=2i,filled=t 1699123456789000000
//! ```
//!
//! Symbols are always written before columns, whatever order they were added in.

use crate::error::{DbError, DbResult};
use crate::models::{FieldValue, RowTimestamp};

/// Characters QuestDB rejects in both table and column names.
const ILLEGAL_NAME_CHARS: &[char] = &[
    '?', ',', '\'', '"', '\\', '/', ':', '(', ')', '+', '*', '%', '~', '\0',
];

const NANOS_PER_MILLI: i64 = 1_000_000;

/// One row being assembled for a single insert.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    table: String,
    symbols: Vec<(String, String)>,
    columns: Vec<(String, FieldValue)>,
    timestamp: RowTimestamp,
}

impl Row {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            symbols: Vec::new(),
            columns: Vec::new(),
            timestamp: RowTimestamp::Now,
        }
    }

    /// Add a field, routing symbols and typed columns to their own sections.
    pub fn field(&mut self, name: impl Into<String>, value: FieldValue) -> &mut Self {
        match value {
            FieldValue::Symbol(s) => self.symbols.push((name.into(), s)),
            other => self.columns.push((name.into(), other)),
        }
        self
    }

    /// Close the row with its event time.
    pub fn at(&mut self, timestamp: RowTimestamp) -> &mut Self {
        self.timestamp = timestamp;
        self
    }

    /// Check names against QuestDB's rules.
    pub fn validate(&self) -> DbResult<()> {
        validate_table_name(&self.table)?;
        if self.symbols.is_empty() && self.columns.is_empty() {
            return Err(DbError::transport(format!(
                "Row for table '{}' has no columns",
                self.table
            )));
        }
        for name in self
            .symbols
            .iter()
            .map(|(n, _)| n)
            .chain(self.columns.iter().map(|(n, _)| n))
        {
            validate_column_name(name)?;
        }
        Ok(())
    }

    /// Encode as a single line-protocol line, including the trailing newline.
    pub fn encode(&self) -> DbResult<String> {
        self.validate()?;

        let mut line = escape_name(&self.table);
        for (name, value) in &self.symbols {
            line.push(',');
            line.push_str(&escape_name(name));
            line.push('=');
            line.push_str(&escape_symbol_value(value));
        }

        for (i, (name, value)) in self.columns.iter().enumerate() {
            line.push(if i == 0 { ' ' } else { ',' });
            line.push_str(&escape_name(name));
            line.push('=');
            line.push_str(&encode_column_value(value)?);
        }

        if let RowTimestamp::At(ms) = self.timestamp {
            let nanos = ms.checked_mul(NANOS_PER_MILLI).ok_or_else(|| {
                DbError::transport(format!("Timestamp {} ms is out of range", ms))
            })?;
            line.push(' ');
            line.push_str(&nanos.to_string());
        }

        line.push('\n');
        Ok(line)
    }
}

fn encode_column_value(value: &FieldValue) -> DbResult<String> {
    match value {
        FieldValue::Long(i) => Ok(format!("{}i", i)),
        FieldValue::Double(f) if f.is_finite() => {
            let text = f.to_string();
            // Keep doubles distinguishable from longs on the wire.
            if text.contains(['.', 'e', 'E']) {
                Ok(text)
            } else {
                Ok(format!("{}.0", text))
            }
        }
        FieldValue::Double(f) => Err(DbError::transport(format!(
            "Cannot write non-finite double {}",
            f
        ))),
        FieldValue::Boolean(b) => Ok(if *b { "t" } else { "f" }.to_string()),
        FieldValue::Symbol(_) => Err(DbError::internal("Symbol encoded as column")),
    }
}

fn has_illegal_chars(name: &str) -> bool {
    name.chars()
        .any(|c| ILLEGAL_NAME_CHARS.contains(&c) || c.is_control())
}

pub fn validate_table_name(name: &str) -> DbResult<()> {
    if name.is_empty() {
        return Err(DbError::transport("Table name cannot be empty"));
    }
    if has_illegal_chars(name) || name.starts_with('.') || name.ends_with('.') {
        return Err(DbError::transport(format!(
            "Bad table name '{}': contains illegal characters",
            name
        )));
    }
    Ok(())
}

pub fn validate_column_name(name: &str) -> DbResult<()> {
    if name.is_empty() {
        return Err(DbError::transport("Column name cannot be empty"));
    }
    if has_illegal_chars(name) || name.contains(['.', '-']) {
        return Err(DbError::transport(format!(
            "Bad column name '{}': contains illegal characters",
            name
        )));
    }
    Ok(())
}

fn escape_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, ' ' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_symbol_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '=' | ' ' | '\\' | '\n' | '\r') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Encoded rows waiting to be flushed.
#[derive(Debug, Default)]
pub struct LineBuffer {
    data: String,
    rows: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode and append a row. The buffer is unchanged if encoding fails.
    pub fn push(&mut self, row: &Row) -> DbResult<()> {
        let line = row.encode()?;
        self.data.push_str(&line);
        self.rows += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn as_str(&self) -> &str {
        &self.data
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.rows = 0;
    }
}
