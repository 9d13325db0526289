//! Line-protocol sender over HTTP.
//!
//! The sender is configured from a single configuration string in the usual
//! QuestDB client format:
//!
//! ```text
//! http::addr=localhost:9000;username=admin;password=quest;auto_flush_rows=1000;
//! ```
//!
//! Rows are buffered locally and POSTed to `/write` on flush. Auto-flush is
//! evaluated after every append; callers that need durability flush explicitly.

use crate::db::line::{LineBuffer, Row};
use crate::error::{DbError, DbResult};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// Parsed sender configuration string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderConfig {
    pub addr: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub auto_flush: bool,
    pub auto_flush_rows: Option<usize>,
    pub auto_flush_interval: Option<Duration>,
}

impl SenderConfig {
    /// Parse a `schema::key=value;key=value;` configuration string.
    ///
    /// Only the `http` schema is supported. `;;` inside a value is a literal `;`.
    pub fn from_conf(conf: &str) -> DbResult<Self> {
        let (schema, params) = conf
            .split_once("::")
            .ok_or_else(|| DbError::config("Missing '::' after schema in sender configuration"))?;

        if schema != "http" {
            return Err(DbError::config(format!(
                "Unsupported sender schema '{}', only 'http' is supported",
                schema
            )));
        }

        let mut config = Self {
            addr: String::new(),
            username: None,
            password: None,
            auto_flush: true,
            auto_flush_rows: None,
            auto_flush_interval: None,
        };

        for (key, value) in parse_params(params)? {
            match key.as_str() {
                "addr" => config.addr = value,
                "username" => config.username = Some(value),
                "password" => config.password = Some(value),
                "auto_flush" => {
                    config.auto_flush = match value.as_str() {
                        "on" => true,
                        "off" => false,
                        _ => {
                            return Err(DbError::config(format!(
                                "Invalid auto_flush value '{}', expected 'on' or 'off'",
                                value
                            )));
                        }
                    }
                }
                "auto_flush_rows" => {
                    config.auto_flush_rows = Some(parse_number(&key, &value)?);
                }
                "auto_flush_interval" => {
                    config.auto_flush_interval =
                        Some(Duration::from_millis(parse_number(&key, &value)?));
                }
                _ => {
                    return Err(DbError::config(format!(
                        "Unknown sender configuration key '{}'",
                        key
                    )));
                }
            }
        }

        if config.addr.is_empty() {
            return Err(DbError::config("Missing 'addr' in sender configuration"));
        }
        if config.username.is_some() != config.password.is_some() {
            return Err(DbError::config(
                "'username' and 'password' must be provided together",
            ));
        }

        Ok(config)
    }

    /// URL of the ILP-over-HTTP endpoint. Timestamps are sent in nanoseconds.
    pub fn write_url(&self) -> DbResult<Url> {
        let mut url = Url::parse(&format!("http://{}/write", self.addr))
            .map_err(|e| DbError::config(format!("Invalid addr '{}': {}", self.addr, e)))?;
        url.query_pairs_mut().append_pair("precision", "n");
        Ok(url)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> DbResult<T> {
    value
        .parse()
        .map_err(|_| DbError::config(format!("Invalid value '{}' for '{}'", value, key)))
}

/// Split `key=value;` pairs, honouring `;;` escapes in values.
fn parse_params(params: &str) -> DbResult<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    let mut chars = params.chars().peekable();

    while chars.peek().is_some() {
        let key: String = chars.by_ref().take_while(|c| *c != '=').collect();
        let key = key.trim().to_string();
        if key.is_empty() {
            return Err(DbError::config("Empty key in sender configuration"));
        }

        let mut value = String::new();
        let mut terminated = false;
        while let Some(c) = chars.next() {
            if c == ';' {
                if chars.peek() == Some(&';') {
                    chars.next();
                    value.push(';');
                } else {
                    terminated = true;
                    break;
                }
            } else {
                value.push(c);
            }
        }
        if !terminated && chars.peek().is_none() && value.is_empty() {
            return Err(DbError::config(format!("Missing value for '{}'", key)));
        }
        pairs.push((key, value));
    }

    Ok(pairs)
}

/// Buffered ILP-over-HTTP writer bound to one QuestDB instance.
#[derive(Debug)]
pub struct LineSender {
    client: Client,
    config: SenderConfig,
    write_url: Url,
    buffer: LineBuffer,
    last_flush: Instant,
    closed: bool,
}

impl LineSender {
    /// Create a sender from a configuration string.
    pub fn from_conf(conf: &str) -> DbResult<Self> {
        let config = SenderConfig::from_conf(conf)?;
        let write_url = config.write_url()?;
        let client = Client::builder()
            .user_agent(concat!("questdb-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            write_url,
            buffer: LineBuffer::new(),
            last_flush: Instant::now(),
            closed: false,
        })
    }

    /// Number of rows waiting to be flushed.
    pub fn pending_rows(&self) -> usize {
        self.buffer.row_count()
    }

    /// Append a row to the buffer, flushing if the auto-flush policy says so.
    pub async fn append(&mut self, row: &Row) -> DbResult<()> {
        if self.closed {
            return Err(DbError::transport("Sender is closed"));
        }
        self.buffer.push(row)?;

        if self.should_auto_flush() {
            debug!(rows = self.buffer.row_count(), "Auto-flushing sender");
            self.flush().await?;
        }
        Ok(())
    }

    fn should_auto_flush(&self) -> bool {
        if !self.config.auto_flush {
            return false;
        }
        let rows_reached = self
            .config
            .auto_flush_rows
            .is_some_and(|rows| self.buffer.row_count() >= rows);
        let interval_elapsed = self
            .config
            .auto_flush_interval
            .is_some_and(|interval| self.last_flush.elapsed() >= interval);
        rows_reached || interval_elapsed
    }

    /// Send all buffered rows. The buffer is kept if the server rejects them.
    pub async fn flush(&mut self) -> DbResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let mut request = self
            .client
            .post(self.write_url.clone())
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(self.buffer.as_str().to_owned());
        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DbError::transport(format!(
                "Write failed with status {}: {}",
                status.as_u16(),
                body
            )));
        }

        debug!(
            rows = self.buffer.row_count(),
            bytes = self.buffer.len(),
            "Flushed rows to QuestDB"
        );
        self.buffer.clear();
        self.last_flush = Instant::now();
        Ok(())
    }

    /// Drop buffered rows without sending them.
    pub fn discard_pending(&mut self) {
        self.buffer.clear();
    }

    /// Flush remaining rows and refuse further appends.
    pub async fn close(&mut self) -> DbResult<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.flush().await;
        self.closed = true;
        result
    }
}
