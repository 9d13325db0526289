//! Best-effort log reporting for tool calls.
//!
//! While an MCP client is connected, entries are sent to it as
//! `notifications/message`. Before the session starts, after it ends, or when a
//! notification cannot be delivered, entries go to the local tracing stream
//! (stderr). Nothing here ever returns an error to the caller.

use rmcp::model::{LoggingLevel, LoggingMessageNotificationParam};
use rmcp::service::{Peer, RoleServer};
use serde_json::{Value as JsonValue, json};
use std::future::Future;
use tokio::sync::RwLock;

const LOGGER_NAME: &str = "questdb-mcp-server";

/// Severity of a reported entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

impl From<LogLevel> for LoggingLevel {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Info => LoggingLevel::Info,
            LogLevel::Error => LoggingLevel::Error,
        }
    }
}

/// Destination for log entries.
pub trait LogSink: Send + Sync {
    /// Deliver an entry. Returns false if it could not be delivered.
    fn log(
        &self,
        level: LogLevel,
        message: &str,
        meta: &JsonValue,
    ) -> impl Future<Output = bool> + Send;
}

/// Sends entries to the connected MCP client.
#[derive(Clone)]
pub struct PeerLogSink {
    peer: Peer<RoleServer>,
}

impl PeerLogSink {
    pub fn new(peer: Peer<RoleServer>) -> Self {
        Self { peer }
    }
}

impl LogSink for PeerLogSink {
    async fn log(&self, level: LogLevel, message: &str, meta: &JsonValue) -> bool {
        let param = LoggingMessageNotificationParam {
            level: level.into(),
            logger: Some(LOGGER_NAME.to_string()),
            data: json!({ "message": message, "meta": meta }),
        };
        self.peer.notify_logging_message(param).await.is_ok()
    }
}

/// Writes entries to the local tracing subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalLogSink;

impl LogSink for LocalLogSink {
    async fn log(&self, level: LogLevel, message: &str, meta: &JsonValue) -> bool {
        match level {
            LogLevel::Info => tracing::info!(meta = %meta, "{}", message),
            LogLevel::Error => tracing::error!(meta = %meta, "{}", message),
        }
        true
    }
}

/// Picks the MCP peer when one is attached, the local stream otherwise.
#[derive(Default)]
pub struct ProtocolLogger {
    peer: RwLock<Option<PeerLogSink>>,
    local: LocalLogSink,
}

impl ProtocolLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route entries to a connected client.
    pub async fn attach(&self, peer: Peer<RoleServer>) {
        *self.peer.write().await = Some(PeerLogSink::new(peer));
    }

    /// Go back to local logging, e.g. once the transport has closed.
    pub async fn detach(&self) {
        *self.peer.write().await = None;
    }

    pub async fn is_connected(&self) -> bool {
        self.peer.read().await.is_some()
    }

    pub async fn info(&self, message: &str, meta: JsonValue) {
        self.log(LogLevel::Info, message, &meta).await;
    }

    pub async fn error(&self, message: &str, meta: JsonValue) {
        self.log(LogLevel::Error, message, &meta).await;
    }

    async fn log(&self, level: LogLevel, message: &str, meta: &JsonValue) {
        let peer = self.peer.read().await.clone();
        let delivered = match peer {
            Some(sink) => sink.log(level, message, meta).await,
            None => false,
        };
        if !delivered {
            self.local.log(level, message, meta).await;
        }
    }
}
