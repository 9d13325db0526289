//! Configuration handling for the QuestDB MCP Server.
//!
//! This module provides configuration management via CLI arguments and environment variables,
//! and resolves them into the [`ConnectionDescriptor`] shared by the query and ingest paths.

use clap::Parser;
use std::fmt;

pub const DEFAULT_QUESTDB_HOST: &str = "localhost";
pub const DEFAULT_QUESTDB_PORT: u16 = 9000;

/// Username/password pair used for HTTP Basic auth on both endpoints.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Auto-flush policy for the line-protocol sender.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushPolicy {
    /// Flush once this many rows are buffered
    pub rows: Option<usize>,
    /// Flush once this many milliseconds have passed since the last flush
    pub interval_ms: Option<u64>,
}

/// Where and how to reach QuestDB. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub credentials: Option<Credentials>,
    pub flush_policy: FlushPolicy,
}

impl ConnectionDescriptor {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            credentials: None,
            flush_policy: FlushPolicy::default(),
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_flush_policy(mut self, flush_policy: FlushPolicy) -> Self {
        self.flush_policy = flush_policy;
        self
    }

    /// `host:port`, as used in the sender's `addr` key.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL of the QuestDB HTTP server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr())
    }

    /// Render the line-protocol sender configuration string.
    ///
    /// ```
    /// use questdb_mcp_server::config::ConnectionDescriptor;
    ///
    /// let descriptor = ConnectionDescriptor::new("localhost", 9000);
    /// assert_eq!(descriptor.sender_conf(), "http::addr=localhost:9000;");
    /// ```
    pub fn sender_conf(&self) -> String {
        let mut conf = format!("http::addr={};", self.addr());
        if let Some(creds) = &self.credentials {
            conf.push_str(&format!(
                "username={};password={};",
                escape_conf_value(&creds.username),
                escape_conf_value(&creds.password)
            ));
        }
        if let Some(rows) = self.flush_policy.rows {
            conf.push_str(&format!("auto_flush_rows={};", rows));
        }
        if let Some(interval) = self.flush_policy.interval_ms {
            conf.push_str(&format!("auto_flush_interval={};", interval));
        }
        conf
    }
}

/// Semicolons inside values are doubled in the configuration string.
fn escape_conf_value(value: &str) -> String {
    value.replace(';', ";;")
}

/// Configuration for the QuestDB MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "questdb-mcp-server",
    about = "MCP server for QuestDB - enables AI assistants to query and ingest time-series data",
    version,
    author
)]
pub struct Config {
    /// QuestDB host
    #[arg(long, default_value = DEFAULT_QUESTDB_HOST, env = "QUESTDB_HOST")]
    pub host: String,

    /// QuestDB HTTP port (serves both /exec and ILP-over-HTTP /write)
    #[arg(long, default_value_t = DEFAULT_QUESTDB_PORT, env = "QUESTDB_PORT")]
    pub port: u16,

    /// Username for HTTP Basic auth
    #[arg(long, env = "QUESTDB_USERNAME")]
    pub username: Option<String>,

    /// Password for HTTP Basic auth
    #[arg(long, env = "QUESTDB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Flush the sender after this many buffered rows
    #[arg(long, env = "QUESTDB_AUTO_FLUSH_ROWS")]
    pub auto_flush_rows: Option<usize>,

    /// Flush the sender after this many milliseconds
    #[arg(long, env = "QUESTDB_AUTO_FLUSH_INTERVAL")]
    pub auto_flush_interval: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            host: DEFAULT_QUESTDB_HOST.to_string(),
            port: DEFAULT_QUESTDB_PORT,
            username: None,
            password: None,
            auto_flush_rows: None,
            auto_flush_interval: None,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Resolve the connection descriptor.
    ///
    /// Credentials are only attached when both username and password are set.
    pub fn connection_descriptor(&self) -> ConnectionDescriptor {
        let descriptor = ConnectionDescriptor::new(self.host.clone(), self.port).with_flush_policy(
            FlushPolicy {
                rows: self.auto_flush_rows,
                interval_ms: self.auto_flush_interval,
            },
        );

        match (&self.username, &self.password) {
            (Some(username), Some(password)) => descriptor.with_credentials(username, password),
            _ => descriptor,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
