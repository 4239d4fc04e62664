//! Typed configuration from environment variables or a TOML file.
//!
//! Loads once at startup, fails fast on malformed values. Every setting has
//! a default, so an empty environment yields a runnable server on
//! `[::]:50051`.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "[::]";
pub const DEFAULT_PORT: u16 = 50051;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

/// Deployment parameters for one echo server instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Append-only activity log. `None` disables file logging.
    pub log_file: Option<PathBuf>,
    /// Fixed delay before each response.
    pub response_delay: Option<Duration>,
    /// How long `stop` waits for in-flight calls before force-closing.
    pub grace_period: Duration,
    /// Concurrently executing calls allowed per connection.
    pub max_concurrent_calls: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_file: None,
            response_delay: None,
            grace_period: Duration::from_secs(1),
            max_concurrent_calls: 10,
        }
    }
}

impl ServerConfig {
    /// `host:port` string handed to the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// On-disk form. Durations are milliseconds.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    server: FileServerConfig,
    otel_endpoint: Option<String>,
    log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileServerConfig {
    host: Option<String>,
    port: Option<u16>,
    log_file: Option<PathBuf>,
    response_delay_ms: Option<u64>,
    grace_period_ms: Option<u64>,
    max_concurrent_calls: Option<usize>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: std::env::var("TASKECHO_HOST").unwrap_or(defaults.host),
            port: parsed_var("TASKECHO_PORT")?.unwrap_or(defaults.port),
            log_file: std::env::var("TASKECHO_LOG_FILE").ok().map(PathBuf::from),
            response_delay: parsed_var("TASKECHO_RESPONSE_DELAY_MS")?.map(Duration::from_millis),
            grace_period: parsed_var("TASKECHO_GRACE_PERIOD_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.grace_period),
            max_concurrent_calls: parsed_var("TASKECHO_MAX_CONCURRENT_CALLS")?
                .unwrap_or(defaults.max_concurrent_calls),
        };
        validate(&server)?;

        Ok(Self {
            server,
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Load configuration from a TOML file. Missing keys take defaults.
    ///
    /// ```toml
    /// log_level = "debug"
    ///
    /// [server]
    /// host = "127.0.0.1"
    /// port = 50052
    /// log_file = "/tmp/ai_server.log"
    /// response_delay_ms = 10
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("bad config {}: {e}", path.display())))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: FileConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        let defaults = ServerConfig::default();
        let s = file.server;
        let server = ServerConfig {
            host: s.host.unwrap_or(defaults.host),
            port: s.port.unwrap_or(defaults.port),
            log_file: s.log_file,
            response_delay: s.response_delay_ms.map(Duration::from_millis),
            grace_period: s
                .grace_period_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.grace_period),
            max_concurrent_calls: s
                .max_concurrent_calls
                .unwrap_or(defaults.max_concurrent_calls),
        };
        validate(&server)?;

        Ok(Self {
            server,
            otel_endpoint: file.otel_endpoint,
            log_level: file.log_level.unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn validate(server: &ServerConfig) -> Result<()> {
    if server.host.trim().is_empty() {
        return Err(Error::Config("host must not be empty".to_string()));
    }
    if server.max_concurrent_calls == 0 {
        return Err(Error::Config(
            "max_concurrent_calls must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn parsed_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("{name}={raw:?} is invalid: {e}"))),
        Err(_) => Ok(None),
    }
}
