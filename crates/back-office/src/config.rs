//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// Back-office server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Notification webhook URL, if any.
    pub webhook_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `BACKOFFICE_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:casaemordem.db?mode=rwc` |
    /// | `NOTIFY_WEBHOOK_URL` | Notification webhook URL | (unset: notices dropped) |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("BACKOFFICE_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:casaemordem.db?mode=rwc".to_string());

        let webhook_url = env::var("NOTIFY_WEBHOOK_URL").ok();

        Ok(Self {
            addr,
            database_url,
            webhook_url,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid BACKOFFICE_ADDR format")]
    InvalidAddr,
}
