//! Server configuration schema and loading.
//!
//! # Design Decisions
//! - Every field has a default, so an empty TOML file (or no file at all)
//!   yields a working loopback configuration
//! - Validation is explicit and runs on load, not lazily at bind time

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Construction-time server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind. Port 0 requests an ephemeral port; the assigned
    /// address is reported back through the root URL.
    pub bind_address: String,

    /// Grace period the demo host passes to `stop`, in milliseconds.
    pub shutdown_timeout_ms: u64,

    /// Request bodies above this size are rejected with 413.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Loopback with an ephemeral port: a single co-located client,
            // never an externally reachable surface.
            bind_address: "127.0.0.1:0".to_string(),
            shutdown_timeout_ms: 100,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let Some((host, port)) = self.bind_address.rsplit_once(':') else {
            return Err(ConfigError::Invalid(format!(
                "bind_address `{}` is missing a port",
                self.bind_address
            )));
        };
        if host.is_empty() {
            return Err(ConfigError::Invalid("bind_address has an empty host".to_string()));
        }
        if port.parse::<u16>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "bind_address port `{port}` is not a valid port number"
            )));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("max_body_bytes must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
