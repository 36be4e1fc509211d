//! Configuration loading for sync-relay.
//!
//! Configuration is loaded from a TOML file (default: `relay.toml`).
//! Every field has a default, so an empty file (or no file) is valid.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default ceiling on one WebSocket message (16 MiB).
///
/// Leaves room for a base64-encoded 10 MiB file plus its name. The relay
/// forwards frames opaquely; receiving peers enforce the frame cap.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Root configuration for sync-relay.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Channel limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for HTTP + WebSocket (default: 0.0.0.0:8080).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Per-channel limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Deadline for writing one frame to a peer (default: 10).
    /// A peer that misses it is dropped.
    #[serde(default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,
    /// Interval between server pings (default: 30).
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    /// A channel with no inbound traffic for this long is dead (default: 60).
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Largest WebSocket message accepted from a peer (default: 16 MiB).
    /// A larger message ends the sender's channel.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl LimitsConfig {
    /// Write deadline as a Duration.
    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    /// Ping interval as a Duration.
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    /// Read deadline as a Duration.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_write_timeout_secs() -> u64 {
    10
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_read_timeout_secs() -> u64 {
    60 // two missed pongs
}

fn default_max_message_size() -> usize {
    DEFAULT_MAX_MESSAGE_SIZE
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            write_timeout_secs: default_write_timeout_secs(),
            ping_interval_secs: default_ping_interval_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a limit
    /// is out of range (see [`Config::validate`]).
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every limit is usable.
    ///
    /// Timers cannot run with a zero period and a zero message size would
    /// reject every frame.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = &self.limits;
        for (field, value) in [
            ("limits.write_timeout_secs", limits.write_timeout_secs),
            ("limits.ping_interval_secs", limits.ping_interval_secs),
            ("limits.read_timeout_secs", limits.read_timeout_secs),
            ("limits.max_message_size", limits.max_message_size as u64),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero",
                });
            }
        }
        Ok(())
    }

    /// Override the bind address.
    pub fn with_bind_address(mut self, bind_address: impl Into<String>) -> Self {
        self.server.bind_address = bind_address.into();
        self
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value parsed but cannot be used.
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        /// Dotted name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}
