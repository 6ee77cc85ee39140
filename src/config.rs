//! Configuration surface for the MariaDB agent
//!
//! A single option is recognized: `port`. Invalid values are reported as
//! `ConfigError` so the controller can surface a Blocked status instead of
//! crashing the event handler.

use serde::Deserialize;
use thiserror::Error;

/// Default MariaDB server port
pub const DEFAULT_PORT: i64 = 3306;

/// Highest valid TCP port
pub const MAX_PORT: i64 = 65535;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("port {0} is out of range (expected 1-65535)")]
    PortOutOfRange(i64),
}

/// User-supplied configuration, as delivered by the platform's config store.
///
/// The port is kept as a raw integer so that out-of-range values survive
/// parsing and can be rejected with a useful message during validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MariadbConfig {
    #[serde(default = "default_port")]
    pub port: i64,
}

fn default_port() -> i64 {
    DEFAULT_PORT
}

impl Default for MariadbConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl MariadbConfig {
    /// Validate the configured port, returning it as a concrete `u16`.
    pub fn validated_port(&self) -> Result<u16, ConfigError> {
        if (1..=MAX_PORT).contains(&self.port) {
            Ok(self.port as u16)
        } else {
            Err(ConfigError::PortOutOfRange(self.port))
        }
    }
}
