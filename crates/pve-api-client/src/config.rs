//! Provider configuration
//!
//! Loaded from a TOML file, with `PVE_SDN_*` environment variables taking
//! precedence. Nested keys use a double underscore, e.g.
//! `PVE_SDN_TIMEOUTS__CREATE=600`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use pve_sdn_core::ReconcileTimeouts;

pub const ENV_PREFIX: &str = "PVE_SDN";

const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 20 * 60;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Per-operation time limits, in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationTimeouts {
    pub create: u64,
    pub read: u64,
    pub update: u64,
    pub delete: u64,
}

impl Default for OperationTimeouts {
    fn default() -> Self {
        Self {
            create: DEFAULT_OPERATION_TIMEOUT_SECS,
            read: DEFAULT_OPERATION_TIMEOUT_SECS,
            update: DEFAULT_OPERATION_TIMEOUT_SECS,
            delete: DEFAULT_OPERATION_TIMEOUT_SECS,
        }
    }
}

/// Connection and reconcile settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of any cluster node, e.g. `https://pve1:8006`
    pub api_url: String,
    /// `user@realm!tokenid`
    pub token_id: String,
    pub token_secret: String,
    /// Verify the node's TLS certificate
    pub verify_tls: bool,
    /// Timeout of a single HTTP request (seconds)
    pub http_timeout: u64,
    pub timeouts: OperationTimeouts,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "https://localhost:8006".to_string(),
            token_id: String::new(),
            token_secret: String::new(),
            verify_tls: true,
            http_timeout: 60,
            timeouts: OperationTimeouts::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file plus environment overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).format(config::FileFormat::Toml))
            .add_source(environment())
            .build()?;

        Self::finish(settings)
    }

    /// Load configuration from the environment alone
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(environment())
            .build()?;

        Self::finish(settings)
    }

    fn finish(settings: config::Config) -> Result<Self, ConfigError> {
        let config: ClientConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.is_empty() {
            return Err(ConfigError::Missing("api_url"));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "api_url",
                message: format!("'{}' is not an http(s) URL", self.api_url),
            });
        }
        if self.token_id.is_empty() {
            return Err(ConfigError::Missing("token_id"));
        }
        if self.token_secret.is_empty() {
            return Err(ConfigError::Missing("token_secret"));
        }

        let timeouts = [
            ("timeouts.create", self.timeouts.create),
            ("timeouts.read", self.timeouts.read),
            ("timeouts.update", self.timeouts.update),
            ("timeouts.delete", self.timeouts.delete),
            ("http_timeout", self.http_timeout),
        ];
        for (field, secs) in timeouts {
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: "must be at least one second".to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout)
    }

    pub fn reconcile_timeouts(&self) -> ReconcileTimeouts {
        ReconcileTimeouts {
            create: Duration::from_secs(self.timeouts.create),
            read: Duration::from_secs(self.timeouts.read),
            update: Duration::from_secs(self.timeouts.update),
            delete: Duration::from_secs(self.timeouts.delete),
        }
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
