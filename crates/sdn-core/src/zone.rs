//! SDN zone gateway abstractions

use async_trait::async_trait;
use thiserror::Error;

pub use pve_shared_types::ZoneConfig;

/// Failures at the controller boundary
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Controller returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed")]
    Authentication,

    #[error("Failed to decode controller response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// What a delete request found on the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
}

/// Network operations against the controller holding SDN zones.
///
/// `zone_exists` answers `Ok(false)` for an unknown zone; errors are
/// reserved for failures of the request itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ZoneGateway: Send + Sync {
    async fn zone_exists(&self, zone: &str) -> Result<bool, GatewayError>;

    /// Raw controller representation of the zone
    async fn fetch_zone(&self, zone: &str) -> Result<serde_json::Value, GatewayError>;

    async fn create_zone(&self, zone: &str, config: &ZoneConfig) -> Result<(), GatewayError>;

    /// Replace the zone record with `config`; properties at their zero value
    /// must end up unset on the controller
    async fn update_zone(&self, zone: &str, config: &ZoneConfig) -> Result<(), GatewayError>;

    async fn delete_zone(&self, zone: &str) -> Result<DeleteOutcome, GatewayError>;
}
