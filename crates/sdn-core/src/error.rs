//! Error types for zone reconciliation

use std::time::Duration;

use thiserror::Error;

use crate::context::Operation;
use crate::zone::GatewayError;

/// Errors surfaced to the host by the lifecycle operations
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("zone {zone} could not be found")]
    NotFound { zone: String },

    #[error("{operation} of zone {zone} failed: {source}")]
    Transport {
        operation: Operation,
        zone: String,
        #[source]
        source: GatewayError,
    },

    #[error("invalid value for attribute {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{operation} of zone {zone} timed out after {after:?}")]
    Timeout {
        operation: Operation,
        zone: String,
        after: Duration,
    },

    #[error("no zone identifier: neither the resource id nor the 'zone' attribute is set")]
    MissingIdentifier,
}

impl ZoneError {
    pub(crate) fn transport(operation: Operation, zone: &str, source: GatewayError) -> Self {
        ZoneError::Transport {
            operation,
            zone: zone.to_string(),
            source,
        }
    }

    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        ZoneError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ZoneError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ZoneError>;
