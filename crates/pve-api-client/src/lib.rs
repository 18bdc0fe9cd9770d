//! Proxmox VE API access for SDN zones
//!
//! Provides the HTTP client, the [`ZoneGateway`](pve_sdn_core::ZoneGateway)
//! implementation on top of it and the provider configuration.

pub mod client;
pub mod config;
pub mod zones;

pub use client::{ApiError, ApiRequest, ApiResponse, HttpApiClient, MockApiClient, PveApiClient};
pub use config::{ClientConfig, ConfigError, OperationTimeouts};
pub use zones::PveZoneGateway;
