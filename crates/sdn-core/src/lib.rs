//! Proxmox VE SDN Core
//!
//! Declarative lifecycle (create, read, update, delete, import) for SDN
//! zones held by the cluster controller.

pub mod attributes;
pub mod context;
pub mod error;
pub mod existence;
pub mod lock;
pub mod mapper;
pub mod reconciler;
pub mod schema;
pub mod zone;


pub use attributes::{AttributeKind, AttributeStore, AttributeValue};
pub use context::{Operation, ProviderContext, ReconcileTimeouts};
pub use error::{Result, ZoneError};
pub use existence::ExistenceChecker;
pub use lock::{LockGuard, LockInfo, LockManager};
pub use mapper::FieldMapper;
pub use reconciler::{ZoneReconciler, ZoneState};
pub use schema::{ZoneField, ZONE_FIELDS};
pub use zone::{DeleteOutcome, GatewayError, ZoneConfig, ZoneGateway};
