//! Provider context shared by every lifecycle invocation

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::lock::LockManager;
use crate::zone::ZoneGateway;

/// Default bound for each lifecycle operation
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Lifecycle operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::Import => write!(f, "import"),
        }
    }
}

/// Per-operation time limits, lock wait included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileTimeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for ReconcileTimeouts {
    fn default() -> Self {
        Self::uniform(DEFAULT_OPERATION_TIMEOUT)
    }
}

impl ReconcileTimeouts {
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            create: timeout,
            read: timeout,
            update: timeout,
            delete: timeout,
        }
    }

    /// Import is a read of a not yet tracked zone and shares its limit
    pub fn for_operation(&self, operation: Operation) -> Duration {
        match operation {
            Operation::Create => self.create,
            Operation::Read | Operation::Import => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

/// Gateway, lock and limits handed to the reconciler by the host
#[derive(Clone)]
pub struct ProviderContext {
    gateway: Arc<dyn ZoneGateway>,
    lock: Arc<LockManager>,
    timeouts: ReconcileTimeouts,
}

impl ProviderContext {
    pub fn new(gateway: Arc<dyn ZoneGateway>) -> Self {
        Self {
            gateway,
            lock: Arc::new(LockManager::new()),
            timeouts: ReconcileTimeouts::default(),
        }
    }

    /// Share an existing lock, e.g. between contexts using different gateways
    /// against the same controller
    pub fn with_lock(mut self, lock: Arc<LockManager>) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_timeouts(mut self, timeouts: ReconcileTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn gateway(&self) -> &dyn ZoneGateway {
        self.gateway.as_ref()
    }

    pub fn lock(&self) -> &LockManager {
        &self.lock
    }

    pub fn timeouts(&self) -> &ReconcileTimeouts {
        &self.timeouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_uses_read_timeout() {
        let timeouts = ReconcileTimeouts {
            create: Duration::from_secs(1),
            read: Duration::from_secs(2),
            update: Duration::from_secs(3),
            delete: Duration::from_secs(4),
        };

        assert_eq!(timeouts.for_operation(Operation::Create).as_secs(), 1);
        assert_eq!(timeouts.for_operation(Operation::Import).as_secs(), 2);
        assert_eq!(timeouts.for_operation(Operation::Update).as_secs(), 3);
        assert_eq!(timeouts.for_operation(Operation::Delete).as_secs(), 4);
        assert_eq!(ReconcileTimeouts::default().read, DEFAULT_OPERATION_TIMEOUT);
    }
}
