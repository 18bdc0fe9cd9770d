//! Process-wide SDN lock
//!
//! The controller's SDN configuration is one shared document and concurrent
//! writers can interleave partial commits. Every lifecycle operation, reads
//! included, runs its whole body under this single lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::context::Operation;

/// Lock holder information
#[derive(Debug, Clone)]
pub struct LockInfo {
    pub operation: Operation,
    pub zone: String,
    pub acquired_at: DateTime<Utc>,
}

/// Single mutual-exclusion gate for all zone operations
#[derive(Debug, Default)]
pub struct LockManager {
    gate: Arc<Mutex<Option<LockInfo>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the lock. It is held until the returned guard is released
    /// or dropped, including when the owning future is cancelled.
    pub async fn begin(&self, operation: Operation, zone: &str) -> LockGuard {
        log::debug!("Waiting for SDN lock ({} {})", operation, zone);

        let mut guard = self.gate.clone().lock_owned().await;
        *guard = Some(LockInfo {
            operation,
            zone: zone.to_string(),
            acquired_at: Utc::now(),
        });

        log::debug!("Acquired SDN lock ({} {})", operation, zone);
        LockGuard { guard }
    }

    #[cfg(test)]
    pub(crate) fn is_locked(&self) -> bool {
        self.gate.try_lock().is_err()
    }
}

/// Held SDN lock
#[derive(Debug)]
pub struct LockGuard {
    guard: OwnedMutexGuard<Option<LockInfo>>,
}

impl LockGuard {
    #[cfg(test)]
    pub(crate) fn info(&self) -> Option<&LockInfo> {
        (*self.guard).as_ref()
    }

    #[cfg(test)]
    pub(crate) fn release(self) {}
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(info) = self.guard.take() {
            let held = Utc::now() - info.acquired_at;
            log::debug!(
                "Released SDN lock ({} {}) after {}ms",
                info.operation,
                info.zone,
                held.num_milliseconds()
            );
        }
    }
}
