//! # In-Memory Lock Store
//!
//! Per-target mutex table backing tests and single-process deployments.
//! Each target maps to one `tokio` mutex; acquisition parks the caller on
//! that mutex under a timeout, and the owned guard is parked in a held-lock
//! table until release.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use super::{LockError, LockStore, LockTarget};

struct HeldLock {
    _guard: OwnedMutexGuard<()>,
    acquired_at: DateTime<Utc>,
}

/// Lock store for tests and single-process deployments
#[derive(Default)]
pub struct InMemoryLockStore {
    cells: DashMap<LockTarget, Arc<Mutex<()>>>,
    held: DashMap<LockTarget, HeldLock>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the target is currently held
    pub fn is_held(&self, target: &LockTarget) -> bool {
        self.held.contains_key(target)
    }
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    async fn acquire(&self, target: &LockTarget, timeout: Duration) -> Result<(), LockError> {
        let cell = self
            .cells
            .entry(target.clone())
            .or_default()
            .clone();

        match tokio::time::timeout(timeout, cell.lock_owned()).await {
            Ok(guard) => {
                debug!(target = %target, "lock acquired");
                self.held.insert(
                    target.clone(),
                    HeldLock {
                        _guard: guard,
                        acquired_at: Utc::now(),
                    },
                );
                Ok(())
            }
            Err(_) => Err(LockError::Timeout {
                target: target.clone(),
                timeout,
            }),
        }
    }

    async fn release(&self, target: &LockTarget) -> Result<(), LockError> {
        match self.held.remove(target) {
            Some((_, held)) => {
                let held_for = Utc::now().signed_duration_since(held.acquired_at);
                debug!(
                    target = %target,
                    held_ms = held_for.num_milliseconds(),
                    "lock released"
                );
                Ok(())
            }
            None => Err(LockError::NotHeld {
                target: target.clone(),
            }),
        }
    }
}
