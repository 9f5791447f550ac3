//! # Lock Coordination
//!
//! Per-resource locking around handler invocation. The dispatch core names
//! the resource to lock (via a handler's pre-lock hook) and owns the
//! acquire/release call sites; the store that holds and contends locks is a
//! collaborator behind the [`LockStore`] trait.

pub mod in_memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use in_memory::InMemoryLockStore;

/// Identity of a lockable resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockTarget {
    resource_type: String,
    resource_id: String,
}

impl LockTarget {
    pub fn new(resource_type: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }
}

impl fmt::Display for LockTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.resource_id)
    }
}

/// What should happen to a held lock after a successful invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseDecision {
    /// Release the lock now
    Release,
    /// Keep the lock for a follow-up step of the saga
    Hold,
}

/// Errors from lock store operations
#[derive(Error, Debug)]
pub enum LockError {
    #[error("lock acquisition for {target} timed out after {timeout:?}")]
    Timeout {
        target: LockTarget,
        timeout: Duration,
    },

    #[error("lock for {target} is not held")]
    NotHeld { target: LockTarget },

    #[error("lock store error for {target}: {message}")]
    Store { target: LockTarget, message: String },
}

/// Store that serializes access to lock targets
///
/// Acquisition blocks until the target is free or the timeout elapses.
/// Release of a target that is not held is an error: the dispatch core only
/// releases locks it successfully acquired.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Acquire the lock for a target, waiting up to `timeout`
    async fn acquire(&self, target: &LockTarget, timeout: Duration) -> Result<(), LockError>;

    /// Release a previously acquired lock
    async fn release(&self, target: &LockTarget) -> Result<(), LockError>;
}
