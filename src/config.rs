//! # Dispatcher Configuration
//!
//! Tuning knobs for the dispatch core. Fields default to sensible values so
//! wiring code can deserialize a partial document or start from
//! `DispatcherConfig::default()`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`CommandDispatcher`](crate::dispatch::CommandDispatcher)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// How long to wait for a configured lock target before failing the
    /// command with a lock-timeout error
    #[serde(default = "default_lock_acquire_timeout_ms")]
    pub lock_acquire_timeout_ms: u64,
}

fn default_lock_acquire_timeout_ms() -> u64 {
    10_000
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            lock_acquire_timeout_ms: default_lock_acquire_timeout_ms(),
        }
    }
}

impl DispatcherConfig {
    pub fn lock_acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_acquire_timeout_ms)
    }
}
