//! Shared test doubles for the dispatch integration suite.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use saga_core::locking::InMemoryLockStore;
use saga_core::messaging::MessagingResult;
use saga_core::{LockError, LockStore, LockTarget, Message, MessageProducer, MessagingError};

/// Ordered log of lock and handler events, shared between a
/// [`RecordingLockStore`] and handler closures
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Lock store that records successful acquire/release calls in order
pub struct RecordingLockStore {
    inner: InMemoryLockStore,
    events: EventLog,
}

impl RecordingLockStore {
    pub fn new(events: EventLog) -> Self {
        Self {
            inner: InMemoryLockStore::new(),
            events,
        }
    }

    pub fn is_held(&self, target: &LockTarget) -> bool {
        self.inner.is_held(target)
    }

    /// Pre-acquire a target so later acquisitions contend
    pub async fn occupy(&self, target: &LockTarget) {
        self.inner
            .acquire(target, Duration::from_millis(50))
            .await
            .expect("target should be free");
    }
}

#[async_trait]
impl LockStore for RecordingLockStore {
    async fn acquire(&self, target: &LockTarget, timeout: Duration) -> Result<(), LockError> {
        self.inner.acquire(target, timeout).await?;
        self.events.lock().push(format!("acquire:{target}"));
        Ok(())
    }

    async fn release(&self, target: &LockTarget) -> Result<(), LockError> {
        self.inner.release(target).await?;
        self.events.lock().push(format!("release:{target}"));
        Ok(())
    }
}

/// Producer whose first send fails, to exercise independent reply sends
#[derive(Default)]
pub struct FlakyProducer {
    calls: AtomicUsize,
    sent: Mutex<Vec<(String, Message)>>,
}

impl FlakyProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_messages(&self) -> Vec<(String, Message)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl MessageProducer for FlakyProducer {
    async fn send(&self, destination: &str, message: Message) -> MessagingResult<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(MessagingError::send(destination, "simulated outage"));
        }
        self.sent.lock().push((destination.to_string(), message));
        Ok(())
    }
}

/// Build an inbound command message from header pairs and a payload
pub fn command_message(payload: &str, headers: &[(&str, &str)]) -> Message {
    let headers: HashMap<String, String> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Message::new(payload, headers)
}
