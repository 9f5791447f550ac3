//! # Transport Seams
//!
//! The dispatch core consumes the message transport through two operations
//! only: subscribe with a handler callback, and send to a destination.
//! Delivery semantics (at-least-once, partitioning, reconnection) belong to
//! the transport implementation.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::errors::MessagingResult;
use super::message::Message;

/// Callback invoked by a consumer for each delivered message
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one delivered message from the given channel
    async fn handle(&self, channel: &str, message: Message) -> anyhow::Result<()>;
}

/// Inbound side of the transport
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Subscribe a handler to a set of channels under a subscriber id
    async fn subscribe(
        &self,
        subscriber_id: &str,
        channels: &BTreeSet<String>,
        handler: Arc<dyn MessageHandler>,
    ) -> MessagingResult<()>;
}

/// Outbound side of the transport
///
/// Implementations assign the [`headers::ID`](super::message::headers::ID)
/// header when the message does not already carry one.
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Send a message to a destination channel
    async fn send(&self, destination: &str, message: Message) -> MessagingResult<()>;
}
