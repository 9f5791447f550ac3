//! # In-Memory Transport
//!
//! Channel-keyed in-process pub/sub implementing both transport seams.
//! Used by the test suite and by single-process wiring; it assigns message
//! ids on send and keeps a log of every sent message for inspection.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use super::errors::MessagingResult;
use super::message::{headers, Message};
use super::transport::{MessageConsumer, MessageHandler, MessageProducer};

struct Subscription {
    subscriber_id: String,
    handler: Arc<dyn MessageHandler>,
}

/// In-process transport for tests and single-process deployments
#[derive(Default)]
pub struct InMemoryTransport {
    subscriptions: RwLock<HashMap<String, Vec<Subscription>>>,
    sent: RwLock<Vec<(String, Message)>>,
}

impl InMemoryTransport {
    /// Create an empty transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message sent so far, paired with its destination channel
    pub fn sent_messages(&self) -> Vec<(String, Message)> {
        self.sent.read().clone()
    }

    /// Messages sent to one destination channel
    pub fn sent_to(&self, destination: &str) -> Vec<Message> {
        self.sent
            .read()
            .iter()
            .filter(|(dest, _)| dest == destination)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

#[async_trait]
impl MessageConsumer for InMemoryTransport {
    async fn subscribe(
        &self,
        subscriber_id: &str,
        channels: &BTreeSet<String>,
        handler: Arc<dyn MessageHandler>,
    ) -> MessagingResult<()> {
        let mut subscriptions = self.subscriptions.write();
        for channel in channels {
            subscriptions
                .entry(channel.clone())
                .or_default()
                .push(Subscription {
                    subscriber_id: subscriber_id.to_string(),
                    handler: Arc::clone(&handler),
                });
        }
        debug!(
            subscriber_id,
            channel_count = channels.len(),
            "subscriber registered"
        );
        Ok(())
    }
}

#[async_trait]
impl MessageProducer for InMemoryTransport {
    async fn send(&self, destination: &str, mut message: Message) -> MessagingResult<()> {
        if message.id().is_none() {
            message.set_header(headers::ID, Uuid::new_v4().to_string());
        }
        message.set_header(headers::DATE, Utc::now().to_rfc3339());

        self.sent
            .write()
            .push((destination.to_string(), message.clone()));

        let handlers: Vec<(String, Arc<dyn MessageHandler>)> = {
            let subscriptions = self.subscriptions.read();
            subscriptions
                .get(destination)
                .map(|subs| {
                    subs.iter()
                        .map(|s| (s.subscriber_id.clone(), Arc::clone(&s.handler)))
                        .collect()
                })
                .unwrap_or_default()
        };

        if handlers.is_empty() {
            debug!(destination, "no subscribers for destination");
            return Ok(());
        }

        for (subscriber_id, handler) in handlers {
            if let Err(e) = handler.handle(destination, message.clone()).await {
                error!(
                    subscriber_id,
                    destination,
                    error = %e,
                    "subscriber failed to handle message"
                );
            }
        }
        Ok(())
    }
}
