//! # Command Dispatcher
//!
//! The orchestration core of a saga participant. One inbound command message
//! becomes zero or more correlated replies: resolve the handler by command
//! type, extract path variables, acquire the configured lock, invoke the
//! handler, and map the outcome (or any failure) into reply messages sent to
//! the command's reply destination.
//!
//! Only configuration and protocol defects escalate out of
//! [`CommandDispatcher::handle_message`]; every command-level failure
//! terminates in a sent reply, either from a matching exception handler or as
//! the generic failure payload.

pub mod errors;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::command::{headers as command_headers, Failure};
use crate::config::DispatcherConfig;
use crate::locking::{LockStore, LockTarget, ReleaseDecision};
use crate::messaging::{
    headers as message_headers, Message, MessageBuilder, MessageConsumer, MessageHandler,
    MessageProducer, MessagingResult,
};
use crate::paths::{PathVariables, ResourcePath};
use crate::registry::{CommandHandler, CommandHandlers};

pub use errors::{DispatchError, InvocationError};

/// Routes inbound command messages to handlers and sends correlated replies
///
/// Safe to invoke concurrently: the only shared state is the immutable
/// registry and the lock store behind its trait.
pub struct CommandDispatcher {
    dispatcher_id: String,
    handlers: Arc<CommandHandlers>,
    producer: Arc<dyn MessageProducer>,
    lock_store: Arc<dyn LockStore>,
    config: DispatcherConfig,
}

impl CommandDispatcher {
    /// Create a dispatcher with default configuration
    pub fn new(
        dispatcher_id: impl Into<String>,
        handlers: Arc<CommandHandlers>,
        producer: Arc<dyn MessageProducer>,
        lock_store: Arc<dyn LockStore>,
    ) -> Self {
        Self::with_config(
            dispatcher_id,
            handlers,
            producer,
            lock_store,
            DispatcherConfig::default(),
        )
    }

    /// Create a dispatcher with explicit configuration
    pub fn with_config(
        dispatcher_id: impl Into<String>,
        handlers: Arc<CommandHandlers>,
        producer: Arc<dyn MessageProducer>,
        lock_store: Arc<dyn LockStore>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            dispatcher_id: dispatcher_id.into(),
            handlers,
            producer,
            lock_store,
            config,
        }
    }

    pub fn dispatcher_id(&self) -> &str {
        &self.dispatcher_id
    }

    /// Subscribe this dispatcher to the registry's channel set
    pub async fn initialize(self: &Arc<Self>, consumer: &dyn MessageConsumer) -> MessagingResult<()> {
        let channels = self.handlers.channels();
        info!(
            dispatcher_id = %self.dispatcher_id,
            channel_count = channels.len(),
            handler_count = self.handlers.handler_count(),
            "🚚 dispatcher subscribing"
        );
        consumer
            .subscribe(
                &self.dispatcher_id,
                &channels,
                Arc::clone(self) as Arc<dyn MessageHandler>,
            )
            .await
    }

    /// Handle one inbound command message end to end
    pub async fn handle_message(
        &self,
        channel: &str,
        message: Message,
    ) -> Result<(), DispatchError> {
        let command_type = message
            .required_header(command_headers::COMMAND_TYPE)?
            .to_string();
        let handler = self
            .handlers
            .find_command_handler(&command_type)
            .ok_or_else(|| DispatchError::NoHandler {
                command_type: command_type.clone(),
            })?;

        let message_id = message.required_id()?.to_string();
        let security_token = message
            .required_header(message_headers::SECURITY_TOKEN)?
            .to_string();

        debug!(
            dispatcher_id = %self.dispatcher_id,
            channel,
            command_type = %command_type,
            message_id = %message_id,
            "received command message"
        );

        let reply_to = message.header(command_headers::REPLY_TO).map(str::to_string);
        let correlation_headers =
            command_headers::correlation_headers(&message.headers, &message_id);
        let path_vars = self.path_variables(&message, &handler)?;

        let outcome = self
            .invoke_handler(&handler, &message, &message_id, &correlation_headers, &path_vars)
            .await;

        let replies = match outcome {
            Ok(replies) => {
                debug!(
                    dispatcher_id = %self.dispatcher_id,
                    message_id = %message_id,
                    reply_count = replies.len(),
                    "handler completed"
                );
                replies
            }
            Err(invocation_error) => {
                let handler_error = invocation_error.into_handler_error();
                debug!(
                    dispatcher_id = %self.dispatcher_id,
                    message_id = %message_id,
                    error_kind = %handler_error.kind(),
                    "handler failed, mapping to reply"
                );
                match self.handlers.find_exception_handler(&handler_error) {
                    Some(exception_handler) => exception_handler.invoke(&handler_error),
                    None => vec![MessageBuilder::with_payload(
                        Failure::new(handler_error.kind(), handler_error.message()).to_payload(),
                    )
                    .build()],
                }
            }
        };

        if replies.is_empty() {
            debug!(
                dispatcher_id = %self.dispatcher_id,
                message_id = %message_id,
                "no replies produced, nothing to publish"
            );
            return Ok(());
        }

        self.send_replies(replies, &correlation_headers, reply_to, &security_token, &message_id)
            .await
    }

    /// Extract path variables from the handler's pattern and the resource header
    fn path_variables(
        &self,
        message: &Message,
        handler: &CommandHandler,
    ) -> Result<PathVariables, DispatchError> {
        let Some(pattern) = handler.resource() else {
            return Ok(PathVariables::default());
        };
        let Some(raw_path) = message.header(command_headers::RESOURCE) else {
            return Ok(PathVariables::default());
        };

        let path = ResourcePath::parse(raw_path).map_err(|source| DispatchError::Resource {
            pattern: pattern.to_string(),
            path: raw_path.to_string(),
            source,
        })?;
        pattern
            .path_variable_values(&path)
            .map_err(|source| DispatchError::Resource {
                pattern: pattern.to_string(),
                path: raw_path.to_string(),
                source,
            })
    }

    /// Decode, lock, invoke, and settle the lock for one message
    async fn invoke_handler(
        &self,
        handler: &CommandHandler,
        message: &Message,
        message_id: &str,
        correlation_headers: &HashMap<String, String>,
        path_vars: &PathVariables,
    ) -> Result<Vec<Message>, InvocationError> {
        let invoker = handler.invoker();
        let command = invoker
            .decode(message.payload())
            .map_err(|source| InvocationError::PayloadConversion { source })?;

        let lock_target = invoker.lock_target(&command, path_vars);
        if let Some(target) = &lock_target {
            self.lock_store
                .acquire(target, self.config.lock_acquire_timeout())
                .await?;
        }

        let result = invoker
            .invoke(&command, message_id, correlation_headers, message, path_vars)
            .await;

        match result {
            Ok(replies) => {
                if let Some(target) = &lock_target {
                    match invoker.release_decision(&command, path_vars, &replies) {
                        ReleaseDecision::Release => self.release_lock(target).await,
                        ReleaseDecision::Hold => {
                            debug!(target = %target, "lock held for follow-up step");
                        }
                    }
                }
                Ok(replies)
            }
            Err(handler_error) => {
                if let Some(target) = &lock_target {
                    self.release_lock(target).await;
                }
                Err(InvocationError::Handler(handler_error))
            }
        }
    }

    async fn release_lock(&self, target: &LockTarget) {
        if let Err(e) = self.lock_store.release(target).await {
            error!(target = %target, error = %e, "lock release failed");
        }
    }

    /// Attach correlation headers and the security token, then send each reply
    ///
    /// Sends are independent: one failed send is logged and the remaining
    /// replies are still attempted.
    async fn send_replies(
        &self,
        replies: Vec<Message>,
        correlation_headers: &HashMap<String, String>,
        reply_to: Option<String>,
        security_token: &str,
        message_id: &str,
    ) -> Result<(), DispatchError> {
        let destination = reply_to.ok_or_else(|| DispatchError::NoReplyDestination {
            message_id: message_id.to_string(),
        })?;

        for reply in replies {
            let outbound = MessageBuilder::with_message(reply)
                .extra_headers(correlation_headers.clone())
                .header(message_headers::SECURITY_TOKEN, security_token)
                .build();
            if let Err(e) = self.producer.send(&destination, outbound).await {
                error!(
                    dispatcher_id = %self.dispatcher_id,
                    destination = %destination,
                    message_id = %message_id,
                    error = %e,
                    "reply send failed"
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MessageHandler for CommandDispatcher {
    async fn handle(&self, channel: &str, message: Message) -> anyhow::Result<()> {
        self.handle_message(channel, message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandMessage;
    use crate::locking::InMemoryLockStore;
    use crate::registry::{CommandHandlerDef, CommandHandlersBuilder};
    use serde::Deserialize;

    #[derive(Debug, Clone, Deserialize)]
    struct Ping {}

    fn inbound(headers: &[(&str, &str)]) -> Message {
        Message::new(
            "{}",
            headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn dispatcher(handlers: CommandHandlers) -> (CommandDispatcher, Arc<crate::messaging::InMemoryTransport>) {
        let transport = Arc::new(crate::messaging::InMemoryTransport::new());
        let dispatcher = CommandDispatcher::new(
            "test-dispatcher",
            Arc::new(handlers),
            transport.clone(),
            Arc::new(InMemoryLockStore::new()),
        );
        (dispatcher, transport)
    }

    #[tokio::test]
    async fn test_unregistered_command_type_escalates() {
        let handlers = CommandHandlersBuilder::from_channel("orderService")
            .build()
            .unwrap();
        let (dispatcher, transport) = dispatcher(handlers);

        let err = dispatcher
            .handle_message(
                "orderService",
                inbound(&[
                    ("command_type", "UnknownCommand"),
                    ("message_id", "msg-1"),
                    ("security_token", "tok-1"),
                ]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::NoHandler { .. }));
        assert!(transport.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_missing_security_token_escalates_before_reply() {
        let handlers = CommandHandlersBuilder::from_channel("orderService")
            .on_command(CommandHandlerDef::new(
                "Ping",
                |_cm: CommandMessage<Ping>, _vars| async move { Ok(Vec::new()) },
            ))
            .build()
            .unwrap();
        let (dispatcher, transport) = dispatcher(handlers);

        let err = dispatcher
            .handle_message(
                "orderService",
                inbound(&[
                    ("command_type", "Ping"),
                    ("message_id", "msg-1"),
                    ("command_reply_to", "replies"),
                ]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::MissingHeader { .. }));
        assert!(transport.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_empty_replies_send_nothing() {
        let handlers = CommandHandlersBuilder::from_channel("orderService")
            .on_command(CommandHandlerDef::new(
                "Ping",
                |_cm: CommandMessage<Ping>, _vars| async move { Ok(Vec::new()) },
            ))
            .build()
            .unwrap();
        let (dispatcher, transport) = dispatcher(handlers);

        dispatcher
            .handle_message(
                "orderService",
                inbound(&[
                    ("command_type", "Ping"),
                    ("message_id", "msg-1"),
                    ("security_token", "tok-1"),
                    ("command_reply_to", "replies"),
                ]),
            )
            .await
            .unwrap();

        assert!(transport.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_replies_without_destination_escalate() {
        let handlers = CommandHandlersBuilder::from_channel("orderService")
            .on_command(CommandHandlerDef::new(
                "Ping",
                |_cm: CommandMessage<Ping>, _vars| async move {
                    Ok(vec![MessageBuilder::with_payload("{}").build()])
                },
            ))
            .build()
            .unwrap();
        let (dispatcher, transport) = dispatcher(handlers);

        let err = dispatcher
            .handle_message(
                "orderService",
                inbound(&[
                    ("command_type", "Ping"),
                    ("message_id", "msg-1"),
                    ("security_token", "tok-1"),
                ]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::NoReplyDestination { .. }));
        assert!(transport.sent_messages().is_empty());
    }
}
