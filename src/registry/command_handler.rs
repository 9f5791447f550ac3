//! # Command Handler Descriptors
//!
//! A handler is registered for one command type with a typed async function
//! plus optional resource pattern and lock hooks. Registration erases the
//! command type behind [`ErasedCommandInvoker`], so the dispatch table maps a
//! command-type tag to a descriptor with no runtime type inspection beyond
//! the descriptor's own decode step.

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::command::CommandMessage;
use crate::locking::{LockTarget, ReleaseDecision};
use crate::messaging::Message;
use crate::paths::{PathVariables, ResourcePathPattern};

use super::exception_handler::HandlerError;

/// Typed async handler function, boxed for storage in a descriptor
pub type CommandHandlerFn<C> = dyn Fn(CommandMessage<C>, PathVariables) -> BoxFuture<'static, Result<Vec<Message>, HandlerError>>
    + Send
    + Sync;

/// Pre-invocation hook naming the resource to lock
pub type PreLockFn<C> = dyn Fn(&C, &PathVariables) -> LockTarget + Send + Sync;

/// Post-invocation hook deciding what happens to the held lock
pub type PostLockFn<C> = dyn Fn(&C, &PathVariables, &[Message]) -> ReleaseDecision + Send + Sync;

/// A decoded command payload, type-erased between decode and invoke
pub struct DecodedCommand(Box<dyn Any + Send + Sync>);

impl DecodedCommand {
    fn downcast_ref<C: 'static>(&self) -> Option<&C> {
        self.0.downcast_ref()
    }
}

/// Type-erased face of a registered handler
///
/// `decode` and `invoke` are implemented by the same typed wrapper, so the
/// payload handed to `invoke`, `lock_target`, and `release_decision` is
/// always the type `decode` produced.
#[async_trait]
pub trait ErasedCommandInvoker: Send + Sync {
    /// Deserialize the raw payload into the declared command type
    fn decode(&self, payload: &str) -> Result<DecodedCommand, serde_json::Error>;

    /// Evaluate the pre-lock hook, if configured
    fn lock_target(&self, command: &DecodedCommand, path_vars: &PathVariables)
        -> Option<LockTarget>;

    /// Invoke the handler function
    async fn invoke(
        &self,
        command: &DecodedCommand,
        message_id: &str,
        correlation_headers: &HashMap<String, String>,
        message: &Message,
        path_vars: &PathVariables,
    ) -> Result<Vec<Message>, HandlerError>;

    /// Evaluate the post-lock hook against the handler's replies
    ///
    /// Returns [`ReleaseDecision::Release`] when no hook is configured.
    fn release_decision(
        &self,
        command: &DecodedCommand,
        path_vars: &PathVariables,
        replies: &[Message],
    ) -> ReleaseDecision;
}

struct TypedCommandInvoker<C> {
    handler: Arc<CommandHandlerFn<C>>,
    pre_lock: Option<Arc<PreLockFn<C>>>,
    post_lock: Option<Arc<PostLockFn<C>>>,
}

#[async_trait]
impl<C> ErasedCommandInvoker for TypedCommandInvoker<C>
where
    C: DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn decode(&self, payload: &str) -> Result<DecodedCommand, serde_json::Error> {
        let command: C = serde_json::from_str(payload)?;
        Ok(DecodedCommand(Box::new(command)))
    }

    fn lock_target(
        &self,
        command: &DecodedCommand,
        path_vars: &PathVariables,
    ) -> Option<LockTarget> {
        let pre_lock = self.pre_lock.as_ref()?;
        command
            .downcast_ref::<C>()
            .map(|command| pre_lock(command, path_vars))
    }

    async fn invoke(
        &self,
        command: &DecodedCommand,
        message_id: &str,
        correlation_headers: &HashMap<String, String>,
        message: &Message,
        path_vars: &PathVariables,
    ) -> Result<Vec<Message>, HandlerError> {
        let Some(command) = command.downcast_ref::<C>() else {
            return Err(HandlerError::internal("command payload type mismatch"));
        };
        let command_message = CommandMessage::new(
            message_id,
            command.clone(),
            correlation_headers.clone(),
            message.clone(),
        );
        (self.handler)(command_message, path_vars.clone()).await
    }

    fn release_decision(
        &self,
        command: &DecodedCommand,
        path_vars: &PathVariables,
        replies: &[Message],
    ) -> ReleaseDecision {
        match (&self.post_lock, command.downcast_ref::<C>()) {
            (Some(post_lock), Some(command)) => post_lock(command, path_vars, replies),
            _ => ReleaseDecision::Release,
        }
    }
}

/// Definition of one handler registration, accumulated by the builder
///
/// ```rust,no_run
/// use saga_core::registry::CommandHandlerDef;
/// use saga_core::{CommandMessage, LockTarget, MessageBuilder, PathVariables};
/// use serde::Deserialize;
///
/// #[derive(Clone, Deserialize)]
/// struct CreateOrder {
///     order_total: u64,
/// }
///
/// let def = CommandHandlerDef::new(
///     "CreateOrder",
///     |cm: CommandMessage<CreateOrder>, _vars: PathVariables| async move {
///         Ok(vec![MessageBuilder::with_payload(r#"{"status":"CREATED"}"#).build()])
///     },
/// )
/// .resource("/orders/{orderId}")
/// .pre_lock(|_cmd, vars| LockTarget::new("order", vars.get("orderId").unwrap_or("unknown")));
/// ```
pub struct CommandHandlerDef<C> {
    command_type: String,
    resource: Option<String>,
    handler: Arc<CommandHandlerFn<C>>,
    pre_lock: Option<Arc<PreLockFn<C>>>,
    post_lock: Option<Arc<PostLockFn<C>>>,
}

impl<C> CommandHandlerDef<C>
where
    C: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Register a typed async handler for a command type
    pub fn new<F, Fut>(command_type: impl Into<String>, handler: F) -> Self
    where
        F: Fn(CommandMessage<C>, PathVariables) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Message>, HandlerError>> + Send + 'static,
    {
        Self {
            command_type: command_type.into(),
            resource: None,
            handler: Arc::new(move |command_message, path_vars| {
                handler(command_message, path_vars).boxed()
            }),
            pre_lock: None,
            post_lock: None,
        }
    }

    /// Declare the resource path pattern this handler addresses
    pub fn resource(mut self, pattern: impl Into<String>) -> Self {
        self.resource = Some(pattern.into());
        self
    }

    /// Attach the pre-invocation hook naming the resource to lock
    pub fn pre_lock(
        mut self,
        hook: impl Fn(&C, &PathVariables) -> LockTarget + Send + Sync + 'static,
    ) -> Self {
        self.pre_lock = Some(Arc::new(hook));
        self
    }

    /// Attach the post-invocation hook deciding when the lock is released
    pub fn post_lock(
        mut self,
        hook: impl Fn(&C, &PathVariables, &[Message]) -> ReleaseDecision + Send + Sync + 'static,
    ) -> Self {
        self.post_lock = Some(Arc::new(hook));
        self
    }

    pub(super) fn into_parts(self) -> (String, Option<String>, Arc<dyn ErasedCommandInvoker>, bool) {
        let has_pre_lock = self.pre_lock.is_some();
        let invoker = Arc::new(TypedCommandInvoker {
            handler: self.handler,
            pre_lock: self.pre_lock,
            post_lock: self.post_lock,
        });
        (self.command_type, self.resource, invoker, has_pre_lock)
    }
}

/// A finalized handler registration
#[derive(Clone)]
pub struct CommandHandler {
    channel: String,
    command_type: String,
    resource: Option<ResourcePathPattern>,
    has_pre_lock: bool,
    invoker: Arc<dyn ErasedCommandInvoker>,
}

impl CommandHandler {
    pub(super) fn new(
        channel: String,
        command_type: String,
        resource: Option<ResourcePathPattern>,
        has_pre_lock: bool,
        invoker: Arc<dyn ErasedCommandInvoker>,
    ) -> Self {
        Self {
            channel,
            command_type,
            resource,
            has_pre_lock,
            invoker,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn command_type(&self) -> &str {
        &self.command_type
    }

    pub fn resource(&self) -> Option<&ResourcePathPattern> {
        self.resource.as_ref()
    }

    /// Whether this handler runs under a lock
    pub fn has_pre_lock(&self) -> bool {
        self.has_pre_lock
    }

    pub fn invoker(&self) -> &dyn ErasedCommandInvoker {
        self.invoker.as_ref()
    }
}

impl fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandler")
            .field("channel", &self.channel)
            .field("command_type", &self.command_type)
            .field("resource", &self.resource)
            .field("has_pre_lock", &self.has_pre_lock)
            .finish()
    }
}
