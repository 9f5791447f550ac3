//! # Command Handler Registry
//!
//! Immutable routing table for a saga participant: command-type tag to
//! handler descriptor, plus error-kind to exception handler. Built once at
//! startup by [`CommandHandlersBuilder`] and shared read-only across every
//! concurrent dispatch task.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use saga_core::registry::{CommandHandlerDef, CommandHandlersBuilder};
//! use saga_core::{CommandMessage, MessageBuilder, PathVariables};
//! use serde::Deserialize;
//!
//! #[derive(Clone, Deserialize)]
//! struct CreateOrder {
//!     order_total: u64,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let handlers = CommandHandlersBuilder::from_channel("orderService")
//!     .on_command(CommandHandlerDef::new(
//!         "CreateOrder",
//!         |cm: CommandMessage<CreateOrder>, _vars: PathVariables| async move {
//!             Ok(vec![MessageBuilder::with_payload(r#"{"status":"CREATED"}"#).build()])
//!         },
//!     ))
//!     .on_exception("InsufficientStock", |error| {
//!         vec![MessageBuilder::with_payload(format!(
//!             r#"{{"rejected":"{}"}}"#,
//!             error.message()
//!         ))
//!         .build()]
//!     })
//!     .build()?;
//!
//! assert!(handlers.find_command_handler("CreateOrder").is_some());
//! # Ok(())
//! # }
//! ```

pub mod command_handler;
pub mod exception_handler;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::paths::{PathError, ResourcePathPattern};

pub use command_handler::{
    CommandHandler, CommandHandlerDef, DecodedCommand, ErasedCommandInvoker,
};
pub use exception_handler::{error_kinds, ExceptionHandler, HandlerError};

/// Errors detected when finalizing a registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("duplicate handler registered for command type {command_type}")]
    DuplicateCommandType { command_type: String },

    #[error("duplicate exception handler registered for error kind {error_kind}")]
    DuplicateErrorKind { error_kind: String },

    #[error("invalid resource pattern {pattern} for command type {command_type}: {source}")]
    InvalidResourcePattern {
        command_type: String,
        pattern: String,
        source: PathError,
    },
}

struct PendingHandler {
    command_type: String,
    resource: Option<String>,
    invoker: Arc<dyn ErasedCommandInvoker>,
    has_pre_lock: bool,
}

/// Accumulates handler definitions, finalized once into [`CommandHandlers`]
///
/// Duplicate registrations for the same command type or error kind are
/// rejected at [`build`](CommandHandlersBuilder::build) time rather than
/// silently shadowing an earlier entry.
pub struct CommandHandlersBuilder {
    channel: String,
    pending: Vec<PendingHandler>,
    exception_handlers: Vec<ExceptionHandler>,
}

impl CommandHandlersBuilder {
    /// Start a builder for handlers subscribed to one channel
    pub fn from_channel(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            pending: Vec::new(),
            exception_handlers: Vec::new(),
        }
    }

    /// Add a command handler definition
    pub fn on_command<C>(mut self, def: CommandHandlerDef<C>) -> Self
    where
        C: serde::de::DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let (command_type, resource, invoker, has_pre_lock) = def.into_parts();
        self.pending.push(PendingHandler {
            command_type,
            resource,
            invoker,
            has_pre_lock,
        });
        self
    }

    /// Map an error kind to a reply-producing exception handler
    pub fn on_exception(
        mut self,
        error_kind: impl Into<String>,
        invoker: impl Fn(&HandlerError) -> Vec<crate::messaging::Message> + Send + Sync + 'static,
    ) -> Self {
        self.exception_handlers
            .push(ExceptionHandler::new(error_kind, invoker));
        self
    }

    /// Finalize into an immutable registry
    pub fn build(self) -> Result<CommandHandlers, RegistryError> {
        let mut handlers: HashMap<String, Arc<CommandHandler>> = HashMap::new();
        for pending in self.pending {
            let resource = pending
                .resource
                .map(|pattern| {
                    ResourcePathPattern::parse(&pattern).map_err(|source| {
                        RegistryError::InvalidResourcePattern {
                            command_type: pending.command_type.clone(),
                            pattern,
                            source,
                        }
                    })
                })
                .transpose()?;

            let handler = CommandHandler::new(
                self.channel.clone(),
                pending.command_type.clone(),
                resource,
                pending.has_pre_lock,
                pending.invoker,
            );
            if handlers
                .insert(pending.command_type.clone(), Arc::new(handler))
                .is_some()
            {
                return Err(RegistryError::DuplicateCommandType {
                    command_type: pending.command_type,
                });
            }
        }

        let mut exception_handlers: HashMap<String, Arc<ExceptionHandler>> = HashMap::new();
        for handler in self.exception_handlers {
            let error_kind = handler.error_kind().to_string();
            if exception_handlers
                .insert(error_kind.clone(), Arc::new(handler))
                .is_some()
            {
                return Err(RegistryError::DuplicateErrorKind { error_kind });
            }
        }

        info!(
            channel = %self.channel,
            handler_count = handlers.len(),
            exception_handler_count = exception_handlers.len(),
            "command handler registry built"
        );

        Ok(CommandHandlers {
            handlers,
            exception_handlers,
        })
    }
}

/// Immutable set of registered handlers for a participant
///
/// Read-only after [`CommandHandlersBuilder::build`]; safe to share across
/// concurrent dispatch tasks without synchronization.
pub struct CommandHandlers {
    handlers: HashMap<String, Arc<CommandHandler>>,
    exception_handlers: HashMap<String, Arc<ExceptionHandler>>,
}

impl CommandHandlers {
    /// The distinct channels the registered handlers listen on
    pub fn channels(&self) -> BTreeSet<String> {
        self.handlers
            .values()
            .map(|handler| handler.channel().to_string())
            .collect()
    }

    /// Resolve the handler for a command type
    pub fn find_command_handler(&self, command_type: &str) -> Option<Arc<CommandHandler>> {
        self.handlers.get(command_type).cloned()
    }

    /// Resolve the most specific exception handler for a failure
    ///
    /// Walks the error's kind chain (exact kind first, then declared
    /// ancestors in order) and returns the first registered entry.
    pub fn find_exception_handler(&self, error: &HandlerError) -> Option<Arc<ExceptionHandler>> {
        error
            .kind_chain()
            .find_map(|kind| self.exception_handlers.get(kind).cloned())
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn exception_handler_count(&self) -> usize {
        self.exception_handlers.len()
    }
}
