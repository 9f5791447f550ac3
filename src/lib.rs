#![allow(clippy::doc_markdown)] // Allow technical terms like JSON, saga in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Saga Core
//!
//! Command-dispatch core for distributed saga participants.
//!
//! ## Overview
//!
//! A saga participant receives command messages from a saga orchestrator,
//! executes one step of a distributed, compensatable transaction, and
//! replies with the outcome. This crate is the dispatch machinery between
//! the transport and the application's command handlers: routing by command
//! type, resource path variable extraction, per-resource lock coordination,
//! exception-to-reply mapping, and reply correlation.
//!
//! ## Architecture
//!
//! The dispatcher composes four collaborators. Handlers live in an immutable
//! registry built once at startup; the transport and the lock store sit
//! behind traits; correlation headers are derived per message:
//!
//! ```text
//! inbound message
//!   -> registry lookup (command type)
//!   -> path variable extraction (resource pattern)
//!   -> lock acquisition (pre-lock hook, lock store)
//!   -> handler invocation
//!   -> release decision (post-lock hook)
//!   -> replies + correlation headers + security token
//!   -> reply destination
//! ```
//!
//! ## Module Organization
//!
//! - [`messaging`] - Wire message model and the transport seams
//! - [`command`] - Command-side data model and header namespaces
//! - [`paths`] - Resource path patterns and variable extraction
//! - [`registry`] - Handler and exception-handler registration
//! - [`dispatch`] - The command dispatcher
//! - [`locking`] - Lock targets, release decisions, and the lock store seam
//! - [`config`] - Dispatcher configuration
//! - [`logging`] - Structured logging initialization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use saga_core::registry::{CommandHandlerDef, CommandHandlersBuilder};
//! use saga_core::{
//!     CommandDispatcher, CommandMessage, InMemoryLockStore, InMemoryTransport,
//!     MessageBuilder, PathVariables,
//! };
//! use serde::Deserialize;
//!
//! #[derive(Clone, Deserialize)]
//! struct CreateOrder {
//!     order_total: u64,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handlers = CommandHandlersBuilder::from_channel("orderService")
//!     .on_command(
//!         CommandHandlerDef::new(
//!             "CreateOrder",
//!             |cm: CommandMessage<CreateOrder>, _vars: PathVariables| async move {
//!                 Ok(vec![MessageBuilder::with_payload(r#"{"status":"CREATED"}"#).build()])
//!             },
//!         )
//!         .resource("/orders/{orderId}"),
//!     )
//!     .build()?;
//!
//! let transport = Arc::new(InMemoryTransport::new());
//! let dispatcher = Arc::new(CommandDispatcher::new(
//!     "order-participant",
//!     Arc::new(handlers),
//!     transport.clone(),
//!     Arc::new(InMemoryLockStore::new()),
//! ));
//! dispatcher.initialize(transport.as_ref()).await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod dispatch;
pub mod locking;
pub mod logging;
pub mod messaging;
pub mod paths;
pub mod registry;

pub use command::{CommandMessage, Failure};
pub use config::DispatcherConfig;
pub use dispatch::{CommandDispatcher, DispatchError, InvocationError};
pub use locking::{InMemoryLockStore, LockError, LockStore, LockTarget, ReleaseDecision};
pub use messaging::{
    InMemoryTransport, Message, MessageBuilder, MessageConsumer, MessageHandler, MessageProducer,
    MessagingError,
};
pub use paths::{PathVariables, ResourcePath, ResourcePathPattern};
pub use registry::{CommandHandlers, CommandHandlersBuilder, HandlerError, RegistryError};
