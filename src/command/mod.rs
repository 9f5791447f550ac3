//! # Command Module
//!
//! The command-side data model: header namespaces shared with the
//! orchestrator, the typed [`CommandMessage`] handed to handlers, and the
//! generic [`Failure`] payload for unmapped errors.

pub mod failure;
pub mod headers;
pub mod message;

pub use failure::Failure;
pub use message::CommandMessage;
