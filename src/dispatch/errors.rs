//! # Dispatch Error Types
//!
//! Two tiers of failure. [`DispatchError`] covers configuration and protocol
//! defects that escalate out of the dispatcher with no reply sent.
//! [`InvocationError`] covers command-level failures that terminate in a
//! reply through the exception-handling path.

use thiserror::Error;

use crate::locking::{LockError, LockTarget};
use crate::messaging::MessagingError;
use crate::paths::PathError;
use crate::registry::{error_kinds, HandlerError};

/// Failures that escalate out of the dispatcher without a reply
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("no handler registered for command type {command_type}")]
    NoHandler { command_type: String },

    #[error("message {message_id} has replies but no reply destination")]
    NoReplyDestination { message_id: String },

    #[error("message is missing required header: {header}")]
    MissingHeader { header: String },

    #[error("resource header {path} does not satisfy pattern {pattern}: {source}")]
    Resource {
        pattern: String,
        path: String,
        source: PathError,
    },

    #[error("transport protocol violation: {message}")]
    Protocol { message: String },
}

impl From<MessagingError> for DispatchError {
    fn from(err: MessagingError) -> Self {
        match err {
            MessagingError::MissingHeader { header } => DispatchError::MissingHeader { header },
            other => DispatchError::Protocol {
                message: other.to_string(),
            },
        }
    }
}

/// Command-level failures routed to the exception-handling path
#[derive(Error, Debug)]
pub enum InvocationError {
    #[error("payload conversion failed: {source}")]
    PayloadConversion {
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl InvocationError {
    /// Collapse into the [`HandlerError`] form used for exception lookup
    pub fn into_handler_error(self) -> HandlerError {
        match self {
            InvocationError::Handler(error) => error,
            InvocationError::PayloadConversion { source } => {
                HandlerError::new(error_kinds::PAYLOAD_CONVERSION, source.to_string())
            }
            InvocationError::Lock(LockError::Timeout { target, timeout }) => HandlerError::new(
                error_kinds::LOCK_TIMEOUT,
                format!("lock acquisition for {target} timed out after {timeout:?}"),
            ),
            InvocationError::Lock(other) => {
                HandlerError::new(error_kinds::LOCK_STORE, other.to_string())
            }
        }
    }

    /// The lock target involved, when the failure came from the lock store
    pub fn lock_target(&self) -> Option<&LockTarget> {
        match self {
            InvocationError::Lock(LockError::Timeout { target, .. })
            | InvocationError::Lock(LockError::NotHeld { target })
            | InvocationError::Lock(LockError::Store { target, .. }) => Some(target),
            _ => None,
        }
    }
}
