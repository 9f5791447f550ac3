//! # Exception Handlers
//!
//! Maps handler failures to reply messages. A [`HandlerError`] names its
//! failure kind plus a declared ancestry chain ordered most specific first;
//! lookup walks that chain and selects the first registered handler, so
//! precedence is deterministic and independent of registration order.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::messaging::Message;

/// Well-known failure kinds produced by the dispatch core itself
pub mod error_kinds {
    /// Payload could not be deserialized into the handler's command type
    pub const PAYLOAD_CONVERSION: &str = "PayloadConversion";
    /// Lock target could not be acquired within the configured window
    pub const LOCK_TIMEOUT: &str = "LockTimeout";
    /// Lock store failed outside the timeout path
    pub const LOCK_STORE: &str = "LockStore";
    /// Internal dispatch defect
    pub const INTERNAL: &str = "Internal";
}

/// A failure raised during command handling
///
/// The typed replacement for an exception-class hierarchy: `kind` is the
/// concrete failure tag, `ancestry` lists the broader failure families it
/// belongs to, ordered most specific first.
#[derive(Debug, Clone)]
pub struct HandlerError {
    kind: String,
    ancestry: Vec<String>,
    message: String,
    details: Option<Value>,
}

impl HandlerError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ancestry: Vec::new(),
            message: message.into(),
            details: None,
        }
    }

    /// Internal dispatch defect, never expected during normal operation
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(error_kinds::INTERNAL, message)
    }

    /// Declare the broader failure families this error belongs to,
    /// most specific first
    pub fn with_ancestry<I, S>(mut self, ancestry: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ancestry = ancestry.into_iter().map(Into::into).collect();
        self
    }

    /// Attach structured detail for exception handlers to inspect
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// The kind followed by the declared ancestry, most specific first
    pub fn kind_chain(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.kind.as_str()).chain(self.ancestry.iter().map(String::as_str))
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for HandlerError {}

/// Function mapping a failure to its reply messages
pub type ExceptionHandlerFn = dyn Fn(&HandlerError) -> Vec<Message> + Send + Sync;

/// Registered mapping from one failure kind to a reply producer
#[derive(Clone)]
pub struct ExceptionHandler {
    error_kind: String,
    invoker: Arc<ExceptionHandlerFn>,
}

impl ExceptionHandler {
    pub fn new(
        error_kind: impl Into<String>,
        invoker: impl Fn(&HandlerError) -> Vec<Message> + Send + Sync + 'static,
    ) -> Self {
        Self {
            error_kind: error_kind.into(),
            invoker: Arc::new(invoker),
        }
    }

    pub fn error_kind(&self) -> &str {
        &self.error_kind
    }

    /// Produce the replies for a failure
    pub fn invoke(&self, error: &HandlerError) -> Vec<Message> {
        (self.invoker)(error)
    }
}

impl fmt::Debug for ExceptionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionHandler")
            .field("error_kind", &self.error_kind)
            .finish()
    }
}
