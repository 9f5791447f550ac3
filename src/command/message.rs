//! Typed per-delivery view of an inbound command.

use std::collections::HashMap;

use crate::messaging::Message;

/// The typed command a handler receives
///
/// Created once per delivery and never mutated: the transport message id, the
/// deserialized command payload, the correlation headers every reply must
/// carry, and the raw envelope for access to transport headers such as the
/// security token.
#[derive(Debug, Clone)]
pub struct CommandMessage<C> {
    /// Transport-assigned id of the inbound message
    pub message_id: String,
    /// Deserialized command payload
    pub command: C,
    /// Correlation headers derived from the inbound command headers
    pub correlation_headers: HashMap<String, String>,
    /// The raw inbound envelope
    pub message: Message,
}

impl<C> CommandMessage<C> {
    pub fn new(
        message_id: impl Into<String>,
        command: C,
        correlation_headers: HashMap<String, String>,
        message: Message,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            command,
            correlation_headers,
            message,
        }
    }
}
