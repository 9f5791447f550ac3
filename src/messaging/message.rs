//! # Message Structure
//!
//! The wire-level message exchanged with the saga orchestrator: a serialized
//! payload plus a string header map. The message id, command type, resource
//! path, reply destination, and security token all travel as headers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::errors::{MessagingError, MessagingResult};

/// Well-known transport-level header names
pub mod headers {
    /// Unique message id, assigned by the transport on send
    pub const ID: &str = "message_id";
    /// Security token propagated unchanged from command to reply
    pub const SECURITY_TOKEN: &str = "security_token";
    /// When the message was handed to the transport
    pub const DATE: &str = "message_date";
}

/// A transport message: opaque payload plus headers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Serialized payload (JSON for command and reply bodies)
    pub payload: String,
    /// Header map; keys are case-sensitive
    pub headers: HashMap<String, String>,
}

impl Message {
    /// Create a message from payload and headers
    pub fn new(payload: impl Into<String>, headers: HashMap<String, String>) -> Self {
        Self {
            payload: payload.into(),
            headers,
        }
    }

    /// The transport-assigned message id, if present
    pub fn id(&self) -> Option<&str> {
        self.header(headers::ID)
    }

    /// The message id, or an error when the transport never assigned one
    pub fn required_id(&self) -> MessagingResult<&str> {
        self.required_header(headers::ID)
    }

    /// Look up a header by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Look up a header that the protocol requires to be present
    pub fn required_header(&self, name: &str) -> MessagingResult<&str> {
        self.header(name)
            .ok_or_else(|| MessagingError::missing_header(name))
    }

    /// Set or replace a header
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Borrow the serialized payload
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// Builder for outbound messages
///
/// Reply payloads are typically JSON; [`MessageBuilder::with_json`] serializes
/// a typed value, [`MessageBuilder::with_payload`] accepts a pre-serialized
/// string. [`MessageBuilder::with_message`] starts from an existing message so
/// correlation headers can be layered onto a handler-produced reply.
#[derive(Debug, Default)]
pub struct MessageBuilder {
    payload: String,
    headers: HashMap<String, String>,
}

impl MessageBuilder {
    /// Start from a pre-serialized payload
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            headers: HashMap::new(),
        }
    }

    /// Start from a serializable value
    pub fn with_json<T: Serialize>(value: &T) -> MessagingResult<Self> {
        Ok(Self::with_payload(serde_json::to_string(value)?))
    }

    /// Start from an existing message, keeping its payload and headers
    pub fn with_message(message: Message) -> Self {
        Self {
            payload: message.payload,
            headers: message.headers,
        }
    }

    /// Set a single header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Merge a map of headers; existing keys are overwritten
    pub fn extra_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Finalize into an immutable message
    pub fn build(self) -> Message {
        Message {
            payload: self.payload,
            headers: self.headers,
        }
    }
}
