//! # Messaging Error Types
//!
//! Structured error handling for the transport seam using thiserror
//! instead of `Box<dyn Error>` patterns.

use thiserror::Error;

/// Errors raised at the messaging seam
#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("message is missing required header: {header}")]
    MissingHeader { header: String },

    #[error("message payload serialization error: {message}")]
    PayloadSerialization { message: String },

    #[error("transport send to {destination} failed: {message}")]
    Send {
        destination: String,
        message: String,
    },

    #[error("subscription failed for {subscriber_id}: {message}")]
    Subscription {
        subscriber_id: String,
        message: String,
    },
}

impl MessagingError {
    /// Create a missing header error
    pub fn missing_header(header: impl Into<String>) -> Self {
        Self::MissingHeader {
            header: header.into(),
        }
    }

    /// Create a payload serialization error
    pub fn payload_serialization(message: impl Into<String>) -> Self {
        Self::PayloadSerialization {
            message: message.into(),
        }
    }

    /// Create a transport send error
    pub fn send(destination: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Send {
            destination: destination.into(),
            message: message.into(),
        }
    }

    /// Create a subscription error
    pub fn subscription(subscriber_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Subscription {
            subscriber_id: subscriber_id.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        MessagingError::payload_serialization(err.to_string())
    }
}

/// Result type alias for messaging operations
pub type MessagingResult<T> = Result<T, MessagingError>;
