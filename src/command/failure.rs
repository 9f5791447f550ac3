//! Generic failure payload for unmapped handler errors.

use serde::{Deserialize, Serialize};

/// Payload of the generic failure reply
///
/// Sent when a command fails and no exception handler matches the error.
/// The schema is stable: `{"error": <kind>, "message": <text>}`, where
/// `error` is the failure kind tag and `message` is human-readable detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Failure {
    /// Failure kind tag
    pub error: String,
    /// Human-readable detail
    pub message: String,
}

impl Failure {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }

    /// Serialize to the wire payload
    pub fn to_payload(&self) -> String {
        serde_json::json!({
            "error": self.error,
            "message": self.message,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_schema_is_stable() {
        let failure = Failure::new("InsufficientStock", "only 2 units left");
        let payload = failure.to_payload();
        let parsed: Failure = serde_json::from_str(&payload).unwrap();
        assert_eq!(parsed, failure);
        assert_eq!(
            payload,
            r#"{"error":"InsufficientStock","message":"only 2 units left"}"#
        );
    }
}
