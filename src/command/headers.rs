//! # Command and Reply Header Namespaces
//!
//! Commands carry their routing metadata in `command_`-prefixed headers.
//! Replies echo every command-prefixed header back under the
//! `commandreply_` prefix, plus an in-reply-to header carrying the inbound
//! message id, so the orchestrator can correlate each reply to its request.

use std::collections::HashMap;

use crate::messaging::headers as message_headers;

/// Prefix shared by all command-scoped headers
pub const COMMAND_HEADER_PREFIX: &str = "command_";
/// Command-type tag used for handler routing
pub const COMMAND_TYPE: &str = "command_type";
/// Concrete resource path the command addresses
pub const RESOURCE: &str = "command_resource";
/// Channel the reply should be sent to
pub const REPLY_TO: &str = "command_reply_to";

/// Prefix for command headers echoed onto replies
pub const REPLY_HEADER_PREFIX: &str = "commandreply_";
/// Reply header carrying the id of the command message being answered
pub const IN_REPLY_TO: &str = "reply_to_message_id";

/// Re-namespace a command header key into the reply namespace
///
/// Keys without the command prefix are returned unchanged.
pub fn in_reply(command_header: &str) -> String {
    match command_header.strip_prefix(COMMAND_HEADER_PREFIX) {
        Some(rest) => format!("{REPLY_HEADER_PREFIX}{rest}"),
        None => command_header.to_string(),
    }
}

/// Derive the correlation headers for every reply to the given command
///
/// Each inbound `command_*` header is copied under the reply prefix with its
/// value unchanged, and [`IN_REPLY_TO`] is set to the inbound message id.
pub fn correlation_headers(
    inbound_headers: &HashMap<String, String>,
    message_id: &str,
) -> HashMap<String, String> {
    let mut correlated: HashMap<String, String> = inbound_headers
        .iter()
        .filter(|(key, _)| key.starts_with(COMMAND_HEADER_PREFIX))
        .map(|(key, value)| (in_reply(key), value.clone()))
        .collect();
    correlated.insert(IN_REPLY_TO.to_string(), message_id.to_string());
    correlated
}

/// Convenience for the security-token header name on the message level
pub const SECURITY_TOKEN: &str = message_headers::SECURITY_TOKEN;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_reply_swaps_prefix() {
        assert_eq!(in_reply("command_saga_id"), "commandreply_saga_id");
        assert_eq!(in_reply("command_type"), "commandreply_type");
    }

    #[test]
    fn test_in_reply_leaves_other_keys_alone() {
        assert_eq!(in_reply("message_id"), "message_id");
    }

    #[test]
    fn test_correlation_headers_copy_command_subset() {
        let inbound = HashMap::from([
            ("command_saga_id".to_string(), "saga-9".to_string()),
            ("command_type".to_string(), "CreateOrder".to_string()),
            ("message_id".to_string(), "msg-1".to_string()),
            ("unrelated".to_string(), "x".to_string()),
        ]);

        let correlated = correlation_headers(&inbound, "msg-1");

        assert_eq!(correlated.get("commandreply_saga_id").unwrap(), "saga-9");
        assert_eq!(correlated.get("commandreply_type").unwrap(), "CreateOrder");
        assert_eq!(correlated.get(IN_REPLY_TO).unwrap(), "msg-1");
        assert!(!correlated.contains_key("unrelated"));
        assert!(!correlated.contains_key("message_id"));
        assert_eq!(correlated.len(), 3);
    }
}
