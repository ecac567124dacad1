//! Inbound agent requests.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form JSON object used for reply payloads and result fields.
pub type Payload = Map<String, Value>;

/// What the agent is telling the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageOperation {
    /// "I am alive and idle, tell me what to do."
    Poll,
    /// Outcome of a previously assigned task.
    Reply,
}

/// A request received from an agent.
///
/// Besides `operation` and `agent_id`, `reply` messages carry arbitrary
/// result fields (`stdout`, `stderr`, `exit_code`, ...) which land in
/// [`payload`](Self::payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub operation: MessageOperation,
    pub agent_id: String,
    #[serde(flatten)]
    pub payload: Payload,
}

impl InboundMessage {
    pub fn poll(agent_id: impl Into<String>) -> Self {
        Self {
            operation: MessageOperation::Poll,
            agent_id: agent_id.into(),
            payload: Payload::new(),
        }
    }

    pub fn reply(agent_id: impl Into<String>, payload: Payload) -> Self {
        Self {
            operation: MessageOperation::Reply,
            agent_id: agent_id.into(),
            payload,
        }
    }

    /// Builder helper for adding a single payload field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn is_poll(&self) -> bool {
        self.operation == MessageOperation::Poll
    }

    pub fn is_reply(&self) -> bool {
        self.operation == MessageOperation::Reply
    }

    /// String payload field, if present.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Integer payload field, if present.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.payload.get(key).and_then(Value::as_i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_reply_with_payload() {
        let msg: InboundMessage = serde_json::from_str(
            r#"{"operation": "reply", "agent_id": "alpha", "stdout": "ok", "status": 0}"#,
        )
        .unwrap();
        assert!(msg.is_reply());
        assert_eq!(msg.agent_id, "alpha");
        assert_eq!(msg.get_str("stdout"), Some("ok"));
        assert_eq!(msg.get_i64("status"), Some(0));
    }

    #[test]
    fn test_poll_has_empty_payload() {
        let value = serde_json::to_value(InboundMessage::poll("beta")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"operation": "poll", "agent_id": "beta"})
        );
    }

    #[test]
    fn test_unknown_operation_rejected() {
        let result: Result<InboundMessage, _> =
            serde_json::from_str(r#"{"operation": "dance", "agent_id": "alpha"}"#);
        assert!(result.is_err());
    }
}
