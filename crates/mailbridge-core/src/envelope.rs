//! The uniform operation result envelope
//!
//! Every provider operation resolves to an [`Envelope`]: a status, a
//! human-readable message, and an optional payload. Failures are carried in
//! the envelope itself; no provider error type crosses this boundary.

use serde::{Deserialize, Serialize};

use crate::message::EmailMessage;

/// Outcome of a provider operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Succeeded,
    Failed,
}

/// Payload carried by a successful envelope
///
/// The variant is fixed by the operation that was invoked: single-item
/// operations carry [`Payload::Message`], list operations carry
/// [`Payload::Messages`]. Callers never have to inspect the data to know
/// which shape they received.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// A single normalized message
    Message(Box<EmailMessage>),
    /// An ordered sequence of normalized messages
    Messages(Vec<EmailMessage>),
}

/// Uniform three-field result of every operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "operation_status")]
    pub status: OperationStatus,
    #[serde(rename = "operation_message")]
    pub message: String,
    #[serde(rename = "result", skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
}

impl Envelope {
    /// Successful envelope carrying a payload
    pub fn succeeded(message: impl Into<String>, payload: Payload) -> Self {
        Self {
            status: OperationStatus::Succeeded,
            message: message.into(),
            payload: Some(payload),
        }
    }

    /// Successful envelope with no payload (e.g. delete, providers that
    /// acknowledge without returning a resource)
    pub fn succeeded_empty(message: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Succeeded,
            message: message.into(),
            payload: None,
        }
    }

    /// Failed envelope; the payload is always absent
    pub fn failed(message: impl std::fmt::Display) -> Self {
        Self {
            status: OperationStatus::Failed,
            message: message.to_string(),
            payload: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OperationStatus::Succeeded
    }

    /// Consume the envelope and return its single message, if that is what
    /// it carries
    pub fn into_message(self) -> Option<EmailMessage> {
        match self.payload {
            Some(Payload::Message(msg)) => Some(*msg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Sender;

    fn sample_message() -> EmailMessage {
        EmailMessage {
            id: "m1".into(),
            thread_id: Some("t1".into()),
            subject: "Hello".into(),
            sender: Sender::parse("Jane Doe <jane@example.com>"),
            body: "body".into(),
            attachments: vec!["a.pdf".into()],
            labels: ["INBOX".to_string()].into_iter().collect(),
            received: Some("2025-03-01T09:00:00Z".into()),
        }
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&OperationStatus::Succeeded).unwrap();
        assert_eq!(json, "\"succeeded\"");
        let json = serde_json::to_string(&OperationStatus::Failed).unwrap();
        assert_eq!(json, "\"failed\"");
    }

    #[test]
    fn failed_envelope_has_no_payload_field() {
        let envelope = Envelope::failed("boom");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["operation_status"], "failed");
        assert_eq!(value["operation_message"], "boom");
        assert!(value.get("result").is_none());
    }

    #[test]
    fn single_and_list_payloads_serialize_distinctly() {
        let single = Envelope::succeeded("ok", Payload::Message(Box::new(sample_message())));
        let value = serde_json::to_value(&single).unwrap();
        assert!(value["result"].is_object());

        let list = Envelope::succeeded("ok", Payload::Messages(vec![sample_message()]));
        let value = serde_json::to_value(&list).unwrap();
        assert!(value["result"].is_array());
    }

    #[test]
    fn into_message_unwraps_single_payload_only() {
        let single = Envelope::succeeded("ok", Payload::Message(Box::new(sample_message())));
        assert_eq!(single.into_message().unwrap().id, "m1");

        let list = Envelope::succeeded("ok", Payload::Messages(vec![sample_message()]));
        assert!(list.into_message().is_none());
    }
}
