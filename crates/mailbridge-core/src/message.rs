//! Normalized message record
//!
//! Provider clients parse their raw message objects into [`EmailMessage`]
//! so callers see one shape regardless of backend. Records are built once
//! and never mutated; nothing is persisted.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Email sender with optional display name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Display name (e.g. "Jane Doe")
    pub name: Option<String>,
    /// Address (e.g. "jane@example.com")
    pub address: String,
}

impl Sender {
    pub fn new(name: Option<String>, address: impl Into<String>) -> Self {
        Self {
            name,
            address: address.into(),
        }
    }

    /// Parse an RFC 5322 display form: `Jane Doe <jane@example.com>`,
    /// `<jane@example.com>`, or a bare address.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let (Some(open), Some(close)) = (raw.rfind('<'), raw.rfind('>')) {
            if open < close {
                let address = raw[open + 1..close].trim().to_string();
                let name = raw[..open].trim().trim_matches('"').trim();
                return Self {
                    name: (!name.is_empty()).then(|| name.to_string()),
                    address,
                };
            }
        }
        Self {
            name: None,
            address: raw.to_string(),
        }
    }

    /// Format as "Name <address>", falling back to the bare address, or
    /// "Unknown Sender" when nothing was parsed.
    pub fn display(&self) -> String {
        match (&self.name, self.address.is_empty()) {
            (Some(name), false) => format!("{} <{}>", name, self.address),
            (Some(name), true) => name.clone(),
            (None, false) => self.address.clone(),
            (None, true) => "Unknown Sender".to_string(),
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Provider-agnostic message record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Provider-assigned message identifier
    pub id: String,
    /// Conversation/thread identifier, when the provider exposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    /// Subject line, "No Subject" when the header is absent
    pub subject: String,
    pub sender: Sender,
    /// Plain-text body with inline attachment content stripped
    pub body: String,
    /// Attachment filenames in provider order
    pub attachments: Vec<String>,
    /// Label/category names attached to the message
    pub labels: BTreeSet<String>,
    /// Received timestamp as ISO-8601, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
}

impl EmailMessage {
    /// Default subject used when a message carries no subject header
    pub const NO_SUBJECT: &'static str = "No Subject";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_address() {
        let sender = Sender::parse("Jane Doe <jane@example.com>");
        assert_eq!(sender.name.as_deref(), Some("Jane Doe"));
        assert_eq!(sender.address, "jane@example.com");
        assert_eq!(sender.display(), "Jane Doe <jane@example.com>");
    }

    #[test]
    fn parses_quoted_name() {
        let sender = Sender::parse("\"Doe, Jane\" <jane@example.com>");
        assert_eq!(sender.name.as_deref(), Some("Doe, Jane"));
        assert_eq!(sender.address, "jane@example.com");
    }

    #[test]
    fn parses_bare_address() {
        let sender = Sender::parse("jane@example.com");
        assert_eq!(sender.name, None);
        assert_eq!(sender.address, "jane@example.com");
    }

    #[test]
    fn parses_bracketed_address_without_name() {
        let sender = Sender::parse("<jane@example.com>");
        assert_eq!(sender.name, None);
        assert_eq!(sender.address, "jane@example.com");
    }

    #[test]
    fn empty_sender_displays_placeholder() {
        assert_eq!(Sender::default().display(), "Unknown Sender");
    }
}
