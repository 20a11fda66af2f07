//! Graph message normalization
//!
//! Graph has no flat label set, so the normalized record synthesizes one:
//! the message's categories plus Gmail-style markers derived from the
//! read/draft/flag state. Body content is taken as plain text (list and
//! single fetches ask Graph for text bodies), with the preview as fallback.

use std::collections::BTreeSet;

use mailbridge_core::{EmailMessage, Sender};

use crate::types::GraphMessage;

/// Normalize a Graph message resource
pub fn parse_message(raw: GraphMessage) -> EmailMessage {
    let sender = raw
        .from
        .map(|r| Sender::new(r.email_address.name, r.email_address.address.unwrap_or_default()))
        .unwrap_or_default();

    let body = match raw.body {
        Some(body)
            if body
                .content_type
                .as_deref()
                .map(|t| t.eq_ignore_ascii_case("text"))
                .unwrap_or(true) =>
        {
            body.content.unwrap_or_default()
        }
        _ => raw.body_preview.unwrap_or_default(),
    };

    let attachments = raw
        .attachments
        .into_iter()
        .filter_map(|a| a.name)
        .collect();

    let mut labels: BTreeSet<String> = raw.categories.into_iter().collect();
    if raw.is_read == Some(false) {
        labels.insert("UNREAD".to_string());
    }
    if raw.is_draft == Some(true) {
        labels.insert("DRAFT".to_string());
    }
    if raw
        .flag
        .and_then(|f| f.flag_status)
        .as_deref()
        .map(|s| s.eq_ignore_ascii_case("flagged"))
        .unwrap_or(false)
    {
        labels.insert("STARRED".to_string());
    }

    EmailMessage {
        id: raw.id,
        thread_id: raw.conversation_id,
        subject: raw
            .subject
            .unwrap_or_else(|| EmailMessage::NO_SUBJECT.to_string()),
        sender,
        body,
        attachments,
        labels,
        received: raw.received_date_time,
    }
}

/// Minimal record for mutation acknowledgements
pub fn ack_message(
    id: String,
    thread_id: Option<String>,
    labels: impl IntoIterator<Item = String>,
) -> EmailMessage {
    EmailMessage {
        id,
        thread_id,
        subject: String::new(),
        sender: Sender::default(),
        body: String::new(),
        attachments: Vec::new(),
        labels: labels.into_iter().collect(),
        received: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GraphMessage {
        serde_json::from_value(serde_json::json!({
            "id": "AAMk-1",
            "conversationId": "conv-1",
            "subject": "Planning",
            "from": {"emailAddress": {"name": "Jane Doe", "address": "jane@example.com"}},
            "receivedDateTime": "2025-03-01T09:30:00Z",
            "isRead": false,
            "isDraft": false,
            "hasAttachments": true,
            "bodyPreview": "short preview",
            "body": {"contentType": "text", "content": "Full plain body"},
            "flag": {"flagStatus": "flagged"},
            "categories": ["ProjectX"],
            "attachments": [{"name": "agenda.docx"}, {"name": null}]
        }))
        .unwrap()
    }

    #[test]
    fn normalizes_graph_message() {
        let message = parse_message(sample());
        assert_eq!(message.id, "AAMk-1");
        assert_eq!(message.thread_id.as_deref(), Some("conv-1"));
        assert_eq!(message.subject, "Planning");
        assert_eq!(message.sender.name.as_deref(), Some("Jane Doe"));
        assert_eq!(message.sender.address, "jane@example.com");
        assert_eq!(message.body, "Full plain body");
        assert_eq!(message.attachments, vec!["agenda.docx"]);
        assert_eq!(message.received.as_deref(), Some("2025-03-01T09:30:00Z"));
    }

    #[test]
    fn synthesizes_gmail_style_labels() {
        let labels = parse_message(sample()).labels;
        assert!(labels.contains("ProjectX"));
        assert!(labels.contains("UNREAD"));
        assert!(labels.contains("STARRED"));
        assert!(!labels.contains("DRAFT"));
    }

    #[test]
    fn html_body_falls_back_to_preview() {
        let mut raw = sample();
        raw.body = Some(crate::types::GraphItemBody {
            content_type: Some("html".to_string()),
            content: Some("<p>hi</p>".to_string()),
        });
        let message = parse_message(raw);
        assert_eq!(message.body, "short preview");
    }

    #[test]
    fn missing_fields_use_defaults() {
        let raw: GraphMessage =
            serde_json::from_value(serde_json::json!({"id": "AAMk-2"})).unwrap();
        let message = parse_message(raw);
        assert_eq!(message.subject, EmailMessage::NO_SUBJECT);
        assert_eq!(message.sender.display(), "Unknown Sender");
        assert!(message.body.is_empty());
        assert!(message.labels.is_empty());
    }
}
