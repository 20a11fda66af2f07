//! Gmail message normalization
//!
//! Turns a raw Gmail message resource into the shared [`EmailMessage`]
//! record: header scan for subject/sender, URL-safe base64 body extraction
//! with a top-level fallback, attachment filename collection, and epoch
//! millisecond to ISO-8601 conversion.

use base64::alphabet::URL_SAFE;
use base64::engine::general_purpose::GeneralPurpose;
use base64::engine::{DecodePaddingMode, GeneralPurposeConfig};
use base64::Engine;
use chrono::{DateTime, SecondsFormat};
use mailbridge_core::{EmailMessage, Sender};

use crate::types::{GmailMessage, MessagePayload};

/// Gmail emits URL-safe base64 with and without padding
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Normalize a full Gmail message resource
pub fn parse_message(raw: GmailMessage) -> EmailMessage {
    let (subject, sender, body, attachments) = match &raw.payload {
        Some(payload) => (
            header_value(payload, "subject")
                .unwrap_or_else(|| EmailMessage::NO_SUBJECT.to_string()),
            header_value(payload, "from")
                .map(|from| Sender::parse(&from))
                .unwrap_or_default(),
            extract_body(payload),
            extract_attachments(payload),
        ),
        None => (
            EmailMessage::NO_SUBJECT.to_string(),
            Sender::default(),
            String::new(),
            Vec::new(),
        ),
    };

    EmailMessage {
        id: raw.id,
        thread_id: raw.thread_id,
        subject,
        sender,
        body,
        attachments,
        labels: raw.label_ids.into_iter().collect(),
        received: raw.internal_date.as_deref().and_then(internal_date_to_iso),
    }
}

/// Minimal record for mutation acknowledgements: the provider returned a
/// message resource with identifiers and labels but no content
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

fn header_value(payload: &MessagePayload, name: &str) -> Option<String> {
    payload
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
}

/// Extract the plain-text body: first `text/plain` part with data, falling
/// back to the top-level body
fn extract_body(payload: &MessagePayload) -> String {
    for part in &payload.parts {
        if part.mime_type.as_deref() == Some("text/plain") {
            if let Some(data) = part.body.as_ref().and_then(|b| b.data.as_deref()) {
                if let Some(text) = decode_body(data) {
                    return text;
                }
            }
        }
    }
    payload
        .body
        .as_ref()
        .and_then(|b| b.data.as_deref())
        .and_then(decode_body)
        .unwrap_or_default()
}

/// Attachment filenames: any part carrying a non-empty filename
fn extract_attachments(payload: &MessagePayload) -> Vec<String> {
    payload
        .parts
        .iter()
        .filter_map(|part| part.filename.as_deref())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn decode_body(data: &str) -> Option<String> {
    let bytes = URL_SAFE_LENIENT.decode(data).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Gmail `internalDate` (epoch milliseconds as a string) to ISO-8601 UTC
fn internal_date_to_iso(millis: &str) -> Option<String> {
    let millis: i64 = millis.parse().ok()?;
    let datetime = DateTime::from_timestamp_millis(millis)?;
    Some(datetime.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_message() -> GmailMessage {
        serde_json::from_value(serde_json::json!({
            "id": "m1",
            "threadId": "t1",
            "labelIds": ["INBOX", "UNREAD"],
            "internalDate": "1735689600000",
            "payload": {
                "headers": [
                    {"name": "Subject", "value": "Quarterly report"},
                    {"name": "From", "value": "Jane Doe <jane@example.com>"}
                ],
                "parts": [
                    {
                        "mimeType": "text/plain",
                        "filename": "",
                        // "Hello world\n" URL-safe base64, no padding
                        "body": {"data": "SGVsbG8gd29ybGQK"}
                    },
                    {
                        "mimeType": "application/pdf",
                        "filename": "report.pdf",
                        "body": {}
                    }
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn normalizes_full_multipart_message() {
        let message = parse_message(full_message());
        assert_eq!(message.id, "m1");
        assert_eq!(message.thread_id.as_deref(), Some("t1"));
        assert_eq!(message.subject, "Quarterly report");
        assert_eq!(message.sender.name.as_deref(), Some("Jane Doe"));
        assert_eq!(message.sender.address, "jane@example.com");
        assert_eq!(message.body, "Hello world\n");
        assert_eq!(message.attachments, vec!["report.pdf"]);
        assert!(message.labels.contains("UNREAD"));
        assert_eq!(message.received.as_deref(), Some("2025-01-01T00:00:00Z"));
    }

    #[test]
    fn falls_back_to_top_level_body() {
        let raw: GmailMessage = serde_json::from_value(serde_json::json!({
            "id": "m2",
            "threadId": "t2",
            "payload": {
                "headers": [],
                "body": {"data": "VG9wLWxldmVsIGJvZHk="}
            }
        }))
        .unwrap();
        let message = parse_message(raw);
        assert_eq!(message.body, "Top-level body");
        assert_eq!(message.subject, EmailMessage::NO_SUBJECT);
        assert_eq!(message.sender.display(), "Unknown Sender");
    }

    #[test]
    fn missing_payload_yields_empty_record() {
        let raw: GmailMessage =
            serde_json::from_value(serde_json::json!({"id": "m3"})).unwrap();
        let message = parse_message(raw);
        assert!(message.body.is_empty());
        assert!(message.attachments.is_empty());
        assert!(message.received.is_none());
    }

    #[test]
    fn padded_and_unpadded_base64_both_decode() {
        assert_eq!(decode_body("aGk=").as_deref(), Some("hi"));
        assert_eq!(decode_body("aGk").as_deref(), Some("hi"));
    }

    #[test]
    fn undecodable_internal_date_is_dropped() {
        assert!(internal_date_to_iso("not-a-number").is_none());
        assert_eq!(
            internal_date_to_iso("0").as_deref(),
            Some("1970-01-01T00:00:00Z")
        );
    }
}
