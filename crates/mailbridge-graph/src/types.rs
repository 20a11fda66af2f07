//! Microsoft Graph wire types

use serde::{Deserialize, Serialize};

/// Response wrapper for Graph list endpoints
#[derive(Debug, Deserialize)]
pub struct GraphListResponse<T> {
    pub value: Vec<T>,
}

/// A message resource from Graph
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMessage {
    pub id: String,
    pub conversation_id: Option<String>,
    pub subject: Option<String>,
    pub from: Option<GraphRecipient>,
    pub received_date_time: Option<String>,
    pub is_read: Option<bool>,
    pub is_draft: Option<bool>,
    #[serde(default)]
    pub has_attachments: bool,
    pub body_preview: Option<String>,
    pub body: Option<GraphItemBody>,
    pub flag: Option<GraphFlag>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<GraphAttachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRecipient {
    pub email_address: GraphEmailAddress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEmailAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphItemBody {
    pub content_type: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphFlag {
    pub flag_status: Option<String>,
}

/// Attachment metadata (`$expand=attachments($select=name)`)
#[derive(Debug, Clone, Deserialize)]
pub struct GraphAttachment {
    pub name: Option<String>,
}

/// Body for `POST /me/sendMail`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMailRequest {
    pub message: OutgoingMessage,
    pub save_to_sent_items: bool,
}

/// Message fields for sendMail and draft creation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub subject: String,
    pub body: GraphItemBody,
    pub to_recipients: Vec<GraphRecipient>,
}

impl OutgoingMessage {
    /// Plain-text message to a single recipient
    pub fn text(to: &str, subject: &str, body: &str) -> Self {
        Self {
            subject: subject.to_string(),
            body: GraphItemBody {
                content_type: Some("Text".to_string()),
                content: Some(body.to_string()),
            },
            to_recipients: vec![GraphRecipient {
                email_address: GraphEmailAddress {
                    name: None,
                    address: Some(to.to_string()),
                },
            }],
        }
    }
}

/// Body for `POST /me/messages/{id}/reply`
#[derive(Debug, Serialize)]
pub struct ReplyRequest {
    pub comment: String,
}

/// Body for `POST /me/messages/{id}/move`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub destination_id: String,
}

/// Body for the categories PATCH used by label toggles
#[derive(Debug, Serialize)]
pub struct CategoriesPatch {
    pub categories: Vec<String>,
}
