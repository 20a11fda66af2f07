//! Gmail REST wire types

use serde::{Deserialize, Serialize};

/// Response wrapper for `GET /messages`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMessagesResponse {
    pub messages: Option<Vec<MessageRef>>,
}

/// Bare message reference from a list query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
}

/// A full message resource (`format=full`)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailMessage {
    pub id: String,
    pub thread_id: Option<String>,
    #[serde(default)]
    pub label_ids: Vec<String>,
    pub payload: Option<MessagePayload>,
    /// Epoch milliseconds as a decimal string
    pub internal_date: Option<String>,
}

/// Message payload: headers plus either a flat body or multipart parts
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
    pub body: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    pub mime_type: Option<String>,
    /// Non-empty for attachment parts
    pub filename: Option<String>,
    pub body: Option<MessageBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    /// URL-safe base64 content
    pub data: Option<String>,
}

/// One entry of `GET /labels`
#[derive(Debug, Clone, Deserialize)]
pub struct GmailLabel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LabelsResponse {
    #[serde(default)]
    pub labels: Vec<GmailLabel>,
}

/// Body for `POST /messages/send`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Body for `POST /drafts`
#[derive(Debug, Serialize)]
pub struct DraftRequest {
    pub message: SendRequest,
}

/// Response of `POST /drafts`
#[derive(Debug, Deserialize)]
pub struct DraftResponse {
    pub id: String,
    pub message: Option<GmailMessage>,
}

/// Body for `POST /drafts/send`
#[derive(Debug, Serialize)]
pub struct SendDraftRequest {
    pub id: String,
}

/// Body for `POST /messages/{id}/modify`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_label_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_label_ids: Vec<String>,
}
