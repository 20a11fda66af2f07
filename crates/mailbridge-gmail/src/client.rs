//! Gmail REST transport and operation set

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use mailbridge_auth::TokenStore;
use mailbridge_core::{
    after_date, plan_label_change, EmailProvider, Envelope, LabelAction, LabelChange,
    LabelPlanError, Payload, SearchFilters,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{GmailError, GmailResult};
use crate::normalize::{ack_message, parse_message};
use crate::query::{plan_search, GmailQuery};
use crate::types::{
    DraftRequest, DraftResponse, GmailLabel, GmailMessage, LabelsResponse, ListMessagesResponse,
    ModifyRequest, SendDraftRequest, SendRequest,
};

const GMAIL_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Gmail provider client
///
/// Construction requires an opened [`TokenStore`]; a missing token file has
/// already failed there, so every value of this type can reach the API.
pub struct GmailClient {
    http: reqwest::Client,
    tokens: TokenStore,
}

impl GmailClient {
    pub fn new(tokens: TokenStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            tokens,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> GmailResult<T> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&token)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> GmailResult<T> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn delete(&self, url: &str) -> GmailResult<()> {
        let token = self.tokens.access_token().await?;
        let response = self.http.delete(url).bearer_auth(&token).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GmailError::ApiError { status, body });
        }
        Ok(())
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> GmailResult<T> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GmailError::ApiError { status, body });
        }
        response
            .json()
            .await
            .map_err(|e| GmailError::ParseError(e.to_string()))
    }

    /// Build the base64url-encoded RFC 2822 text Gmail's send/draft
    /// endpoints expect
    fn prep_raw(to: &str, subject: &str, body: &str, in_reply_to: Option<&str>) -> String {
        let mut message = String::new();
        message.push_str(&format!("To: {to}\r\n"));
        message.push_str(&format!("Subject: {subject}\r\n"));
        if let Some(original) = in_reply_to {
            message.push_str(&format!("In-Reply-To: {original}\r\n"));
            message.push_str(&format!("References: {original}\r\n"));
        }
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        message.push_str("\r\n");
        message.push_str(body);
        URL_SAFE.encode(message.as_bytes())
    }

    /// Fetch one message as the normalized record
    async fn fetch_message(&self, msg_id: &str) -> GmailResult<mailbridge_core::EmailMessage> {
        let url = format!("{GMAIL_BASE}/messages/{msg_id}");
        let raw: GmailMessage = self
            .get_json(&url, &[("format", "full".to_string())])
            .await?;
        Ok(parse_message(raw))
    }

    /// Run a list query and enrich every hit into a normalized record
    async fn fetch_matching(
        &self,
        q: &str,
        max_results: u32,
    ) -> GmailResult<Vec<mailbridge_core::EmailMessage>> {
        debug!("Gmail: listing messages q={:?} max={}", q, max_results);
        let url = format!("{GMAIL_BASE}/messages");
        let list: ListMessagesResponse = self
            .get_json(
                &url,
                &[
                    ("q", q.to_string()),
                    ("maxResults", max_results.to_string()),
                ],
            )
            .await?;

        let mut messages = Vec::new();
        for reference in list.messages.unwrap_or_default() {
            messages.push(self.fetch_message(&reference.id).await?);
        }
        debug!("Gmail: {} messages matched", messages.len());
        Ok(messages)
    }

    async fn list_labels(&self) -> GmailResult<Vec<GmailLabel>> {
        let url = format!("{GMAIL_BASE}/labels");
        let response: LabelsResponse = self.get_json(&url, &[]).await?;
        Ok(response.labels)
    }

    async fn modify_labels(
        &self,
        msg_id: &str,
        add: Vec<String>,
        remove: Vec<String>,
    ) -> GmailResult<GmailMessage> {
        let url = format!("{GMAIL_BASE}/messages/{msg_id}/modify");
        self.post_json(
            &url,
            &ModifyRequest {
                add_label_ids: add,
                remove_label_ids: remove,
            },
        )
        .await
    }

    async fn try_send(&self, to: &str, subject: &str, body: &str) -> GmailResult<Envelope> {
        let raw = Self::prep_raw(to, subject, body, None);
        let url = format!("{GMAIL_BASE}/messages/send");
        let sent: GmailMessage = self
            .post_json(
                &url,
                &SendRequest {
                    raw,
                    thread_id: None,
                },
            )
            .await?;
        info!("Gmail: sent message {}", sent.id);
        Ok(Envelope::succeeded(
            "Email has been sent successfully",
            Payload::Message(Box::new(ack_message(sent.id, sent.thread_id, sent.label_ids))),
        ))
    }

    async fn try_draft(&self, to: &str, subject: &str, body: &str) -> GmailResult<Envelope> {
        let raw = Self::prep_raw(to, subject, body, None);
        let url = format!("{GMAIL_BASE}/drafts");
        let draft: DraftResponse = self
            .post_json(
                &url,
                &DraftRequest {
                    message: SendRequest {
                        raw,
                        thread_id: None,
                    },
                },
            )
            .await?;
        info!("Gmail: created draft {}", draft.id);
        let (thread_id, labels) = match draft.message {
            Some(message) => (message.thread_id, message.label_ids),
            None => (None, Vec::new()),
        };
        Ok(Envelope::succeeded(
            "Email draft has been created successfully",
            Payload::Message(Box::new(ack_message(draft.id, thread_id, labels))),
        ))
    }

    async fn try_send_draft(&self, draft_id: &str) -> GmailResult<Envelope> {
        let url = format!("{GMAIL_BASE}/drafts/send");
        let sent: GmailMessage = self
            .post_json(
                &url,
                &SendDraftRequest {
                    id: draft_id.to_string(),
                },
            )
            .await?;
        info!("Gmail: sent draft as message {}", sent.id);
        Ok(Envelope::succeeded(
            "Email draft has been sent successfully",
            Payload::Message(Box::new(ack_message(sent.id, sent.thread_id, sent.label_ids))),
        ))
    }

    async fn try_search(&self, filters: &SearchFilters) -> GmailResult<Envelope> {
        match plan_search(filters)? {
            GmailQuery::Single { msg_id } => {
                let message = self.fetch_message(&msg_id).await?;
                Ok(Envelope::succeeded(
                    "Email has been searched successfully",
                    Payload::Message(Box::new(message)),
                ))
            }
            GmailQuery::List { q, max_results } => {
                let messages = self.fetch_matching(&q, max_results).await?;
                Ok(Envelope::succeeded(
                    "Emails have been searched successfully",
                    Payload::Messages(messages),
                ))
            }
        }
    }

    async fn try_read(&self, max_results: u32, days_back: i64) -> GmailResult<Envelope> {
        let filters = SearchFilters {
            after: Some(after_date(days_back)),
            max_results,
            ..Default::default()
        };
        let GmailQuery::List { q, max_results } = plan_search(&filters)? else {
            unreachable!("read filters never carry a message id");
        };
        let messages = self.fetch_matching(&q, max_results).await?;
        Ok(Envelope::succeeded(
            "Emails have been read successfully",
            Payload::Messages(messages),
        ))
    }

    async fn try_reply(&self, msg_id: &str, body: &str) -> GmailResult<Envelope> {
        // the lookup's own failure aborts the reply
        let original = self.fetch_message(msg_id).await?;

        let subject = if original.subject.to_ascii_lowercase().starts_with("re:") {
            original.subject.clone()
        } else {
            format!("Re: {}", original.subject)
        };
        let to = if original.sender.address.is_empty() {
            original.sender.display()
        } else {
            original.sender.address.clone()
        };

        let raw = Self::prep_raw(&to, &subject, body, Some(msg_id));
        let url = format!("{GMAIL_BASE}/messages/send");
        let sent: GmailMessage = self
            .post_json(
                &url,
                &SendRequest {
                    raw,
                    thread_id: original.thread_id,
                },
            )
            .await?;
        info!("Gmail: replied to {} with {}", msg_id, sent.id);
        Ok(Envelope::succeeded(
            "Replied to email successfully",
            Payload::Message(Box::new(ack_message(sent.id, sent.thread_id, sent.label_ids))),
        ))
    }

    async fn try_delete(&self, msg_id: &str) -> GmailResult<Envelope> {
        let url = format!("{GMAIL_BASE}/messages/{msg_id}");
        self.delete(&url).await?;
        info!("Gmail: deleted message {}", msg_id);
        Ok(Envelope::succeeded_empty("Email has been deleted successfully"))
    }

    async fn try_archive(&self, msg_id: &str) -> GmailResult<Envelope> {
        let modified = self
            .modify_labels(msg_id, Vec::new(), vec!["INBOX".to_string()])
            .await?;
        info!("Gmail: archived message {}", msg_id);
        Ok(Envelope::succeeded(
            "Email has been archived successfully",
            Payload::Message(Box::new(ack_message(
                modified.id,
                modified.thread_id,
                modified.label_ids,
            ))),
        ))
    }

    async fn try_toggle(
        &self,
        msg_id: &str,
        label: &str,
        action: LabelAction,
    ) -> GmailResult<Envelope> {
        let labels = self.list_labels().await?;
        let label_id = labels
            .iter()
            .find(|l| l.name.eq_ignore_ascii_case(label))
            .map(|l| l.id.clone());

        let Some(label_id) = label_id else {
            let mut names: Vec<String> =
                labels.iter().map(|l| l.name.to_lowercase()).collect();
            names.sort();
            return Err(GmailError::Operation(format!(
                "Label '{label}' not found. Available labels: {}",
                names.join(",")
            )));
        };

        let url = format!("{GMAIL_BASE}/messages/{msg_id}");
        let current: GmailMessage = self
            .get_json(&url, &[("format", "minimal".to_string())])
            .await?;
        let current_labels = current.label_ids.into_iter().collect();

        let change = plan_label_change(&current_labels, &label_id, action).map_err(|err| {
            GmailError::Operation(match err {
                LabelPlanError::AlreadyPresent(_) => {
                    format!("Label '{label}' already present on message {msg_id}")
                }
                LabelPlanError::NotPresent(_) => {
                    format!("Label '{label}' not present on message {msg_id}")
                }
            })
        })?;

        let (modified, message) = match change {
            LabelChange::Add(id) => (
                self.modify_labels(msg_id, vec![id], Vec::new()).await?,
                format!("Added label '{label}' to message {msg_id}"),
            ),
            LabelChange::Remove(id) => (
                self.modify_labels(msg_id, Vec::new(), vec![id]).await?,
                format!("Removed label '{label}' from message {msg_id}"),
            ),
        };
        Ok(Envelope::succeeded(
            message,
            Payload::Message(Box::new(ack_message(
                modified.id,
                modified.thread_id,
                modified.label_ids,
            ))),
        ))
    }
}

#[async_trait]
impl EmailProvider for GmailClient {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Envelope {
        self.try_send(to, subject, body)
            .await
            .unwrap_or_else(|e| Envelope::failed(e))
    }

    async fn draft_email(&self, to: &str, subject: &str, body: &str) -> Envelope {
        self.try_draft(to, subject, body)
            .await
            .unwrap_or_else(|e| Envelope::failed(e))
    }

    async fn send_draft(&self, draft_id: &str) -> Envelope {
        self.try_send_draft(draft_id)
            .await
            .unwrap_or_else(|e| Envelope::failed(e))
    }

    async fn search_emails(&self, filters: &SearchFilters) -> Envelope {
        self.try_search(filters)
            .await
            .unwrap_or_else(|e| Envelope::failed(e))
    }

    async fn read_emails(&self, max_results: u32, days_back: i64) -> Envelope {
        self.try_read(max_results, days_back)
            .await
            .unwrap_or_else(|e| Envelope::failed(e))
    }

    async fn reply_to_email(&self, msg_id: &str, body: &str) -> Envelope {
        self.try_reply(msg_id, body)
            .await
            .unwrap_or_else(|e| Envelope::failed(e))
    }

    async fn delete_email(&self, msg_id: &str) -> Envelope {
        self.try_delete(msg_id)
            .await
            .unwrap_or_else(|e| Envelope::failed(e))
    }

    async fn archive_email(&self, msg_id: &str) -> Envelope {
        self.try_archive(msg_id)
            .await
            .unwrap_or_else(|e| Envelope::failed(e))
    }

    async fn toggle_label(&self, msg_id: &str, label: &str, action: LabelAction) -> Envelope {
        self.try_toggle(msg_id, label, action)
            .await
            .unwrap_or_else(|e| Envelope::failed(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_raw(raw: &str) -> String {
        let bytes = URL_SAFE.decode(raw).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn raw_message_carries_headers_and_body() {
        let raw = GmailClient::prep_raw("a@b.com", "Hi there", "Body text", None);
        let decoded = decode_raw(&raw);
        assert!(decoded.starts_with("To: a@b.com\r\n"));
        assert!(decoded.contains("Subject: Hi there\r\n"));
        assert!(!decoded.contains("In-Reply-To"));
        assert!(decoded.ends_with("\r\n\r\nBody text"));
    }

    #[test]
    fn reply_raw_links_the_original_message() {
        let raw = GmailClient::prep_raw("a@b.com", "Re: Hi", "Sure", Some("orig-123"));
        let decoded = decode_raw(&raw);
        assert!(decoded.contains("In-Reply-To: orig-123\r\n"));
        assert!(decoded.contains("References: orig-123\r\n"));
    }
}
