//! Graph transport and operation set

use async_trait::async_trait;
use mailbridge_auth::TokenStore;
use mailbridge_core::{
    after_date, plan_label_change, EmailProvider, Envelope, LabelAction, LabelChange,
    LabelPlanError, Payload, SearchFilters,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{GraphError, GraphResult};
use crate::normalize::{ack_message, parse_message};
use crate::query::{plan_search, GraphQuery};
use crate::types::{
    CategoriesPatch, GraphListResponse, GraphMessage, MoveRequest, OutgoingMessage, ReplyRequest,
    SendMailRequest,
};

const GRAPH_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Message fields selected on fetches (keeps payloads small)
const MESSAGE_SELECT: &str =
    "id,conversationId,subject,from,receivedDateTime,isRead,isDraft,hasAttachments,bodyPreview,body,flag,categories";

/// Attachment metadata expansion; only filenames are needed
const ATTACHMENT_EXPAND: &str = "attachments($select=name)";

/// Outlook provider client over Microsoft Graph
pub struct OutlookClient {
    http: reqwest::Client,
    tokens: TokenStore,
}

impl OutlookClient {
    pub fn new(tokens: TokenStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            tokens,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> GraphResult<T> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&token)
            .header("Prefer", "outlook.body-content-type=\"text\"")
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> GraphResult<T> {
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

    /// POST for endpoints that acknowledge without a resource (sendMail,
    /// send draft, reply)
    async fn post_no_content<B: Serialize>(&self, url: &str, body: Option<&B>) -> GraphResult<()> {
        let token = self.tokens.access_token().await?;
        let mut request = self.http.post(url).bearer_auth(&token);
        if let Some(body) = body {
            request = request.json(body);
        } else {
            request = request.header(reqwest::header::CONTENT_LENGTH, 0);
        }
        let response = request.send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn patch_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> GraphResult<T> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .patch(url)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn delete(&self, url: &str) -> GraphResult<()> {
        let token = self.tokens.access_token().await?;
        let response = self.http.delete(url).bearer_auth(&token).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn check_status(response: reqwest::Response) -> GraphResult<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::ApiError { status, body });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> GraphResult<T> {
        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| GraphError::ParseError(e.to_string()))
    }

    /// Fetch one message as the normalized record
    async fn fetch_message(&self, msg_id: &str) -> GraphResult<mailbridge_core::EmailMessage> {
        let url = format!(
            "{GRAPH_BASE}/me/messages/{msg_id}?$select={MESSAGE_SELECT}&$expand={ATTACHMENT_EXPAND}"
        );
        let raw: GraphMessage = self.get_json(&url).await?;
        Ok(parse_message(raw))
    }

    /// Run a planned list query
    async fn fetch_matching(
        &self,
        query: &GraphQuery,
    ) -> GraphResult<Vec<mailbridge_core::EmailMessage>> {
        let GraphQuery::List { path, .. } = query else {
            return Err(GraphError::Operation(
                "single-message directive passed to list transport".into(),
            ));
        };
        let url = format!(
            "{GRAPH_BASE}{path}?{}&$select={MESSAGE_SELECT}&$expand={ATTACHMENT_EXPAND}",
            query.encoded_query()
        );
        debug!("Graph: listing messages via {}", path);
        let list: GraphListResponse<GraphMessage> = self.get_json(&url).await?;
        debug!("Graph: {} messages matched", list.value.len());
        Ok(list.value.into_iter().map(parse_message).collect())
    }

    async fn try_send(&self, to: &str, subject: &str, body: &str) -> GraphResult<Envelope> {
        let url = format!("{GRAPH_BASE}/me/sendMail");
        self.post_no_content(
            &url,
            Some(&SendMailRequest {
                message: OutgoingMessage::text(to, subject, body),
                save_to_sent_items: true,
            }),
        )
        .await?;
        info!("Graph: sent mail to {}", to);
        // Graph acknowledges sendMail with 202 and no resource
        Ok(Envelope::succeeded_empty("Email has been sent successfully"))
    }

    async fn try_draft(&self, to: &str, subject: &str, body: &str) -> GraphResult<Envelope> {
        let url = format!("{GRAPH_BASE}/me/messages");
        let draft: GraphMessage = self
            .post_json(&url, &OutgoingMessage::text(to, subject, body))
            .await?;
        info!("Graph: created draft {}", draft.id);
        Ok(Envelope::succeeded(
            "Email draft has been created successfully",
            Payload::Message(Box::new(ack_message(
                draft.id,
                draft.conversation_id,
                draft.categories,
            ))),
        ))
    }

    async fn try_send_draft(&self, draft_id: &str) -> GraphResult<Envelope> {
        let url = format!("{GRAPH_BASE}/me/messages/{draft_id}/send");
        self.post_no_content::<()>(&url, None).await?;
        info!("Graph: sent draft {}", draft_id);
        Ok(Envelope::succeeded_empty(
            "Email draft has been sent successfully",
        ))
    }

    async fn try_search(&self, filters: &SearchFilters) -> GraphResult<Envelope> {
        match plan_search(filters)? {
            GraphQuery::Single { msg_id } => {
                let message = self.fetch_message(&msg_id).await?;
                Ok(Envelope::succeeded(
                    "Email has been searched successfully",
                    Payload::Message(Box::new(message)),
                ))
            }
            query @ GraphQuery::List { .. } => {
                let messages = self.fetch_matching(&query).await?;
                Ok(Envelope::succeeded(
                    "Emails have been searched successfully",
                    Payload::Messages(messages),
                ))
            }
        }
    }

    async fn try_read(&self, max_results: u32, days_back: i64) -> GraphResult<Envelope> {
        let filters = SearchFilters {
            after: Some(after_date(days_back)),
            max_results,
            ..Default::default()
        };
        let query = plan_search(&filters)?;
        let messages = self.fetch_matching(&query).await?;
        Ok(Envelope::succeeded(
            "Emails have been read successfully",
            Payload::Messages(messages),
        ))
    }

    async fn try_reply(&self, msg_id: &str, body: &str) -> GraphResult<Envelope> {
        // the native reply endpoint resolves the original's sender and
        // subject server-side
        let url = format!("{GRAPH_BASE}/me/messages/{msg_id}/reply");
        self.post_no_content(
            &url,
            Some(&ReplyRequest {
                comment: body.to_string(),
            }),
        )
        .await?;
        info!("Graph: replied to {}", msg_id);
        Ok(Envelope::succeeded_empty("Replied to email successfully"))
    }

    async fn try_delete(&self, msg_id: &str) -> GraphResult<Envelope> {
        let url = format!("{GRAPH_BASE}/me/messages/{msg_id}");
        self.delete(&url).await?;
        info!("Graph: deleted message {}", msg_id);
        Ok(Envelope::succeeded_empty("Email has been deleted successfully"))
    }

    async fn try_archive(&self, msg_id: &str) -> GraphResult<Envelope> {
        let url = format!("{GRAPH_BASE}/me/messages/{msg_id}/move");
        let moved: GraphMessage = self
            .post_json(
                &url,
                &MoveRequest {
                    destination_id: "archive".to_string(),
                },
            )
            .await?;
        info!("Graph: archived message {} as {}", msg_id, moved.id);
        Ok(Envelope::succeeded(
            "Email has been archived successfully",
            Payload::Message(Box::new(ack_message(
                moved.id,
                moved.conversation_id,
                moved.categories,
            ))),
        ))
    }

    async fn try_toggle(
        &self,
        msg_id: &str,
        label: &str,
        action: LabelAction,
    ) -> GraphResult<Envelope> {
        let url = format!("{GRAPH_BASE}/me/messages/{msg_id}?$select=categories");
        let current: GraphMessage = self.get_json(&url).await?;
        let current_set = current.categories.iter().cloned().collect();

        let change = plan_label_change(&current_set, label, action).map_err(|err| {
            GraphError::Operation(match err {
                LabelPlanError::AlreadyPresent(_) => {
                    format!("Label '{label}' already present on message {msg_id}")
                }
                LabelPlanError::NotPresent(_) => {
                    format!("Label '{label}' not present on message {msg_id}")
                }
            })
        })?;

        let (categories, message) = match change {
            LabelChange::Add(label_value) => {
                let mut categories = current.categories;
                categories.push(label_value);
                (
                    categories,
                    format!("Added label '{label}' to message {msg_id}"),
                )
            }
            LabelChange::Remove(label_value) => (
                current
                    .categories
                    .into_iter()
                    .filter(|c| !c.eq_ignore_ascii_case(&label_value))
                    .collect(),
                format!("Removed label '{label}' from message {msg_id}"),
            ),
        };

        let url = format!("{GRAPH_BASE}/me/messages/{msg_id}");
        let updated: GraphMessage = self
            .patch_json(&url, &CategoriesPatch { categories })
            .await?;
        Ok(Envelope::succeeded(
            message,
            Payload::Message(Box::new(ack_message(
                updated.id,
                updated.conversation_id,
                updated.categories,
            ))),
        ))
    }
}

#[async_trait]
impl EmailProvider for OutlookClient {
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
