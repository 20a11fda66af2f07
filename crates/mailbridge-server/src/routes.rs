//! HTTP facade routes
//!
//! One route per unified operation plus the settings endpoints. Every mail
//! route accepts a `provider` query parameter, defaulting to the stored
//! `default_provider` setting. Operation failures arrive inside the result
//! envelope with HTTP 200; a provider that cannot be constructed at all is
//! reported as 503, outside the envelope contract.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use mailbridge_core::{
    EmailProvider, LabelAction, Provider, SearchFilters, SettingsStore, DEFAULT_MAX_RESULTS,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::factory::{ClientFactory, MailClient};

/// Shared state behind every handler
pub struct AppState {
    pub factory: ClientFactory,
    pub settings: SettingsStore,
}

pub type SharedState = Arc<AppState>;

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/send_email", post(send_email))
        .route("/draft_email", post(draft_email))
        .route("/send_draft", post(send_draft))
        .route("/read_emails", get(read_emails))
        .route("/search_emails", get(search_emails))
        .route("/reply_to_email", post(reply_to_email))
        .route("/delete_email/:msg_id", delete(delete_email))
        .route("/archive_email/:msg_id", post(archive_email))
        .route("/toggle_label", post(toggle_label))
        .route("/load_email_settings", get(load_email_settings))
        .route("/update_email_settings", post(update_email_settings))
        .route("/mcp", post(crate::mcp::handle))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ProviderSelect {
    pub provider: Option<Provider>,
}

#[derive(Debug, Deserialize)]
pub struct ComposeRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct SendDraftRequest {
    pub draft_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    pub msg_id: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ToggleLabelRequest {
    pub msg_id: String,
    pub label_name: String,
    #[serde(default = "default_action")]
    pub action: LabelAction,
}

fn default_action() -> LabelAction {
    LabelAction::Add
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReadParams {
    pub provider: Option<Provider>,
    pub max_results: u32,
    pub days_back: i64,
}

impl Default for ReadParams {
    fn default() -> Self {
        Self {
            provider: None,
            max_results: 5,
            days_back: 5,
        }
    }
}

/// Flat query-string form of [`SearchFilters`] plus the provider selector
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub provider: Option<Provider>,
    pub sender: Option<String>,
    pub subject: Option<String>,
    pub has_attachment: bool,
    pub after: Option<String>,
    pub before: Option<String>,
    pub unread: bool,
    pub label: Option<String>,
    pub msg_id: Option<String>,
    pub max_results: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            provider: None,
            sender: None,
            subject: None,
            has_attachment: false,
            after: None,
            before: None,
            unread: false,
            label: None,
            msg_id: None,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl SearchParams {
    pub fn into_parts(self) -> (Option<Provider>, SearchFilters) {
        (
            self.provider,
            SearchFilters {
                sender: self.sender,
                subject: self.subject,
                has_attachment: self.has_attachment,
                after: self.after,
                before: self.before,
                unread: self.unread,
                label: self.label,
                msg_id: self.msg_id,
                max_results: self.max_results,
            },
        )
    }
}

/// Resolve the provider client for a request, falling back to the stored
/// default provider
pub(crate) async fn client_for(
    state: &AppState,
    provider: Option<Provider>,
) -> Result<Arc<MailClient>, Response> {
    let provider = provider.unwrap_or_else(|| state.settings.load().default_provider);
    state.factory.client(provider).await.map_err(|err| {
        warn!("cannot construct {} client: {err}", provider);
        (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response()
    })
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "mailbridge",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn send_email(
    State(state): State<SharedState>,
    Query(select): Query<ProviderSelect>,
    Json(request): Json<ComposeRequest>,
) -> Response {
    match client_for(&state, select.provider).await {
        Ok(client) => Json(
            client
                .send_email(&request.to, &request.subject, &request.body)
                .await,
        )
        .into_response(),
        Err(response) => response,
    }
}

async fn draft_email(
    State(state): State<SharedState>,
    Query(select): Query<ProviderSelect>,
    Json(request): Json<ComposeRequest>,
) -> Response {
    match client_for(&state, select.provider).await {
        Ok(client) => Json(
            client
                .draft_email(&request.to, &request.subject, &request.body)
                .await,
        )
        .into_response(),
        Err(response) => response,
    }
}

async fn send_draft(
    State(state): State<SharedState>,
    Query(select): Query<ProviderSelect>,
    Json(request): Json<SendDraftRequest>,
) -> Response {
    match client_for(&state, select.provider).await {
        Ok(client) => Json(client.send_draft(&request.draft_id).await).into_response(),
        Err(response) => response,
    }
}

async fn read_emails(
    State(state): State<SharedState>,
    Query(params): Query<ReadParams>,
) -> Response {
    match client_for(&state, params.provider).await {
        Ok(client) => Json(
            client
                .read_emails(params.max_results, params.days_back)
                .await,
        )
        .into_response(),
        Err(response) => response,
    }
}

async fn search_emails(
    State(state): State<SharedState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let (provider, filters) = params.into_parts();
    match client_for(&state, provider).await {
        Ok(client) => Json(client.search_emails(&filters).await).into_response(),
        Err(response) => response,
    }
}

async fn reply_to_email(
    State(state): State<SharedState>,
    Query(select): Query<ProviderSelect>,
    Json(request): Json<ReplyRequest>,
) -> Response {
    match client_for(&state, select.provider).await {
        Ok(client) => {
            Json(client.reply_to_email(&request.msg_id, &request.body).await).into_response()
        }
        Err(response) => response,
    }
}

async fn delete_email(
    State(state): State<SharedState>,
    Query(select): Query<ProviderSelect>,
    Path(msg_id): Path<String>,
) -> Response {
    match client_for(&state, select.provider).await {
        Ok(client) => Json(client.delete_email(&msg_id).await).into_response(),
        Err(response) => response,
    }
}

async fn archive_email(
    State(state): State<SharedState>,
    Query(select): Query<ProviderSelect>,
    Path(msg_id): Path<String>,
) -> Response {
    match client_for(&state, select.provider).await {
        Ok(client) => Json(client.archive_email(&msg_id).await).into_response(),
        Err(response) => response,
    }
}

async fn toggle_label(
    State(state): State<SharedState>,
    Query(select): Query<ProviderSelect>,
    Json(request): Json<ToggleLabelRequest>,
) -> Response {
    match client_for(&state, select.provider).await {
        Ok(client) => Json(
            client
                .toggle_label(&request.msg_id, &request.label_name, request.action)
                .await,
        )
        .into_response(),
        Err(response) => response,
    }
}

async fn load_email_settings(State(state): State<SharedState>) -> Response {
    Json(state.settings.load()).into_response()
}

/// Partial settings update; an invalid update is reported as the two-element
/// `["error", message]` pair with the stored document untouched
async fn update_email_settings(
    State(state): State<SharedState>,
    Json(partial): Json<Map<String, Value>>,
) -> Response {
    match state.settings.update(&partial) {
        Ok(updated) => Json(updated).into_response(),
        Err(err) => Json(json!(["error", err.to_string()])).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_params_convert_to_filters() {
        let params: SearchParams = serde_json::from_value(json!({
            "provider": "outlook",
            "sender": "a@b.com",
            "unread": true,
            "max_results": 3
        }))
        .unwrap();
        let (provider, filters) = params.into_parts();
        assert_eq!(provider, Some(Provider::Outlook));
        assert_eq!(filters.sender.as_deref(), Some("a@b.com"));
        assert!(filters.unread);
        assert_eq!(filters.max_results, 3);
    }

    #[test]
    fn toggle_request_defaults_to_add() {
        let request: ToggleLabelRequest =
            serde_json::from_value(json!({"msg_id": "m1", "label_name": "starred"})).unwrap();
        assert_eq!(request.action, LabelAction::Add);

        let request: ToggleLabelRequest = serde_json::from_value(
            json!({"msg_id": "m1", "label_name": "starred", "action": "remove"}),
        )
        .unwrap();
        assert_eq!(request.action, LabelAction::Remove);
    }

    #[test]
    fn read_params_default_to_five_and_five() {
        let params: ReadParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(params.max_results, 5);
        assert_eq!(params.days_back, 5);
    }
}
