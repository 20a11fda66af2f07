//! MCP surface: JSON-RPC over `POST /mcp`
//!
//! Exposes the same unified operation set as the REST routes so MCP clients
//! can drive the service with `tools/list` and `tools/call`.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use mailbridge_core::{EmailProvider, LabelAction, Provider, SearchFilters};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::factory::MailClient;
use crate::routes::{AppState, SharedState};

const INVALID_PARAMS: i32 = -32602;
const METHOD_NOT_FOUND: i32 = -32601;

#[derive(Debug, Deserialize)]
pub struct McpRequest {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub struct McpResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
}

impl McpResponse {
    fn ok(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    fn err(id: u64, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(McpError {
                code,
                message: message.into(),
            }),
            id,
        }
    }
}

#[derive(Debug, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    parameters: Vec<ToolParameter>,
}

#[derive(Debug, Serialize)]
struct ToolParameter {
    name: &'static str,
    #[serde(rename = "type")]
    param_type: &'static str,
    required: bool,
}

fn param(name: &'static str, param_type: &'static str, required: bool) -> ToolParameter {
    ToolParameter {
        name,
        param_type,
        required,
    }
}

fn tool_list() -> Vec<Tool> {
    vec![
        Tool {
            name: "send_email",
            description: "Send an email to the specified recipient",
            parameters: vec![
                param("to", "string", true),
                param("subject", "string", true),
                param("body", "string", true),
                param("provider", "string", false),
            ],
        },
        Tool {
            name: "draft_email",
            description: "Create a draft email without sending it",
            parameters: vec![
                param("to", "string", true),
                param("subject", "string", true),
                param("body", "string", true),
                param("provider", "string", false),
            ],
        },
        Tool {
            name: "send_draft",
            description: "Send a previously created draft email",
            parameters: vec![
                param("draft_id", "string", true),
                param("provider", "string", false),
            ],
        },
        Tool {
            name: "read_emails",
            description: "Read recent emails received within the past days_back days",
            parameters: vec![
                param("max_results", "integer", false),
                param("days_back", "integer", false),
                param("provider", "string", false),
            ],
        },
        Tool {
            name: "search_emails",
            description: "Search emails matching the given filters; msg_id looks up one message",
            parameters: vec![
                param("sender", "string", false),
                param("subject", "string", false),
                param("has_attachment", "boolean", false),
                param("after", "string", false),
                param("before", "string", false),
                param("unread", "boolean", false),
                param("label", "string", false),
                param("msg_id", "string", false),
                param("max_results", "integer", false),
                param("provider", "string", false),
            ],
        },
        Tool {
            name: "reply_to_email",
            description: "Reply to the specified message",
            parameters: vec![
                param("msg_id", "string", true),
                param("body", "string", true),
                param("provider", "string", false),
            ],
        },
        Tool {
            name: "delete_email",
            description: "Delete the specified message",
            parameters: vec![
                param("msg_id", "string", true),
                param("provider", "string", false),
            ],
        },
        Tool {
            name: "archive_email",
            description: "Archive the specified message",
            parameters: vec![
                param("msg_id", "string", true),
                param("provider", "string", false),
            ],
        },
        Tool {
            name: "toggle_label",
            description: "Add or remove a label/category on the specified message",
            parameters: vec![
                param("msg_id", "string", true),
                param("label_name", "string", true),
                param("action", "string", false),
                param("provider", "string", false),
            ],
        },
        Tool {
            name: "load_email_settings",
            description: "Load the persisted email generation settings",
            parameters: vec![],
        },
        Tool {
            name: "update_email_settings",
            description: "Merge the given fields into the persisted email settings",
            parameters: vec![param("fields", "object", true)],
        },
    ]
}

/// JSON-RPC endpoint handler
pub async fn handle(
    State(state): State<SharedState>,
    Json(request): Json<McpRequest>,
) -> Json<McpResponse> {
    debug!("MCP request: method={}", request.method);
    let response = match request.method.as_str() {
        "tools/list" => McpResponse::ok(
            request.id,
            serde_json::json!({ "tools": tool_list() }),
        ),
        "tools/call" => {
            let name = request.params["name"].as_str().unwrap_or_default().to_string();
            let arguments = request.params.get("arguments").cloned().unwrap_or(Value::Null);
            match call_tool(&state, &name, &arguments).await {
                Ok(result) => McpResponse::ok(request.id, result),
                Err(error) => McpResponse {
                    jsonrpc: "2.0",
                    result: None,
                    error: Some(error),
                    id: request.id,
                },
            }
        }
        other => McpResponse::err(
            request.id,
            METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        ),
    };
    Json(response)
}

fn invalid(message: impl Into<String>) -> McpError {
    McpError {
        code: INVALID_PARAMS,
        message: message.into(),
    }
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, McpError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(format!("missing required argument '{key}'")))
}

fn optional_provider(args: &Value) -> Result<Option<Provider>, McpError> {
    match args.get("provider").and_then(Value::as_str) {
        Some(raw) => Provider::from_str(raw).map(Some).map_err(invalid),
        None => Ok(None),
    }
}

async fn resolve_client(
    state: &AppState,
    args: &Value,
) -> Result<Arc<MailClient>, McpError> {
    let provider = optional_provider(args)?
        .unwrap_or_else(|| state.settings.load().default_provider);
    state
        .factory
        .client(provider)
        .await
        .map_err(|err| invalid(err.to_string()))
}

fn to_result(envelope: mailbridge_core::Envelope) -> Result<Value, McpError> {
    serde_json::to_value(envelope).map_err(|err| invalid(err.to_string()))
}

async fn call_tool(state: &AppState, name: &str, args: &Value) -> Result<Value, McpError> {
    match name {
        "send_email" => {
            let client = resolve_client(state, args).await?;
            to_result(
                client
                    .send_email(
                        required_str(args, "to")?,
                        required_str(args, "subject")?,
                        required_str(args, "body")?,
                    )
                    .await,
            )
        }
        "draft_email" => {
            let client = resolve_client(state, args).await?;
            to_result(
                client
                    .draft_email(
                        required_str(args, "to")?,
                        required_str(args, "subject")?,
                        required_str(args, "body")?,
                    )
                    .await,
            )
        }
        "send_draft" => {
            let client = resolve_client(state, args).await?;
            to_result(client.send_draft(required_str(args, "draft_id")?).await)
        }
        "read_emails" => {
            let client = resolve_client(state, args).await?;
            let max_results = args.get("max_results").and_then(Value::as_u64).unwrap_or(5) as u32;
            let days_back = args.get("days_back").and_then(Value::as_i64).unwrap_or(5);
            to_result(client.read_emails(max_results, days_back).await)
        }
        "search_emails" => {
            let client = resolve_client(state, args).await?;
            let filters: SearchFilters = match args {
                Value::Null => SearchFilters::default(),
                other => serde_json::from_value(other.clone())
                    .map_err(|err| invalid(format!("invalid search filters: {err}")))?,
            };
            to_result(client.search_emails(&filters).await)
        }
        "reply_to_email" => {
            let client = resolve_client(state, args).await?;
            to_result(
                client
                    .reply_to_email(required_str(args, "msg_id")?, required_str(args, "body")?)
                    .await,
            )
        }
        "delete_email" => {
            let client = resolve_client(state, args).await?;
            to_result(client.delete_email(required_str(args, "msg_id")?).await)
        }
        "archive_email" => {
            let client = resolve_client(state, args).await?;
            to_result(client.archive_email(required_str(args, "msg_id")?).await)
        }
        "toggle_label" => {
            let client = resolve_client(state, args).await?;
            let action = match args.get("action").and_then(Value::as_str) {
                Some(raw) => LabelAction::from_str(raw).map_err(invalid)?,
                None => LabelAction::Add,
            };
            to_result(
                client
                    .toggle_label(
                        required_str(args, "msg_id")?,
                        required_str(args, "label_name")?,
                        action,
                    )
                    .await,
            )
        }
        "load_email_settings" => serde_json::to_value(state.settings.load())
            .map_err(|err| invalid(err.to_string())),
        "update_email_settings" => {
            let fields: Map<String, Value> = match args.get("fields") {
                Some(Value::Object(map)) => map.clone(),
                _ => return Err(invalid("missing required argument 'fields'")),
            };
            match state.settings.update(&fields) {
                Ok(updated) => serde_json::to_value(updated)
                    .map_err(|err| invalid(err.to_string())),
                Err(err) => Ok(serde_json::json!(["error", err.to_string()])),
            }
        }
        other => Err(McpError {
            code: METHOD_NOT_FOUND,
            message: format!("Unknown tool: {other}"),
        }),
    }
}
