//! Provider contract
//!
//! The nine-operation capability interface every provider client
//! implements, the provider identifier used to select one, and the pure
//! label-toggle planning shared by both implementations.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::envelope::Envelope;
use crate::filters::SearchFilters;

/// Identifies which provider backend serves a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Outlook,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Outlook => "outlook",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" | "gmail" => Ok(Provider::Google),
            "outlook" | "microsoft" => Ok(Provider::Outlook),
            other => Err(format!("unknown provider '{other}', expected 'google' or 'outlook'")),
        }
    }
}

/// Direction of a label toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelAction {
    Add,
    Remove,
}

impl std::str::FromStr for LabelAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(LabelAction::Add),
            "remove" => Ok(LabelAction::Remove),
            other => Err(format!("unknown action '{other}', use 'add' or 'remove'")),
        }
    }
}

/// The mutation a valid toggle resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelChange {
    Add(String),
    Remove(String),
}

/// A toggle that would not change anything, reported loudly instead of
/// applied as a silent no-op
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelPlanError {
    #[error("label '{0}' is already present")]
    AlreadyPresent(String),
    #[error("label '{0}' is not present")]
    NotPresent(String),
}

/// Decide what a label toggle should do against the message's current
/// label/category set. Membership is case-insensitive; the returned change
/// carries the label exactly as requested.
pub fn plan_label_change(
    current: &BTreeSet<String>,
    label: &str,
    action: LabelAction,
) -> Result<LabelChange, LabelPlanError> {
    let present = current.iter().any(|l| l.eq_ignore_ascii_case(label));
    match action {
        LabelAction::Add if present => Err(LabelPlanError::AlreadyPresent(label.to_string())),
        LabelAction::Add => Ok(LabelChange::Add(label.to_string())),
        LabelAction::Remove if !present => Err(LabelPlanError::NotPresent(label.to_string())),
        LabelAction::Remove => Ok(LabelChange::Remove(label.to_string())),
    }
}

/// Unified capability interface over email providers
///
/// Every operation resolves to an [`Envelope`]; transport and provider
/// errors are converted into failed envelopes inside the implementation and
/// never propagate to the caller.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Send an email to a single recipient
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Envelope;

    /// Create a draft without sending it
    async fn draft_email(&self, to: &str, subject: &str, body: &str) -> Envelope;

    /// Send a previously created draft by identifier
    async fn send_draft(&self, draft_id: &str) -> Envelope;

    /// Search messages; a set `msg_id` turns this into a single lookup
    async fn search_emails(&self, filters: &SearchFilters) -> Envelope;

    /// Read recent messages received within the past `days_back` days
    async fn read_emails(&self, max_results: u32, days_back: i64) -> Envelope;

    /// Reply to the given message, resolving its sender and subject first
    async fn reply_to_email(&self, msg_id: &str, body: &str) -> Envelope;

    /// Delete the given message
    async fn delete_email(&self, msg_id: &str) -> Envelope;

    /// Archive the given message (remove it from the inbox)
    async fn archive_email(&self, msg_id: &str) -> Envelope;

    /// Add or remove a label/category on the given message
    async fn toggle_label(&self, msg_id: &str, label: &str, action: LabelAction) -> Envelope;
}
