//! Shared data model and provider contract for Mailbridge
//!
//! Defines the result envelope every operation returns, the normalized
//! message record, the provider-agnostic search filter vocabulary, the
//! `EmailProvider` capability trait, and the persisted email settings store.

mod envelope;
mod filters;
mod message;
mod provider;
mod settings;

pub use envelope::{Envelope, OperationStatus, Payload};
pub use filters::{after_date, parse_filter_date, FilterDateError, SearchFilters, DEFAULT_MAX_RESULTS};
pub use message::{EmailMessage, Sender};
pub use provider::{
    plan_label_change, EmailProvider, LabelAction, LabelChange, LabelPlanError, Provider,
};
pub use settings::{EmailSettings, Language, SettingsError, SettingsStore, Tone, WritingStyle};
