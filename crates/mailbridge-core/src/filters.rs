//! Provider-agnostic search filter vocabulary
//!
//! A [`SearchFilters`] value is the input to both query planners. Dates use
//! the `YYYY/MM/DD` exchange format and are validated here, before any
//! provider-specific query is composed.

use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Default result-count bound for list queries
pub const DEFAULT_MAX_RESULTS: u32 = 10;

/// Abstract search criteria shared by all providers
///
/// Invariant: when `msg_id` is set every other filter is ignored and the
/// search degrades to a single-message lookup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    /// Sender address to match
    pub sender: Option<String>,
    /// Subject substring to match
    pub subject: Option<String>,
    pub has_attachment: bool,
    /// Lower date bound, `YYYY/MM/DD`
    pub after: Option<String>,
    /// Upper date bound, `YYYY/MM/DD`
    pub before: Option<String>,
    pub unread: bool,
    /// Label or category name, case-insensitive
    pub label: Option<String>,
    /// Direct message lookup; dominates all other filters
    pub msg_id: Option<String>,
    pub max_results: u32,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
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

impl SearchFilters {
    /// Filters for a direct single-message lookup
    pub fn by_id(msg_id: impl Into<String>) -> Self {
        Self {
            msg_id: Some(msg_id.into()),
            ..Self::default()
        }
    }
}

/// A date filter value that is not `YYYY/MM/DD`
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid date '{0}', expected YYYY/MM/DD")]
pub struct FilterDateError(pub String);

/// Validate and parse a `YYYY/MM/DD` filter date
pub fn parse_filter_date(value: &str) -> Result<NaiveDate, FilterDateError> {
    NaiveDate::parse_from_str(value, "%Y/%m/%d")
        .map_err(|_| FilterDateError(value.to_string()))
}

/// Compute the `after` date for read-recent queries: today minus
/// `days_back`, in the `YYYY/MM/DD` exchange format.
pub fn after_date(days_back: i64) -> String {
    let cutoff = Utc::now().date_naive() - Duration::days(days_back);
    cutoff.format("%Y/%m/%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_max_results_is_ten() {
        assert_eq!(SearchFilters::default().max_results, 10);
    }

    #[test]
    fn by_id_sets_only_the_lookup_field() {
        let filters = SearchFilters::by_id("abc123");
        assert_eq!(filters.msg_id.as_deref(), Some("abc123"));
        assert!(filters.sender.is_none());
        assert!(!filters.unread);
    }

    #[test]
    fn deserializes_with_defaults() {
        let filters: SearchFilters =
            serde_json::from_str(r#"{"sender":"a@b.com","unread":true}"#).unwrap();
        assert_eq!(filters.sender.as_deref(), Some("a@b.com"));
        assert!(filters.unread);
        assert!(!filters.has_attachment);
        assert_eq!(filters.max_results, 10);
    }

    #[test]
    fn accepts_well_formed_dates() {
        let date = parse_filter_date("2025/01/01").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_filter_date("2025-01-01").is_err());
        assert!(parse_filter_date("01/02/2025").is_err());
        assert!(parse_filter_date("2025/13/40").is_err());
        assert!(parse_filter_date("yesterday").is_err());
    }

    #[test]
    fn after_date_formats_exchange_style() {
        let value = after_date(0);
        assert!(parse_filter_date(&value).is_ok());
    }
}
