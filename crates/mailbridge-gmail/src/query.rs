//! Gmail query planner
//!
//! Translates a [`SearchFilters`] value into either a direct message lookup
//! or a Gmail search string: a space-joined list of `field:value` tokens.
//! Pure function, no I/O.

use mailbridge_core::{parse_filter_date, FilterDateError, SearchFilters};

/// Query directive for the Gmail transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GmailQuery {
    /// Fetch one message by identifier; every other filter is ignored
    Single { msg_id: String },
    /// List messages matching a search string, bounded by `max_results`.
    /// An empty string matches everything.
    List { q: String, max_results: u32 },
}

/// Build the query directive for a filter set
///
/// Tokens are emitted in a fixed order (`from:`, `subject:`,
/// `has:attachment`, `after:`, `before:`, `is:unread`, `label:`) so the
/// resulting string is stable for identical inputs. Date values are
/// validated before being embedded.
pub fn plan_search(filters: &SearchFilters) -> Result<GmailQuery, FilterDateError> {
    if let Some(msg_id) = &filters.msg_id {
        return Ok(GmailQuery::Single {
            msg_id: msg_id.clone(),
        });
    }

    let mut tokens = Vec::new();
    if let Some(sender) = &filters.sender {
        tokens.push(format!("from:{sender}"));
    }
    if let Some(subject) = &filters.subject {
        tokens.push(format!("subject:{subject}"));
    }
    if filters.has_attachment {
        tokens.push("has:attachment".to_string());
    }
    if let Some(after) = &filters.after {
        parse_filter_date(after)?;
        tokens.push(format!("after:{after}"));
    }
    if let Some(before) = &filters.before {
        parse_filter_date(before)?;
        tokens.push(format!("before:{before}"));
    }
    if filters.unread {
        tokens.push("is:unread".to_string());
    }
    if let Some(label) = &filters.label {
        tokens.push(format!("label:{label}"));
    }

    Ok(GmailQuery::List {
        q: tokens.join(" "),
        max_results: filters.max_results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_and_unread_compose_in_order() {
        let filters = SearchFilters {
            sender: Some("a@b.com".into()),
            unread: true,
            ..Default::default()
        };
        assert_eq!(
            plan_search(&filters).unwrap(),
            GmailQuery::List {
                q: "from:a@b.com is:unread".into(),
                max_results: 10,
            }
        );
    }

    #[test]
    fn all_filters_emit_every_token() {
        let filters = SearchFilters {
            sender: Some("a@b.com".into()),
            subject: Some("invoice".into()),
            has_attachment: true,
            after: Some("2025/01/01".into()),
            before: Some("2025/02/01".into()),
            unread: true,
            label: Some("work".into()),
            msg_id: None,
            max_results: 25,
        };
        let GmailQuery::List { q, max_results } = plan_search(&filters).unwrap() else {
            panic!("expected list query");
        };
        assert_eq!(
            q,
            "from:a@b.com subject:invoice has:attachment after:2025/01/01 \
             before:2025/02/01 is:unread label:work"
        );
        assert_eq!(max_results, 25);
    }

    #[test]
    fn empty_filters_match_everything() {
        let query = plan_search(&SearchFilters::default()).unwrap();
        assert_eq!(
            query,
            GmailQuery::List {
                q: String::new(),
                max_results: 10,
            }
        );
    }

    #[test]
    fn msg_id_dominates_all_other_filters() {
        let filters = SearchFilters {
            sender: Some("a@b.com".into()),
            unread: true,
            label: Some("work".into()),
            msg_id: Some("m-42".into()),
            ..Default::default()
        };
        assert_eq!(
            plan_search(&filters).unwrap(),
            GmailQuery::Single {
                msg_id: "m-42".into(),
            }
        );
    }

    #[test]
    fn malformed_dates_are_rejected_before_query_building() {
        let filters = SearchFilters {
            after: Some("01-01-2025".into()),
            ..Default::default()
        };
        assert!(plan_search(&filters).is_err());

        let filters = SearchFilters {
            before: Some("soon".into()),
            ..Default::default()
        };
        assert!(plan_search(&filters).is_err());
    }
}
