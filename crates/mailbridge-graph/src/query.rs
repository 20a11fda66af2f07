//! Outlook query planner
//!
//! The hard half of the translation layer. Gmail has one flat "label"
//! concept; Graph splits it into storage folders and tag-like categories.
//! A label therefore either scopes the request path to a well-known folder
//! or becomes a `categories/any(...)` clause in the OData `$filter` — with
//! IMPORTANT deliberately routed through both (folder scope AND category
//! filter), approximating Gmail's overlapping IMPORTANT semantics.
//!
//! Pure functions, no I/O.

use mailbridge_core::{parse_filter_date, FilterDateError, SearchFilters};

/// Canonical Gmail-style label names mapped to Graph well-known folders.
/// Labels outside this table are categories. IMPORTANT appears here AND is
/// treated as a category; STARRED is always a category.
const FOLDER_MAP: [(&str, &str); 7] = [
    ("INBOX", "inbox"),
    ("SENT", "sentitems"),
    ("DRAFT", "drafts"),
    ("SPAM", "junkemail"),
    ("TRASH", "deleteditems"),
    ("ARCHIVE", "archive"),
    ("IMPORTANT", "inbox"),
];

/// Resolve a label (any case) to its Graph well-known folder name
pub fn well_known_folder(label: &str) -> Option<&'static str> {
    let upper = label.to_uppercase();
    FOLDER_MAP
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|(_, folder)| *folder)
}

/// Whether the label is a category filter on Graph: anything outside the
/// folder table, plus STARRED and IMPORTANT literally
fn is_category(label: &str) -> bool {
    let upper = label.to_uppercase();
    upper == "STARRED" || upper == "IMPORTANT" || well_known_folder(label).is_none()
}

/// Query directive for the Graph transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphQuery {
    /// Direct single-resource lookup; every other filter is ignored
    Single { msg_id: String },
    /// Folder- or collection-scoped list request
    List {
        /// Request path relative to the Graph root, e.g.
        /// `/me/mailFolders/inbox/messages` or `/me/messages`
        path: String,
        /// Raw OData `$filter` expression, unencoded
        filter: Option<String>,
        /// Result-count bound (`$top`)
        top: u32,
    },
}

impl GraphQuery {
    /// Query-string parameters for a list request, with the filter value
    /// percent-encoded for use in a URL
    pub fn encoded_query(&self) -> String {
        match self {
            GraphQuery::Single { .. } => String::new(),
            GraphQuery::List { filter, top, .. } => match filter {
                Some(filter) => {
                    format!("$filter={}&$top={top}", urlencoding::encode(filter))
                }
                None => format!("$top={top}"),
            },
        }
    }
}

/// `YYYY/MM/DD` exchange date to the midnight-UTC ISO-8601 instant Graph
/// compares `receivedDateTime` against
pub fn to_graph_datetime(date: &str) -> Result<String, FilterDateError> {
    let parsed = parse_filter_date(date)?;
    Ok(format!("{}T00:00:00Z", parsed.format("%Y-%m-%d")))
}

/// Escape a value for an OData single-quoted string literal
fn escape_odata(value: &str) -> String {
    value.replace('\'', "''")
}

/// Build the query directive for a filter set
pub fn plan_search(filters: &SearchFilters) -> Result<GraphQuery, FilterDateError> {
    if let Some(msg_id) = &filters.msg_id {
        return Ok(GraphQuery::Single {
            msg_id: msg_id.clone(),
        });
    }

    let label_upper = filters.label.as_deref().map(str::to_uppercase);
    let folder = filters
        .label
        .as_deref()
        .and_then(well_known_folder);

    let path = match folder {
        Some(folder) => format!("/me/mailFolders/{folder}/messages"),
        None => "/me/messages".to_string(),
    };

    let mut clauses = Vec::new();
    if label_upper.as_deref() == Some("DRAFT") {
        clauses.push("isDraft eq true".to_string());
    }
    // Inbox-scoped queries carry the unread intent through the folder path;
    // everywhere else the flag is an explicit clause.
    if filters.unread && label_upper.as_deref() != Some("INBOX") {
        clauses.push("isRead eq false".to_string());
    }
    if let Some(sender) = &filters.sender {
        clauses.push(format!(
            "from/emailAddress/address eq '{}'",
            escape_odata(sender)
        ));
    }
    if let Some(subject) = &filters.subject {
        clauses.push(format!("contains(subject, '{}')", escape_odata(subject)));
    }
    if filters.has_attachment {
        clauses.push("hasAttachments eq true".to_string());
    }
    if let Some(after) = &filters.after {
        clauses.push(format!("receivedDateTime ge {}", to_graph_datetime(after)?));
    }
    if let Some(before) = &filters.before {
        clauses.push(format!("receivedDateTime le {}", to_graph_datetime(before)?));
    }
    if let Some(label) = &filters.label {
        if is_category(label) {
            clauses.push(format!("categories/any(c:c eq '{}')", escape_odata(label)));
        }
    }

    let filter = (!clauses.is_empty()).then(|| clauses.join(" and "));
    Ok(GraphQuery::List {
        path,
        filter,
        top: filters.max_results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_label(label: &str) -> SearchFilters {
        SearchFilters {
            label: Some(label.to_string()),
            ..Default::default()
        }
    }

    fn list(query: GraphQuery) -> (String, Option<String>, u32) {
        match query {
            GraphQuery::List { path, filter, top } => (path, filter, top),
            GraphQuery::Single { .. } => panic!("expected list query"),
        }
    }

    #[test]
    fn msg_id_dominates_all_other_filters() {
        let filters = SearchFilters {
            sender: Some("a@b.com".into()),
            label: Some("INBOX".into()),
            unread: true,
            msg_id: Some("AAMk-1".into()),
            ..Default::default()
        };
        assert_eq!(
            plan_search(&filters).unwrap(),
            GraphQuery::Single {
                msg_id: "AAMk-1".into(),
            }
        );
    }

    #[test]
    fn folder_labels_scope_the_path_without_category_clause() {
        for (label, folder) in [
            ("INBOX", "inbox"),
            ("SENT", "sentitems"),
            ("SPAM", "junkemail"),
            ("TRASH", "deleteditems"),
            ("ARCHIVE", "archive"),
        ] {
            let (path, filter, _) = list(plan_search(&with_label(label)).unwrap());
            assert_eq!(path, format!("/me/mailFolders/{folder}/messages"));
            assert!(filter.is_none(), "label {label} must not add clauses");
        }
    }

    #[test]
    fn folder_lookup_is_case_insensitive() {
        let (path, _, _) = list(plan_search(&with_label("inbox")).unwrap());
        assert_eq!(path, "/me/mailFolders/inbox/messages");
    }

    #[test]
    fn draft_label_scopes_folder_and_flags_drafts() {
        let (path, filter, _) = list(plan_search(&with_label("DRAFT")).unwrap());
        assert_eq!(path, "/me/mailFolders/drafts/messages");
        assert_eq!(filter.as_deref(), Some("isDraft eq true"));
    }

    #[test]
    fn unknown_label_becomes_a_category_filter_on_the_generic_path() {
        let (path, filter, _) = list(plan_search(&with_label("ProjectX")).unwrap());
        assert_eq!(path, "/me/messages");
        assert_eq!(
            filter.as_deref(),
            Some("categories/any(c:c eq 'ProjectX')")
        );
    }

    #[test]
    fn starred_is_a_category_not_a_folder() {
        let (path, filter, _) = list(plan_search(&with_label("STARRED")).unwrap());
        assert_eq!(path, "/me/messages");
        assert_eq!(filter.as_deref(), Some("categories/any(c:c eq 'STARRED')"));
    }

    #[test]
    fn important_is_double_routed_through_folder_and_category() {
        let (path, filter, _) = list(plan_search(&with_label("IMPORTANT")).unwrap());
        assert_eq!(path, "/me/mailFolders/inbox/messages");
        assert_eq!(
            filter.as_deref(),
            Some("categories/any(c:c eq 'IMPORTANT')")
        );
    }

    #[test]
    fn unread_is_explicit_outside_the_inbox() {
        let filters = SearchFilters {
            unread: true,
            ..Default::default()
        };
        let (path, filter, _) = list(plan_search(&filters).unwrap());
        assert_eq!(path, "/me/messages");
        assert_eq!(filter.as_deref(), Some("isRead eq false"));

        let filters = SearchFilters {
            unread: true,
            label: Some("SENT".into()),
            ..Default::default()
        };
        let (_, filter, _) = list(plan_search(&filters).unwrap());
        assert_eq!(filter.as_deref(), Some("isRead eq false"));
    }

    #[test]
    fn unread_is_suppressed_when_scoped_to_the_inbox() {
        let filters = SearchFilters {
            unread: true,
            label: Some("INBOX".into()),
            ..Default::default()
        };
        let (path, filter, _) = list(plan_search(&filters).unwrap());
        assert_eq!(path, "/me/mailFolders/inbox/messages");
        assert!(filter.is_none());
    }

    #[test]
    fn clauses_join_conjunctively_in_fixed_order() {
        let filters = SearchFilters {
            sender: Some("a@b.com".into()),
            subject: Some("status".into()),
            has_attachment: true,
            after: Some("2025/01/01".into()),
            before: Some("2025/02/01".into()),
            unread: true,
            label: Some("ProjectX".into()),
            msg_id: None,
            max_results: 5,
        };
        let (path, filter, top) = list(plan_search(&filters).unwrap());
        assert_eq!(path, "/me/messages");
        assert_eq!(top, 5);
        assert_eq!(
            filter.as_deref(),
            Some(
                "isRead eq false and from/emailAddress/address eq 'a@b.com' and \
                 contains(subject, 'status') and hasAttachments eq true and \
                 receivedDateTime ge 2025-01-01T00:00:00Z and \
                 receivedDateTime le 2025-02-01T00:00:00Z and \
                 categories/any(c:c eq 'ProjectX')"
            )
        );
    }

    #[test]
    fn dates_convert_to_midnight_utc() {
        assert_eq!(
            to_graph_datetime("2025/01/01").unwrap(),
            "2025-01-01T00:00:00Z"
        );
        assert_eq!(
            to_graph_datetime("2024/12/31").unwrap(),
            "2024-12-31T00:00:00Z"
        );
    }

    #[test]
    fn malformed_dates_are_rejected_before_embedding() {
        assert!(to_graph_datetime("2025-01-01").is_err());
        assert!(to_graph_datetime("2025/1").is_err());

        let filters = SearchFilters {
            after: Some("tomorrow".into()),
            ..Default::default()
        };
        assert!(plan_search(&filters).is_err());
    }

    #[test]
    fn single_quotes_are_escaped_in_literals() {
        let filters = SearchFilters {
            subject: Some("bob's report".into()),
            ..Default::default()
        };
        let (_, filter, _) = list(plan_search(&filters).unwrap());
        assert_eq!(
            filter.as_deref(),
            Some("contains(subject, 'bob''s report')")
        );
    }

    #[test]
    fn encoded_query_percent_encodes_the_filter_value() {
        let filters = SearchFilters {
            unread: true,
            max_results: 7,
            ..Default::default()
        };
        let query = plan_search(&filters).unwrap();
        assert_eq!(
            query.encoded_query(),
            "$filter=isRead%20eq%20false&$top=7"
        );

        let bare = plan_search(&SearchFilters::default()).unwrap();
        assert_eq!(bare.encoded_query(), "$top=10");
    }

    #[test]
    fn no_filters_yields_broadest_query_bounded_by_top() {
        let (path, filter, top) = list(plan_search(&SearchFilters::default()).unwrap());
        assert_eq!(path, "/me/messages");
        assert!(filter.is_none());
        assert_eq!(top, 10);
    }
}
