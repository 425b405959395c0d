//! Client-side search and status filtering.
//!
//! This is a pure selector over `(records, filter)`: no state, no I/O. A
//! dashboard re-runs it whenever the list or the filter inputs change.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::record::{Record, Status};

/// Fields searched when a view does not configure its own.
pub const DEFAULT_SEARCH_FIELDS: &[&str] = &[
    "title",
    "name",
    "description",
    "email",
    "phone",
    "tags",
    "assignedTo",
    "createdBy",
];

/// Exact-match status filter. `all` disables it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    pub fn matches(&self, status: &Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(StatusFilter::All)
        } else {
            Ok(StatusFilter::Only(Status::new(s)?))
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

/// The user-driven filter inputs of a view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientFilter {
    /// Case-insensitive substring searched across the text fields.
    pub search: String,
    pub status: StatusFilter,
}

impl ClientFilter {
    pub fn new(search: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            search: search.into(),
            status,
        }
    }

    /// True when the filter lets every record through.
    pub fn is_passthrough(&self) -> bool {
        self.search.is_empty() && self.status == StatusFilter::All
    }

    pub fn apply<F: AsRef<str>>(&self, records: &[Record], fields: &[F]) -> Vec<Record> {
        apply_client_filter(records, fields, &self.search, &self.status)
    }
}

/// Filter `records` by search term and status, preserving order.
///
/// A record matches the search when `search_term` is a case-insensitive
/// substring of at least one of `fields`. The status filter is ANDed on
/// top. An empty term with [`StatusFilter::All`] returns the input as-is.
pub fn apply_client_filter<F: AsRef<str>>(
    records: &[Record],
    fields: &[F],
    search_term: &str,
    status: &StatusFilter,
) -> Vec<Record> {
    let needle = search_term.to_lowercase();

    records
        .iter()
        .filter(|record| status.matches(&record.status))
        .filter(|record| needle.is_empty() || matches_search(record, fields, &needle))
        .cloned()
        .collect()
}

fn matches_search<F: AsRef<str>>(record: &Record, fields: &[F], needle: &str) -> bool {
    fields.iter().any(|field| {
        record
            .text_field(field.as_ref())
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, status: &str, title: &str) -> Record {
        serde_json::from_value(json!({
            "id": id,
            "status": status,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z",
            "title": title,
            "secret": "hidden match",
        }))
        .unwrap()
    }

    fn sample() -> Vec<Record> {
        vec![
            record("1", "open", "Maths tutor needed"),
            record("2", "resolved", "Physics lead"),
            record("3", "open", "Chemistry MATHS combo"),
        ]
    }

    #[test]
    fn passthrough_is_identity() {
        let records = sample();
        let filter = ClientFilter::default();
        assert!(filter.is_passthrough());
        assert_eq!(filter.apply(&records, DEFAULT_SEARCH_FIELDS), records);
    }

    #[test]
    fn status_filter_selects_exact_matches() {
        let status: StatusFilter = "resolved".parse().unwrap();
        let result = apply_client_filter(&sample(), DEFAULT_SEARCH_FIELDS, "", &status);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id.as_str(), "2");
    }

    #[test]
    fn search_is_case_insensitive_and_ordered() {
        let result = apply_client_filter(&sample(), &["title"], "maths", &StatusFilter::All);
        let ids: Vec<_> = result.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn search_only_looks_at_designated_fields() {
        let result = apply_client_filter(&sample(), &["title"], "hidden", &StatusFilter::All);
        assert!(result.is_empty());

        let result =
            apply_client_filter(&sample(), &["title", "secret"], "HIDDEN", &StatusFilter::All);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn search_and_status_are_anded() {
        let filter = ClientFilter::new("maths", "open".parse().unwrap());
        let result = filter.apply(&sample(), &["title"]);
        assert_eq!(result.len(), 2);

        let filter = ClientFilter::new("physics", "open".parse().unwrap());
        assert!(filter.apply(&sample(), &["title"]).is_empty());
    }

    #[test]
    fn membership_matches_substring_definition() {
        let records = sample();
        for term in ["", "a", "LEAD", "combo", "xyz", "s t"] {
            let result = apply_client_filter(&records, &["title"], term, &StatusFilter::All);
            for r in &records {
                let title = r.text_field("title").unwrap().to_lowercase();
                let expected = title.contains(&term.to_lowercase());
                assert_eq!(result.contains(r), expected, "term {term:?} record {}", r.id);
            }
        }
    }

    #[test]
    fn status_filter_parses_all() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(StatusFilter::All.to_string(), "all");
    }
}
