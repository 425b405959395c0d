//! Server-side query constraints.
//!
//! A [`Query`] is what a live subscription asks the store for: equality
//! constraints on fields plus an optional ordering. Stores that cannot push
//! constraints down evaluate them with [`Query::apply`].

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::Record;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering applied to a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    /// Newest first, the order every dashboard lists records in.
    pub fn newest_first() -> Self {
        Self {
            field: "createdAt".to_string(),
            direction: Direction::Descending,
        }
    }
}

/// A single field constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum FieldFilter {
    /// `field == value`.
    Eq { field: String, value: Value },
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FieldFilter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            FieldFilter::Eq { field, value } => record.field(field).as_ref() == Some(value),
        }
    }
}

/// Constraints for a live query: all filters must match (AND).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub filters: Vec<FieldFilter>,
    #[serde(default)]
    pub order_by: Option<OrderBy>,
}

impl Query {
    /// A query matching the whole collection, unordered.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    /// Combine two queries. Filters are ANDed; `other`'s ordering wins when
    /// both specify one.
    pub fn and(mut self, other: Query) -> Self {
        self.filters.extend(other.filters);
        if other.order_by.is_some() {
            self.order_by = other.order_by;
        }
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    /// Filter and sort a full collection.
    ///
    /// Sorting is stable and ties keep store order; records missing the
    /// ordering field sort last in either direction.
    pub fn apply(&self, records: impl IntoIterator<Item = Record>) -> Vec<Record> {
        let mut matching: Vec<Record> = records.into_iter().filter(|r| self.matches(r)).collect();

        if let Some(order) = &self.order_by {
            matching.sort_by(|a, b| compare_field(a, b, order));
        }

        matching
    }
}

fn compare_field(a: &Record, b: &Record, order: &OrderBy) -> Ordering {
    let key = |r: &Record| match order.field.as_str() {
        "createdAt" => Some(SortKey::Time(r.created_at.timestamp_micros())),
        "updatedAt" => Some(SortKey::Time(r.updated_at.timestamp_micros())),
        field => r.field(field).and_then(SortKey::from_value),
    };

    match (key(a), key(b)) {
        (Some(x), Some(y)) => {
            let ord = x.cmp_with(&y);
            match order.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

enum SortKey {
    Time(i64),
    Number(f64),
    Text(String),
    Bool(bool),
}

impl SortKey {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(SortKey::Number),
            Value::String(s) => Some(SortKey::Text(s)),
            Value::Bool(b) => Some(SortKey::Bool(b)),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Time(_) => 0,
            SortKey::Number(_) => 1,
            SortKey::Text(_) => 2,
            SortKey::Bool(_) => 3,
        }
    }

    fn cmp_with(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Time(a), SortKey::Time(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Bool(a), SortKey::Bool(b)) => a.cmp(b),
            // Mixed types: group by kind so the order is still total.
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, status: &str, created: &str, extra: Value) -> Record {
        let mut value = json!({
            "id": id,
            "status": status,
            "createdAt": created,
            "updatedAt": created,
        });
        if let (Some(obj), Value::Object(extra)) = (value.as_object_mut(), extra) {
            obj.extend(extra);
        }
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn eq_filters_are_anded() {
        let records = vec![
            record("a", "open", "2024-01-01T00:00:00Z", json!({"assignedTo": "x@y"})),
            record("b", "open", "2024-01-02T00:00:00Z", json!({"assignedTo": "z@y"})),
            record("c", "closed", "2024-01-03T00:00:00Z", json!({"assignedTo": "x@y"})),
        ];

        let query = Query::all()
            .filter(FieldFilter::eq("assignedTo", "x@y"))
            .filter(FieldFilter::eq("status", "open"));

        let ids: Vec<_> = query.apply(records).into_iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].as_str(), "a");
    }

    #[test]
    fn newest_first_orders_by_created_at() {
        let records = vec![
            record("old", "open", "2024-01-01T00:00:00Z", json!({})),
            record("new", "open", "2024-02-01T00:00:00Z", json!({})),
            record("mid", "open", "2024-01-15T00:00:00Z", json!({})),
        ];

        let sorted = Query::all().order_by(OrderBy::newest_first()).apply(records);
        let ids: Vec<_> = sorted.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["new", "mid", "old"]);
    }

    #[test]
    fn missing_sort_field_sorts_last() {
        let records = vec![
            record("none", "open", "2024-01-01T00:00:00Z", json!({})),
            record("two", "open", "2024-01-01T00:00:00Z", json!({"views": 2})),
            record("ten", "open", "2024-01-01T00:00:00Z", json!({"views": 10})),
        ];

        let order = OrderBy {
            field: "views".to_string(),
            direction: Direction::Descending,
        };
        let sorted = Query::all().order_by(order).apply(records);
        let ids: Vec<_> = sorted.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["ten", "two", "none"]);
    }

    #[test]
    fn and_merges_filters_and_prefers_later_order() {
        let scope = Query::all()
            .filter(FieldFilter::eq("assignedTo", "x@y"))
            .order_by(OrderBy::newest_first());
        let caller = Query::all().filter(FieldFilter::eq("status", "open"));

        let merged = scope.and(caller);
        assert_eq!(merged.filters.len(), 2);
        assert_eq!(merged.order_by, Some(OrderBy::newest_first()));
    }
}
