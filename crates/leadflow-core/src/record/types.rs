//! Record value types.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Status;
use crate::error::ValidationError;
use crate::types::{ActorId, RecordId};

/// A record as read back from a store.
///
/// Payload fields that are not part of the fixed schema are flattened into
/// the same JSON object, so `{"id": "..", "status": "new", "title": "..."}`
/// round-trips with `title` landing in [`Record::fields`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Store-assigned identifier. Never changes after creation.
    pub id: RecordId,

    /// Current workflow stage.
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ActorId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<ActorId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_by: Option<ActorId>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Domain payload (title, description, tags, counters, ...).
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Returns the value of a field by its wire name.
    ///
    /// Fixed fields are addressed by their camelCase names (`status`,
    /// `assignedTo`, `createdAt`, ...); anything else is looked up in the
    /// payload.
    pub fn field(&self, name: &str) -> Option<Value> {
        let actor = |a: &Option<ActorId>| a.as_ref().map(|a| Value::String(a.to_string()));
        match name {
            "id" => Some(Value::String(self.id.to_string())),
            "status" => Some(Value::String(self.status.to_string())),
            "createdBy" => actor(&self.created_by),
            "assignedTo" => actor(&self.assigned_to),
            "assignedBy" => actor(&self.assigned_by),
            "createdAt" => Some(Value::String(self.created_at.to_rfc3339())),
            "updatedAt" => Some(Value::String(self.updated_at.to_rfc3339())),
            other => self.fields.get(other).cloned(),
        }
    }

    /// Returns a field rendered as searchable text.
    ///
    /// Strings are returned as-is, numbers and booleans are formatted, and
    /// arrays of scalars (e.g. `tags`) are joined with spaces. Objects and
    /// nulls have no text form.
    pub fn text_field(&self, name: &str) -> Option<Cow<'_, str>> {
        fn actor(a: &Option<ActorId>) -> Option<Cow<'_, str>> {
            a.as_ref().map(|a| Cow::Borrowed(a.as_str()))
        }
        match name {
            "id" => Some(Cow::Borrowed(self.id.as_str())),
            "status" => Some(Cow::Borrowed(self.status.as_str())),
            "createdBy" => actor(&self.created_by),
            "assignedTo" => actor(&self.assigned_to),
            "assignedBy" => actor(&self.assigned_by),
            other => self.fields.get(other).and_then(value_text),
        }
    }

    /// Apply a partial update in place.
    pub fn apply_patch(&mut self, patch: &RecordPatch) {
        if let Some(status) = &patch.status {
            self.status = status.clone();
        }
        if let Some(to) = &patch.assigned_to {
            self.assigned_to = Some(to.clone());
        }
        if let Some(by) = &patch.assigned_by {
            self.assigned_by = Some(by.clone());
        }
        for (key, value) in &patch.fields {
            self.fields.insert(key.clone(), value.clone());
        }
        self.updated_at = patch.updated_at;
    }

    /// Split a record back into its id and stored document.
    pub fn into_parts(self) -> (RecordId, Document) {
        (
            self.id,
            Document {
                status: self.status,
                created_by: self.created_by,
                assigned_to: self.assigned_to,
                assigned_by: self.assigned_by,
                created_at: self.created_at,
                updated_at: self.updated_at,
                fields: self.fields,
            },
        )
    }
}

/// Wire names of the fixed record fields. A payload may not reuse them,
/// since the flattened JSON would then carry the key twice.
pub const RESERVED_FIELDS: [&str; 7] = [
    "id",
    "status",
    "createdBy",
    "assignedTo",
    "assignedBy",
    "createdAt",
    "updatedAt",
];

/// Reject payloads that use a reserved field name.
pub fn check_payload(fields: &Map<String, Value>) -> Result<(), ValidationError> {
    match RESERVED_FIELDS.iter().find(|name| fields.contains_key(**name)) {
        Some(name) => Err(ValidationError::ReservedField {
            field: name.to_string(),
        }),
        None => Ok(()),
    }
}

fn value_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Array(items) => {
            let parts: Vec<Cow<'_, str>> = items
                .iter()
                .filter(|v| !v.is_array())
                .filter_map(value_text)
                .collect();
            Some(Cow::Owned(parts.join(" ")))
        }
        Value::Null | Value::Object(_) => None,
    }
}

/// The payload written to a store by `add_document`.
///
/// Identical to [`Record`] minus the id, which the store assigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_by: Option<ActorId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Attach a store-assigned id.
    pub fn into_record(self, id: RecordId) -> Record {
        Record {
            id,
            status: self.status,
            created_by: self.created_by,
            assigned_to: self.assigned_to,
            assigned_by: self.assigned_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            fields: self.fields,
        }
    }
}

/// Form input for a new record.
///
/// Timestamps and `createdBy` are filled in by the workflow when the
/// record is written.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewRecord {
    pub status: Option<Status>,
    pub assigned_to: Option<ActorId>,
    pub fields: Map<String, Value>,
}

impl NewRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn assigned_to(mut self, actor: ActorId) -> Self {
        self.assigned_to = Some(actor);
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A partial update. `None` fields are left untouched by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_by: Option<ActorId>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RecordPatch {
    /// A patch that only bumps `updatedAt`.
    pub fn touch(updated_at: DateTime<Utc>) -> Self {
        Self {
            status: None,
            assigned_to: None,
            assigned_by: None,
            updated_at,
            fields: Map::new(),
        }
    }
}

/// Who a status change is performed on behalf of.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorMetadata {
    /// Reassign the record to this actor as part of the change.
    pub assign_to: Option<ActorId>,
}

impl ActorMetadata {
    /// Change the status without touching the assignment.
    pub fn none() -> Self {
        Self::default()
    }

    /// Change the status and hand the record to `actor`.
    pub fn assign(actor: ActorId) -> Self {
        Self {
            assign_to: Some(actor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Record {
        serde_json::from_value(json!({
            "id": "lead1",
            "status": "new",
            "createdBy": "ops@example.com",
            "assignedTo": "sam@example.com",
            "createdAt": "2024-03-01T10:00:00Z",
            "updatedAt": "2024-03-01T10:00:00Z",
            "title": "Grade 10 physics tutor",
            "tags": ["physics", "cbse"],
            "views": 12
        }))
        .unwrap()
    }

    #[test]
    fn payload_is_flattened() {
        let record = sample();
        assert_eq!(record.id.as_str(), "lead1");
        assert_eq!(record.fields["title"], "Grade 10 physics tutor");
        assert!(!record.fields.contains_key("status"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["title"], "Grade 10 physics tutor");
        assert_eq!(value["assignedTo"], "sam@example.com");
        assert!(value.get("assignedBy").is_none());
    }

    #[test]
    fn text_fields_cover_owner_fields_and_payload() {
        let record = sample();
        assert_eq!(record.text_field("assignedTo").unwrap(), "sam@example.com");
        assert_eq!(record.text_field("tags").unwrap(), "physics cbse");
        assert_eq!(record.text_field("views").unwrap(), "12");
        assert!(record.text_field("assignedBy").is_none());
        assert!(record.text_field("missing").is_none());
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut record = sample();
        let later = record.updated_at + chrono::Duration::minutes(5);
        let patch = RecordPatch {
            status: Some(Status::new("contacted").unwrap()),
            ..RecordPatch::touch(later)
        };

        record.apply_patch(&patch);

        assert_eq!(record.status.as_str(), "contacted");
        assert_eq!(record.assigned_to.as_ref().unwrap().as_str(), "sam@example.com");
        assert_eq!(record.updated_at, later);
        assert_eq!(record.fields["views"], 12);
    }

    #[test]
    fn reserved_names_are_rejected_in_payloads() {
        let mut fields = Map::new();
        fields.insert("title".into(), json!("ok"));
        assert!(check_payload(&fields).is_ok());

        fields.insert("status".into(), json!("hot"));
        let err = check_payload(&fields).unwrap_err();
        assert!(matches!(err, ValidationError::ReservedField { field } if field == "status"));
    }

    #[test]
    fn patch_serializes_as_partial_payload() {
        let at: DateTime<Utc> = "2024-03-02T00:00:00Z".parse().unwrap();
        let patch = RecordPatch {
            status: Some(Status::new("resolved").unwrap()),
            ..RecordPatch::touch(at)
        };
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            value,
            json!({"status": "resolved", "updatedAt": "2024-03-02T00:00:00Z"})
        );
    }
}
