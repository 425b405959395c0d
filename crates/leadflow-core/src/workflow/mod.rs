//! The live filtered record workflow.
//!
//! [`RecordWorkflow`] ties one collection of a [`DocumentStore`] to one
//! signed-in [`Actor`]. It opens role-scoped live queries, derives filtered
//! views, and performs the status/delete actions a dashboard offers.
//!
//! Local state is never patched optimistically. After a write the caller
//! keeps rendering snapshots and the change shows up in the next one.

mod confirm;
mod live_view;
mod retry;

pub use confirm::{Confirm, Decline, Preconfirmed};
pub use live_view::{FilterHandle, LiveView, ViewState};
pub use retry::RetryPolicy;

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::Result;
use crate::error::{Error, PermissionError, ValidationError};
use crate::filter::{ClientFilter, DEFAULT_SEARCH_FIELDS, StatusFilter, apply_client_filter};
use crate::query::Query;
use crate::record::{
    ActorMetadata, Document, NewRecord, Record, RecordPatch, Status, StatusSet, TransitionPolicy,
    check_payload,
};
use crate::role::Actor;
use crate::traits::{DocumentStore, Subscription};
use crate::types::{CollectionName, RecordId};

/// Per-collection workflow settings.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub retry: RetryPolicy,
    /// Text fields the search box matches against.
    pub search_fields: Vec<String>,
    /// Quiet period before a filter edit is applied to a live view.
    pub debounce: Duration,
    pub transitions: TransitionPolicy,
    /// Status vocabulary; its initial status is used for new records.
    pub statuses: StatusSet,
    /// Payload fields a new record must carry.
    pub required_fields: Vec<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            search_fields: DEFAULT_SEARCH_FIELDS.iter().map(|s| s.to_string()).collect(),
            debounce: Duration::from_millis(150),
            transitions: TransitionPolicy::Open,
            statuses: StatusSet::leads(),
            required_fields: Vec::new(),
        }
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user declined; the store was not contacted.
    Cancelled,
}

/// Role-scoped live workflow over one collection.
#[derive(Debug, Clone)]
pub struct RecordWorkflow<S> {
    store: S,
    collection: CollectionName,
    actor: Actor,
    config: WorkflowConfig,
}

impl<S: DocumentStore> RecordWorkflow<S> {
    pub fn new(store: S, collection: CollectionName, actor: Actor) -> Self {
        Self::with_config(store, collection, actor, WorkflowConfig::default())
    }

    pub fn with_config(
        store: S,
        collection: CollectionName,
        actor: Actor,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            store,
            collection,
            actor,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn collection(&self) -> &CollectionName {
        &self.collection
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Open a live query: the actor's role scope ANDed with `filter`.
    ///
    /// Calling this again re-issues the query from scratch.
    #[instrument(skip(self), fields(collection = %self.collection, actor = %self.actor.id))]
    pub async fn subscribe(&self, filter: Query) -> Result<Subscription> {
        let query = self.actor.scope().and(filter);
        let result = self
            .config
            .retry
            .run("subscribe_collection", || async {
                self.store
                    .subscribe_collection(&self.collection, query.clone())
            })
            .await;
        self.report("subscribe", result)
    }

    /// Subscribe and wrap the stream in a [`LiveView`] with `filter` applied.
    pub async fn live_view(&self, query: Query, filter: ClientFilter) -> Result<LiveView> {
        let subscription = self.subscribe(query).await?;
        Ok(LiveView::new(
            subscription,
            filter,
            self.config.search_fields.clone(),
            self.config.debounce,
        ))
    }

    /// Apply the search box and status dropdown to a snapshot.
    pub fn apply_client_filter(
        &self,
        records: &[Record],
        search_term: &str,
        status: &StatusFilter,
    ) -> Vec<Record> {
        apply_client_filter(records, &self.config.search_fields, search_term, status)
    }

    /// Validate a form submission and write it as a new record.
    #[instrument(skip(self, new), fields(collection = %self.collection, actor = %self.actor.id))]
    pub async fn create_record(&self, new: NewRecord) -> Result<RecordId> {
        let result = self.create_inner(new).await;
        self.report("create", result)
    }

    async fn create_inner(&self, new: NewRecord) -> Result<RecordId> {
        check_payload(&new.fields)?;
        for field in &self.config.required_fields {
            let present = new.fields.get(field).is_some_and(|value| match value {
                serde_json::Value::Null => false,
                serde_json::Value::String(s) => !s.trim().is_empty(),
                _ => true,
            });
            if !present {
                return Err(ValidationError::MissingField {
                    field: field.clone(),
                }
                .into());
            }
        }

        if new.assigned_to.is_some() && !self.actor.role.can_assign() {
            return Err(self.role_denied("assign", "new"));
        }

        let now = Utc::now();
        let assigned_by = new.assigned_to.as_ref().map(|_| self.actor.id.clone());
        let document = Document {
            status: new
                .status
                .unwrap_or_else(|| self.config.statuses.initial().clone()),
            created_by: Some(self.actor.id.clone()),
            assigned_to: new.assigned_to,
            assigned_by,
            created_at: now,
            updated_at: now,
            fields: new.fields,
        };

        let id = self
            .config
            .retry
            .run("add_document", || {
                self.store.add_document(&self.collection, &document)
            })
            .await?;

        info!(%id, status = %document.status, "Record created");
        Ok(id)
    }

    /// Fetch one record, subject to the actor's visibility scope.
    pub async fn get_record(&self, id: &RecordId) -> Result<Record> {
        let result = self.fetch_visible(id).await;
        self.report("get", result)
    }

    async fn fetch_visible(&self, id: &RecordId) -> Result<Record> {
        let record = self
            .config
            .retry
            .run("get_document", || self.store.get_document(&self.collection, id))
            .await?;

        if !self.actor.scope().matches(&record) && !self.actor.can_update(&record) {
            return Err(self.role_denied("read", id.as_str()));
        }
        Ok(record)
    }

    /// Move a record to `status`, optionally reassigning it.
    ///
    /// Returns the record as the store will hold it once the write lands.
    /// The new `updatedAt` is never earlier than the previous one.
    #[instrument(skip(self, id, status, meta), fields(collection = %self.collection, %id, %status))]
    pub async fn update_status(
        &self,
        id: &RecordId,
        status: Status,
        meta: ActorMetadata,
    ) -> Result<Record> {
        let result = self.update_inner(id, status, meta).await;
        self.report("update status", result)
    }

    async fn update_inner(
        &self,
        id: &RecordId,
        status: Status,
        meta: ActorMetadata,
    ) -> Result<Record> {
        let mut record = self.fetch_visible(id).await?;

        if !self.actor.can_update(&record) {
            return Err(self.role_denied("update", id.as_str()));
        }
        if meta.assign_to.is_some() && !self.actor.role.can_assign() {
            return Err(self.role_denied("reassign", id.as_str()));
        }
        self.config.transitions.check(&record.status, &status)?;

        let assigned_by = meta.assign_to.as_ref().map(|_| self.actor.id.clone());
        let patch = RecordPatch {
            status: Some(status),
            assigned_to: meta.assign_to,
            assigned_by,
            ..RecordPatch::touch(Utc::now().max(record.updated_at))
        };

        self.config
            .retry
            .run("update_document", || {
                self.store.update_document(&self.collection, id, &patch)
            })
            .await?;

        let from = record.status.clone();
        record.apply_patch(&patch);
        info!(%from, to = %record.status, "Status updated");
        Ok(record)
    }

    /// Delete a record after asking `confirm`.
    ///
    /// A declined prompt returns [`DeleteOutcome::Cancelled`] without any
    /// remote call.
    #[instrument(skip(self, id, confirm), fields(collection = %self.collection, %id))]
    pub async fn delete_record(
        &self,
        id: &RecordId,
        confirm: &impl Confirm,
    ) -> Result<DeleteOutcome> {
        if !self.actor.role.can_delete() {
            return self.report("delete", Err(self.role_denied("delete", id.as_str())));
        }

        let prompt = format!(
            "Permanently delete record {} from {}? This cannot be undone.",
            id, self.collection
        );
        if !confirm.confirm(&prompt) {
            debug!("Delete cancelled by user");
            return Ok(DeleteOutcome::Cancelled);
        }

        let result = self
            .config
            .retry
            .run("delete_document", || {
                self.store.delete_document(&self.collection, id)
            })
            .await
            .map(|()| DeleteOutcome::Deleted);

        if result.is_ok() {
            info!("Record deleted");
        }
        self.report("delete", result)
    }

    fn role_denied(&self, action: &'static str, id: &str) -> Error {
        PermissionError::Role {
            role: self.actor.role.to_string(),
            action,
            id: id.to_string(),
        }
        .into()
    }

    /// Log a failed action. The caller shows `Error::user_notice`.
    fn report<T>(&self, action: &'static str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            warn!(
                action,
                collection = %self.collection,
                actor = %self.actor.id,
                error = %err,
                notice = err.user_notice(),
                "Record action failed"
            );
        }
        result
    }
}
