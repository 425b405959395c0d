//! In-process document store.
//!
//! `MemoryStore` keeps collections in a mutex-guarded map and wakes every
//! live subscription through a `watch` channel carrying the store revision.
//! Subscriptions skip wakeups that leave their own result set unchanged.
//! It also supports failure injection and call counting, which makes it the
//! store of choice for exercising workflow error paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tracing::{debug, instrument};

use crate::Result;
use crate::error::{BackendError, Error, PermissionError};
use crate::query::Query;
use crate::record::{Document, Record, RecordPatch, check_payload};
use crate::traits::{DocumentStore, Snapshot, Subscription};
use crate::types::{CollectionName, RecordId};

/// Store operations, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Subscribe,
    Add,
    Get,
    Update,
    Delete,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::Subscribe => "subscribe_collection",
            Operation::Add => "add_document",
            Operation::Get => "get_document",
            Operation::Update => "update_document",
            Operation::Delete => "delete_document",
        }
    }
}

/// The kind of failure to inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Unavailable,
    PermissionDenied,
}

#[derive(Default)]
struct State {
    collections: BTreeMap<CollectionName, BTreeMap<RecordId, Record>>,
    revision: u64,
    failures: HashMap<Operation, (FailureKind, usize)>,
    calls: HashMap<Operation, usize>,
}

struct Inner {
    state: Mutex<State>,
    changes: watch::Sender<u64>,
    active: AtomicUsize,
}

/// In-process document store with live queries.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("revision", &*self.inner.changes.borrow())
            .field("active_subscriptions", &self.active_subscriptions())
            .finish()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                changes,
                active: AtomicUsize::new(0),
            }),
        }
    }

    /// Make the next `times` calls of `operation` fail with `kind`.
    pub fn fail_next(&self, operation: Operation, kind: FailureKind, times: usize) {
        self.lock().failures.insert(operation, (kind, times));
    }

    /// How many times `operation` has been called, failed calls included.
    pub fn calls(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Number of subscriptions whose producer task is still running.
    pub fn active_subscriptions(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another caller panicked mid-call; the
        // map itself is still consistent.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call and consume one injected failure, if any.
    fn enter(&self, state: &mut State, operation: Operation) -> Result<()> {
        *state.calls.entry(operation).or_default() += 1;

        let Some((kind, remaining)) = state.failures.get_mut(&operation) else {
            return Ok(());
        };
        if *remaining == 0 {
            return Ok(());
        }
        *remaining -= 1;

        let name = operation.name();
        Err(match kind {
            FailureKind::Unavailable => BackendError::new(name, "injected outage").into(),
            FailureKind::PermissionDenied => PermissionError::Store {
                operation: name,
                message: "injected rejection".to_string(),
            }
            .into(),
        })
    }

    fn commit(&self, state: &mut State) {
        state.revision += 1;
        self.inner.changes.send_replace(state.revision);
    }

    fn snapshot(&self, collection: &CollectionName, query: &Query) -> Snapshot {
        let state = self.lock();
        let records = state
            .collections
            .get(collection)
            .map(|docs| query.apply(docs.values().cloned()))
            .unwrap_or_default();
        Snapshot::new(records, state.revision)
    }
}

struct ActiveGuard(Arc<Inner>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn subscribe_collection(
        &self,
        collection: &CollectionName,
        query: Query,
    ) -> Result<Subscription> {
        {
            let mut state = self.lock();
            self.enter(&mut state, Operation::Subscribe)?;
        }

        let (tx, rx) = mpsc::channel::<Result<Snapshot>>(16);
        let mut changes = self.inner.changes.subscribe();
        let store = self.clone();
        let name = collection.clone();

        self.inner.active.fetch_add(1, Ordering::SeqCst);
        let guard = ActiveGuard(self.inner.clone());

        tokio::spawn(async move {
            let _guard = guard;
            // The revision is store-wide, so a write to another collection
            // wakes us too. Only forward snapshots whose records changed.
            let mut last: Option<Vec<Record>> = None;
            loop {
                let snapshot = store.snapshot(&name, &query);
                if last.as_ref() != Some(&snapshot.records) {
                    last = Some(snapshot.records.clone());
                    if tx.send(Ok(snapshot)).await.is_err() {
                        break;
                    }
                }
                tokio::select! {
                    _ = tx.closed() => break,
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(collection = %name, "Memory subscription closed");
        });

        Ok(Subscription::from_receiver(collection.clone(), rx))
    }

    #[instrument(skip(self, document), fields(%collection))]
    async fn add_document(
        &self,
        collection: &CollectionName,
        document: &Document,
    ) -> Result<RecordId> {
        let mut state = self.lock();
        self.enter(&mut state, Operation::Add)?;
        check_payload(&document.fields)?;

        let id = RecordId::generate();
        let record = document.clone().into_record(id.clone());
        state
            .collections
            .entry(collection.clone())
            .or_default()
            .insert(id.clone(), record);
        self.commit(&mut state);

        debug!(%id, "Added document");
        Ok(id)
    }

    async fn get_document(&self, collection: &CollectionName, id: &RecordId) -> Result<Record> {
        let mut state = self.lock();
        self.enter(&mut state, Operation::Get)?;

        state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
            .ok_or_else(|| Error::not_found(collection, id))
    }

    #[instrument(skip(self, patch), fields(%collection, %id))]
    async fn update_document(
        &self,
        collection: &CollectionName,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<()> {
        let mut state = self.lock();
        self.enter(&mut state, Operation::Update)?;
        check_payload(&patch.fields)?;

        let record = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| Error::not_found(collection, id))?;
        record.apply_patch(patch);
        self.commit(&mut state);

        debug!("Updated document");
        Ok(())
    }

    #[instrument(skip(self), fields(%collection, %id))]
    async fn delete_document(&self, collection: &CollectionName, id: &RecordId) -> Result<()> {
        let mut state = self.lock();
        self.enter(&mut state, Operation::Delete)?;

        let removed = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id));
        if removed.is_none() {
            return Err(Error::not_found(collection, id));
        }
        self.commit(&mut state);

        debug!("Deleted document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Status;
    use chrono::Utc;
    use futures_util::StreamExt;
    use serde_json::Map;
    use std::time::Duration;

    fn leads() -> CollectionName {
        CollectionName::new("leads").unwrap()
    }

    fn doc(status: &str) -> Document {
        let now = Utc::now();
        Document {
            status: Status::new(status).unwrap(),
            created_by: None,
            assigned_to: None,
            assigned_by: None,
            created_at: now,
            updated_at: now,
            fields: Map::new(),
        }
    }

    async fn next(sub: &mut Subscription) -> Snapshot {
        tokio::time::timeout(Duration::from_secs(2), sub.next())
            .await
            .expect("snapshot in time")
            .expect("stream open")
            .expect("snapshot ok")
    }

    #[tokio::test]
    async fn subscription_delivers_full_snapshots() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe_collection(&leads(), Query::all()).unwrap();

        assert!(next(&mut sub).await.records.is_empty());

        store.add_document(&leads(), &doc("new")).await.unwrap();
        assert_eq!(next(&mut sub).await.records.len(), 1);

        store.add_document(&leads(), &doc("contacted")).await.unwrap();
        let snapshot = next(&mut sub).await;
        assert_eq!(snapshot.records.len(), 2);
        assert_eq!(snapshot.revision, 2);
    }

    #[tokio::test]
    async fn other_collections_do_not_leak_in() {
        let store = MemoryStore::new();
        let posts = CollectionName::new("posts").unwrap();
        store.add_document(&posts, &doc("draft")).await.unwrap();

        let mut sub = store.subscribe_collection(&leads(), Query::all()).unwrap();
        assert!(next(&mut sub).await.records.is_empty());
    }

    #[tokio::test]
    async fn writes_elsewhere_do_not_resend_identical_snapshots() {
        let store = MemoryStore::new();
        let tickets = CollectionName::new("tickets").unwrap();
        let mut sub = store.subscribe_collection(&leads(), Query::all()).unwrap();
        assert!(next(&mut sub).await.records.is_empty());

        store.add_document(&tickets, &doc("open")).await.unwrap();
        store.add_document(&tickets, &doc("open")).await.unwrap();
        let quiet = tokio::time::timeout(Duration::from_millis(200), sub.next()).await;
        assert!(quiet.is_err(), "unexpected snapshot: {:?}", quiet);

        store.add_document(&leads(), &doc("new")).await.unwrap();
        let snapshot = next(&mut sub).await;
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.revision, 3);
    }

    #[tokio::test]
    async fn reserved_payload_keys_are_refused() {
        let store = MemoryStore::new();
        let mut document = doc("new");
        document
            .fields
            .insert("assignedTo".into(), serde_json::json!("kim@example.com"));

        let err = store.add_document(&leads(), &document).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.lock().collections.is_empty());
    }

    #[tokio::test]
    async fn dropping_subscription_stops_producer() {
        let store = MemoryStore::new();
        let mut sub = store.subscribe_collection(&leads(), Query::all()).unwrap();
        next(&mut sub).await;
        assert_eq!(store.active_subscriptions(), 1);

        sub.unsubscribe();

        tokio::time::timeout(Duration::from_secs(2), async {
            while store.active_subscriptions() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("producer task exits after unsubscribe");
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let store = MemoryStore::new();
        store.fail_next(Operation::Add, FailureKind::Unavailable, 1);

        let err = store.add_document(&leads(), &doc("new")).await.unwrap_err();
        assert!(err.is_transient());
        assert!(store.add_document(&leads(), &doc("new")).await.is_ok());
        assert_eq!(store.calls(Operation::Add), 2);
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let store = MemoryStore::new();
        let id = RecordId::new("nope").unwrap();
        let err = store.delete_document(&leads(), &id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let patch = RecordPatch::touch(Utc::now());
        let err = store.update_document(&leads(), &id, &patch).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
