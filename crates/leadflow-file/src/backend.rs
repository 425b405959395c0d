//! [`DocumentStore`] implementation over a [`FileStore`].

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, instrument};

use leadflow_core::error::ValidationError;
use leadflow_core::record::{Document, Record, RecordPatch};
use leadflow_core::traits::{DocumentStore, Subscription};
use leadflow_core::types::{CollectionName, RecordId, StoreUrl};
use leadflow_core::{Query, Result};

use crate::store::FileStore;
use crate::subscription::{self, ActiveSubscriptions};

/// Filesystem-backed document store.
#[derive(Debug, Clone)]
pub struct FileBackend {
    store: FileStore,
    url: StoreUrl,
    active: ActiveSubscriptions,
}

impl FileBackend {
    /// Create a backend rooted at `root`, identified by `url`.
    pub fn new(root: impl AsRef<Path>, url: StoreUrl) -> Self {
        Self {
            store: FileStore::new(root),
            url,
            active: ActiveSubscriptions::default(),
        }
    }

    /// Open the store a `file://` URL points at.
    pub fn open(url: &StoreUrl) -> Result<Self> {
        let root = url.to_file_path().ok_or_else(|| ValidationError::StoreUrl {
            value: url.to_string(),
            reason: "not a file:// URL".to_string(),
        })?;
        Ok(Self::new(root, url.clone()))
    }

    pub fn url(&self) -> &StoreUrl {
        &self.url
    }

    /// Access the underlying file store.
    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// Number of subscription producers still running.
    pub fn active_subscriptions(&self) -> usize {
        self.active.count()
    }
}

#[async_trait]
impl DocumentStore for FileBackend {
    #[instrument(skip(self, query), fields(url = %self.url, %collection))]
    fn subscribe_collection(
        &self,
        collection: &CollectionName,
        query: Query,
    ) -> Result<Subscription> {
        debug!("Subscribing to collection");
        subscription::subscribe(self.store.clone(), &self.active, collection, query)
    }

    #[instrument(skip(self, document), fields(url = %self.url, %collection))]
    async fn add_document(
        &self,
        collection: &CollectionName,
        document: &Document,
    ) -> Result<RecordId> {
        debug!("Adding document");
        self.store.create_record(collection, document)
    }

    #[instrument(skip(self), fields(url = %self.url, %collection, %id))]
    async fn get_document(&self, collection: &CollectionName, id: &RecordId) -> Result<Record> {
        debug!("Getting document");
        self.store.get_record(collection, id)
    }

    #[instrument(skip(self, patch), fields(url = %self.url, %collection, %id))]
    async fn update_document(
        &self,
        collection: &CollectionName,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<()> {
        debug!("Updating document");
        self.store.update_record(collection, id, patch)
    }

    #[instrument(skip(self), fields(url = %self.url, %collection, %id))]
    async fn delete_document(&self, collection: &CollectionName, id: &RecordId) -> Result<()> {
        debug!("Deleting document");
        self.store.delete_record(collection, id)
    }
}
