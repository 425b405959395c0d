//! Store handle used by the CLI.

use async_trait::async_trait;

use leadflow_core::{
    CollectionName, Document, DocumentStore, MemoryStore, Query, Record, RecordId, RecordPatch,
    Result, StoreUrl, Subscription,
};
use leadflow_file::FileBackend;

/// Whichever store the profile or `--store` points at.
#[derive(Debug, Clone)]
pub enum CliStore {
    File(FileBackend),
    /// Lives for one process only; handy for trying commands out.
    Memory(MemoryStore),
}

impl CliStore {
    pub fn open(url: &StoreUrl) -> Result<Self> {
        if url.is_memory() {
            Ok(CliStore::Memory(MemoryStore::new()))
        } else {
            Ok(CliStore::File(FileBackend::open(url)?))
        }
    }
}

#[async_trait]
impl DocumentStore for CliStore {
    fn subscribe_collection(
        &self,
        collection: &CollectionName,
        query: Query,
    ) -> Result<Subscription> {
        match self {
            CliStore::File(store) => store.subscribe_collection(collection, query),
            CliStore::Memory(store) => store.subscribe_collection(collection, query),
        }
    }

    async fn add_document(
        &self,
        collection: &CollectionName,
        document: &Document,
    ) -> Result<RecordId> {
        match self {
            CliStore::File(store) => store.add_document(collection, document).await,
            CliStore::Memory(store) => store.add_document(collection, document).await,
        }
    }

    async fn get_document(&self, collection: &CollectionName, id: &RecordId) -> Result<Record> {
        match self {
            CliStore::File(store) => store.get_document(collection, id).await,
            CliStore::Memory(store) => store.get_document(collection, id).await,
        }
    }

    async fn update_document(
        &self,
        collection: &CollectionName,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<()> {
        match self {
            CliStore::File(store) => store.update_document(collection, id, patch).await,
            CliStore::Memory(store) => store.update_document(collection, id, patch).await,
        }
    }

    async fn delete_document(&self, collection: &CollectionName, id: &RecordId) -> Result<()> {
        match self {
            CliStore::File(store) => store.delete_document(collection, id).await,
            CliStore::Memory(store) => store.delete_document(collection, id).await,
        }
    }
}
