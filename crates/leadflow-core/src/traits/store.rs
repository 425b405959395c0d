//! Document store trait.

use async_trait::async_trait;

use crate::Result;
use crate::query::Query;
use crate::record::{Document, Record, RecordPatch};
use crate::types::{CollectionName, RecordId};

use super::Subscription;

/// A document store with live queries.
///
/// This is the whole surface the workflow needs from a backend. Stores
/// resolve concurrent writes last-write-wins and never set timestamps;
/// those arrive in the payload from the writer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open a standing live query.
    ///
    /// The subscription yields the full matching set immediately and again
    /// after every change to the collection. Dropping it (or calling
    /// [`Subscription::unsubscribe`]) releases the query.
    fn subscribe_collection(
        &self,
        collection: &CollectionName,
        query: Query,
    ) -> Result<Subscription>;

    /// Store a new document and return its assigned id.
    async fn add_document(
        &self,
        collection: &CollectionName,
        document: &Document,
    ) -> Result<RecordId>;

    /// Fetch a single record.
    async fn get_document(&self, collection: &CollectionName, id: &RecordId) -> Result<Record>;

    /// Apply a partial update to an existing record.
    async fn update_document(
        &self,
        collection: &CollectionName,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<()>;

    /// Remove a record permanently.
    async fn delete_document(&self, collection: &CollectionName, id: &RecordId) -> Result<()>;
}
