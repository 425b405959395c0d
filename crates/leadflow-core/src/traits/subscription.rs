//! Live query subscription handle.

use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures_core::Stream;
use tokio::sync::mpsc;
use tracing::debug;

use crate::Result;
use crate::record::Record;
use crate::types::CollectionName;

/// The full matching result set at one point in time.
///
/// Every emission replaces the previous one; there are no diffs.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub records: Vec<Record>,
    /// Store-specific change counter; increases with every mutation seen.
    pub revision: u64,
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(records: Vec<Record>, revision: u64) -> Self {
        Self {
            records,
            revision,
            taken_at: Utc::now(),
        }
    }
}

/// A standing live query and its single cancellation handle.
///
/// The store side keeps producing snapshots until this value is dropped or
/// [`unsubscribe`](Self::unsubscribe) is called.
pub struct Subscription {
    collection: CollectionName,
    inner: Pin<Box<dyn Stream<Item = Result<Snapshot>> + Send>>,
}

impl Subscription {
    /// Wrap any snapshot stream.
    pub fn new<S>(collection: CollectionName, stream: S) -> Self
    where
        S: Stream<Item = Result<Snapshot>> + Send + 'static,
    {
        Self {
            collection,
            inner: Box::pin(stream),
        }
    }

    /// Wrap the receiving end of a producer task's channel.
    ///
    /// Producers should stop once `Sender::closed` resolves, which happens
    /// when this subscription is dropped.
    pub fn from_receiver(
        collection: CollectionName,
        mut rx: mpsc::Receiver<Result<Snapshot>>,
    ) -> Self {
        let stream = async_stream::stream! {
            while let Some(item) = rx.recv().await {
                yield item;
            }
        };
        Self::new(collection, stream)
    }

    pub fn collection(&self) -> &CollectionName {
        &self.collection
    }

    /// Stop receiving updates and release the live query.
    pub fn unsubscribe(self) {
        debug!(collection = %self.collection, "Unsubscribing");
    }
}

impl Stream for Subscription {
    type Item = Result<Snapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}
