//! A subscription combined with client-side filter state.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::trace;

use crate::Result;
use crate::filter::ClientFilter;
use crate::record::Record;
use crate::traits::{Snapshot, Subscription};

/// What a dashboard renders after each update.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    /// Every record in the latest snapshot, in store order.
    pub records: Vec<Record>,
    /// The records passing the current client filter.
    pub visible: Vec<Record>,
    pub revision: u64,
    pub filter: ClientFilter,
}

/// Cloneable handle for changing a view's filter from elsewhere (an input
/// box, a status dropdown).
#[derive(Debug, Clone)]
pub struct FilterHandle {
    tx: Arc<watch::Sender<ClientFilter>>,
}

impl FilterHandle {
    pub fn set(&self, filter: ClientFilter) {
        self.tx.send_replace(filter);
    }

    pub fn set_search(&self, search: impl Into<String>) {
        let search = search.into();
        self.tx.send_modify(|f| f.search = search);
    }

    pub fn current(&self) -> ClientFilter {
        self.tx.borrow().clone()
    }
}

/// Live view over one subscription.
///
/// Each call to [`next`](Self::next) waits for either a new snapshot or a
/// filter change and returns the re-derived [`ViewState`]. Filter changes
/// are debounced: a burst of edits produces one update once input has been
/// quiet for the configured interval.
pub struct LiveView {
    subscription: Subscription,
    filter_tx: Arc<watch::Sender<ClientFilter>>,
    filter_rx: watch::Receiver<ClientFilter>,
    search_fields: Vec<String>,
    debounce: Duration,
    latest: Option<Snapshot>,
}

impl LiveView {
    pub fn new(
        subscription: Subscription,
        filter: ClientFilter,
        search_fields: Vec<String>,
        debounce: Duration,
    ) -> Self {
        let (tx, filter_rx) = watch::channel(filter);
        Self {
            subscription,
            filter_tx: Arc::new(tx),
            filter_rx,
            search_fields,
            debounce,
            latest: None,
        }
    }

    pub fn filter_handle(&self) -> FilterHandle {
        FilterHandle {
            tx: self.filter_tx.clone(),
        }
    }

    pub fn set_filter(&self, filter: ClientFilter) {
        self.filter_tx.send_replace(filter);
    }

    /// The state derived from the last snapshot, if one has arrived.
    pub fn current(&self) -> Option<ViewState> {
        self.latest.as_ref().map(|snapshot| self.render(snapshot))
    }

    /// Wait for the next snapshot or filter change.
    ///
    /// Returns `None` once the underlying subscription has ended.
    pub async fn next(&mut self) -> Option<Result<ViewState>> {
        loop {
            tokio::select! {
                item = self.subscription.next() => {
                    return match item? {
                        Ok(snapshot) => {
                            trace!(revision = snapshot.revision, "Snapshot received");
                            let state = self.render(&snapshot);
                            self.latest = Some(snapshot);
                            Some(Ok(state))
                        }
                        Err(err) => Some(Err(err)),
                    };
                }
                changed = self.filter_rx.changed() => {
                    if changed.is_err() {
                        continue;
                    }
                    self.settle_filter().await;
                    if let Some(state) = self.current() {
                        return Some(Ok(state));
                    }
                }
            }
        }
    }

    /// Release the subscription.
    pub fn close(self) {
        self.subscription.unsubscribe();
    }

    async fn settle_filter(&mut self) {
        while let Ok(Ok(())) = tokio::time::timeout(self.debounce, self.filter_rx.changed()).await
        {
            trace!("Filter still changing");
        }
        self.filter_rx.borrow_and_update();
    }

    fn render(&self, snapshot: &Snapshot) -> ViewState {
        let filter = self.filter_rx.borrow().clone();
        ViewState {
            visible: filter.apply(&snapshot.records, &self.search_fields),
            records: snapshot.records.clone(),
            revision: snapshot.revision,
            filter,
        }
    }
}

impl std::fmt::Debug for LiveView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveView")
            .field("subscription", &self.subscription)
            .field("debounce", &self.debounce)
            .field("revision", &self.latest.as_ref().map(|s| s.revision))
            .finish_non_exhaustive()
    }
}
