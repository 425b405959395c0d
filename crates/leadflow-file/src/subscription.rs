//! Live collection subscriptions for the file-backed store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use leadflow_core::error::BackendError;
use leadflow_core::{CollectionName, Query, Result, Snapshot, Subscription};

use crate::store::{CHANGES_FILE, FileStore};

const POLL_INTERVAL: Duration = Duration::from_millis(500);

fn watcher_error(err: notify::Error) -> leadflow_core::Error {
    BackendError::new(
        "subscribe_collection",
        format!("failed to watch store: {}", err),
    )
    .into()
}

/// Count of live producer tasks, shared by every clone of a backend.
#[derive(Debug, Clone, Default)]
pub(crate) struct ActiveSubscriptions(Arc<AtomicUsize>);

impl ActiveSubscriptions {
    pub(crate) fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn enter(&self) -> ActiveGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        ActiveGuard(self.0.clone())
    }
}

/// Decrements the count when the producer task exits.
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Start a producer task that re-reads `collection` whenever the change log
/// grows and sends the matching records as a full snapshot.
///
/// A filesystem watcher wakes the task promptly; a slow poll covers
/// platforms where events are dropped or coalesced.
pub(crate) fn subscribe(
    store: FileStore,
    active: &ActiveSubscriptions,
    collection: &CollectionName,
    query: Query,
) -> Result<Subscription> {
    std::fs::create_dir_all(store.root()).map_err(|e| {
        BackendError::new(
            "subscribe_collection",
            format!("failed to create store directory: {}", e),
        )
    })?;

    let (wake_tx, mut wake_rx) = mpsc::channel::<()>(1);

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else {
            return;
        };
        if !matches!(
            event.kind,
            notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
        ) {
            return;
        }
        let touches_log = event
            .paths
            .iter()
            .any(|p| p.file_name().is_some_and(|n| n == CHANGES_FILE));
        if touches_log {
            // Full channel means a wake is already pending.
            let _ = wake_tx.try_send(());
        }
    })
    .map_err(watcher_error)?;

    watcher
        .watch(store.root(), RecursiveMode::NonRecursive)
        .map_err(watcher_error)?;

    let (tx, rx) = mpsc::channel::<Result<Snapshot>>(16);
    let name = collection.clone();
    let guard = active.enter();

    tokio::spawn(async move {
        let _guard = guard;
        let _watcher = watcher;
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut seen: Option<u64> = None;

        loop {
            let revision = store.revision();
            if seen != Some(revision) {
                let item = store
                    .list_records(&name)
                    .map(|records| Snapshot::new(query.apply(records), revision));
                if item.is_ok() {
                    seen = Some(revision);
                }
                trace!(collection = %name, revision, "Sending snapshot");
                if tx.send(item).await.is_err() {
                    break;
                }
            }

            tokio::select! {
                _ = tx.closed() => break,
                _ = wake_rx.recv() => {}
                _ = interval.tick() => {}
            }
        }

        debug!(collection = %name, "File subscription closed");
    });

    Ok(Subscription::from_receiver(collection.clone(), rx))
}
