// Live projection store
//
// Turns source notifications into most-recent-first record lists and
// publishes them through a watch channel. Each subscription owns exactly one
// listener registration and one forwarding task.

use crate::model::Record;
use crate::query::QueryOptions;
use crate::snapshot::{project, Snapshot};
use crate::source::{ListenerId, SnapshotSource, SourceError, SourceEvent};
use crate::{HomewatchError, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Reason published when a source ends a listener without cancelling it
pub const SOURCE_CLOSED: &str = "source closed";

/// Lifecycle of a subscription as seen by the presentation layer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadState {
    /// Waiting for the first snapshot
    Loading,
    Ready,
    /// The source failed; `items` keeps the last list received
    Unavailable { reason: String },
}

/// Current projected state of one subscription
#[derive(Clone, Debug)]
pub struct Projection<T> {
    pub state: LoadState,
    /// Most-recent-first; replaced wholesale on every snapshot
    pub items: Arc<Vec<T>>,
    /// Bumped on every published change
    pub revision: u64,
}

impl<T> Projection<T> {
    fn loading() -> Self {
        Self {
            state: LoadState::Loading,
            items: Arc::new(Vec::new()),
            revision: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self.state, LoadState::Unavailable { .. })
    }
}

/// Entry point for opening subscriptions against a shared source
#[derive(Clone)]
pub struct LiveProjectionStore {
    source: Arc<dyn SnapshotSource>,
}

impl LiveProjectionStore {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self { source }
    }

    /// Open a live subscription on `path`.
    ///
    /// The query is validated before the source is touched, so an unbounded
    /// query without a sort field never opens a listener.
    pub async fn subscribe<T: Record>(
        &self,
        path: &str,
        query: QueryOptions,
    ) -> Result<Subscription<T>> {
        query.validate()?;

        let (listener, events) = self.source.listen(path, &query).await?;
        let (tx, rx) = watch::channel(Projection::loading());

        let shared = Arc::new(Shared {
            path: path.to_string(),
            query,
            inner: Mutex::new(Inner {
                closed: false,
                generation: 0,
                listener: Some(listener.clone()),
            }),
            tx,
        });
        let task = spawn_forwarder(Arc::clone(&shared), events, 0);

        info!(
            target: "store",
            collection = T::COLLECTION,
            path = %path,
            listener = %listener,
            bounded = shared.query.is_bounded(),
            "Subscription opened"
        );

        Ok(Subscription {
            shared,
            source: Arc::clone(&self.source),
            rx,
            task: Some(task),
        })
    }
}

struct Inner {
    closed: bool,
    // Incremented on retry so a superseded forwarder cannot publish
    generation: u64,
    listener: Option<ListenerId>,
}

struct Shared<T> {
    path: String,
    query: QueryOptions,
    inner: Mutex<Inner>,
    tx: watch::Sender<Projection<T>>,
}

impl<T: Record> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // The guard is held while publishing so teardown cannot interleave
    fn apply_snapshot(&self, snapshot: &Snapshot, generation: u64) -> Option<Arc<Vec<T>>> {
        let inner = self.lock();
        if inner.closed || inner.generation != generation {
            return None;
        }

        let items = Arc::new(project::<T>(snapshot, &self.query));
        debug!(
            target: "store",
            collection = T::COLLECTION,
            path = %self.path,
            count = items.len(),
            "Snapshot projected"
        );
        self.tx.send_modify(|p| {
            p.state = LoadState::Ready;
            p.items = Arc::clone(&items);
            p.revision += 1;
        });
        drop(inner);
        Some(items)
    }

    fn apply_cancel(&self, error: &SourceError, generation: u64) {
        self.mark_unavailable(error.to_string(), generation);
    }

    // The source dropped the channel; a live subscription must not keep
    // showing its last state as if nothing happened
    fn apply_closed(&self, generation: u64) {
        self.mark_unavailable(SOURCE_CLOSED.to_string(), generation);
    }

    fn mark_unavailable(&self, reason: String, generation: u64) {
        let mut inner = self.lock();
        if inner.closed || inner.generation != generation {
            return;
        }
        inner.listener = None;

        warn!(
            target: "store",
            collection = T::COLLECTION,
            path = %self.path,
            reason = %reason,
            "Subscription unavailable"
        );
        self.tx.send_modify(|p| {
            p.state = LoadState::Unavailable { reason };
            p.revision += 1;
        });
    }
}

fn spawn_forwarder<T: Record>(
    shared: Arc<Shared<T>>,
    mut events: mpsc::Receiver<SourceEvent>,
    generation: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Some(SourceEvent::Snapshot(snapshot)) => {
                    if shared.apply_snapshot(&snapshot, generation).is_none() {
                        return;
                    }
                }
                Some(SourceEvent::Cancelled(error)) => {
                    shared.apply_cancel(&error, generation);
                    return;
                }
                // Sender gone without a cancellation
                None => {
                    shared.apply_closed(generation);
                    return;
                }
            }
        }
    })
}

/// Handle for one live subscription. Dropping it unsubscribes.
pub struct Subscription<T: Record> {
    shared: Arc<Shared<T>>,
    source: Arc<dyn SnapshotSource>,
    rx: watch::Receiver<Projection<T>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Record> Subscription<T> {
    pub fn path(&self) -> &str {
        &self.shared.path
    }

    pub fn query(&self) -> &QueryOptions {
        &self.shared.query
    }

    pub fn is_active(&self) -> bool {
        !self.shared.lock().closed
    }

    /// Latest published projection
    pub fn current(&self) -> Projection<T> {
        self.rx.borrow().clone()
    }

    /// Receiver that observes every published projection
    pub fn watch(&self) -> watch::Receiver<Projection<T>> {
        self.rx.clone()
    }

    /// Wait until the next projection is published
    pub async fn changed(&mut self) -> Result<Projection<T>> {
        if !self.is_active() {
            return Err(HomewatchError::SubscriptionClosed(self.shared.path.clone()));
        }
        self.rx.changed().await.map_err(|_| {
            HomewatchError::SubscriptionClosed(self.shared.path.clone())
        })?;
        Ok(self.rx.borrow_and_update().clone())
    }

    /// React to a full snapshot. Returns the new list, or `None` once the
    /// subscription has been torn down.
    pub fn on_snapshot(&self, snapshot: &Snapshot) -> Option<Arc<Vec<T>>> {
        let generation = self.shared.lock().generation;
        self.shared.apply_snapshot(snapshot, generation)
    }

    /// Detach the listener. No projection is published afterwards.
    pub fn unsubscribe(&mut self) {
        let listener = {
            let mut inner = self.shared.lock();
            if inner.closed {
                return;
            }
            inner.closed = true;
            inner.listener.take()
        };

        if let Some(id) = &listener {
            self.source.detach(id);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        info!(
            target: "store",
            collection = T::COLLECTION,
            path = %self.shared.path,
            "Subscription closed"
        );
    }

    /// Re-open the listener, typically after the state went `Unavailable`.
    /// The last list is kept visible while loading again.
    pub async fn retry(&mut self) -> Result<()> {
        let (previous, generation) = {
            let mut inner = self.shared.lock();
            if inner.closed {
                return Err(HomewatchError::SubscriptionClosed(self.shared.path.clone()));
            }
            inner.generation += 1;
            self.shared.tx.send_modify(|p| {
                p.state = LoadState::Loading;
                p.revision += 1;
            });
            (inner.listener.take(), inner.generation)
        };
        if let Some(id) = &previous {
            self.source.detach(id);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }

        info!(target: "store", collection = T::COLLECTION, path = %self.shared.path, "Retrying subscription");
        let (listener, events) = match self.source.listen(&self.shared.path, &self.shared.query).await {
            Ok(opened) => opened,
            Err(e) => {
                let mut inner = self.shared.lock();
                if !inner.closed && inner.generation == generation {
                    inner.listener = None;
                    self.shared.tx.send_modify(|p| {
                        p.state = LoadState::Unavailable {
                            reason: e.to_string(),
                        };
                        p.revision += 1;
                    });
                }
                return Err(e);
            }
        };

        {
            let mut inner = self.shared.lock();
            if inner.closed || inner.generation != generation {
                drop(inner);
                self.source.detach(&listener);
                return Err(HomewatchError::SubscriptionClosed(self.shared.path.clone()));
            }
            inner.listener = Some(listener);
        }
        self.task = Some(spawn_forwarder(Arc::clone(&self.shared), events, generation));
        Ok(())
    }
}

impl<T: Record> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
