// In-memory realtime store
//
// Stands in for the hosted database: collections of keyed children, listeners
// that receive the full query result after every write, and a per-path
// permission switch to exercise failure handling.

use crate::query::QueryOptions;
use crate::snapshot::{compare_children, Snapshot};
use crate::source::{ListenerId, SnapshotSource, SourceError, SourceEvent};
use crate::Result;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const DEFAULT_LISTENER_CAPACITY: usize = 64;

// Channel slots held back for the final `Cancelled`
const CANCEL_RESERVE: usize = 1;

/// Listener registration
#[derive(Debug, Clone)]
struct Listener {
    id: ListenerId,
    query: QueryOptions,
    sender: mpsc::Sender<SourceEvent>,
}

/// Per-path statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalDbStats {
    pub total_writes: u64,
    pub total_delivered: u64,
    pub active_listeners: usize,
    pub dropped_snapshots: u64,
}

pub struct LocalDatabase {
    // Path -> children
    collections: DashMap<String, HashMap<String, Value>>,

    // Path -> listener list
    listeners: DashMap<String, Vec<Listener>>,

    // Paths currently refusing reads
    denied: DashSet<String>,

    stats: DashMap<String, LocalDbStats>,

    listener_capacity: usize,
    next_id: AtomicU64,
}

impl LocalDatabase {
    pub fn new() -> Self {
        Self::with_listener_capacity(DEFAULT_LISTENER_CAPACITY)
    }

    pub fn with_listener_capacity(capacity: usize) -> Self {
        Self {
            collections: DashMap::new(),
            listeners: DashMap::new(),
            denied: DashSet::new(),
            stats: DashMap::new(),
            listener_capacity: capacity.max(1),
            next_id: AtomicU64::new(0),
        }
    }

    /// Write a child, replacing any previous value under `key`
    pub fn set(&self, path: &str, key: &str, value: Value) {
        self.collections
            .entry(path.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self.after_write(path);
    }

    /// Append a child under a generated key that sorts after every earlier push
    pub fn push(&self, path: &str, value: Value) -> String {
        let key = self.push_id();
        self.set(path, &key, value);
        key
    }

    /// Replace a whole collection in one write
    pub fn set_collection(&self, path: &str, children: Map<String, Value>) {
        self.collections
            .insert(path.to_string(), children.into_iter().collect());
        self.after_write(path);
    }

    pub fn remove(&self, path: &str, key: &str) -> Option<Value> {
        let removed = self
            .collections
            .get_mut(path)
            .and_then(|mut children| children.remove(key));
        if removed.is_some() {
            self.after_write(path);
        }
        removed
    }

    pub fn clear(&self, path: &str) {
        if self.collections.remove(path).is_some() {
            self.after_write(path);
        }
    }

    /// Evaluate a query against the current state
    pub fn snapshot(&self, path: &str, query: &QueryOptions) -> Snapshot {
        let Some(children) = self.collections.get(path) else {
            return Snapshot::absent(path);
        };
        if children.is_empty() {
            return Snapshot::absent(path);
        }

        let mut ordered: Vec<(String, Value)> = children
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        drop(children);

        ordered.sort_by(|a, b| compare_children(query.order_by.as_deref(), a, b));
        if let Some(n) = query.limit_to_last {
            let skip = ordered.len().saturating_sub(n);
            ordered.drain(..skip);
        }
        Snapshot::new(path, ordered)
    }

    /// Refuse reads under `path`; current listeners are cancelled
    pub fn deny(&self, path: &str) {
        self.denied.insert(path.to_string());
        self.cancel_listeners(
            path,
            SourceError::PermissionDenied {
                path: path.to_string(),
            },
        );
    }

    pub fn allow(&self, path: &str) {
        self.denied.remove(path);
    }

    /// Cancel every listener on every path, as a dropped connection would
    pub fn disconnect(&self, reason: &str) {
        let paths: Vec<String> = self.listeners.iter().map(|e| e.key().clone()).collect();
        for path in paths {
            self.cancel_listeners(&path, SourceError::Disconnected(reason.to_string()));
        }
    }

    pub fn listener_count(&self, path: &str) -> usize {
        self.listeners.get(path).map_or(0, |l| l.len())
    }

    pub fn get_stats(&self, path: &str) -> Option<LocalDbStats> {
        self.stats.get(path).map(|s| s.clone())
    }

    fn after_write(&self, path: &str) {
        self.update_stats(path, |stats| stats.total_writes += 1);
        self.notify(path);
    }

    // Deliver the full query result to every listener on `path`
    fn notify(&self, path: &str) {
        let Some(mut listeners) = self.listeners.get_mut(path) else {
            return;
        };

        let mut delivered = 0;
        let mut dropped = 0;
        listeners.retain(|listener| {
            if listener.sender.is_closed() {
                debug!(target: "local_db", listener = %listener.id, "Listener receiver gone; removing");
                return false;
            }
            // The last slot is kept free for a cancellation
            if listener.sender.capacity() <= CANCEL_RESERVE {
                dropped += 1;
                warn!(target: "local_db", listener = %listener.id, "Listener queue full; snapshot dropped");
                return true;
            }
            let snapshot = self.snapshot(path, &listener.query);
            match listener.sender.try_send(SourceEvent::Snapshot(snapshot)) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // The next full snapshot supersedes this one
                    dropped += 1;
                    warn!(target: "local_db", listener = %listener.id, "Listener queue full; snapshot dropped");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(target: "local_db", listener = %listener.id, "Listener receiver gone; removing");
                    false
                }
            }
        });
        let remaining = listeners.len();
        drop(listeners);

        self.update_stats(path, |stats| {
            stats.total_delivered += delivered;
            stats.dropped_snapshots += dropped;
            stats.active_listeners = remaining;
        });
    }

    fn cancel_listeners(&self, path: &str, error: SourceError) {
        if let Some((_, listeners)) = self.listeners.remove(path) {
            for listener in &listeners {
                if let Err(mpsc::error::TrySendError::Full(_)) = listener
                    .sender
                    .try_send(SourceEvent::Cancelled(error.clone()))
                {
                    // Dropping the sender below still ends the listener
                    warn!(target: "local_db", listener = %listener.id, "No room for cancellation");
                }
            }
            info!(
                target: "local_db",
                path = %path,
                cancelled = listeners.len(),
                error = %error,
                "Cancelled listeners"
            );
        }
        self.update_stats(path, |stats| stats.active_listeners = 0);
    }

    fn push_id(&self) -> String {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
        // Fixed width keeps lexical order equal to creation order
        format!("-P{:012x}{:06x}", millis, seq & 0xff_ffff)
    }

    fn listener_id(&self, path: &str) -> ListenerId {
        let seq = self.next_id.fetch_add(1, Ordering::Relaxed);
        ListenerId(format!("lst_{}_{:x}", path, seq))
    }

    fn update_stats<F>(&self, path: &str, f: F)
    where
        F: FnOnce(&mut LocalDbStats),
    {
        f(self.stats.entry(path.to_string()).or_default().value_mut());
    }
}

impl Default for LocalDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotSource for LocalDatabase {
    async fn listen(
        &self,
        path: &str,
        query: &QueryOptions,
    ) -> Result<(ListenerId, mpsc::Receiver<SourceEvent>)> {
        query.validate()?;
        let id = self.listener_id(path);
        let (tx, rx) = mpsc::channel(self.listener_capacity + CANCEL_RESERVE);

        // Checked under the registration entry so a concurrent deny either
        // refuses this listener or cancels it once registered
        let mut entry = self.listeners.entry(path.to_string()).or_default();
        if self.denied.contains(path) {
            drop(entry);
            let _ = tx.try_send(SourceEvent::Cancelled(SourceError::PermissionDenied {
                path: path.to_string(),
            }));
            warn!(target: "local_db", path = %path, listener = %id, "Listen refused");
            return Ok((id, rx));
        }

        // Initial state goes out while the entry is held so a concurrent
        // write cannot slip in between the two
        let initial = self.snapshot(path, query);
        let _ = tx.try_send(SourceEvent::Snapshot(initial));
        entry.push(Listener {
            id: id.clone(),
            query: query.clone(),
            sender: tx,
        });
        let active = entry.len();
        drop(entry);

        self.update_stats(path, |stats| stats.active_listeners = active);
        info!(target: "local_db", path = %path, listener = %id, "Listener attached");
        Ok((id, rx))
    }

    fn detach(&self, id: &ListenerId) {
        let mut found = None;
        for mut entry in self.listeners.iter_mut() {
            let before = entry.value().len();
            entry.value_mut().retain(|l| &l.id != id);
            if entry.value().len() != before {
                found = Some((entry.key().clone(), entry.value().len()));
            }
        }
        if let Some((path, remaining)) = found {
            self.update_stats(&path, |stats| stats.active_listeners = remaining);
            info!(target: "local_db", path = %path, listener = %id, "Listener detached");
        }
    }
}
