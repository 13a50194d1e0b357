// Snapshot source abstraction
//
// A source is whatever hands out live full-state notifications for a
// collection path: the hosted store's SDK adapter in production, the
// in-memory `LocalDatabase` in tests and the demo.

use crate::query::QueryOptions;
use crate::snapshot::Snapshot;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;

/// Identifies one listener registration on a source
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub String);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connection-level failures reported by a source
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceError {
    #[error("Permission denied for {path}")]
    PermissionDenied { path: String },

    #[error("Disconnected: {0}")]
    Disconnected(String),
}

/// Notification delivered to a listener
#[derive(Clone, Debug)]
pub enum SourceEvent {
    /// Complete current state of the query
    Snapshot(Snapshot),
    /// The listener was cancelled by the source; nothing follows
    Cancelled(SourceError),
}

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Register a listener. The current state is delivered immediately,
    /// then a full snapshot after every change under `path`.
    async fn listen(
        &self,
        path: &str,
        query: &QueryOptions,
    ) -> Result<(ListenerId, mpsc::Receiver<SourceEvent>)>;

    /// Remove a listener registration. Must not block and must be safe to
    /// call for an id that is already gone.
    fn detach(&self, id: &ListenerId);
}
