// Projection change notifications for Dashboard clients
//
// Uses tokio broadcast channel to fan view updates out to multiple SSE clients

use crate::model::Record;
use crate::store::{LoadState, Projection};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

/// Which projection changed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    DashboardPhotos,
    DashboardEvents,
    Gallery,
    EventLog,
}

/// Event sent to Dashboard clients
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ViewUpdate {
    /// Timestamp (RFC 3339)
    pub timestamp: String,
    pub view: ViewKind,
    pub revision: u64,
    pub count: usize,
    #[serde(flatten)]
    pub state: LoadState,
}

/// Broadcaster for view updates
#[derive(Clone)]
pub struct UpdateBroadcaster {
    sender: broadcast::Sender<ViewUpdate>,
}

impl UpdateBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn broadcast(&self, update: ViewUpdate) {
        // Ignore error if no subscribers
        let _ = self.sender.send(update);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewUpdate> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for UpdateBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Forward every change of one projection to the broadcaster. The task ends
/// when the owning subscription is dropped.
pub fn spawn_view_watchers<T: Record>(
    view: ViewKind,
    mut rx: watch::Receiver<Projection<T>>,
    broadcaster: UpdateBroadcaster,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let update = {
                let projection = rx.borrow_and_update();
                ViewUpdate {
                    timestamp: chrono::Utc::now().to_rfc3339(),
                    view,
                    revision: projection.revision,
                    count: projection.items.len(),
                    state: projection.state.clone(),
                }
            };
            broadcaster.broadcast(update);
        }
    })
}
