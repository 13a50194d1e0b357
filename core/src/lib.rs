// Homewatch Core Library
// Live projection of the home-security realtime store into dashboard views

pub mod config;
pub mod dashboard;
pub mod derive;
pub mod local;
pub mod lookup;
pub mod model;
pub mod query;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod telemetry;
pub mod views;

// Export core types
pub use config::{ConnectionConfig, HomewatchConfig};
pub use derive::{derive_stats, filter_by_sensor, recent_slice, SensorFilter, SensorStats};
pub use local::LocalDatabase;
pub use model::{PhotoRecord, Record, SensorEvent, SensorKind};
pub use query::QueryOptions;
pub use snapshot::{project, Snapshot};
pub use source::{ListenerId, SnapshotSource, SourceError, SourceEvent};
pub use store::{LiveProjectionStore, LoadState, Projection, Subscription, SOURCE_CLOSED};
pub use views::{DashboardStats, DashboardView, EventLogView, GalleryView};

use std::sync::Arc;

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HomewatchError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Subscription closed: {0}")]
    SubscriptionClosed(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
pub type Result<T> = std::result::Result<T, HomewatchError>;

/// Core runtime: one shared store connection plus the configuration every
/// view is opened with
pub struct Homewatch {
    pub config: HomewatchConfig,
    pub store: LiveProjectionStore,
}

impl Homewatch {
    pub fn new(config: HomewatchConfig, source: Arc<dyn SnapshotSource>) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            target: "homewatch",
            database_url = %config.connection.database_url,
            photos = %config.photos_path,
            sensors = %config.sensors_path,
            "Homewatch initialized"
        );
        Ok(Self {
            config,
            store: LiveProjectionStore::new(source),
        })
    }

    /// Summary view: bounded photo and event queries
    pub async fn dashboard(&self) -> Result<DashboardView> {
        DashboardView::open(&self.store, &self.config).await
    }

    /// Full photo collection ordered by timestamp
    pub async fn gallery(&self) -> Result<GalleryView> {
        GalleryView::open(&self.store, &self.config).await
    }

    /// Full sensor-event collection ordered by timestamp, filterable
    pub async fn event_log(&self) -> Result<EventLogView> {
        EventLogView::open(&self.store, &self.config).await
    }
}
