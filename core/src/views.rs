// View models consumed by the presentation layer
//
// Each view owns its subscriptions; closing or dropping the view detaches
// them.

use crate::config::HomewatchConfig;
use crate::derive::{derive_stats, filter_by_sensor, recent_slice, SensorFilter, SensorStats};
use crate::lookup::count_label;
use crate::model::{PhotoRecord, SensorEvent};
use crate::query::QueryOptions;
use crate::store::{LiveProjectionStore, LoadState, Projection, Subscription};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Aggregate summary shown on the dashboard
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_photos: usize,
    pub total_sensor_events: usize,
    pub recent_photos: Vec<PhotoRecord>,
    pub recent_events: Vec<SensorEvent>,
}

/// Summary view: last N photos and last M events, tracked independently
pub struct DashboardView {
    photos: Subscription<PhotoRecord>,
    events: Subscription<SensorEvent>,
    preview_count: usize,
}

impl DashboardView {
    pub async fn open(store: &LiveProjectionStore, config: &HomewatchConfig) -> Result<Self> {
        let photos = store
            .subscribe(
                &config.photos_path,
                QueryOptions::last(config.dashboard_photo_limit),
            )
            .await?;
        let events = store
            .subscribe(
                &config.sensors_path,
                QueryOptions::last(config.dashboard_event_limit),
            )
            .await?;
        Ok(Self {
            photos,
            events,
            preview_count: config.preview_count,
        })
    }

    /// True until either collection has delivered or failed
    pub fn loading(&self) -> bool {
        self.photos.current().is_loading() && self.events.current().is_loading()
    }

    pub fn stats(&self) -> DashboardStats {
        let photos = self.photos.current().items;
        let events = self.events.current().items;
        DashboardStats {
            total_photos: photos.len(),
            total_sensor_events: events.len(),
            recent_photos: photos.as_ref().clone(),
            recent_events: events.as_ref().clone(),
        }
    }

    /// Photos shown in the preview row
    pub fn preview(&self) -> Vec<PhotoRecord> {
        let photos = self.photos.current().items;
        recent_slice(photos.as_slice(), self.preview_count).to_vec()
    }

    pub fn photos_state(&self) -> LoadState {
        self.photos.current().state
    }

    pub fn events_state(&self) -> LoadState {
        self.events.current().state
    }

    pub fn watch_photos(&self) -> watch::Receiver<Projection<PhotoRecord>> {
        self.photos.watch()
    }

    pub fn watch_events(&self) -> watch::Receiver<Projection<SensorEvent>> {
        self.events.watch()
    }

    /// Re-open whichever subscription is unavailable. Both are attempted;
    /// the first failure is returned.
    pub async fn retry(&mut self) -> Result<()> {
        let photos = if self.photos.current().is_unavailable() {
            self.photos.retry().await
        } else {
            Ok(())
        };
        let events = if self.events.current().is_unavailable() {
            self.events.retry().await
        } else {
            Ok(())
        };
        photos.and(events)
    }

    pub fn close(&mut self) {
        self.photos.unsubscribe();
        self.events.unsubscribe();
    }
}

/// Every photo, most recent first, with an optional selection for the
/// detail panel
pub struct GalleryView {
    photos: Subscription<PhotoRecord>,
    selected: Option<String>,
}

impl GalleryView {
    pub async fn open(store: &LiveProjectionStore, config: &HomewatchConfig) -> Result<Self> {
        let photos = store
            .subscribe(
                &config.photos_path,
                QueryOptions::ordered_by(config.order_field.clone()),
            )
            .await?;
        Ok(Self {
            photos,
            selected: None,
        })
    }

    pub fn loading(&self) -> bool {
        self.photos.current().is_loading()
    }

    pub fn state(&self) -> LoadState {
        self.photos.current().state
    }

    pub fn photos(&self) -> Arc<Vec<PhotoRecord>> {
        self.photos.current().items
    }

    pub fn count_label(&self) -> String {
        count_label(self.photos.current().items.len(), "foto", "fotos")
    }

    /// Select a photo by id; returns it when present
    pub fn select(&mut self, id: &str) -> Option<PhotoRecord> {
        let found = self.find(id);
        self.selected = found.as_ref().map(|p| p.id.clone());
        found
    }

    /// The selected photo, if it is still in the collection
    pub fn selected(&self) -> Option<PhotoRecord> {
        self.selected.as_deref().and_then(|id| self.find(id))
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn find(&self, id: &str) -> Option<PhotoRecord> {
        self.photos
            .current()
            .items
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    pub fn watch(&self) -> watch::Receiver<Projection<PhotoRecord>> {
        self.photos.watch()
    }

    pub async fn retry(&mut self) -> Result<()> {
        self.photos.retry().await
    }

    pub fn close(&mut self) {
        self.selected = None;
        self.photos.unsubscribe();
    }
}

/// Every sensor event, most recent first, filterable by category
pub struct EventLogView {
    events: Subscription<SensorEvent>,
    filter: SensorFilter,
}

impl EventLogView {
    pub async fn open(store: &LiveProjectionStore, config: &HomewatchConfig) -> Result<Self> {
        let events = store
            .subscribe(
                &config.sensors_path,
                QueryOptions::ordered_by(config.order_field.clone()),
            )
            .await?;
        Ok(Self {
            events,
            filter: SensorFilter::All,
        })
    }

    pub fn loading(&self) -> bool {
        self.events.current().is_loading()
    }

    pub fn state(&self) -> LoadState {
        self.events.current().state
    }

    pub fn filter(&self) -> SensorFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: SensorFilter) {
        self.filter = filter;
    }

    pub fn events(&self) -> Arc<Vec<SensorEvent>> {
        self.events.current().items
    }

    /// Events for the selected category
    pub fn filtered(&self) -> Vec<SensorEvent> {
        self.filtered_by(self.filter)
    }

    /// Events for an arbitrary category, without changing the selection
    pub fn filtered_by(&self, filter: SensorFilter) -> Vec<SensorEvent> {
        filter_by_sensor(&self.events.current().items, filter)
    }

    /// Tallies always cover the whole collection, not the filtered subset
    pub fn stats(&self) -> SensorStats {
        derive_stats(&self.events.current().items)
    }

    pub fn count_label(&self) -> String {
        count_label(self.filtered().len(), "evento", "eventos")
    }

    pub fn empty_message(&self) -> &'static str {
        self.filter.empty_message()
    }

    pub fn watch(&self) -> watch::Receiver<Projection<SensorEvent>> {
        self.events.watch()
    }

    pub async fn retry(&mut self) -> Result<()> {
        self.events.retry().await
    }

    pub fn close(&mut self) {
        self.events.unsubscribe();
    }
}
