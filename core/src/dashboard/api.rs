// Dashboard HTTP API server
//
// Provides REST endpoints and SSE streaming over the live views

use crate::dashboard::event_stream::{spawn_view_watchers, UpdateBroadcaster, ViewKind};
use crate::dashboard::DashboardConfig;
use crate::derive::SensorFilter;
use crate::lookup::{count_label, Icon};
use crate::model::{PhotoRecord, SensorEvent};
use crate::store::LoadState;
use crate::views::{DashboardStats, DashboardView, EventLogView, GalleryView};
use crate::Homewatch;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Sse,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// The three views kept open for the lifetime of the server
pub struct LiveViews {
    pub dashboard: DashboardView,
    pub gallery: GalleryView,
    pub event_log: EventLogView,
}

impl LiveViews {
    pub async fn open(homewatch: &Homewatch) -> crate::Result<Self> {
        Ok(Self {
            dashboard: homewatch.dashboard().await?,
            gallery: homewatch.gallery().await?,
            event_log: homewatch.event_log().await?,
        })
    }

    fn watch_into(&self, broadcaster: &UpdateBroadcaster) -> Vec<JoinHandle<()>> {
        vec![
            spawn_view_watchers(
                ViewKind::DashboardPhotos,
                self.dashboard.watch_photos(),
                broadcaster.clone(),
            ),
            spawn_view_watchers(
                ViewKind::DashboardEvents,
                self.dashboard.watch_events(),
                broadcaster.clone(),
            ),
            spawn_view_watchers(ViewKind::Gallery, self.gallery.watch(), broadcaster.clone()),
            spawn_view_watchers(ViewKind::EventLog, self.event_log.watch(), broadcaster.clone()),
        ]
    }

    /// Close every view; their listeners detach
    pub fn close(&mut self) {
        self.dashboard.close();
        self.gallery.close();
        self.event_log.close();
    }
}

/// Dashboard server state
#[derive(Clone)]
struct DashboardState {
    views: Arc<RwLock<LiveViews>>,
    broadcaster: UpdateBroadcaster,
}

/// Dashboard HTTP server
pub struct DashboardServer {
    config: DashboardConfig,
    state: DashboardState,
    watchers: Vec<JoinHandle<()>>,
}

impl DashboardServer {
    pub fn new(config: DashboardConfig, views: LiveViews, broadcaster: UpdateBroadcaster) -> Self {
        let watchers = views.watch_into(&broadcaster);
        Self {
            config,
            state: DashboardState {
                views: Arc::new(RwLock::new(views)),
                broadcaster,
            },
            watchers,
        }
    }

    /// Watcher tasks still forwarding view changes to SSE clients
    pub fn active_watchers(&self) -> usize {
        self.watchers.iter().filter(|h| !h.is_finished()).count()
    }

    /// Close the views and stop their watcher tasks
    pub async fn shutdown(&mut self) {
        self.state.views.write().await.close();
        for handle in &self.watchers {
            handle.abort();
        }
    }

    /// Build the router without binding a socket
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/health", get(health_handler))
            .route("/api/dashboard", get(dashboard_handler))
            .route("/api/photos", get(photos_handler))
            .route("/api/photos/:id", get(photo_handler))
            .route("/api/events", get(events_handler))
            .route("/api/updates", get(updates_handler))
            .route("/api/retry", post(retry_handler))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(self.state.clone())
    }

    /// Start the Dashboard server; returns once `shutdown` resolves
    pub async fn serve<F>(mut self, shutdown: F) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!(
            target: "dashboard",
            addr = %addr,
            "Starting Dashboard server"
        );

        let app = self.router();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(
            target: "dashboard",
            url = %format!("http://{}", addr),
            "Dashboard server ready"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        // Views are closed explicitly so their listeners detach before exit
        self.shutdown().await;
        info!(target: "dashboard", "Dashboard server stopped");
        Ok(())
    }
}

#[derive(Serialize)]
struct DashboardResponse {
    loading: bool,
    photos: LoadState,
    events: LoadState,
    stats: DashboardStats,
    preview: Vec<PhotoRecord>,
}

#[derive(Serialize)]
struct PhotoRow {
    #[serde(flatten)]
    photo: PhotoRecord,
    resolution: Option<String>,
    size_kb: Option<String>,
}

impl From<PhotoRecord> for PhotoRow {
    fn from(photo: PhotoRecord) -> Self {
        Self {
            resolution: photo.resolution(),
            size_kb: photo.size_kb(),
            photo,
        }
    }
}

#[derive(Serialize)]
struct PhotosResponse {
    #[serde(flatten)]
    state: LoadState,
    count_label: String,
    photos: Vec<PhotoRow>,
}

#[derive(Serialize)]
struct EventRow {
    #[serde(flatten)]
    event: SensorEvent,
    description: Option<Cow<'static, str>>,
    icon: Icon,
    badge: &'static str,
    value_display: Option<String>,
}

impl From<SensorEvent> for EventRow {
    fn from(event: SensorEvent) -> Self {
        Self {
            description: event.description(),
            icon: event.icon(),
            badge: event.badge().css_class(),
            value_display: event.value_display(),
            event,
        }
    }
}

#[derive(Serialize)]
struct EventsResponse {
    #[serde(flatten)]
    state: LoadState,
    filter: String,
    stats: crate::derive::SensorStats,
    count_label: String,
    empty_message: &'static str,
    events: Vec<EventRow>,
}

#[derive(Deserialize)]
struct EventsQuery {
    #[serde(default)]
    sensor: Option<String>,
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn dashboard_handler(State(state): State<DashboardState>) -> Json<DashboardResponse> {
    let views = state.views.read().await;
    let dashboard = &views.dashboard;
    Json(DashboardResponse {
        loading: dashboard.loading(),
        photos: dashboard.photos_state(),
        events: dashboard.events_state(),
        stats: dashboard.stats(),
        preview: dashboard.preview(),
    })
}

async fn photos_handler(State(state): State<DashboardState>) -> Json<PhotosResponse> {
    let views = state.views.read().await;
    let gallery = &views.gallery;
    Json(PhotosResponse {
        state: gallery.state(),
        count_label: gallery.count_label(),
        photos: gallery.photos().iter().cloned().map(PhotoRow::from).collect(),
    })
}

async fn photo_handler(
    State(state): State<DashboardState>,
    Path(id): Path<String>,
) -> Result<Json<PhotoRow>, StatusCode> {
    let views = state.views.read().await;
    views
        .gallery
        .find(&id)
        .map(|photo| Json(PhotoRow::from(photo)))
        .ok_or(StatusCode::NOT_FOUND)
}

/// Query params: ?sensor=PIR (default: all)
async fn events_handler(
    State(state): State<DashboardState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, (StatusCode, String)> {
    let filter = match query.sensor.as_deref() {
        Some(raw) => raw
            .parse::<SensorFilter>()
            .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?,
        None => SensorFilter::All,
    };

    let views = state.views.read().await;
    let log = &views.event_log;
    let filtered = log.filtered_by(filter);

    Ok(Json(EventsResponse {
        state: log.state(),
        filter: filter.to_string(),
        stats: log.stats(),
        count_label: count_label(filtered.len(), "evento", "eventos"),
        empty_message: filter.empty_message(),
        events: filtered.into_iter().map(EventRow::from).collect(),
    }))
}

/// Re-open every unavailable subscription
async fn retry_handler(State(state): State<DashboardState>) -> impl IntoResponse {
    let mut views = state.views.write().await;
    let mut failures = Vec::new();

    if let Err(e) = views.dashboard.retry().await {
        failures.push(format!("dashboard: {}", e));
    }
    if matches!(views.gallery.state(), LoadState::Unavailable { .. }) {
        if let Err(e) = views.gallery.retry().await {
            failures.push(format!("gallery: {}", e));
        }
    }
    if matches!(views.event_log.state(), LoadState::Unavailable { .. }) {
        if let Err(e) = views.event_log.retry().await {
            failures.push(format!("event_log: {}", e));
        }
    }

    if failures.is_empty() {
        (StatusCode::ACCEPTED, Json(serde_json::json!({ "retried": true })))
    } else {
        warn!(target: "dashboard", failures = ?failures, "Retry failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "retried": false, "errors": failures })),
        )
    }
}

/// SSE endpoint for projection changes
async fn updates_handler(
    State(state): State<DashboardState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    info!(target: "dashboard", "New SSE client connected");

    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(update) => match serde_json::to_string(&update) {
            Ok(json) => Some(Ok(Event::default().event("update").data(json))),
            Err(e) => {
                warn!(target: "dashboard", error = %e, "Failed to serialize update");
                None
            }
        },
        Err(e) => {
            warn!(target: "dashboard", error = %e, "Broadcast error");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
