// Dashboard module - read-only HTTP surface over the live views
//
// JSON endpoints for the three views plus an SSE stream announcing every
// projection change.

mod api;
mod event_stream;

pub use api::{DashboardServer, LiveViews};
pub use event_stream::{spawn_view_watchers, UpdateBroadcaster, ViewKind, ViewUpdate};

/// Dashboard configuration
#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub port: u16,
    pub host: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            port: 3030,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("HOMEWATCH_DASHBOARD_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3030),
            host: std::env::var("HOMEWATCH_DASHBOARD_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
        }
    }
}
