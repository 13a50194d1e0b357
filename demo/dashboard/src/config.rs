use std::fs;
use std::path::Path;

use homewatch_core::dashboard::DashboardConfig;
use homewatch_core::HomewatchConfig;

/// Configuration for the dashboard demo
#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub homewatch: HomewatchConfig,
    pub dashboard: DashboardConfig,
    pub seed: SeedConfig,
}

/// Fixture records written to the local store at start-up, plus an optional
/// ticker that keeps appending sensor events
#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub enabled: bool,
    pub photos: usize,
    pub events: usize,
    /// 0 disables the ticker
    pub tick_ms: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: std::env::var("HOMEWATCH_SEED")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            photos: 8,
            events: 24,
            tick_ms: std::env::var("HOMEWATCH_SEED_TICK_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        // Core and dashboard defaults already consider env vars
        Self {
            homewatch: HomewatchConfig::from_env(),
            dashboard: DashboardConfig::from_env(),
            seed: SeedConfig::default(),
        }
    }
}

impl DemoConfig {
    /// Load configuration from a TOML file (path via HOMEWATCH_CONFIG or ./homewatch.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let default = Self::default();
        let path = std::env::var("HOMEWATCH_CONFIG").unwrap_or_else(|_| "homewatch.toml".into());
        let p = Path::new(&path);
        if !p.exists() {
            tracing::info!(target: "homewatch_dashboard", path = %path, "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => Self::from_toml_str(&s, default),
            Err(e) => {
                tracing::warn!(target: "homewatch_dashboard", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }

    fn from_toml_str(s: &str, default: Self) -> Self {
        match toml::from_str::<DemoToml>(s) {
            Ok(t) => t.overlay(default),
            Err(e) => {
                tracing::warn!(target: "homewatch_dashboard", error = %e, "Failed to parse TOML; using defaults");
                default
            }
        }
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct DemoToml {
    pub connection: Option<ConnectionToml>,
    pub collections: Option<CollectionsToml>,
    pub dashboard: Option<DashboardToml>,
    pub seed: Option<SeedToml>,
}

impl DemoToml {
    fn overlay(self, mut base: DemoConfig) -> DemoConfig {
        if let Some(c) = self.connection {
            c.apply(&mut base.homewatch);
        }
        if let Some(c) = self.collections {
            c.apply(&mut base.homewatch);
        }
        if let Some(d) = self.dashboard {
            d.apply(&mut base.dashboard);
        }
        if let Some(s) = self.seed {
            s.apply(&mut base.seed);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct ConnectionToml {
    pub database_url: Option<String>,
    pub api_key: Option<String>,
    pub project_id: Option<String>,
}
impl ConnectionToml {
    fn apply(self, h: &mut HomewatchConfig) {
        if let Some(v) = self.database_url {
            h.connection.database_url = v;
        }
        if let Some(v) = self.api_key {
            h.connection.api_key = Some(v);
        }
        if let Some(v) = self.project_id {
            h.connection.project_id = Some(v);
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct CollectionsToml {
    pub photos_path: Option<String>,
    pub sensors_path: Option<String>,
    pub dashboard_photo_limit: Option<usize>,
    pub dashboard_event_limit: Option<usize>,
    pub preview_count: Option<usize>,
    pub order_field: Option<String>,
}
impl CollectionsToml {
    fn apply(self, h: &mut HomewatchConfig) {
        if let Some(v) = self.photos_path {
            h.photos_path = v;
        }
        if let Some(v) = self.sensors_path {
            h.sensors_path = v;
        }
        if let Some(v) = self.dashboard_photo_limit {
            h.dashboard_photo_limit = v;
        }
        if let Some(v) = self.dashboard_event_limit {
            h.dashboard_event_limit = v;
        }
        if let Some(v) = self.preview_count {
            h.preview_count = v;
        }
        if let Some(v) = self.order_field {
            h.order_field = v;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct DashboardToml {
    pub host: Option<String>,
    pub port: Option<u16>,
}
impl DashboardToml {
    fn apply(self, d: &mut DashboardConfig) {
        if let Some(v) = self.host {
            d.host = v;
        }
        if let Some(v) = self.port {
            d.port = v;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct SeedToml {
    pub enabled: Option<bool>,
    pub photos: Option<usize>,
    pub events: Option<usize>,
    pub tick_ms: Option<u64>,
}
impl SeedToml {
    fn apply(self, s: &mut SeedConfig) {
        if let Some(v) = self.enabled {
            s.enabled = v;
        }
        if let Some(v) = self.photos {
            s.photos = v;
        }
        if let Some(v) = self.events {
            s.events = v;
        }
        if let Some(v) = self.tick_ms {
            s.tick_ms = v;
        }
    }
}
