mod config;
use config::{DemoConfig, SeedConfig};
use homewatch_core::dashboard::{DashboardServer, LiveViews, UpdateBroadcaster};
use homewatch_core::telemetry::init_tracing;
use homewatch_core::{Homewatch, LocalDatabase, SensorKind};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

const DEVICE_CAMERA: &str = "ESP32-CAM";
const DEVICE_MAIN: &str = "ESP32-MAIN";

// JPEG header only; the gallery shows a broken thumbnail
const PLACEHOLDER_JPEG: &str = "/9j/4AAQSkZJRg==";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    init_tracing("info,homewatch_core=info,homewatch_dashboard=info");

    info!(
        target: "homewatch_dashboard",
        "Starting Homewatch dashboard demo: local store → live views → HTTP/SSE"
    );

    // Load configuration (defaults + env + optional TOML overlay)
    let cfg = DemoConfig::load();
    if !cfg.homewatch.connection.database_url.starts_with("memory://") {
        warn!(
            target: "homewatch_dashboard",
            url = %cfg.homewatch.connection.database_url,
            "Only the in-memory store is bundled; serving local data instead"
        );
    }

    let db = Arc::new(LocalDatabase::new());
    if cfg.seed.enabled {
        seed(&db, &cfg.seed, &cfg.homewatch.photos_path, &cfg.homewatch.sensors_path);
    }

    let homewatch = Homewatch::new(cfg.homewatch.clone(), db.clone())?;
    let views = LiveViews::open(&homewatch).await?;
    let server = DashboardServer::new(cfg.dashboard.clone(), views, UpdateBroadcaster::default());

    let ticker = (cfg.seed.enabled && cfg.seed.tick_ms > 0).then(|| {
        spawn_ticker(
            db.clone(),
            cfg.homewatch.sensors_path.clone(),
            Duration::from_millis(cfg.seed.tick_ms),
        )
    });

    // Ctrl+C handler to shutdown gracefully
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(target: "homewatch_dashboard", error = %e, "Failed to listen for Ctrl+C");
        }
        info!(target: "homewatch_dashboard", "Shutting down...");
    };

    let result = server.serve(shutdown).await;

    if let Some(handle) = ticker {
        handle.abort();
    }
    result
}

/// Write fixture photos and sensor events, oldest first
fn seed(db: &LocalDatabase, seed: &SeedConfig, photos_path: &str, sensors_path: &str) {
    let now = chrono::Local::now();

    for i in 0..seed.photos {
        let taken = now - chrono::Duration::minutes(((seed.photos - i) * 7) as i64);
        db.push(
            photos_path,
            json!({
                "timestamp": format_timestamp(taken),
                "image": PLACEHOLDER_JPEG,
                "width": 640,
                "height": 480,
                "size": 18_000 + i * 512,
                "device": DEVICE_CAMERA,
                "type": "image/jpeg"
            }),
        );
    }

    for i in 0..seed.events {
        let at = now - chrono::Duration::minutes(((seed.events - i) * 3) as i64);
        db.push(sensors_path, fixture_event(i, at));
    }

    info!(
        target: "homewatch_dashboard",
        photos = seed.photos,
        events = seed.events,
        "Seeded local store"
    );
}

fn fixture_event(i: usize, at: chrono::DateTime<chrono::Local>) -> serde_json::Value {
    let kind = SensorKind::ALL[i % SensorKind::ALL.len()];
    let (event, value) = match kind {
        SensorKind::Motion => ("movimiento_detectado", None),
        SensorKind::Ultrasonic if (i / 4) % 2 == 0 => {
            ("objeto_detectado_foco_encendido", Some(12.0 + (i % 30) as f64))
        }
        SensorKind::Ultrasonic => ("objeto_fuera_rango_foco_apagado", Some(150.0)),
        SensorKind::Light => ("luz_detectada_foco_apagado", None),
        SensorKind::Camera => ("error_captura_imagen", None),
    };

    let mut record = json!({
        "timestamp": format_timestamp(at),
        "sensor": kind.as_wire(),
        "event": event,
        "device": DEVICE_MAIN
    });
    if let (Some(v), Some(obj)) = (value, record.as_object_mut()) {
        obj.insert("value".to_string(), json!(v));
    }
    record
}

/// Append one sensor event per tick so the views visibly update
fn spawn_ticker(
    db: Arc<LocalDatabase>,
    sensors_path: String,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // First tick fires immediately
        interval.tick().await;
        let mut i = 0usize;
        loop {
            interval.tick().await;
            let key = db.push(&sensors_path, fixture_event(i, chrono::Local::now()));
            info!(target: "homewatch_dashboard", key = %key, "Simulated sensor event");
            i += 1;
        }
    })
}

fn format_timestamp(at: chrono::DateTime<chrono::Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}
