//! Shared fixtures for the homewatch-core integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use homewatch_core::{
    ListenerId, LocalDatabase, Projection, QueryOptions, Record, Result, SnapshotSource,
    SourceEvent,
};
use mockall::mock;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

mock! {
    pub Source {}

    #[async_trait]
    impl SnapshotSource for Source {
        async fn listen(
            &self,
            path: &str,
            query: &QueryOptions,
        ) -> Result<(ListenerId, mpsc::Receiver<SourceEvent>)>;

        fn detach(&self, id: &ListenerId);
    }
}

pub const PHOTOS: &str = "eventos/fotos";
pub const SENSORS: &str = "eventos/sensores";

pub fn photo(timestamp: &str) -> Value {
    json!({
        "timestamp": timestamp,
        "image": "/9j/4AAQSkZJRg==",
        "width": 640,
        "height": 480,
        "size": 20480,
        "device": "ESP32-CAM",
        "type": "image/jpeg"
    })
}

pub fn sensor_event(timestamp: &str, sensor: &str, event: &str) -> Value {
    json!({
        "timestamp": timestamp,
        "sensor": sensor,
        "event": event,
        "device": "ESP32-MAIN"
    })
}

/// "2025-01-10 12:00:07"
pub fn ts(second: u32) -> String {
    format!("2025-01-10 12:{:02}:{:02}", second / 60, second % 60)
}

/// Seed `count` photos whose timestamps increase with their key
pub fn seed_photos(db: &LocalDatabase, count: u32) {
    for i in 0..count {
        db.set(PHOTOS, &format!("p{:02}", i), photo(&ts(i)));
    }
}

/// Seed `count` events cycling through the four sensors
pub fn seed_events(db: &LocalDatabase, count: u32) {
    let sensors = [
        ("PIR", "movimiento_detectado"),
        ("Ultrasonico", "objeto_detectado_foco_encendido"),
        ("LDR", "luz_detectada_foco_apagado"),
        ("Camara", "error_captura_imagen"),
    ];
    for i in 0..count {
        let (sensor, event) = sensors[i as usize % sensors.len()];
        db.set(SENSORS, &format!("e{:02}", i), sensor_event(&ts(i), sensor, event));
    }
}

/// Wait until the projection satisfies `pred`, with a timeout
pub async fn wait_for<T, F>(rx: &mut watch::Receiver<Projection<T>>, mut pred: F) -> Projection<T>
where
    T: Record,
    F: FnMut(&Projection<T>) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|p| pred(p)))
        .await
        .expect("timeout waiting for projection")
        .expect("projection channel closed")
        .clone()
}

/// Wait until the projection has left the loading state
pub async fn ready<T: Record>(rx: &mut watch::Receiver<Projection<T>>) -> Projection<T> {
    wait_for(rx, |p| !p.is_loading()).await
}

pub fn timestamps<T: Record>(items: &[T]) -> Vec<String> {
    items
        .iter()
        .map(|r| r.timestamp().unwrap_or_default().to_string())
        .collect()
}
