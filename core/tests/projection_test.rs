//! Snapshot projection tests
//!
//! Covers conversion of raw snapshot payloads into most-recent-first lists:
//! - key → id mapping and sibling fields
//! - reversal of store order for bounded queries
//! - independent re-sort for unbounded ordered queries
//! - absent payloads

mod common;

use common::*;
use homewatch_core::lookup::describe_event;
use homewatch_core::{project, PhotoRecord, QueryOptions, SensorEvent, Snapshot};
use serde_json::json;

#[test]
fn projected_length_and_ids_match_payload() {
    let payload = json!({
        "-Nb1": photo(&ts(1)),
        "-Nb2": photo(&ts(2)),
        "-Nb3": photo(&ts(3)),
    });
    let snapshot = Snapshot::from_value(PHOTOS, payload);
    let photos: Vec<PhotoRecord> = project(&snapshot, &QueryOptions::last(5));

    assert_eq!(photos.len(), 3);
    let mut ids: Vec<&str> = photos.iter().map(|p| p.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["-Nb1", "-Nb2", "-Nb3"]);
}

#[test]
fn bounded_projection_is_most_recent_first() {
    // Store delivers ascending order for limit_to_last queries
    let snapshot = Snapshot::new(
        SENSORS,
        vec![
            ("a".to_string(), sensor_event(&ts(10), "PIR", "movimiento_detectado")),
            ("b".to_string(), sensor_event(&ts(11), "LDR", "luz_detectada_foco_apagado")),
            ("c".to_string(), sensor_event(&ts(12), "Camara", "error_captura_imagen")),
        ],
    );
    let events: Vec<SensorEvent> = project(&snapshot, &QueryOptions::last(10));

    assert_eq!(timestamps(&events), vec![ts(12), ts(11), ts(10)]);
}

#[test]
fn unbounded_projection_is_resorted_by_field() {
    // Delivery order deliberately disagrees with timestamp order
    let snapshot = Snapshot::new(
        PHOTOS,
        vec![
            ("k1".to_string(), photo(&ts(30))),
            ("k2".to_string(), photo(&ts(5))),
            ("k3".to_string(), photo(&ts(50))),
            ("k4".to_string(), photo(&ts(20))),
        ],
    );
    let photos: Vec<PhotoRecord> = project(&snapshot, &QueryOptions::ordered_by("timestamp"));

    assert_eq!(timestamps(&photos), vec![ts(50), ts(30), ts(20), ts(5)]);
}

#[test]
fn unbounded_projection_puts_missing_timestamps_last() {
    let snapshot = Snapshot::new(
        PHOTOS,
        vec![
            ("k1".to_string(), json!({ "device": "cam" })),
            ("k2".to_string(), photo(&ts(1))),
        ],
    );
    let photos: Vec<PhotoRecord> = project(&snapshot, &QueryOptions::ordered_by("timestamp"));

    let ids: Vec<&str> = photos.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["k2", "k1"]);
}

#[test]
fn absent_payload_projects_to_empty_list() {
    let snapshot = Snapshot::from_value(PHOTOS, serde_json::Value::Null);
    let photos: Vec<PhotoRecord> = project(&snapshot, &QueryOptions::last(5));
    assert!(photos.is_empty());

    let empty = Snapshot::new(PHOTOS, vec![]);
    let photos: Vec<PhotoRecord> = project(&empty, &QueryOptions::ordered_by("timestamp"));
    assert!(photos.is_empty());
}

#[test]
fn single_event_scenario() {
    let payload = json!({
        "k1": {
            "timestamp": "T1",
            "sensor": "PIR",
            "event": "movimiento_detectado",
            "device": "D1"
        }
    });
    let snapshot = Snapshot::from_value(SENSORS, payload);
    let events: Vec<SensorEvent> = project(&snapshot, &QueryOptions::ordered_by("timestamp"));

    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.id, "k1");
    assert_eq!(event.timestamp.as_deref(), Some("T1"));
    assert_eq!(event.sensor.as_deref(), Some("PIR"));
    assert_eq!(event.event.as_deref(), Some("movimiento_detectado"));
    assert_eq!(event.device.as_deref(), Some("D1"));
    assert_eq!(event.value, None);

    let rendered = serde_json::to_value(event).unwrap();
    assert_eq!(
        rendered,
        json!({
            "id": "k1",
            "timestamp": "T1",
            "sensor": "PIR",
            "event": "movimiento_detectado",
            "device": "D1"
        })
    );
    assert_eq!(
        describe_event(event.event.as_deref().unwrap()),
        "Movimiento detectado por sensor PIR"
    );
}

#[test]
fn unknown_sibling_fields_are_carried() {
    let payload = json!({
        "k1": { "timestamp": "T1", "sensor": "PIR", "event": "x", "battery": 87 }
    });
    let events: Vec<SensorEvent> = project(
        &Snapshot::from_value(SENSORS, payload),
        &QueryOptions::last(10),
    );
    assert_eq!(events[0].extra.get("battery"), Some(&json!(87)));
}
