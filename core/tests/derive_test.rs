//! Derivation tests: per-sensor tallies, category filter, recent slices

use homewatch_core::{
    derive_stats, filter_by_sensor, recent_slice, SensorEvent, SensorFilter, SensorKind,
    SensorStats,
};

fn event(id: &str, sensor: &str) -> SensorEvent {
    SensorEvent {
        id: id.to_string(),
        timestamp: Some(format!("2025-01-10 08:00:{}", id)),
        sensor: Some(sensor.to_string()),
        event: Some("movimiento_detectado".to_string()),
        ..Default::default()
    }
}

fn mixed_events() -> Vec<SensorEvent> {
    vec![
        event("09", "Camara"),
        event("08", "PIR"),
        event("07", "Camara"),
        event("06", "LDR"),
        event("05", "Humedad"),
        event("04", "PIR"),
        event("03", "Camara"),
    ]
}

#[test]
fn stats_ignore_unknown_categories() {
    let events = mixed_events();
    let stats = derive_stats(&events);

    assert_eq!(
        stats,
        SensorStats {
            motion: 2,
            ultrasonic: 0,
            light: 1,
            camera: 3,
        }
    );
    assert_eq!(stats.total(), 6);
    assert_eq!(stats.get(SensorKind::Camera), 3);
    // The unknown event is still part of the list
    assert_eq!(events.len(), 7);
}

#[test]
fn stats_of_empty_list_are_zero() {
    assert_eq!(derive_stats(&[]), SensorStats::default());
}

#[test]
fn stats_skip_events_without_sensor() {
    let events = vec![SensorEvent {
        id: "x".into(),
        ..Default::default()
    }];
    assert_eq!(derive_stats(&events).total(), 0);
}

#[test]
fn filter_all_returns_list_unchanged() {
    let events = mixed_events();
    assert_eq!(filter_by_sensor(&events, SensorFilter::All), events);
}

#[test]
fn filter_keeps_only_matching_sensor_in_order() {
    let events = mixed_events();
    let cameras = filter_by_sensor(&events, SensorFilter::Sensor(SensorKind::Camera));

    let ids: Vec<&str> = cameras.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["09", "07", "03"]);
    assert!(cameras.iter().all(|e| e.sensor.as_deref() == Some("Camara")));
}

#[test]
fn filter_with_no_matches_is_empty() {
    let events = mixed_events();
    let ultrasonic = filter_by_sensor(&events, SensorFilter::Sensor(SensorKind::Ultrasonic));
    assert!(ultrasonic.is_empty());
}

#[test]
fn recent_slice_takes_leading_items() {
    let ten: Vec<u32> = (0..10).collect();
    assert_eq!(recent_slice(ten.as_slice(), 3), &[0, 1, 2]);

    let two = vec![7, 8];
    assert_eq!(recent_slice(two.as_slice(), 3), &[7, 8]);

    let none: Vec<u32> = Vec::new();
    assert!(recent_slice(none.as_slice(), 3).is_empty());
}
