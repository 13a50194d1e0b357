// Pure derivations over projected lists

use crate::model::{SensorEvent, SensorKind};
use crate::HomewatchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-category event tally
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorStats {
    pub motion: usize,
    pub ultrasonic: usize,
    pub light: usize,
    pub camera: usize,
}

impl SensorStats {
    pub fn get(&self, kind: SensorKind) -> usize {
        match kind {
            SensorKind::Motion => self.motion,
            SensorKind::Ultrasonic => self.ultrasonic,
            SensorKind::Light => self.light,
            SensorKind::Camera => self.camera,
        }
    }

    pub fn total(&self) -> usize {
        self.motion + self.ultrasonic + self.light + self.camera
    }

    fn bump(&mut self, kind: SensorKind) {
        match kind {
            SensorKind::Motion => self.motion += 1,
            SensorKind::Ultrasonic => self.ultrasonic += 1,
            SensorKind::Light => self.light += 1,
            SensorKind::Camera => self.camera += 1,
        }
    }
}

/// Count events per known category; unknown sensors are skipped
pub fn derive_stats(events: &[SensorEvent]) -> SensorStats {
    events
        .iter()
        .filter_map(SensorEvent::kind)
        .fold(SensorStats::default(), |mut stats, kind| {
            stats.bump(kind);
            stats
        })
}

/// Category selection for the event log
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorFilter {
    #[default]
    All,
    Sensor(SensorKind),
}

impl FromStr for SensorFilter {
    type Err = HomewatchError;

    /// Accepts "all", a wire name ("PIR") or a category name ("motion")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(SensorFilter::All);
        }
        if let Some(kind) = SensorKind::from_wire(s) {
            return Ok(SensorFilter::Sensor(kind));
        }
        SensorKind::ALL
            .into_iter()
            .find(|kind| format!("{:?}", kind).eq_ignore_ascii_case(s))
            .map(SensorFilter::Sensor)
            .ok_or_else(|| HomewatchError::InvalidQuery(format!("unknown sensor filter: {}", s)))
    }
}

impl fmt::Display for SensorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorFilter::All => f.write_str("all"),
            SensorFilter::Sensor(kind) => f.write_str(kind.as_wire()),
        }
    }
}

/// Events of the selected category, order preserved. `All` returns the
/// list unchanged.
pub fn filter_by_sensor(events: &[SensorEvent], filter: SensorFilter) -> Vec<SensorEvent> {
    match filter {
        SensorFilter::All => events.to_vec(),
        SensorFilter::Sensor(kind) => events
            .iter()
            .filter(|event| event.sensor.as_deref() == Some(kind.as_wire()))
            .cloned()
            .collect(),
    }
}

/// First `n` items of a most-recent-first list
pub fn recent_slice<T>(items: &[T], n: usize) -> &[T] {
    &items[..n.min(items.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parse() {
        assert_eq!("all".parse::<SensorFilter>().ok(), Some(SensorFilter::All));
        assert_eq!("".parse::<SensorFilter>().ok(), Some(SensorFilter::All));
        assert_eq!(
            "LDR".parse::<SensorFilter>().ok(),
            Some(SensorFilter::Sensor(SensorKind::Light))
        );
        assert_eq!(
            "camera".parse::<SensorFilter>().ok(),
            Some(SensorFilter::Sensor(SensorKind::Camera))
        );
        assert!("Humedad".parse::<SensorFilter>().is_err());
    }

    #[test]
    fn test_filter_display_round_trips_wire_name() {
        let filter = SensorFilter::Sensor(SensorKind::Ultrasonic);
        assert_eq!(filter.to_string(), "Ultrasonico");
        assert_eq!(SensorFilter::All.to_string(), "all");
    }

    #[test]
    fn test_recent_slice_bounds() {
        let items = [1, 2, 3];
        assert_eq!(recent_slice(&items, 0), &[] as &[i32]);
        assert_eq!(recent_slice(&items, 5), &[1, 2, 3]);
    }
}
