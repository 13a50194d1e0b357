// Presentation lookup tables shared by every view
//
// Descriptions, icons, badge styles and labels for sensor events, plus the
// small formatting helpers the views render with.

use crate::derive::SensorFilter;
use crate::model::{PhotoRecord, SensorEvent, SensorKind};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

const EVENT_DESCRIPTIONS: &[(&str, &str)] = &[
    ("movimiento_detectado", "Movimiento detectado por sensor PIR"),
    (
        "objeto_detectado_foco_encendido",
        "Objeto cercano detectado - Foco encendido",
    ),
    (
        "objeto_fuera_rango_foco_apagado",
        "Objeto fuera de rango - Foco apagado",
    ),
    (
        "luz_detectada_foco_apagado",
        "Luz ambiente detectada - Foco apagado automáticamente",
    ),
    ("error_captura_imagen", "Error al capturar imagen"),
];

/// Human description of a symbolic event name
pub fn describe_event(name: &str) -> Cow<'static, str> {
    EVENT_DESCRIPTIONS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, text)| Cow::Borrowed(*text))
        .unwrap_or_else(|| Cow::Owned(humanize_event(name)))
}

/// Literal rendering: separators become spaces
pub fn humanize_event(name: &str) -> String {
    name.replace('_', " ")
}

/// Icon shown next to an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Walking,
    Warning,
    Lightbulb,
    Camera,
    Clock,
}

/// Badge colour for a sensor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    Danger,
    Warning,
    Info,
    Primary,
    Secondary,
}

impl Badge {
    pub fn css_class(&self) -> &'static str {
        match self {
            Badge::Danger => "bg-danger",
            Badge::Warning => "bg-warning text-dark",
            Badge::Info => "bg-info",
            Badge::Primary => "bg-primary",
            Badge::Secondary => "bg-secondary",
        }
    }
}

impl SensorKind {
    pub fn icon(&self) -> Icon {
        match self {
            SensorKind::Motion => Icon::Walking,
            SensorKind::Ultrasonic => Icon::Warning,
            SensorKind::Light => Icon::Lightbulb,
            SensorKind::Camera => Icon::Camera,
        }
    }

    pub fn badge(&self) -> Badge {
        match self {
            SensorKind::Motion => Badge::Danger,
            SensorKind::Ultrasonic => Badge::Warning,
            SensorKind::Light => Badge::Info,
            SensorKind::Camera => Badge::Primary,
        }
    }

    /// Short label used on the per-sensor counters
    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::Motion => "Sensor PIR",
            SensorKind::Ultrasonic => "Ultrasónico",
            SensorKind::Light => "Fotoresistencia",
            SensorKind::Camera => "Cámara",
        }
    }

    /// Label used in the category selector
    pub fn filter_label(&self) -> &'static str {
        match self {
            SensorKind::Motion => "Sensor PIR (Movimiento)",
            SensorKind::Ultrasonic => "Sensor Ultrasónico",
            SensorKind::Light => "Fotoresistencia (LDR)",
            SensorKind::Camera => "Cámara",
        }
    }
}

/// Icon for a possibly unknown category
pub fn icon_for(kind: Option<SensorKind>) -> Icon {
    kind.map_or(Icon::Clock, |k| k.icon())
}

/// Badge for a possibly unknown category
pub fn badge_for(kind: Option<SensorKind>) -> Badge {
    kind.map_or(Badge::Secondary, |k| k.badge())
}

impl SensorFilter {
    /// Message shown when the filtered list is empty
    pub fn empty_message(&self) -> &'static str {
        match self {
            SensorFilter::All => "No hay eventos disponibles",
            SensorFilter::Sensor(_) => "No hay eventos disponibles para este sensor",
        }
    }
}

/// "1 foto" / "3 fotos"
pub fn count_label(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

impl PhotoRecord {
    /// Inline image source for the JPEG payload
    pub fn data_uri(&self) -> Option<String> {
        self.image
            .as_deref()
            .map(|b64| format!("data:image/jpeg;base64,{}", b64))
    }

    pub fn resolution(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{} x {}", w, h)),
            _ => None,
        }
    }

    /// Size in kilobytes with two decimals
    pub fn size_kb(&self) -> Option<String> {
        self.size.map(|bytes| format!("{:.2} KB", bytes as f64 / 1024.0))
    }
}

impl SensorEvent {
    pub fn description(&self) -> Option<Cow<'static, str>> {
        self.event.as_deref().map(describe_event)
    }

    pub fn icon(&self) -> Icon {
        icon_for(self.kind())
    }

    pub fn badge(&self) -> Badge {
        badge_for(self.kind())
    }

    /// Distance reading, when the event carries one
    pub fn value_display(&self) -> Option<String> {
        self.value.map(|v| format!("{} cm", v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_descriptions() {
        assert_eq!(
            describe_event("movimiento_detectado"),
            "Movimiento detectado por sensor PIR"
        );
        assert_eq!(
            describe_event("error_captura_imagen"),
            "Error al capturar imagen"
        );
    }

    #[test]
    fn test_unknown_description_falls_back() {
        assert_eq!(describe_event("puerta_abierta"), "puerta abierta");
        assert_eq!(describe_event("plain"), "plain");
    }

    #[test]
    fn test_default_icon_and_badge() {
        assert_eq!(icon_for(None), Icon::Clock);
        assert_eq!(badge_for(None).css_class(), "bg-secondary");
        assert_eq!(badge_for(Some(SensorKind::Motion)).css_class(), "bg-danger");
    }

    #[test]
    fn test_photo_helpers() {
        let photo = PhotoRecord {
            id: "p".into(),
            image: Some("AAAA".into()),
            width: Some(640),
            height: Some(480),
            size: Some(2048),
            ..Default::default()
        };
        assert_eq!(photo.data_uri().as_deref(), Some("data:image/jpeg;base64,AAAA"));
        assert_eq!(photo.resolution().as_deref(), Some("640 x 480"));
        assert_eq!(photo.size_kb().as_deref(), Some("2.00 KB"));
    }

    #[test]
    fn test_count_label() {
        assert_eq!(count_label(1, "foto", "fotos"), "1 foto");
        assert_eq!(count_label(0, "foto", "fotos"), "0 fotos");
    }
}
