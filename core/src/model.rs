// Record model for the two mirrored collections
//
// Records are authored by the capture device, never by this crate. Every
// field apart from the store key is optional so that a half-written record
// still shows up in the views.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// A record that can be rebuilt from one child of a collection snapshot
pub trait Record: Clone + Send + Sync + 'static {
    /// Collection name used in logs
    const COLLECTION: &'static str;

    /// Build a record from a child key and its field map
    fn from_entry(key: &str, value: &Value) -> Self;

    fn id(&self) -> &str;

    fn timestamp(&self) -> Option<&str>;
}

/// Photo captured by the camera module
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Store key
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Base64 JPEG payload
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Payload size in bytes
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    /// Sibling fields this model does not name
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sensor event reported by the device
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorEvent {
    /// Store key
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Wire name of the sensor ("PIR", "Ultrasonico", "LDR", "Camara")
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub sensor: Option<String>,
    /// Symbolic snake_case event name
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Distance in centimetres, only set by the ultrasonic sensor
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Known sensor categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Motion,
    Ultrasonic,
    Light,
    Camera,
}

impl SensorKind {
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Motion,
        SensorKind::Ultrasonic,
        SensorKind::Light,
        SensorKind::Camera,
    ];

    /// Parse the value the device writes into `sensor`
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "PIR" => Some(SensorKind::Motion),
            "Ultrasonico" => Some(SensorKind::Ultrasonic),
            "LDR" => Some(SensorKind::Light),
            "Camara" => Some(SensorKind::Camera),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            SensorKind::Motion => "PIR",
            SensorKind::Ultrasonic => "Ultrasonico",
            SensorKind::Light => "LDR",
            SensorKind::Camera => "Camara",
        }
    }
}

impl SensorEvent {
    /// Category of this event, `None` for sensors outside the known set
    pub fn kind(&self) -> Option<SensorKind> {
        self.sensor.as_deref().and_then(SensorKind::from_wire)
    }
}

impl Record for PhotoRecord {
    const COLLECTION: &'static str = "photos";

    fn from_entry(key: &str, value: &Value) -> Self {
        decode_entry(key, value)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }
}

impl Record for SensorEvent {
    const COLLECTION: &'static str = "sensor_events";

    fn from_entry(key: &str, value: &Value) -> Self {
        decode_entry(key, value)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn timestamp(&self) -> Option<&str> {
        self.timestamp.as_deref()
    }
}

// Decode a child into a record. The key always wins over any `id` sibling,
// and a child that is not an object yields a record with only its key.
fn decode_entry<T>(key: &str, value: &Value) -> T
where
    T: DeserializeOwned + Default + HasId,
{
    let mut fields = match value {
        Value::Object(map) => map.clone(),
        other => {
            warn!(target: "model", key = %key, value = %other, "Child is not an object; keeping key only");
            Map::new()
        }
    };
    fields.remove("id");

    let mut record = match serde_json::from_value::<T>(Value::Object(fields)) {
        Ok(record) => record,
        Err(e) => {
            warn!(target: "model", key = %key, error = %e, "Failed to decode child; keeping key only");
            T::default()
        }
    };
    record.set_id(key);
    record
}

trait HasId {
    fn set_id(&mut self, id: &str);
}

impl HasId for PhotoRecord {
    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

impl HasId for SensorEvent {
    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }
}

// A mistyped field decodes as absent instead of failing the whole record
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
