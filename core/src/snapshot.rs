// Snapshot payloads and their projection into ordered record lists

use crate::model::Record;
use crate::query::QueryOptions;
use serde_json::Value;
use std::cmp::Ordering;
use tracing::warn;

/// Full state of a collection (or of a bounded query over it) at one instant
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub path: String,
    /// Children in store delivery order; `None` when the collection is absent
    pub children: Option<Vec<(String, Value)>>,
}

impl Snapshot {
    pub fn new(path: impl Into<String>, children: Vec<(String, Value)>) -> Self {
        Self {
            path: path.into(),
            children: Some(children),
        }
    }

    /// Snapshot for a path with no data
    pub fn absent(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            children: None,
        }
    }

    /// Build from a raw payload: `null` or an object keyed by child id.
    /// Object key order is kept as delivered.
    pub fn from_value(path: impl Into<String>, value: Value) -> Self {
        let path = path.into();
        match value {
            Value::Null => Self::absent(path),
            Value::Object(map) => Self::new(path, map.into_iter().collect()),
            other => {
                warn!(target: "snapshot", path = %path, value = %other, "Collection payload is not an object; treating as absent");
                Self::absent(path)
            }
        }
    }

    pub fn exists(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn len(&self) -> usize {
        self.children.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Convert a snapshot into a most-recent-first list.
///
/// Bounded queries keep the order the store delivered; unbounded queries are
/// re-sorted by their `order_by` field first. Both are then reversed, since
/// the store delivers ascending order.
pub fn project<T: Record>(snapshot: &Snapshot, query: &QueryOptions) -> Vec<T> {
    let Some(children) = &snapshot.children else {
        return Vec::new();
    };

    let mut ordered: Vec<&(String, Value)> = children.iter().collect();
    if !query.is_bounded() {
        if let Some(field) = query.order_by.as_deref() {
            ordered.sort_by(|a, b| compare_children(Some(field), a, b));
        }
    }

    ordered
        .into_iter()
        .rev()
        .map(|(key, value)| T::from_entry(key, value))
        .collect()
}

/// Store ordering of two children: by `order_by` field when given, then by key
pub fn compare_children(
    order_by: Option<&str>,
    (key_a, value_a): &(String, Value),
    (key_b, value_b): &(String, Value),
) -> Ordering {
    let by_field = match order_by {
        Some(field) => compare_values(value_a.get(field), value_b.get(field)),
        None => Ordering::Equal,
    };
    by_field.then_with(|| compare_keys(key_a, key_b))
}

/// Missing < false < true < numbers < strings < objects
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match rank(a).cmp(&rank(b)) {
        Ordering::Equal => {}
        other => return other,
    }
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

// Integer-like keys sort numerically before all other keys
fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(false)) => 1,
        Some(Value::Bool(true)) => 2,
        Some(Value::Number(_)) => 3,
        Some(Value::String(_)) => 4,
        Some(Value::Array(_)) | Some(Value::Object(_)) => 5,
    }
}
