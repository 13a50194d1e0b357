// Query modifiers understood by snapshot sources

use crate::{HomewatchError, Result};
use serde::{Deserialize, Serialize};

/// How a subscription is bounded and ordered.
///
/// Two shapes are used by the views:
/// - bounded: the last `n` children in store order (`QueryOptions::last`)
/// - unbounded: every child ordered by a field (`QueryOptions::ordered_by`)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Child field used for ordering; `None` means store key order
    pub order_by: Option<String>,
    /// Keep only the last N children of the ordered set
    pub limit_to_last: Option<usize>,
}

impl QueryOptions {
    pub fn last(n: usize) -> Self {
        Self {
            order_by: None,
            limit_to_last: Some(n),
        }
    }

    pub fn ordered_by(field: impl Into<String>) -> Self {
        Self {
            order_by: Some(field.into()),
            limit_to_last: None,
        }
    }

    pub fn with_limit(mut self, n: usize) -> Self {
        self.limit_to_last = Some(n);
        self
    }

    pub fn is_bounded(&self) -> bool {
        self.limit_to_last.is_some()
    }

    /// Unbounded queries must name a sort field, and limits must be non-zero
    pub fn validate(&self) -> Result<()> {
        match (&self.order_by, self.limit_to_last) {
            (_, Some(0)) => Err(HomewatchError::InvalidQuery(
                "limit_to_last must be at least 1".into(),
            )),
            (None, None) => Err(HomewatchError::InvalidQuery(
                "unbounded query requires an order_by field".into(),
            )),
            (Some(field), _) if field.trim().is_empty() => Err(HomewatchError::InvalidQuery(
                "order_by field must not be empty".into(),
            )),
            _ => Ok(()),
        }
    }
}
