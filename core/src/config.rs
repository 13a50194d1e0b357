// Runtime configuration
//
// Connection settings are supplied at start-up (environment or the demo's
// TOML overlay); nothing is compiled in.

use crate::{HomewatchError, Result};
use std::fmt;

/// Where the hosted store lives
#[derive(Clone, Default)]
pub struct ConnectionConfig {
    pub database_url: String,
    pub api_key: Option<String>,
    pub project_id: Option<String>,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("database_url", &self.database_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("project_id", &self.project_id)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct HomewatchConfig {
    pub connection: ConnectionConfig,
    /// Collection written by the camera
    pub photos_path: String,
    /// Collection written by the sensors
    pub sensors_path: String,
    pub dashboard_photo_limit: usize,
    pub dashboard_event_limit: usize,
    /// Photos shown in the dashboard preview row
    pub preview_count: usize,
    /// Child field used by the gallery and the event log
    pub order_field: String,
}

impl Default for HomewatchConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig {
                database_url: "memory://local".to_string(),
                api_key: None,
                project_id: None,
            },
            photos_path: "eventos/fotos".to_string(),
            sensors_path: "eventos/sensores".to_string(),
            dashboard_photo_limit: 5,
            dashboard_event_limit: 10,
            preview_count: 3,
            order_field: "timestamp".to_string(),
        }
    }
}

impl HomewatchConfig {
    /// Defaults overlaid with `HOMEWATCH_*` environment variables
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            connection: ConnectionConfig {
                database_url: env_string("HOMEWATCH_DATABASE_URL")
                    .unwrap_or(d.connection.database_url),
                api_key: env_string("HOMEWATCH_API_KEY"),
                project_id: env_string("HOMEWATCH_PROJECT_ID"),
            },
            photos_path: env_string("HOMEWATCH_PHOTOS_PATH").unwrap_or(d.photos_path),
            sensors_path: env_string("HOMEWATCH_SENSORS_PATH").unwrap_or(d.sensors_path),
            dashboard_photo_limit: env_parse("HOMEWATCH_DASHBOARD_PHOTO_LIMIT")
                .unwrap_or(d.dashboard_photo_limit),
            dashboard_event_limit: env_parse("HOMEWATCH_DASHBOARD_EVENT_LIMIT")
                .unwrap_or(d.dashboard_event_limit),
            preview_count: env_parse("HOMEWATCH_PREVIEW_COUNT").unwrap_or(d.preview_count),
            order_field: env_string("HOMEWATCH_ORDER_FIELD").unwrap_or(d.order_field),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.connection.database_url.as_str();
        match url.split_once("://") {
            Some((scheme, rest)) if !scheme.is_empty() && !rest.is_empty() => {}
            _ => {
                return Err(HomewatchError::Config(format!(
                    "database_url must look like scheme://host, got {:?}",
                    url
                )))
            }
        }
        for (name, path) in [
            ("photos_path", &self.photos_path),
            ("sensors_path", &self.sensors_path),
            ("order_field", &self.order_field),
        ] {
            if path.trim().is_empty() {
                return Err(HomewatchError::Config(format!("{} must not be empty", name)));
            }
        }
        for (name, limit) in [
            ("dashboard_photo_limit", self.dashboard_photo_limit),
            ("dashboard_event_limit", self.dashboard_event_limit),
            ("preview_count", self.preview_count),
        ] {
            if limit == 0 {
                return Err(HomewatchError::Config(format!("{} must be at least 1", name)));
            }
        }
        Ok(())
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(HomewatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = HomewatchConfig::default();
        cfg.connection.database_url = "smarthome.example".into();
        assert!(cfg.validate().is_err());

        let mut cfg = HomewatchConfig::default();
        cfg.sensors_path = " ".into();
        assert!(cfg.validate().is_err());

        let mut cfg = HomewatchConfig::default();
        cfg.preview_count = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let conn = ConnectionConfig {
            database_url: "https://db.example".into(),
            api_key: Some("secret-key".into()),
            project_id: None,
        };
        let rendered = format!("{:?}", conn);
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
