//! Engine settings file.
//!
//! A small optional JSON document for deployments that want to tune the
//! engine without recompiling:
//!
//! ```json
//! { "cache_ceiling": 8, "default_seconds": 5 }
//! ```
//!
//! Both fields are optional; absent fields keep their built-in values.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::registry::DEFAULT_SECONDS;
use crate::synth::DEFAULT_CACHE_CEILING;

/// Deserialised settings document.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Countdowns at or above this many seconds are never cached.
    #[serde(default = "default_cache_ceiling")]
    pub cache_ceiling: u32,

    /// Countdown length used when an invocation does not name one.
    #[serde(default = "default_seconds")]
    pub default_seconds: u32,
}

fn default_cache_ceiling() -> u32 {
    DEFAULT_CACHE_CEILING
}

fn default_seconds() -> u32 {
    DEFAULT_SECONDS
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { cache_ceiling: DEFAULT_CACHE_CEILING, default_seconds: DEFAULT_SECONDS }
    }
}

impl EngineSettings {
    /// Read settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let settings_err = |details: String| Error::Settings { path: path.to_path_buf(), details };
        let text = std::fs::read_to_string(path).map_err(|e| settings_err(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| settings_err(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_full_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "cache_ceiling": 8, "default_seconds": 5 }"#).unwrap();
        let settings = EngineSettings::load(&path).unwrap();
        assert_eq!(settings.cache_ceiling, 8);
        assert_eq!(settings.default_seconds, 5);
    }

    #[test]
    fn test_absent_fields_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{}").unwrap();
        let settings = EngineSettings::load(&path).unwrap();
        assert_eq!(settings.cache_ceiling, DEFAULT_CACHE_CEILING);
        assert_eq!(settings.default_seconds, DEFAULT_SECONDS);
    }

    #[test]
    fn test_missing_file() {
        let err = EngineSettings::load(Path::new("/nonexistent/settings.json")).unwrap_err();
        assert!(matches!(err, Error::Settings { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(EngineSettings::load(&path).unwrap_err(), Error::Settings { .. }));
    }
}
