//! Tracker configuration

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Upper bound for every configured interval (one day)
pub const MAX_INTERVAL_MS: u64 = 86_400_000;

/// Tunables for ingestion cadence, popups and scene scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Records admitted per ingestion batch
    pub batch_size: usize,
    /// Pause between ingestion batches
    pub batch_interval_ms: u64,
    /// How long a popup stays up after selection
    pub popup_lifetime_ms: u64,
    /// Planet radius in scene units
    pub body_radius: f32,
    /// Marker sphere radius in scene units
    pub marker_size: f32,
    /// Selecting an object retires every other popup
    pub exclusive_popups: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            batch_interval_ms: 80,
            popup_lifetime_ms: 5000,
            body_radius: 1.0,
            marker_size: crate::renderer::MARKER_SIZE,
            exclusive_popups: false,
        }
    }
}

impl TrackerConfig {
    /// Load from a JSON file, missing keys take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tracker config: {:?}", path))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse tracker config: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.batch_size > 0, "batch_size must be at least 1");
        anyhow::ensure!(
            self.batch_interval_ms <= MAX_INTERVAL_MS,
            "batch_interval_ms must not exceed {} ms",
            MAX_INTERVAL_MS
        );
        anyhow::ensure!(
            self.popup_lifetime_ms <= MAX_INTERVAL_MS,
            "popup_lifetime_ms must not exceed {} ms",
            MAX_INTERVAL_MS
        );
        anyhow::ensure!(
            self.body_radius > 0.0 && self.body_radius.is_finite(),
            "body_radius must be positive"
        );
        anyhow::ensure!(
            self.marker_size > 0.0 && self.marker_size.is_finite(),
            "marker_size must be positive"
        );
        Ok(())
    }

    /// Pause between batches, clamped to `MAX_INTERVAL_MS`
    pub fn batch_interval(&self) -> Duration {
        clamped_millis(self.batch_interval_ms)
    }

    /// Popup lifetime, clamped to `MAX_INTERVAL_MS`
    pub fn popup_lifetime(&self) -> Duration {
        clamped_millis(self.popup_lifetime_ms)
    }
}

fn clamped_millis(ms: u64) -> Duration {
    // Bounded by MAX_INTERVAL_MS, so the conversion never wraps
    Duration::milliseconds(ms.min(MAX_INTERVAL_MS) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.batch_interval(), Duration::milliseconds(80));
        assert_eq!(config.popup_lifetime(), Duration::seconds(5));
        assert_eq!(config.marker_size, 0.0025);
        assert!(!config.exclusive_popups);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        std::fs::write(&path, r#"{"batch_size": 250, "exclusive_popups": true}"#).unwrap();

        let config = TrackerConfig::load(&path).unwrap();
        assert_eq!(config.batch_size, 250);
        assert!(config.exclusive_popups);
        assert_eq!(config.batch_interval_ms, 80);
    }

    #[test]
    fn test_load_rejects_zero_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");
        std::fs::write(&path, r#"{"batch_size": 0}"#).unwrap();
        assert!(TrackerConfig::load(&path).is_err());
    }

    #[test]
    fn test_load_rejects_oversized_intervals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.json");

        std::fs::write(&path, r#"{"popup_lifetime_ms": 18446744073709551615}"#).unwrap();
        let err = TrackerConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("popup_lifetime_ms"));

        std::fs::write(&path, r#"{"batch_interval_ms": 86400001}"#).unwrap();
        assert!(TrackerConfig::load(&path).is_err());

        std::fs::write(&path, r#"{"popup_lifetime_ms": 86400000}"#).unwrap();
        assert!(TrackerConfig::load(&path).is_ok());
    }

    #[test]
    fn test_unvalidated_intervals_are_clamped() {
        let config = TrackerConfig {
            popup_lifetime_ms: u64::MAX,
            batch_interval_ms: u64::MAX - 1,
            ..TrackerConfig::default()
        };
        assert_eq!(config.popup_lifetime(), Duration::days(1));
        assert_eq!(config.batch_interval(), Duration::days(1));
    }
}
