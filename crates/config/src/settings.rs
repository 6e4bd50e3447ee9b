// Application settings
// Loaded from ~/.config/cartcheck/settings.json

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum SettingsError {
    Io(String),
    Parse(String),
    /// A value outside its allowed range.
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "settings IO error: {msg}"),
            Self::Parse(msg) => write!(f, "settings parse error: {msg}"),
            Self::Invalid { key, reason } => write!(f, "invalid setting '{key}': {reason}"),
        }
    }
}

impl std::error::Error for SettingsError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Basket
    #[serde(rename = "basket.capacityLiters")]
    pub capacity_liters: f64,

    #[serde(rename = "basket.nearFullPercent")]
    pub near_full_percent: u8,

    // Scan session
    #[serde(rename = "scan.tickIntervalMs")]
    pub tick_interval_ms: u64,

    #[serde(rename = "scan.maxProgressStep")]
    pub max_progress_step: f64,

    #[serde(rename = "scan.maxOverlays")]
    pub max_overlays: usize,

    #[serde(rename = "scan.overlayProbability")]
    pub overlay_probability: f64,

    // Detector
    #[serde(rename = "detector.missProbability")]
    pub miss_probability: f64,

    #[serde(rename = "detector.extraProbability")]
    pub extra_probability: f64,

    #[serde(rename = "detector.minConfidence")]
    pub min_confidence: f32,

    #[serde(rename = "detector.seed", skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Basket: typical hand basket is 30-40 L
            capacity_liters: 40.0,
            near_full_percent: 90,
            // Scan
            tick_interval_ms: 400,
            max_progress_step: 18.0,
            max_overlays: 7,
            overlay_probability: 0.4,
            // Detector
            miss_probability: 0.2,
            extra_probability: 0.35,
            min_confidence: 0.5,
            seed: None,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cartcheck");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return settings;
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    /// Load and validate a settings.json file. `//` comment lines are ignored.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| SettingsError::Io(format!("{}: {e}", path.display())))?;

        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let settings: Self =
            serde_json::from_str(&cleaned).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a TOML override file. Keys are the same quoted dotted names as the JSON file.
    pub fn from_toml(s: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(s).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save current settings to the default location
    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }

        let json =
            serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))?;

        fs::write(path, json).map_err(|e| SettingsError::Io(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        fn probability(key: &'static str, value: f64) -> Result<(), SettingsError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(SettingsError::Invalid {
                    key,
                    reason: format!("{value} is not within 0..=1"),
                })
            }
        }

        if !(self.capacity_liters > 0.0 && self.capacity_liters.is_finite()) {
            return Err(SettingsError::Invalid {
                key: "basket.capacityLiters",
                reason: "must be a positive number".into(),
            });
        }
        if self.near_full_percent > 100 {
            return Err(SettingsError::Invalid {
                key: "basket.nearFullPercent",
                reason: "must be at most 100".into(),
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(SettingsError::Invalid {
                key: "scan.tickIntervalMs",
                reason: "must be greater than 0".into(),
            });
        }
        if !(self.max_progress_step > 0.0 && self.max_progress_step.is_finite()) {
            return Err(SettingsError::Invalid {
                key: "scan.maxProgressStep",
                reason: "must be a positive number".into(),
            });
        }
        probability("scan.overlayProbability", self.overlay_probability)?;
        probability("detector.missProbability", self.miss_probability)?;
        probability("detector.extraProbability", self.extra_probability)?;
        probability("detector.minConfidence", f64::from(self.min_confidence))?;
        Ok(())
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {e}");
                return;
            }
        }

        let default_config = r#"{
    // Basket size estimator (liters, percent)
    "basket.capacityLiters": 40,
    "basket.nearFullPercent": 90,

    // Video scan progress ticker
    "scan.tickIntervalMs": 400,
    "scan.maxProgressStep": 18,
    "scan.maxOverlays": 7,
    "scan.overlayProbability": 0.4,

    // Detection
    // missProbability / extraProbability only affect the simulated detector
    "detector.missProbability": 0.2,
    "detector.extraProbability": 0.35,
    "detector.minConfidence": 0.5
}
"#;

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("Error writing default settings.json: {e}");
        }
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.capacity_liters, 40.0);
        assert_eq!(settings.tick_interval_ms, 400);
    }

    #[test]
    fn load_commented_json_with_partial_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{
    // bigger trolley
    "basket.capacityLiters": 100,
    "detector.seed": 7
}"#,
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.capacity_liters, 100.0);
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.tick_interval_ms, 400);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            near_full_percent: 80,
            seed: Some(3),
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn toml_override() {
        let settings = Settings::from_toml(
            r#"
"scan.tickIntervalMs" = 50
"detector.missProbability" = 0.0
"#,
        )
        .unwrap();
        assert_eq!(settings.tick_interval_ms, 50);
        assert_eq!(settings.miss_probability, 0.0);
        assert_eq!(settings.extra_probability, 0.35);
    }

    #[test]
    fn out_of_range_probability_rejected() {
        let err = Settings::from_toml(r#""detector.extraProbability" = 1.5"#).unwrap_err();
        match err {
            SettingsError::Invalid { key, .. } => assert_eq!(key, "detector.extraProbability"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(SettingsError::Parse(_))));
    }
}
