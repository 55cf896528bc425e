//! Settings loading.
//!
//! Thresholds come from an optional TOML file layered under `REPSENSE_*`
//! environment variables, e.g. `REPSENSE_CURL__MIN_REP_SECS=1.0`. Keys that
//! are not set keep their defaults; for the squat the defaults come from the
//! selected preset.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use repsense_core::{Error, Result};
use repsense_motion::{CurlConfig, Exercise, ExerciseConfig, PushUpConfig, SquatConfig, SquatPreset};

const ENV_PREFIX: &str = "REPSENSE";

/// Runner tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Reports buffered before the session waits for the consumer
    pub report_queue_size: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            report_queue_size: 256,
        }
    }
}

/// Squat section: a preset plus threshold overrides on top of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquatSettings {
    pub preset: SquatPreset,
    pub thresholds: SquatConfig,
}

impl Default for SquatSettings {
    fn default() -> Self {
        Self::from_preset(SquatPreset::Beginner)
    }
}

impl SquatSettings {
    pub fn from_preset(preset: SquatPreset) -> Self {
        Self {
            preset,
            thresholds: SquatConfig::preset(preset),
        }
    }
}

/// Complete settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub curl: CurlConfig,
    pub squat: SquatSettings,
    pub pushup: PushUpConfig,
    pub stream: StreamSettings,
}

impl Settings {
    /// Load from a TOML file with environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let builder = config::Config::builder().add_source(config::File::from(path.as_ref()));
        Self::load(builder)
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::load(config::Config::builder())
    }

    fn load(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        let layered = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        let overrides: Value = layered
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;
        Self::from_overrides(overrides)
    }

    /// Apply a tree of overrides on top of the defaults
    pub fn from_overrides(overrides: Value) -> Result<Self> {
        let preset = match overrides.pointer("/squat/preset") {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| Error::Config(format!("squat.preset: {e}")))?,
            None => SquatPreset::Beginner,
        };
        let defaults = Settings {
            squat: SquatSettings::from_preset(preset),
            ..Default::default()
        };

        let mut merged = serde_json::to_value(&defaults)?;
        merge(&mut merged, overrides);
        serde_json::from_value(merged).map_err(|e| Error::Config(e.to_string()))
    }

    /// Thresholds for `exercise`, validated
    pub fn exercise_config(&self, exercise: Exercise) -> Result<ExerciseConfig> {
        let config = match exercise {
            Exercise::BicepCurl => ExerciseConfig::BicepCurl(self.curl.clone()),
            Exercise::Squat => ExerciseConfig::Squat(self.squat.thresholds.clone()),
            Exercise::PushUp => ExerciseConfig::PushUp(self.pushup.clone()),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Deep-merge `overrides` into `base`; objects merge key by key, anything
/// else replaces
fn merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.stream.report_queue_size, 256);
        assert_eq!(settings.squat.thresholds, SquatConfig::beginner());
        for exercise in Exercise::ALL {
            settings.exercise_config(exercise).unwrap();
        }
    }

    #[test]
    fn test_overrides_keep_unset_defaults() {
        let settings = Settings::from_overrides(json!({
            "curl": {"min_rep_secs": 1.2},
            "pushup": {"movement_window": 6}
        }))
        .unwrap();

        assert_eq!(settings.curl.min_rep_secs, 1.2);
        assert_eq!(settings.curl.lock_angle, 175.0);
        assert_eq!(settings.pushup.movement_window, 6);
        assert_eq!(settings.pushup.descent_angle, 120.0);
    }

    #[test]
    fn test_squat_preset_then_overrides() {
        let settings = Settings::from_overrides(json!({
            "squat": {"preset": "pro", "thresholds": {"inactive_secs": 30.0}}
        }))
        .unwrap();

        assert_eq!(settings.squat.preset, SquatPreset::Pro);
        assert_eq!(settings.squat.thresholds.ankle_max, 30.0);
        assert_eq!(settings.squat.thresholds.inactive_secs, 30.0);
    }

    #[test]
    fn test_bad_preset_rejected() {
        let result = Settings::from_overrides(json!({"squat": {"preset": "olympic"}}));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_thresholds_fail_validation() {
        let settings = Settings::from_overrides(json!({
            "curl": {"min_curl_angle": 170.0}
        }))
        .unwrap();
        assert!(matches!(
            settings.exercise_config(Exercise::BicepCurl),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = std::env::temp_dir().join(format!("repsense-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("repsense.toml");
        std::fs::write(
            &path,
            "[squat]\npreset = \"pro\"\n\n[stream]\nreport_queue_size = 8\n",
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.squat.preset, SquatPreset::Pro);
        assert_eq!(settings.stream.report_queue_size, 8);

        std::fs::remove_dir_all(&dir).ok();
    }
}
