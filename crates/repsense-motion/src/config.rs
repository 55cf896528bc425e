//! Per-exercise thresholds.
//!
//! Every number a rep counter compares against lives here so it can be tuned
//! from a settings file or overridden in tests. Each config validates itself
//! before a counter is built from it.

use repsense_core::{Error, FrameGeometry, Result, Side, SideStrategy};
use serde::{Deserialize, Serialize};

/// Inclusive angle range in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleBand {
    pub min: f64,
    pub max: f64,
}

impl AngleBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, angle: f64) -> bool {
        self.min <= angle && angle <= self.max
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !(self.min.is_finite() && self.max.is_finite()) {
            return Err(Error::invalid_config(format!("{name} band is not finite")));
        }
        if self.min > self.max {
            return Err(Error::invalid_config(format!(
                "{name} band is inverted: {} > {}",
                self.min, self.max
            )));
        }
        if self.min < 0.0 || self.max > 180.0 {
            return Err(Error::invalid_config(format!(
                "{name} band [{}, {}] lies outside [0, 180]",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

fn check_angle(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid_config(format!("{name} must be an angle in [0, 180], got {value}")))
    }
}

fn check_secs(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(format!("{name} must be a non-negative duration, got {value}")))
    }
}

fn check_ascending(names: &[&str], values: &[f64]) -> Result<()> {
    for i in 1..values.len() {
        if values[i - 1] >= values[i] {
            return Err(Error::invalid_config(format!(
                "{} ({}) must be below {} ({})",
                names[i - 1],
                values[i - 1],
                names[i],
                values[i]
            )));
        }
    }
    Ok(())
}

fn check_frame(frame: &FrameGeometry) -> Result<()> {
    if frame.is_valid() {
        Ok(())
    } else {
        Err(Error::invalid_config(format!(
            "frame geometry must be positive, got {}x{}",
            frame.width, frame.height
        )))
    }
}

/// Bicep curl thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurlConfig {
    /// Warm-up before counting starts (seconds)
    pub countdown_secs: f64,
    /// Elbow angle above which the arm counts as extended (rep start)
    pub extended_angle: f64,
    /// Elbow angle below which the curl counts as complete
    pub min_curl_angle: f64,
    /// Rebound angle that marks an abandoned curl
    pub half_rep_threshold: f64,
    /// How far the arm must fall back from its best angle to abort the rep
    pub half_rep_rebound: f64,
    /// Elbow angle treated as a locked-out joint
    pub lock_angle: f64,
    /// Time above `lock_angle` before the lock guard trips (seconds)
    pub lock_secs: f64,
    /// Reps faster than this are counted as incorrect (seconds)
    pub min_rep_secs: f64,
    /// Optional upper bound; reps slower than this are counted as incorrect
    pub max_rep_secs: Option<f64>,
    pub side: SideStrategy,
}

impl Default for CurlConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 3.0,
            extended_angle: 160.0,
            min_curl_angle: 30.0,
            half_rep_threshold: 80.0,
            half_rep_rebound: 20.0,
            lock_angle: 175.0,
            lock_secs: 0.5,
            min_rep_secs: 0.7,
            max_rep_secs: None,
            side: SideStrategy::Fixed(Side::Left),
        }
    }
}

impl CurlConfig {
    pub fn validate(&self) -> Result<()> {
        check_secs("countdown_secs", self.countdown_secs)?;
        check_secs("lock_secs", self.lock_secs)?;
        check_secs("min_rep_secs", self.min_rep_secs)?;
        check_angle("half_rep_rebound", self.half_rep_rebound)?;
        for (name, value) in [
            ("min_curl_angle", self.min_curl_angle),
            ("half_rep_threshold", self.half_rep_threshold),
            ("extended_angle", self.extended_angle),
            ("lock_angle", self.lock_angle),
        ] {
            check_angle(name, value)?;
        }
        check_ascending(
            &["min_curl_angle", "half_rep_threshold", "extended_angle", "lock_angle"],
            &[self.min_curl_angle, self.half_rep_threshold, self.extended_angle, self.lock_angle],
        )?;
        if let Some(max) = self.max_rep_secs {
            check_secs("max_rep_secs", max)?;
            if max <= self.min_rep_secs {
                return Err(Error::invalid_config(format!(
                    "max_rep_secs ({max}) must exceed min_rep_secs ({})",
                    self.min_rep_secs
                )));
            }
        }
        Ok(())
    }
}

/// Named squat threshold sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquatPreset {
    Beginner,
    Pro,
}

/// Knee-to-vertical bands that discretize the squat into states
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KneeBands {
    /// Standing
    pub normal: AngleBand,
    /// On the way down or up
    pub trans: AngleBand,
    /// Deep enough to count
    pub pass: AngleBand,
}

/// Squat thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquatConfig {
    pub countdown_secs: f64,
    pub knee_bands: KneeBands,
    /// Hip-to-vertical window; above `max` leans back, below `min` leans forward
    pub hip_range: AngleBand,
    /// Knee-to-vertical window (exclusive) in which to suggest lowering the hips
    pub lower_hips_range: AngleBand,
    /// Knee-to-vertical angle past which the squat is too deep
    pub knee_max: f64,
    /// Ankle-to-vertical angle past which the knee travels over the toe
    pub ankle_max: f64,
    /// Nose-shoulder offset angle above which the camera faces the subject head-on
    pub offset_thresh: f64,
    /// Seconds without progress before the counters reset
    pub inactive_secs: f64,
    /// Frames a posture warning stays up once raised
    pub feedback_frames: u32,
    pub side: SideStrategy,
    pub frame: FrameGeometry,
}

impl SquatConfig {
    pub fn preset(preset: SquatPreset) -> Self {
        match preset {
            SquatPreset::Beginner => Self::beginner(),
            SquatPreset::Pro => Self::pro(),
        }
    }

    pub fn beginner() -> Self {
        Self {
            countdown_secs: 0.0,
            knee_bands: KneeBands {
                normal: AngleBand::new(0.0, 32.0),
                trans: AngleBand::new(35.0, 65.0),
                pass: AngleBand::new(70.0, 95.0),
            },
            hip_range: AngleBand::new(10.0, 50.0),
            lower_hips_range: AngleBand::new(50.0, 70.0),
            knee_max: 95.0,
            ankle_max: 45.0,
            offset_thresh: 35.0,
            inactive_secs: 15.0,
            feedback_frames: 50,
            side: SideStrategy::FootShoulder,
            frame: FrameGeometry::default(),
        }
    }

    pub fn pro() -> Self {
        Self {
            knee_bands: KneeBands {
                normal: AngleBand::new(0.0, 32.0),
                trans: AngleBand::new(35.0, 65.0),
                pass: AngleBand::new(80.0, 95.0),
            },
            hip_range: AngleBand::new(15.0, 50.0),
            lower_hips_range: AngleBand::new(50.0, 80.0),
            ankle_max: 30.0,
            ..Self::beginner()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_secs("countdown_secs", self.countdown_secs)?;
        let bands = &self.knee_bands;
        bands.normal.validate("normal")?;
        bands.trans.validate("trans")?;
        bands.pass.validate("pass")?;
        if bands.normal.max >= bands.trans.min || bands.trans.max >= bands.pass.min {
            return Err(Error::invalid_config(
                "knee bands must be ordered normal < trans < pass without overlap",
            ));
        }
        self.hip_range.validate("hip_range")?;
        self.lower_hips_range.validate("lower_hips_range")?;
        check_angle("knee_max", self.knee_max)?;
        check_angle("ankle_max", self.ankle_max)?;
        check_angle("offset_thresh", self.offset_thresh)?;
        if self.lower_hips_range.max > self.knee_max {
            return Err(Error::invalid_config(format!(
                "lower_hips_range ends at {} beyond knee_max {}",
                self.lower_hips_range.max, self.knee_max
            )));
        }
        check_secs("inactive_secs", self.inactive_secs)?;
        if self.inactive_secs == 0.0 {
            return Err(Error::invalid_config("inactive_secs must be positive"));
        }
        check_frame(&self.frame)
    }
}

impl Default for SquatConfig {
    fn default() -> Self {
        Self::beginner()
    }
}

/// Push-up thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushUpConfig {
    pub countdown_secs: f64,
    /// Elbow angle below which the descent starts
    pub descent_angle: f64,
    /// Elbow angle above which the arms count as extended again
    pub extension_angle: f64,
    /// Depth boundary between the "great" and "acceptable" buckets
    pub good_elbow_angle: f64,
    /// Depth at or below which the rep is rejected
    pub min_elbow_angle: f64,
    /// Shoulder-hip-knee angle required for a straight body line
    pub min_body_angle: f64,
    /// Number of frame-to-frame elbow deltas kept for the movement filter
    pub movement_window: usize,
    /// Summed elbow movement needed before a transition is honored (degrees)
    pub min_angle_change: f64,
    pub side: SideStrategy,
}

impl Default for PushUpConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 5.0,
            descent_angle: 120.0,
            extension_angle: 160.0,
            good_elbow_angle: 90.0,
            min_elbow_angle: 70.0,
            min_body_angle: 160.0,
            movement_window: 10,
            min_angle_change: 15.0,
            side: SideStrategy::Visibility,
        }
    }
}

impl PushUpConfig {
    pub fn validate(&self) -> Result<()> {
        check_secs("countdown_secs", self.countdown_secs)?;
        for (name, value) in [
            ("min_elbow_angle", self.min_elbow_angle),
            ("good_elbow_angle", self.good_elbow_angle),
            ("descent_angle", self.descent_angle),
            ("extension_angle", self.extension_angle),
            ("min_body_angle", self.min_body_angle),
            ("min_angle_change", self.min_angle_change),
        ] {
            check_angle(name, value)?;
        }
        check_ascending(
            &["min_elbow_angle", "good_elbow_angle", "descent_angle", "extension_angle"],
            &[
                self.min_elbow_angle,
                self.good_elbow_angle,
                self.descent_angle,
                self.extension_angle,
            ],
        )?;
        if self.movement_window == 0 {
            return Err(Error::invalid_config("movement_window must hold at least one delta"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        CurlConfig::default().validate().unwrap();
        SquatConfig::beginner().validate().unwrap();
        SquatConfig::pro().validate().unwrap();
        PushUpConfig::default().validate().unwrap();
    }

    #[test]
    fn test_overlapping_knee_bands_rejected() {
        let mut config = SquatConfig::beginner();
        config.knee_bands.trans = AngleBand::new(30.0, 65.0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_inverted_band_rejected() {
        let mut config = SquatConfig::beginner();
        config.knee_bands.pass = AngleBand::new(95.0, 70.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_curl_thresholds_must_ascend() {
        let config = CurlConfig {
            half_rep_threshold: 20.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CurlConfig {
            max_rep_secs: Some(0.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pushup_depth_buckets_must_ascend() {
        let config = PushUpConfig {
            min_elbow_angle: 95.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PushUpConfig {
            movement_window: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pro_preset_is_stricter() {
        let beginner = SquatConfig::beginner();
        let pro = SquatConfig::pro();
        assert!(pro.knee_bands.pass.min > beginner.knee_bands.pass.min);
        assert!(pro.ankle_max < beginner.ankle_max);
        assert_eq!(pro.inactive_secs, beginner.inactive_secs);
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: CurlConfig = serde_json::from_str(r#"{"min_rep_secs": 1.0}"#).unwrap();
        assert_eq!(config.min_rep_secs, 1.0);
        assert_eq!(config.lock_angle, 175.0);
    }
}
