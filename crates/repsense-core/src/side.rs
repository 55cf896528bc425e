//! Choosing which body side an exercise is read from.
//!
//! Selection is recomputed independently on every frame; there is no
//! hysteresis, so a subject turned square to the camera can flip sides
//! between frames.

use serde::{Deserialize, Serialize};

use crate::types::{Joint, PoseLandmarks, Side};

/// Picks the active body side for one frame
pub trait SideSelector: Send + Sync {
    /// `None` when neither side has enough landmarks to decide
    fn select(&self, landmarks: &PoseLandmarks) -> Option<Side>;
}

/// Always reads the same side
#[derive(Debug, Clone, Copy)]
pub struct FixedSide(pub Side);

impl SideSelector for FixedSide {
    fn select(&self, _landmarks: &PoseLandmarks) -> Option<Side> {
        Some(self.0)
    }
}

/// Reads the side whose limb chain the estimator sees more confidently
#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilitySelector;

impl SideSelector for VisibilitySelector {
    fn select(&self, landmarks: &PoseLandmarks) -> Option<Side> {
        let left = landmarks.side_visibility(Side::Left, &Joint::LIMB_CHAIN);
        let right = landmarks.side_visibility(Side::Right, &Joint::LIMB_CHAIN);

        if left > right {
            Some(Side::Left)
        } else {
            Some(Side::Right)
        }
    }
}

/// Reads the side with the larger vertical foot-to-shoulder span.
///
/// In a side-on view the near side projects a longer body line, which makes
/// this a cheap proxy for "facing the camera".
#[derive(Debug, Clone, Copy, Default)]
pub struct FootShoulderSelector;

impl FootShoulderSelector {
    fn span(landmarks: &PoseLandmarks, side: Side) -> Option<f64> {
        let foot = landmarks.get(Joint::Foot.on(side))?;
        let shoulder = landmarks.get(Joint::Shoulder.on(side))?;
        Some((foot.y - shoulder.y).abs())
    }
}

impl SideSelector for FootShoulderSelector {
    fn select(&self, landmarks: &PoseLandmarks) -> Option<Side> {
        match (Self::span(landmarks, Side::Left), Self::span(landmarks, Side::Right)) {
            (Some(left), Some(right)) if left > right => Some(Side::Left),
            (Some(_), Some(_)) => Some(Side::Right),
            (Some(_), None) => Some(Side::Left),
            (None, Some(_)) => Some(Side::Right),
            (None, None) => None,
        }
    }
}

/// Serializable choice of [`SideSelector`], used in exercise configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideStrategy {
    Fixed(Side),
    Visibility,
    FootShoulder,
}

impl SideStrategy {
    pub fn selector(&self) -> Box<dyn SideSelector> {
        match self {
            SideStrategy::Fixed(side) => Box::new(FixedSide(*side)),
            SideStrategy::Visibility => Box::new(VisibilitySelector),
            SideStrategy::FootShoulder => Box::new(FootShoulderSelector),
        }
    }
}
