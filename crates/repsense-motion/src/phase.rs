//! Discrete rep phases.

use serde::{Deserialize, Serialize};

use crate::config::KneeBands;

/// Phase of a curl or push-up cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokePhase {
    #[default]
    None,
    Down,
    Up,
}

/// Discretized knee-to-vertical angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KneeState {
    /// Standing
    S1,
    /// Transitional
    S2,
    /// Deep enough to pass
    S3,
}

impl KneeState {
    /// Map a knee angle onto the configured bands. The angle is truncated to
    /// whole degrees first, so 32.7 falls in a band ending at 32.
    pub fn classify(knee_angle: f64, bands: &KneeBands) -> Option<Self> {
        let knee = knee_angle.trunc();
        if bands.normal.contains(knee) {
            Some(KneeState::S1)
        } else if bands.trans.contains(knee) {
            Some(KneeState::S2)
        } else if bands.pass.contains(knee) {
            Some(KneeState::S3)
        } else {
            None
        }
    }
}

/// Ordered buffer of squat states seen since the last standing frame
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquatSequence(Vec<KneeState>);

impl SquatSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a state.
    ///
    /// `S2` is accepted while nothing is pending, or once more on the way back
    /// up after an `S3`. `S3` is accepted once, and only after an `S2`.
    /// `S1` never enters the buffer.
    pub fn push(&mut self, state: KneeState) {
        match state {
            KneeState::S2 => {
                let s2 = self.count_s2();
                if (s2 == 0 && !self.contains_s3()) || (self.contains_s3() && s2 == 1) {
                    self.0.push(state);
                }
            }
            KneeState::S3 => {
                if !self.contains_s3() && self.count_s2() > 0 {
                    self.0.push(state);
                }
            }
            KneeState::S1 => {}
        }
    }

    pub fn count_s2(&self) -> usize {
        self.0.iter().filter(|s| **s == KneeState::S2).count()
    }

    pub fn contains_s3(&self) -> bool {
        self.0.contains(&KneeState::S3)
    }

    /// True when the descent never reached the pass band
    pub fn is_incomplete(&self) -> bool {
        self.0 == [KneeState::S2]
    }

    pub fn states(&self) -> &[KneeState] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
