//! Per-frame output of a rep counter.

use std::fmt;
use std::str::FromStr;

use repsense_core::Error;
use serde::{Deserialize, Serialize};

use crate::countdown::GateState;
use crate::feedback::Feedback;
use crate::phase::{KneeState, SquatSequence, StrokePhase};

/// Supported exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exercise {
    BicepCurl,
    Squat,
    PushUp,
}

impl Exercise {
    pub const ALL: [Exercise; 3] = [Exercise::BicepCurl, Exercise::Squat, Exercise::PushUp];

    pub fn name(&self) -> &'static str {
        match self {
            Exercise::BicepCurl => "bicep_curl",
            Exercise::Squat => "squat",
            Exercise::PushUp => "push_up",
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Exercise {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "curl" | "bicep_curl" | "bicep_curls" => Ok(Exercise::BicepCurl),
            "squat" | "squats" => Ok(Exercise::Squat),
            "pushup" | "push_up" | "pushups" | "push_ups" => Ok(Exercise::PushUp),
            other => Err(Error::invalid_config(format!("unknown exercise '{other}'"))),
        }
    }
}

/// Running counts.
///
/// `incorrect` and `acceptable` are only reported by exercises that track
/// them; for push-ups `correct` holds the great reps and `incorrect` the
/// rejected ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepTally {
    #[serde(rename = "total_count")]
    pub total: u32,
    #[serde(rename = "correct_count")]
    pub correct: u32,
    #[serde(rename = "incorrect_count", default, skip_serializing_if = "Option::is_none")]
    pub incorrect: Option<u32>,
    #[serde(rename = "acceptable_count", default, skip_serializing_if = "Option::is_none")]
    pub acceptable: Option<u32>,
}

/// How a finished rep was judged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepQuality {
    Correct,
    Incorrect,
    Great,
    Acceptable,
    /// Resolved but not counted
    Rejected,
}

/// A rep resolved on this frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepEvent {
    pub quality: RepQuality,
    /// Time from phase entry to resolution, when the counter tracks it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
}

/// Exercise-specific phase snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhaseReport {
    Stroke {
        phase: StrokePhase,
    },
    Squat {
        state: Option<KneeState>,
        sequence: SquatSequence,
    },
}

/// Everything a counter publishes for one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub exercise: Exercise,
    #[serde(flatten)]
    pub tally: RepTally,
    pub phase: PhaseReport,
    pub feedback: Feedback,
    pub gate: GateState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock_flag: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment_flag: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rep: Option<RepEvent>,
    /// Set on the frame an inactivity guard zeroed the counters
    pub counters_reset: bool,
}

impl FrameReport {
    pub fn message(&self) -> crate::feedback::FeedbackMessage {
        self.feedback.message
    }
}
