//! Form feedback messages and their aggregation.

use serde::{Deserialize, Serialize};

use crate::guards::StickyFlag;

/// How urgently a message should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Form is fine
    Good,
    /// Status or setup information
    Info,
    /// Advisory; the rep still counts
    Caution,
    /// The rep is rejected or the posture is unsafe
    Error,
}

/// Every message a counter can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackMessage {
    GetReady,
    Go,
    GoodForm,
    Reposition,
    NoPersonDetected,
    // Curl
    AvoidLockingJoints,
    SlowDown,
    TooSlow,
    HalfRepDetected,
    // Push-up
    PositionSideways,
    KeepBodyStraight,
    GoingDown,
    GoLower,
    GoodDepth,
    AcceptableRep,
    GreatRep,
    TooShallow,
    // Squat
    BendBackwards,
    BendForward,
    LowerHips,
    KneeOverToe,
    SquatTooDeep,
    IncompleteSquat,
    CameraNotAligned,
    ResetDueToInactivity,
}

impl FeedbackMessage {
    pub fn text(&self) -> &'static str {
        match self {
            FeedbackMessage::GetReady => "Get ready",
            FeedbackMessage::Go => "GO!",
            FeedbackMessage::GoodForm => "Good form",
            FeedbackMessage::Reposition => "Reposition yourself in frame",
            FeedbackMessage::NoPersonDetected => "No person detected",
            FeedbackMessage::AvoidLockingJoints => "Avoid locking joints",
            FeedbackMessage::SlowDown => "Slow down",
            FeedbackMessage::TooSlow => "Too slow, keep a steady pace",
            FeedbackMessage::HalfRepDetected => "Half rep detected",
            FeedbackMessage::PositionSideways => "Position yourself sideways to the camera",
            FeedbackMessage::KeepBodyStraight => "Keep your body straight!",
            FeedbackMessage::GoingDown => "Going down...",
            FeedbackMessage::GoLower => "Go lower for better form",
            FeedbackMessage::GoodDepth => "Good depth!",
            FeedbackMessage::AcceptableRep => "Push-up counted! Go deeper next time",
            FeedbackMessage::GreatRep => "Great push-up!",
            FeedbackMessage::TooShallow => "Too shallow! Not counted",
            FeedbackMessage::BendBackwards => "Bend backwards",
            FeedbackMessage::BendForward => "Bend forward",
            FeedbackMessage::LowerHips => "Lower your hips",
            FeedbackMessage::KneeOverToe => "Knee falling over toe",
            FeedbackMessage::SquatTooDeep => "Squat too deep",
            FeedbackMessage::IncompleteSquat => "Incomplete squat",
            FeedbackMessage::CameraNotAligned => "Camera not aligned",
            FeedbackMessage::ResetDueToInactivity => "Reset due to inactivity",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FeedbackMessage::GoodForm
            | FeedbackMessage::GoodDepth
            | FeedbackMessage::GreatRep
            | FeedbackMessage::Go => Severity::Good,
            FeedbackMessage::GetReady
            | FeedbackMessage::Reposition
            | FeedbackMessage::NoPersonDetected
            | FeedbackMessage::PositionSideways
            | FeedbackMessage::GoingDown
            | FeedbackMessage::CameraNotAligned
            | FeedbackMessage::ResetDueToInactivity => Severity::Info,
            FeedbackMessage::SlowDown
            | FeedbackMessage::TooSlow
            | FeedbackMessage::GoLower
            | FeedbackMessage::AcceptableRep
            | FeedbackMessage::BendBackwards
            | FeedbackMessage::BendForward
            | FeedbackMessage::LowerHips => Severity::Caution,
            FeedbackMessage::AvoidLockingJoints
            | FeedbackMessage::HalfRepDetected
            | FeedbackMessage::KeepBodyStraight
            | FeedbackMessage::TooShallow
            | FeedbackMessage::KneeOverToe
            | FeedbackMessage::SquatTooDeep
            | FeedbackMessage::IncompleteSquat => Severity::Error,
        }
    }
}

/// Current message with its severity, as reported for a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub message: FeedbackMessage,
    pub severity: Severity,
    pub text: &'static str,
}

impl From<FeedbackMessage> for Feedback {
    fn from(message: FeedbackMessage) -> Self {
        Self {
            message,
            severity: message.severity(),
            text: message.text(),
        }
    }
}

/// Squat posture problems, in display priority order (later wins)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureFault {
    BendBackwards,
    BendForward,
    KneeOverToe,
    SquatTooDeep,
}

impl PostureFault {
    pub const ALL: [PostureFault; 4] = [
        PostureFault::BendBackwards,
        PostureFault::BendForward,
        PostureFault::KneeOverToe,
        PostureFault::SquatTooDeep,
    ];

    fn slot(&self) -> usize {
        *self as usize
    }

    pub fn message(&self) -> FeedbackMessage {
        match self {
            PostureFault::BendBackwards => FeedbackMessage::BendBackwards,
            PostureFault::BendForward => FeedbackMessage::BendForward,
            PostureFault::KneeOverToe => FeedbackMessage::KneeOverToe,
            PostureFault::SquatTooDeep => FeedbackMessage::SquatTooDeep,
        }
    }
}

/// Reduces raised posture flags, the hip advisory and the latest rep outcome
/// into one message per frame.
///
/// Priority: any active posture flag (highest slot wins), then a rep outcome
/// resolved this frame, then the lower-hips advisory, then good form.
#[derive(Debug, Clone)]
pub struct FeedbackAggregator {
    flags: [StickyFlag; PostureFault::ALL.len()],
    decay_frames: u32,
}

impl FeedbackAggregator {
    pub fn new(decay_frames: u32) -> Self {
        Self {
            flags: [StickyFlag::default(); PostureFault::ALL.len()],
            decay_frames,
        }
    }

    pub fn raise(&mut self, fault: PostureFault) {
        self.flags[fault.slot()].raise();
    }

    pub fn is_raised(&self, fault: PostureFault) -> bool {
        self.flags[fault.slot()].is_active()
    }

    pub fn active_faults(&self) -> Vec<PostureFault> {
        PostureFault::ALL
            .into_iter()
            .filter(|f| self.is_raised(*f))
            .collect()
    }

    /// Pick this frame's message, then age the flags
    pub fn resolve(&mut self, outcome: Option<FeedbackMessage>, lower_hips: bool) -> FeedbackMessage {
        for flag in self.flags.iter_mut() {
            flag.tick();
        }

        let flagged = PostureFault::ALL
            .into_iter()
            .rev()
            .find(|f| self.is_raised(*f))
            .map(|f| f.message());

        let message = match (flagged, outcome) {
            (Some(message), _) => message,
            (None, Some(outcome)) => outcome,
            (None, None) if lower_hips => FeedbackMessage::LowerHips,
            (None, None) => FeedbackMessage::GoodForm,
        };

        for flag in self.flags.iter_mut() {
            flag.expire(self.decay_frames);
        }
        message
    }

    pub fn clear(&mut self) {
        for flag in self.flags.iter_mut() {
            flag.clear();
        }
    }
}
