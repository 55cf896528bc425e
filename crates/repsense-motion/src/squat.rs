//! Squat counter.
//!
//! The knee-to-vertical angle is discretized into [`KneeState`]s and the
//! states seen since the subject last stood up are buffered. Standing up
//! resolves the buffer into a correct or incorrect rep. Beside the cycle run
//! the posture guards (hip lean, knee depth, knee over toe), a camera
//! alignment guard and three inactivity timers that zero the counters.

use repsense_core::{
    joint_angle, vertical_angle, Error, Joint, Landmark, Observation, PoseLandmarks, Result, SideSelector,
    Timestamp,
};
use tracing::{debug, info, warn};

use crate::config::SquatConfig;
use crate::countdown::{CountdownGate, GateState};
use crate::counter::RepCounter;
use crate::feedback::{FeedbackAggregator, FeedbackMessage, PostureFault};
use crate::guards::InactivityTimer;
use crate::phase::{KneeState, SquatSequence};
use crate::report::{Exercise, FrameReport, PhaseReport, RepEvent, RepQuality, RepTally};

/// Vertical angles at hip, knee and ankle on the active side
#[derive(Debug, Clone, Copy)]
struct SquatAngles {
    hip: f64,
    knee: f64,
    ankle: f64,
}

pub struct SquatCounter {
    config: SquatConfig,
    selector: Box<dyn SideSelector>,
    gate: CountdownGate,
    sequence: SquatSequence,
    state: Option<KneeState>,
    prev_state: Option<KneeState>,
    correct: u32,
    incorrect: u32,
    incorrect_posture: bool,
    lower_hips: bool,
    aligned: bool,
    feedback: FeedbackAggregator,
    idle: InactivityTimer,
    misaligned: InactivityTimer,
    absent: InactivityTimer,
}

impl SquatCounter {
    pub fn new(config: SquatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            selector: config.side.selector(),
            gate: CountdownGate::new(config.countdown_secs),
            sequence: SquatSequence::new(),
            state: None,
            prev_state: None,
            correct: 0,
            incorrect: 0,
            incorrect_posture: false,
            lower_hips: false,
            aligned: true,
            feedback: FeedbackAggregator::new(config.feedback_frames),
            idle: InactivityTimer::default(),
            misaligned: InactivityTimer::default(),
            absent: InactivityTimer::default(),
            config,
        })
    }

    pub fn state(&self) -> Option<KneeState> {
        self.state
    }

    pub fn sequence(&self) -> &SquatSequence {
        &self.sequence
    }

    /// Posture problems currently displayed
    pub fn active_faults(&self) -> Vec<PostureFault> {
        self.feedback.active_faults()
    }

    fn zero_counters(&mut self, reason: &str) {
        warn!(
            correct = self.correct,
            incorrect = self.incorrect,
            reason,
            "squat counters reset"
        );
        self.correct = 0;
        self.incorrect = 0;
    }

    /// Angle at the nose between both shoulders; large when the subject
    /// faces the camera instead of standing side-on
    fn offset_angle(&self, landmarks: &PoseLandmarks) -> Result<f64> {
        let frame = &self.config.frame;
        let nose = frame.project(landmarks.require(Landmark::Nose)?);
        let left = frame.project(landmarks.require(Landmark::LeftShoulder)?);
        let right = frame.project(landmarks.require(Landmark::RightShoulder)?);
        Ok(joint_angle(left, nose, right))
    }

    fn measure(&self, landmarks: &PoseLandmarks) -> Result<SquatAngles> {
        let side = self.selector.select(landmarks).ok_or(Error::NoPerson)?;
        let frame = &self.config.frame;
        let point = |joint: Joint| landmarks.require(joint.on(side)).map(|p| frame.project(p));

        let shoulder = point(Joint::Shoulder)?;
        let hip = point(Joint::Hip)?;
        let knee = point(Joint::Knee)?;
        let ankle = point(Joint::Ankle)?;

        Ok(SquatAngles {
            hip: vertical_angle(shoulder, hip),
            knee: vertical_angle(hip, knee),
            ankle: vertical_angle(knee, ankle),
        })
    }

    /// Standing up: judge the buffered descent
    fn resolve(&mut self) -> (Option<FeedbackMessage>, Option<RepEvent>) {
        let outcome = if self.sequence.contains_s3() && !self.incorrect_posture {
            self.correct += 1;
            Some((RepQuality::Correct, Some(FeedbackMessage::GoodForm)))
        } else if self.sequence.is_incomplete() {
            self.incorrect += 1;
            Some((RepQuality::Incorrect, Some(FeedbackMessage::IncompleteSquat)))
        } else if self.incorrect_posture {
            self.incorrect += 1;
            Some((RepQuality::Incorrect, None))
        } else {
            None
        };

        self.sequence.clear();
        self.incorrect_posture = false;
        self.lower_hips = false;

        match outcome {
            Some((quality, message)) => {
                info!(correct = self.correct, incorrect = self.incorrect, ?quality, "squat resolved");
                let rep = RepEvent {
                    quality,
                    duration_secs: None,
                };
                (message, Some(rep))
            }
            None => (None, None),
        }
    }

    fn check_posture(&mut self, angles: &SquatAngles) {
        let config = &self.config;
        let single_s2 = self.sequence.count_s2() == 1;

        if angles.hip > config.hip_range.max {
            self.feedback.raise(PostureFault::BendBackwards);
        } else if angles.hip < config.hip_range.min && single_s2 {
            self.feedback.raise(PostureFault::BendForward);
        }

        let lower_hips = config.lower_hips_range;
        if lower_hips.min < angles.knee && angles.knee < lower_hips.max && single_s2 {
            self.lower_hips = true;
        } else if angles.knee > config.knee_max {
            self.feedback.raise(PostureFault::SquatTooDeep);
            self.incorrect_posture = true;
        }

        if angles.ankle > config.ankle_max {
            self.feedback.raise(PostureFault::KneeOverToe);
            self.incorrect_posture = true;
        }
    }

    fn report(&self, message: FeedbackMessage, gate: GateState, rep: Option<RepEvent>, reset: bool) -> FrameReport {
        FrameReport {
            exercise: Exercise::Squat,
            tally: self.tally(),
            phase: PhaseReport::Squat {
                state: self.state,
                sequence: self.sequence.clone(),
            },
            feedback: message.into(),
            gate,
            lock_flag: None,
            alignment_flag: Some(self.aligned),
            rep,
            counters_reset: reset,
        }
    }

    fn process_absent(&mut self, gate: GateState, now: Timestamp) -> FrameReport {
        self.idle.pause();
        self.misaligned.pause();

        let mut reset = false;
        if self.absent.accumulate(now) >= self.config.inactive_secs {
            self.zero_counters("no person");
            self.feedback.clear();
            self.sequence.clear();
            self.incorrect_posture = false;
            self.lower_hips = false;
            self.absent.restart(now);
            reset = true;
        }
        self.report(FeedbackMessage::NoPersonDetected, gate, None, reset)
    }

    fn process_person(&mut self, landmarks: &PoseLandmarks, gate: GateState, now: Timestamp) -> FrameReport {
        self.absent.clear();

        let offset = match self.offset_angle(landmarks) {
            Ok(offset) => offset,
            Err(e) => {
                debug!(error = %e, "squat frame skipped");
                return self.report(FeedbackMessage::Reposition, gate, None, false);
            }
        };

        if offset > self.config.offset_thresh {
            self.aligned = false;
            self.idle.clear();
            self.state = None;
            self.prev_state = None;
            let mut reset = false;
            if self.misaligned.accumulate(now) >= self.config.inactive_secs {
                self.zero_counters("camera not aligned");
                self.misaligned.restart(now);
                reset = true;
            }
            return self.report(FeedbackMessage::CameraNotAligned, gate, None, reset);
        }
        self.aligned = true;
        self.misaligned.clear();

        let angles = match self.measure(landmarks) {
            Ok(angles) => angles,
            Err(e) => {
                debug!(error = %e, "squat frame skipped");
                return self.report(FeedbackMessage::Reposition, gate, None, false);
            }
        };

        let state = KneeState::classify(angles.knee, &self.config.knee_bands);
        if state != self.state {
            debug!(?state, knee = angles.knee, "squat state changed");
        }
        self.state = state;
        if let Some(state) = state {
            self.sequence.push(state);
        }

        let (outcome, rep) = if state == Some(KneeState::S1) {
            self.resolve()
        } else {
            self.check_posture(&angles);
            (None, None)
        };

        let mut reset = false;
        if state == self.prev_state {
            if self.idle.accumulate(now) >= self.config.inactive_secs {
                self.zero_counters("inactivity");
                self.idle.restart(now);
                reset = true;
            }
        } else {
            self.idle.restart(now);
        }
        self.prev_state = state;

        if self.sequence.contains_s3() {
            self.lower_hips = false;
        }

        let message = self.feedback.resolve(outcome, self.lower_hips);
        let message = if reset {
            FeedbackMessage::ResetDueToInactivity
        } else {
            message
        };
        self.report(message, gate, rep, reset)
    }
}

impl RepCounter for SquatCounter {
    fn exercise(&self) -> Exercise {
        Exercise::Squat
    }

    fn process(&mut self, observation: &Observation, now: Timestamp) -> FrameReport {
        let gate = self.gate.poll(now);
        match gate {
            GateState::Countdown { .. } => return self.report(FeedbackMessage::GetReady, gate, None, false),
            GateState::Go => return self.report(FeedbackMessage::Go, gate, None, false),
            GateState::Active => {}
        }

        match observation.landmarks() {
            Some(landmarks) => self.process_person(landmarks, gate, now),
            None => self.process_absent(gate, now),
        }
    }

    fn reset(&mut self) {
        self.gate.reset();
        self.sequence.clear();
        self.state = None;
        self.prev_state = None;
        self.correct = 0;
        self.incorrect = 0;
        self.incorrect_posture = false;
        self.lower_hips = false;
        self.aligned = true;
        self.feedback.clear();
        self.idle.clear();
        self.misaligned.clear();
        self.absent.clear();
    }

    fn tally(&self) -> RepTally {
        RepTally {
            total: self.correct + self.incorrect,
            correct: self.correct,
            incorrect: Some(self.incorrect),
            acceptable: None,
        }
    }
}
