//! Bicep curl counter.
//!
//! The elbow angle drives a three-state cycle: the arm is `Down` once it is
//! extended past `extended_angle`, and the rep completes when it curls below
//! `min_curl_angle`. A lock guard watches for a hyper-extended elbow held too
//! long, and a curl that falls back before reaching the top is abandoned as a
//! half rep.

use repsense_core::{joint_angle, Joint, Observation, PoseLandmarks, Result, Side, SideSelector, Timestamp};
use tracing::{debug, info};

use crate::config::CurlConfig;
use crate::countdown::{CountdownGate, GateState};
use crate::counter::RepCounter;
use crate::feedback::FeedbackMessage;
use crate::guards::LockGuard;
use crate::phase::StrokePhase;
use crate::report::{Exercise, FrameReport, PhaseReport, RepEvent, RepQuality, RepTally};

pub struct CurlCounter {
    config: CurlConfig,
    selector: Box<dyn SideSelector>,
    gate: CountdownGate,
    lock: LockGuard,
    phase: StrokePhase,
    rep_start: Option<Timestamp>,
    min_angle: f64,
    max_angle: f64,
    locked_during_rep: bool,
    total: u32,
    correct: u32,
    incorrect: u32,
    feedback: FeedbackMessage,
}

impl CurlCounter {
    pub fn new(config: CurlConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            selector: config.side.selector(),
            gate: CountdownGate::new(config.countdown_secs),
            lock: LockGuard::new(config.lock_angle, config.lock_secs),
            phase: StrokePhase::None,
            rep_start: None,
            min_angle: 180.0,
            max_angle: 0.0,
            locked_during_rep: false,
            total: 0,
            correct: 0,
            incorrect: 0,
            feedback: FeedbackMessage::GoodForm,
            config,
        })
    }

    pub fn phase(&self) -> StrokePhase {
        self.phase
    }

    /// Smallest and largest elbow angle seen since the rep started
    pub fn rep_range(&self) -> Option<(f64, f64)> {
        (self.phase == StrokePhase::Down).then_some((self.min_angle, self.max_angle))
    }

    fn elbow_angle(&self, landmarks: &PoseLandmarks, side: Side) -> Result<f64> {
        let shoulder = landmarks.require(Joint::Shoulder.on(side))?;
        let elbow = landmarks.require(Joint::Elbow.on(side))?;
        let wrist = landmarks.require(Joint::Wrist.on(side))?;
        Ok(joint_angle(shoulder, elbow, wrist))
    }

    /// Run the cycle on one elbow angle
    fn step(&mut self, angle: f64, now: Timestamp) -> Option<RepEvent> {
        let locked = self.lock.update(angle, now);
        if locked {
            self.feedback = FeedbackMessage::AvoidLockingJoints;
            if self.phase == StrokePhase::Down {
                self.locked_during_rep = true;
            }
        } else if self.feedback == FeedbackMessage::AvoidLockingJoints {
            self.feedback = FeedbackMessage::GoodForm;
        }

        if self.phase == StrokePhase::Down {
            self.min_angle = self.min_angle.min(angle);
            self.max_angle = self.max_angle.max(angle);
        }

        if angle > self.config.extended_angle && self.phase != StrokePhase::Down {
            debug!(angle, "curl rep started");
            self.phase = StrokePhase::Down;
            self.rep_start = Some(now);
            self.min_angle = angle;
            self.max_angle = angle;
            self.locked_during_rep = locked;
            None
        } else if angle < self.config.min_curl_angle && self.phase == StrokePhase::Down {
            Some(self.complete(now))
        } else {
            if self.is_half_rep(angle) {
                debug!(angle, min = self.min_angle, "curl abandoned as half rep");
                self.phase = StrokePhase::None;
                self.feedback = FeedbackMessage::HalfRepDetected;
            }
            None
        }
    }

    fn is_half_rep(&self, angle: f64) -> bool {
        self.phase == StrokePhase::Down
            && angle > self.config.half_rep_threshold
            && self.min_angle > self.config.min_curl_angle
            && self.min_angle < angle
            && angle - self.min_angle > self.config.half_rep_rebound
    }

    fn complete(&mut self, now: Timestamp) -> RepEvent {
        let duration = self.rep_start.map_or(0.0, |start| now.secs_since(start));
        self.total += 1;
        self.phase = StrokePhase::Up;

        let too_slow = self.config.max_rep_secs.is_some_and(|max| duration > max);
        let (quality, feedback) = if duration < self.config.min_rep_secs {
            (RepQuality::Incorrect, FeedbackMessage::SlowDown)
        } else if self.locked_during_rep {
            (RepQuality::Incorrect, FeedbackMessage::AvoidLockingJoints)
        } else if too_slow {
            (RepQuality::Incorrect, FeedbackMessage::TooSlow)
        } else {
            (RepQuality::Correct, FeedbackMessage::GoodForm)
        };

        match quality {
            RepQuality::Correct => self.correct += 1,
            _ => self.incorrect += 1,
        }
        self.feedback = feedback;
        self.locked_during_rep = false;

        info!(
            total = self.total,
            correct = self.correct,
            duration_secs = duration,
            ?quality,
            "curl rep counted"
        );
        RepEvent {
            quality,
            duration_secs: Some(duration),
        }
    }

    fn report(&self, feedback: FeedbackMessage, gate: GateState, rep: Option<RepEvent>) -> FrameReport {
        FrameReport {
            exercise: Exercise::BicepCurl,
            tally: self.tally(),
            phase: PhaseReport::Stroke { phase: self.phase },
            feedback: feedback.into(),
            gate,
            lock_flag: Some(self.lock.is_locked()),
            alignment_flag: None,
            rep,
            counters_reset: false,
        }
    }
}

impl RepCounter for CurlCounter {
    fn exercise(&self) -> Exercise {
        Exercise::BicepCurl
    }

    fn process(&mut self, observation: &Observation, now: Timestamp) -> FrameReport {
        let gate = self.gate.poll(now);
        match gate {
            GateState::Countdown { .. } => return self.report(FeedbackMessage::GetReady, gate, None),
            GateState::Go => return self.report(FeedbackMessage::Go, gate, None),
            GateState::Active => {}
        }

        let Some(landmarks) = observation.landmarks() else {
            return self.report(FeedbackMessage::NoPersonDetected, gate, None);
        };
        let Some(side) = self.selector.select(landmarks) else {
            return self.report(FeedbackMessage::Reposition, gate, None);
        };
        let angle = match self.elbow_angle(landmarks, side) {
            Ok(angle) => angle,
            Err(e) => {
                debug!(error = %e, "curl frame skipped");
                return self.report(FeedbackMessage::Reposition, gate, None);
            }
        };

        let rep = self.step(angle, now);
        self.report(self.feedback, gate, rep)
    }

    fn reset(&mut self) {
        self.gate.reset();
        self.lock.reset();
        self.phase = StrokePhase::None;
        self.rep_start = None;
        self.min_angle = 180.0;
        self.max_angle = 0.0;
        self.locked_during_rep = false;
        self.total = 0;
        self.correct = 0;
        self.incorrect = 0;
        self.feedback = FeedbackMessage::GoodForm;
    }

    fn tally(&self) -> RepTally {
        RepTally {
            total: self.total,
            correct: self.correct,
            incorrect: Some(self.incorrect),
            acceptable: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, from_vertical, unit};
    use repsense_core::{Landmark, LandmarkPoint};

    /// Left arm with the given elbow angle, upper arm pointing straight up
    fn arm(angle_deg: f64) -> Observation {
        let elbow = (300.0, 200.0);
        let wrist = from_vertical(elbow, angle_deg, 100.0);
        Observation::from_landmarks(
            PoseLandmarks::new()
                .with(Landmark::LeftShoulder, unit(300.0, 100.0))
                .with(Landmark::LeftElbow, unit(elbow.0, elbow.1))
                .with(Landmark::LeftWrist, unit(wrist.0, wrist.1)),
        )
    }

    fn counter() -> CurlCounter {
        CurlCounter::new(CurlConfig {
            countdown_secs: 0.0,
            ..Default::default()
        })
        .unwrap()
    }

    fn run(counter: &mut CurlCounter, trace: &[(f64, f64)]) -> FrameReport {
        let mut last = None;
        for (t, angle) in trace {
            last = Some(counter.process(&arm(*angle), at(*t)));
        }
        last.unwrap()
    }

    #[test]
    fn test_rep_at_steady_pace_is_correct() {
        let mut c = counter();
        let report = run(&mut c, &[(0.0, 170.0), (0.4, 170.0), (0.8, 25.0)]);

        assert_eq!(report.tally.total, 1);
        assert_eq!(report.tally.correct, 1);
        assert_eq!(report.rep.unwrap().quality, RepQuality::Correct);
        assert_eq!(c.phase(), StrokePhase::Up);
    }

    #[test]
    fn test_rushed_rep_is_incorrect() {
        let mut c = counter();
        let report = run(&mut c, &[(0.0, 170.0), (0.2, 170.0), (0.5, 25.0)]);

        assert_eq!(report.tally.total, 1);
        assert_eq!(report.tally.correct, 0);
        assert_eq!(report.tally.incorrect, Some(1));
        assert_eq!(report.message(), FeedbackMessage::SlowDown);
    }

    #[test]
    fn test_slow_rep_rejected_when_capped() {
        let mut c = CurlCounter::new(CurlConfig {
            countdown_secs: 0.0,
            max_rep_secs: Some(3.0),
            ..Default::default()
        })
        .unwrap();
        let report = run(&mut c, &[(0.0, 170.0), (2.0, 100.0), (4.0, 25.0)]);
        assert_eq!(report.tally.incorrect, Some(1));
        assert_eq!(report.message(), FeedbackMessage::TooSlow);
    }

    #[test]
    fn test_lock_sets_and_clears() {
        let mut c = counter();
        run(&mut c, &[(0.0, 178.0), (0.3, 178.0)]);
        let report = c.process(&arm(178.0), at(0.6));
        assert_eq!(report.lock_flag, Some(true));
        assert_eq!(report.message(), FeedbackMessage::AvoidLockingJoints);

        let report = c.process(&arm(170.0), at(0.7));
        assert_eq!(report.lock_flag, Some(false));
        assert_eq!(report.message(), FeedbackMessage::GoodForm);
    }

    #[test]
    fn test_rep_after_lock_is_incorrect() {
        let mut c = counter();
        let report = run(
            &mut c,
            &[(0.0, 178.0), (0.3, 178.0), (0.9, 178.0), (1.2, 120.0), (2.0, 25.0)],
        );
        assert_eq!(report.tally.total, 1);
        assert_eq!(report.tally.correct, 0);
        assert_eq!(report.message(), FeedbackMessage::AvoidLockingJoints);
    }

    #[test]
    fn test_rushed_locked_rep_asks_to_slow_down() {
        let mut c = counter();
        let report = run(
            &mut c,
            &[(0.0, 178.0), (0.3, 178.0), (0.6, 178.0), (0.65, 25.0)],
        );
        assert_eq!(report.tally.incorrect, Some(1));
        assert_eq!(report.message(), FeedbackMessage::SlowDown);
    }

    #[test]
    fn test_angle_measured_on_normalized_coordinates() {
        let mut c = counter();
        let arm = Observation::from_landmarks(
            PoseLandmarks::new()
                .with(Landmark::LeftShoulder, LandmarkPoint::new(0.5, 0.2, 1.0))
                .with(Landmark::LeftElbow, LandmarkPoint::new(0.5, 0.5, 1.0))
                .with(Landmark::LeftWrist, LandmarkPoint::new(0.58, 0.75, 1.0)),
        );
        // 162.3 degrees unscaled, below 160 once stretched to 640x480
        c.process(&arm, at(0.0));
        assert_eq!(c.phase(), StrokePhase::Down);
    }

    #[test]
    fn test_half_rep_cancels_without_counting() {
        let mut c = counter();
        let report = run(&mut c, &[(0.0, 170.0), (0.5, 100.0), (1.0, 60.0), (1.5, 90.0)]);

        assert_eq!(report.tally.total, 0);
        assert_eq!(report.message(), FeedbackMessage::HalfRepDetected);
        assert_eq!(c.phase(), StrokePhase::None);
    }

    #[test]
    fn test_missing_landmark_holds_phase() {
        let mut c = counter();
        run(&mut c, &[(0.0, 170.0)]);
        let partial = Observation::from_landmarks(
            PoseLandmarks::new().with(Landmark::LeftShoulder, unit(300.0, 100.0)),
        );
        let report = c.process(&partial, at(0.5));
        assert_eq!(report.message(), FeedbackMessage::Reposition);
        assert_eq!(c.phase(), StrokePhase::Down);
        let (min, max) = c.rep_range().unwrap();
        assert!((min - 170.0).abs() < 1e-6 && (max - 170.0).abs() < 1e-6);
    }

    #[test]
    fn test_countdown_suspends_counting() {
        let mut c = CurlCounter::new(CurlConfig::default()).unwrap();
        let report = c.process(&arm(170.0), at(0.0));
        assert_eq!(report.gate, GateState::Countdown { remaining_secs: 3 });
        assert_eq!(report.message(), FeedbackMessage::GetReady);

        let report = c.process(&arm(25.0), at(3.0));
        assert_eq!(report.gate, GateState::Go);
        assert_eq!(c.phase(), StrokePhase::None);

        let report = run(&mut c, &[(3.1, 170.0), (4.0, 25.0)]);
        assert_eq!(report.tally.correct, 1);
    }

    #[test]
    fn test_reset_discards_session() {
        let mut c = counter();
        run(&mut c, &[(0.0, 170.0), (1.0, 25.0)]);
        c.reset();
        assert_eq!(c.tally(), RepTally { total: 0, correct: 0, incorrect: Some(0), acceptable: None });
        assert_eq!(c.phase(), StrokePhase::None);
    }
}
