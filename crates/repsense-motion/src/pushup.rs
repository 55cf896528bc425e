//! Push-up counter.
//!
//! Reads the elbow angle (shoulder-elbow-wrist) and the body line
//! (shoulder-hip-knee) from the more visible side. Transitions are only
//! honored when the recent elbow movement is significant, which keeps
//! estimator jitter around a threshold from producing phantom reps.

use repsense_core::{joint_angle, Error, Joint, Observation, PoseLandmarks, Result, Side, SideSelector, Timestamp};
use tracing::{debug, info};

use crate::config::PushUpConfig;
use crate::countdown::{CountdownGate, GateState};
use crate::counter::RepCounter;
use crate::feedback::FeedbackMessage;
use crate::guards::MovementWindow;
use crate::phase::StrokePhase;
use crate::report::{Exercise, FrameReport, PhaseReport, RepEvent, RepQuality, RepTally};

/// Angles measured on one frame
#[derive(Debug, Clone, Copy)]
struct PushUpAngles {
    elbow: f64,
    body: f64,
}

pub struct PushUpCounter {
    config: PushUpConfig,
    selector: Box<dyn SideSelector>,
    gate: CountdownGate,
    window: MovementWindow,
    phase: StrokePhase,
    prev_elbow: Option<f64>,
    min_elbow: f64,
    rep_start: Option<Timestamp>,
    total: u32,
    great: u32,
    acceptable: u32,
    rejected: u32,
    feedback: FeedbackMessage,
}

impl PushUpCounter {
    pub fn new(config: PushUpConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            selector: config.side.selector(),
            gate: CountdownGate::new(config.countdown_secs),
            window: MovementWindow::new(config.movement_window, config.min_angle_change),
            phase: StrokePhase::None,
            prev_elbow: None,
            min_elbow: 180.0,
            rep_start: None,
            total: 0,
            great: 0,
            acceptable: 0,
            rejected: 0,
            feedback: FeedbackMessage::GoodForm,
            config,
        })
    }

    pub fn phase(&self) -> StrokePhase {
        self.phase
    }

    fn measure(&self, landmarks: &PoseLandmarks, side: Side) -> Result<PushUpAngles> {
        let point = |joint: Joint| landmarks.require(joint.on(side));

        let shoulder = point(Joint::Shoulder)?;
        let elbow = point(Joint::Elbow)?;
        let wrist = point(Joint::Wrist)?;
        let hip = point(Joint::Hip)?;
        let knee = point(Joint::Knee)?;

        Ok(PushUpAngles {
            elbow: joint_angle(shoulder, elbow, wrist),
            body: joint_angle(shoulder, hip, knee),
        })
    }

    fn step(&mut self, angles: PushUpAngles, now: Timestamp) -> Option<RepEvent> {
        let PushUpAngles { elbow, body } = angles;
        let Some(prev) = self.prev_elbow.replace(elbow) else {
            return None;
        };
        self.window.push(elbow - prev);

        if body <= self.config.min_body_angle {
            self.feedback = FeedbackMessage::KeepBodyStraight;
            return None;
        }

        let significant = self.window.is_significant();
        if elbow < self.config.descent_angle && self.phase != StrokePhase::Down && significant {
            debug!(elbow, movement = self.window.total(), "push-up descent");
            self.phase = StrokePhase::Down;
            self.rep_start = Some(now);
            self.min_elbow = elbow;
            self.feedback = FeedbackMessage::GoingDown;
            return None;
        }

        if self.phase == StrokePhase::Down {
            self.min_elbow = self.min_elbow.min(elbow);
            if elbow < self.config.descent_angle {
                self.feedback = if elbow > self.config.good_elbow_angle {
                    FeedbackMessage::GoLower
                } else {
                    FeedbackMessage::GoodDepth
                };
            }
        }

        if elbow > self.config.extension_angle
            && self.phase == StrokePhase::Down
            && significant
            && self.min_elbow < self.config.descent_angle
        {
            return Some(self.complete(now));
        }
        None
    }

    fn complete(&mut self, now: Timestamp) -> RepEvent {
        let min = self.min_elbow;
        let quality = if min > self.config.min_elbow_angle && min <= self.config.good_elbow_angle {
            RepQuality::Acceptable
        } else if min <= self.config.min_elbow_angle {
            RepQuality::Rejected
        } else {
            RepQuality::Great
        };

        match quality {
            RepQuality::Acceptable => {
                self.acceptable += 1;
                self.total += 1;
                self.feedback = FeedbackMessage::AcceptableRep;
            }
            RepQuality::Great => {
                self.great += 1;
                self.total += 1;
                self.feedback = FeedbackMessage::GreatRep;
            }
            _ => {
                self.rejected += 1;
                self.feedback = FeedbackMessage::TooShallow;
            }
        }

        self.phase = StrokePhase::Up;
        self.window.clear();
        self.min_elbow = 180.0;

        let duration = self.rep_start.map(|start| now.secs_since(start));
        info!(total = self.total, min_elbow = min, ?quality, "push-up resolved");
        RepEvent {
            quality,
            duration_secs: duration,
        }
    }

    fn report(&self, feedback: FeedbackMessage, gate: GateState, rep: Option<RepEvent>) -> FrameReport {
        FrameReport {
            exercise: Exercise::PushUp,
            tally: self.tally(),
            phase: PhaseReport::Stroke { phase: self.phase },
            feedback: feedback.into(),
            gate,
            lock_flag: None,
            alignment_flag: None,
            rep,
            counters_reset: false,
        }
    }
}

impl RepCounter for PushUpCounter {
    fn exercise(&self) -> Exercise {
        Exercise::PushUp
    }

    fn process(&mut self, observation: &Observation, now: Timestamp) -> FrameReport {
        let gate = self.gate.poll(now);
        match gate {
            GateState::Countdown { .. } => return self.report(FeedbackMessage::GetReady, gate, None),
            GateState::Go => {
                self.rep_start = Some(now);
                return self.report(FeedbackMessage::Go, gate, None);
            }
            GateState::Active => {}
        }

        let Some(landmarks) = observation.landmarks() else {
            return self.report(FeedbackMessage::NoPersonDetected, gate, None);
        };
        let angles = self
            .selector
            .select(landmarks)
            .ok_or(Error::NoPerson)
            .and_then(|side| self.measure(landmarks, side));
        let angles = match angles {
            Ok(angles) => angles,
            Err(e) => {
                debug!(error = %e, "push-up frame skipped");
                return self.report(FeedbackMessage::PositionSideways, gate, None);
            }
        };

        let rep = self.step(angles, now);
        self.report(self.feedback, gate, rep)
    }

    fn reset(&mut self) {
        self.gate.reset();
        self.window.clear();
        self.phase = StrokePhase::None;
        self.prev_elbow = None;
        self.min_elbow = 180.0;
        self.rep_start = None;
        self.total = 0;
        self.great = 0;
        self.acceptable = 0;
        self.rejected = 0;
        self.feedback = FeedbackMessage::GoodForm;
    }

    fn tally(&self) -> RepTally {
        RepTally {
            total: self.total,
            correct: self.great,
            incorrect: Some(self.rejected),
            acceptable: Some(self.acceptable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, from_vertical, unit};
    use repsense_core::{Landmark, LandmarkPoint};

    /// Left-side plank with the upper arm hanging below the shoulder
    fn plank(elbow_deg: f64, body_deg: f64) -> Observation {
        let shoulder = (200.0, 200.0);
        let elbow = (200.0, 300.0);
        let wrist = from_vertical(elbow, elbow_deg, 100.0);
        let hip = (350.0, 200.0);
        let knee = from_vertical(hip, 270.0 - body_deg, 150.0);

        Observation::from_landmarks(
            PoseLandmarks::new()
                .with(Landmark::LeftShoulder, unit(shoulder.0, shoulder.1))
                .with(Landmark::LeftElbow, unit(elbow.0, elbow.1))
                .with(Landmark::LeftWrist, unit(wrist.0, wrist.1))
                .with(Landmark::LeftHip, unit(hip.0, hip.1))
                .with(Landmark::LeftKnee, unit(knee.0, knee.1)),
        )
    }

    fn counter() -> PushUpCounter {
        PushUpCounter::new(PushUpConfig {
            countdown_secs: 0.0,
            ..Default::default()
        })
        .unwrap()
    }

    fn run(counter: &mut PushUpCounter, start: f64, elbows: &[f64]) -> FrameReport {
        let mut last = None;
        for (i, elbow) in elbows.iter().enumerate() {
            last = Some(counter.process(&plank(*elbow, 180.0), at(start + i as f64 * 0.5)));
        }
        last.unwrap()
    }

    #[test]
    fn test_plank_geometry() {
        let c = counter();
        let obs = plank(100.0, 170.0);
        let angles = c.measure(obs.landmarks().unwrap(), Side::Left).unwrap();
        assert!((angles.elbow - 100.0).abs() < 1e-6);
        assert!((angles.body - 170.0).abs() < 1e-6);
    }

    #[test]
    fn test_body_line_uses_normalized_coordinates() {
        let c = counter();
        let point = |x: f64, y: f64| LandmarkPoint::new(x, y, 1.0);
        let landmarks = PoseLandmarks::new()
            .with(Landmark::LeftShoulder, point(0.3, 0.5))
            .with(Landmark::LeftElbow, point(0.3, 0.6))
            .with(Landmark::LeftWrist, point(0.3, 0.7))
            .with(Landmark::LeftHip, point(0.5, 0.5))
            .with(Landmark::LeftKnee, point(0.7, 0.58));

        // 158.2 degrees unscaled, a straight enough 163.3 at 640x480
        let angles = c.measure(&landmarks, Side::Left).unwrap();
        assert!((angles.body - 158.2).abs() < 0.1);
    }

    #[test]
    fn test_acceptable_rep() {
        let mut c = counter();
        let report = run(&mut c, 0.0, &[170.0, 170.0, 100.0, 80.0, 170.0]);

        assert_eq!(report.tally.total, 1);
        assert_eq!(report.tally.acceptable, Some(1));
        assert_eq!(report.tally.correct, 0);
        assert_eq!(report.rep.unwrap().quality, RepQuality::Acceptable);
        assert_eq!(report.message(), FeedbackMessage::AcceptableRep);
        assert_eq!(c.phase(), StrokePhase::Up);
    }

    #[test]
    fn test_shallow_dip_never_counts() {
        let mut c = counter();
        let report = run(&mut c, 0.0, &[170.0, 170.0, 130.0, 170.0]);
        assert_eq!(report.tally.total, 0);
        assert!(report.rep.is_none());
        assert_eq!(c.phase(), StrokePhase::None);
    }

    #[test]
    fn test_depth_buckets() {
        let mut c = counter();
        let report = run(&mut c, 0.0, &[170.0, 170.0, 110.0, 100.0, 170.0]);
        assert_eq!(report.rep.unwrap().quality, RepQuality::Great);
        assert_eq!(report.tally.correct, 1);

        let report = run(&mut c, 5.0, &[170.0, 100.0, 65.0, 170.0]);
        assert_eq!(report.rep.unwrap().quality, RepQuality::Rejected);
        assert_eq!(report.message(), FeedbackMessage::TooShallow);
        assert_eq!(report.tally.total, 1);
        assert_eq!(report.tally.incorrect, Some(1));
    }

    #[test]
    fn test_depth_advisories() {
        let mut c = counter();
        let report = run(&mut c, 0.0, &[170.0, 170.0, 115.0]);
        assert_eq!(report.message(), FeedbackMessage::GoingDown);
        let report = c.process(&plank(100.0, 180.0), at(10.0));
        assert_eq!(report.message(), FeedbackMessage::GoLower);
        let report = c.process(&plank(85.0, 180.0), at(10.5));
        assert_eq!(report.message(), FeedbackMessage::GoodDepth);
    }

    #[test]
    fn test_sagging_body_blocks_transition() {
        let mut c = counter();
        c.process(&plank(170.0, 180.0), at(0.0));
        let report = c.process(&plank(100.0, 150.0), at(0.5));
        assert_eq!(report.message(), FeedbackMessage::KeepBodyStraight);
        assert_eq!(c.phase(), StrokePhase::None);
    }

    #[test]
    fn test_jitter_is_not_movement() {
        let mut c = PushUpCounter::new(PushUpConfig {
            countdown_secs: 0.0,
            descent_angle: 120.0,
            ..Default::default()
        })
        .unwrap();
        // Hovering just under the descent angle never builds enough movement
        let report = run(&mut c, 0.0, &[121.0, 119.0, 121.0, 119.0, 121.0, 119.0]);
        assert_eq!(c.phase(), StrokePhase::None);
        assert_eq!(report.tally.total, 0);
    }

    #[test]
    fn test_missing_side_asks_to_turn() {
        let mut c = counter();
        let obs = Observation::from_landmarks(
            PoseLandmarks::new().with(Landmark::LeftShoulder, unit(200.0, 200.0)),
        );
        let report = c.process(&obs, at(0.0));
        assert_eq!(report.message(), FeedbackMessage::PositionSideways);
    }

    #[test]
    fn test_go_frame_anchors_rep_timer() {
        let mut c = PushUpCounter::new(PushUpConfig::default()).unwrap();
        assert_eq!(
            c.process(&plank(170.0, 180.0), at(0.0)).gate,
            GateState::Countdown { remaining_secs: 5 }
        );
        let report = c.process(&plank(170.0, 180.0), at(5.0));
        assert_eq!(report.gate, GateState::Go);
        assert_eq!(report.message(), FeedbackMessage::Go);
        assert_eq!(c.rep_start, Some(at(5.0)));
    }
}
