//! The rep counter abstraction shared by all exercises.

use repsense_core::{Observation, Result, Timestamp};
use serde::{Deserialize, Serialize};

use crate::config::{CurlConfig, PushUpConfig, SquatConfig};
use crate::curl::CurlCounter;
use crate::pushup::PushUpCounter;
use crate::report::{Exercise, FrameReport, RepTally};
use crate::squat::SquatCounter;

/// One exercise session's state machine.
///
/// A counter is owned by exactly one stream and fed one observation per
/// frame. `process` never fails: missing landmarks or an absent subject
/// degrade to feedback and the counter keeps its phase.
pub trait RepCounter: Send {
    fn exercise(&self) -> Exercise;

    /// Advance by one frame observed at `now`
    fn process(&mut self, observation: &Observation, now: Timestamp) -> FrameReport;

    /// Discard all session state, including the countdown
    fn reset(&mut self);

    fn tally(&self) -> RepTally;
}

/// Configuration for any supported exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "exercise", rename_all = "snake_case")]
pub enum ExerciseConfig {
    BicepCurl(CurlConfig),
    Squat(SquatConfig),
    PushUp(PushUpConfig),
}

impl ExerciseConfig {
    /// Default thresholds for `exercise`
    pub fn default_for(exercise: Exercise) -> Self {
        match exercise {
            Exercise::BicepCurl => ExerciseConfig::BicepCurl(CurlConfig::default()),
            Exercise::Squat => ExerciseConfig::Squat(SquatConfig::default()),
            Exercise::PushUp => ExerciseConfig::PushUp(PushUpConfig::default()),
        }
    }

    pub fn exercise(&self) -> Exercise {
        match self {
            ExerciseConfig::BicepCurl(_) => Exercise::BicepCurl,
            ExerciseConfig::Squat(_) => Exercise::Squat,
            ExerciseConfig::PushUp(_) => Exercise::PushUp,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ExerciseConfig::BicepCurl(c) => c.validate(),
            ExerciseConfig::Squat(c) => c.validate(),
            ExerciseConfig::PushUp(c) => c.validate(),
        }
    }
}

/// Build a counter, rejecting invalid thresholds before any frame is seen
pub fn build_counter(config: &ExerciseConfig) -> Result<Box<dyn RepCounter>> {
    let counter: Box<dyn RepCounter> = match config {
        ExerciseConfig::BicepCurl(c) => Box::new(CurlCounter::new(c.clone())?),
        ExerciseConfig::Squat(c) => Box::new(SquatCounter::new(c.clone())?),
        ExerciseConfig::PushUp(c) => Box::new(PushUpCounter::new(c.clone())?),
    };
    Ok(counter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AngleBand;
    use repsense_core::Error;

    #[test]
    fn test_build_every_exercise() {
        for exercise in Exercise::ALL {
            let counter = build_counter(&ExerciseConfig::default_for(exercise)).unwrap();
            assert_eq!(counter.exercise(), exercise);
            assert_eq!(counter.tally().total, 0);
        }
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut squat = SquatConfig::beginner();
        squat.knee_bands.pass = AngleBand::new(60.0, 95.0);
        let result = build_counter(&ExerciseConfig::Squat(squat));
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_no_person_never_panics() {
        for exercise in Exercise::ALL {
            let mut counter = build_counter(&ExerciseConfig::default_for(exercise)).unwrap();
            for i in 0..20 {
                let report = counter.process(&Observation::NoPerson, Timestamp::from_secs_f64(i as f64));
                assert_eq!(report.exercise, exercise);
            }
        }
    }
}
