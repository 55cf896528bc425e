//! Warm-up countdown that holds rep logic back at session start.

use repsense_core::Timestamp;
use serde::{Deserialize, Serialize};

/// What the gate allows on a given frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Still warming up; whole seconds left, rounded up
    Countdown { remaining_secs: u32 },
    /// The single frame on which the countdown expired
    Go,
    /// Rep logic runs
    Active,
}

/// Countdown gate. The clock starts on the first polled frame.
#[derive(Debug, Clone)]
pub struct CountdownGate {
    duration_secs: f64,
    started: Option<Timestamp>,
    finished: bool,
}

impl CountdownGate {
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            started: None,
            finished: duration_secs <= 0.0,
        }
    }

    pub fn poll(&mut self, now: Timestamp) -> GateState {
        if self.finished {
            return GateState::Active;
        }

        let started = *self.started.get_or_insert(now);
        let elapsed = now.secs_since(started);
        if elapsed < self.duration_secs {
            let remaining = self.duration_secs - elapsed;
            GateState::Countdown {
                remaining_secs: remaining.ceil() as u32,
            }
        } else {
            self.finished = true;
            GateState::Go
        }
    }

    pub fn is_active(&self) -> bool {
        self.finished
    }

    /// Rearm the countdown for a restarted session
    pub fn reset(&mut self) {
        *self = Self::new(self.duration_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: f64) -> Timestamp {
        Timestamp::from_secs_f64(secs)
    }

    #[test]
    fn test_countdown_then_single_go() {
        let mut gate = CountdownGate::new(3.0);

        assert_eq!(gate.poll(at(10.0)), GateState::Countdown { remaining_secs: 3 });
        assert_eq!(gate.poll(at(11.2)), GateState::Countdown { remaining_secs: 2 });
        assert_eq!(gate.poll(at(12.9)), GateState::Countdown { remaining_secs: 1 });
        assert_eq!(gate.poll(at(13.0)), GateState::Go);
        assert!(gate.is_active());
        assert_eq!(gate.poll(at(13.1)), GateState::Active);
    }

    #[test]
    fn test_zero_duration_starts_active() {
        let mut gate = CountdownGate::new(0.0);
        assert!(gate.is_active());
        assert_eq!(gate.poll(at(0.0)), GateState::Active);
    }

    #[test]
    fn test_reset_rearms() {
        let mut gate = CountdownGate::new(1.0);
        gate.poll(at(0.0));
        gate.poll(at(2.0));
        gate.reset();
        assert_eq!(gate.poll(at(5.0)), GateState::Countdown { remaining_secs: 1 });
    }
}
