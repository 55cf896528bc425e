//! Monitors that run beside the rep cycle.
//!
//! None of these track the rep itself. They flag form problems, debounce
//! noisy angle streams or decide when a session has gone idle.

use std::collections::VecDeque;

use repsense_core::Timestamp;

/// A warning that stays raised for a fixed number of frames.
///
/// Every frame the flag is up its counter advances; once the counter passes
/// the threshold the flag drops and the counter restarts. Raising an already
/// raised flag does not extend it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StickyFlag {
    active: bool,
    frames: u32,
}

impl StickyFlag {
    pub fn raise(&mut self) {
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Count one displayed frame
    pub fn tick(&mut self) {
        if self.active {
            self.frames += 1;
        }
    }

    /// Drop the flag once it has been shown for more than `threshold` frames
    pub fn expire(&mut self, threshold: u32) {
        if self.frames > threshold {
            self.active = false;
            self.frames = 0;
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Accumulates idle time between frames.
///
/// The first frame after construction, a `clear` or a `pause` only anchors
/// the timer; elapsed time is counted from then on.
#[derive(Debug, Clone, Copy, Default)]
pub struct InactivityTimer {
    elapsed_secs: f64,
    last: Option<Timestamp>,
}

impl InactivityTimer {
    /// Add the time since the previous frame and return the running total
    pub fn accumulate(&mut self, now: Timestamp) -> f64 {
        if let Some(last) = self.last {
            self.elapsed_secs += now.secs_since(last).max(0.0);
        }
        self.last = Some(now);
        self.elapsed_secs
    }

    /// Zero the total and start counting again from `now`
    pub fn restart(&mut self, now: Timestamp) {
        self.elapsed_secs = 0.0;
        self.last = Some(now);
    }

    /// Keep the total but do not count time until the next `accumulate`
    pub fn pause(&mut self) {
        self.last = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }
}

/// Detects a joint held past its lock angle for too long
#[derive(Debug, Clone)]
pub struct LockGuard {
    lock_angle: f64,
    lock_secs: f64,
    above_since: Option<Timestamp>,
    locked: bool,
}

impl LockGuard {
    pub fn new(lock_angle: f64, lock_secs: f64) -> Self {
        Self {
            lock_angle,
            lock_secs,
            above_since: None,
            locked: false,
        }
    }

    /// Feed one angle sample; returns whether the joint is locked afterwards.
    ///
    /// An angle exactly at the lock angle neither advances nor clears the guard.
    pub fn update(&mut self, angle: f64, now: Timestamp) -> bool {
        if angle > self.lock_angle && !self.locked {
            match self.above_since {
                None => self.above_since = Some(now),
                Some(since) => {
                    if now.secs_since(since) > self.lock_secs {
                        self.locked = true;
                    }
                }
            }
        } else if angle < self.lock_angle {
            self.above_since = None;
            self.locked = false;
        }
        self.locked
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn reset(&mut self) {
        self.above_since = None;
        self.locked = false;
    }
}

/// Sliding sum of frame-to-frame angle changes.
///
/// Pose estimators jitter by a few degrees per frame; a transition is only
/// trusted when the recent window shows real movement.
#[derive(Debug, Clone)]
pub struct MovementWindow {
    capacity: usize,
    min_change: f64,
    deltas: VecDeque<f64>,
    sum: f64,
}

impl MovementWindow {
    pub fn new(capacity: usize, min_change: f64) -> Self {
        Self {
            capacity,
            min_change,
            deltas: VecDeque::with_capacity(capacity),
            sum: 0.0,
        }
    }

    pub fn push(&mut self, delta: f64) {
        let delta = delta.abs();
        self.deltas.push_back(delta);
        self.sum += delta;
        while self.deltas.len() > self.capacity {
            if let Some(old) = self.deltas.pop_front() {
                self.sum -= old;
            }
        }
    }

    pub fn total(&self) -> f64 {
        self.sum
    }

    /// True once the windowed movement exceeds the configured minimum
    pub fn is_significant(&self) -> bool {
        !self.deltas.is_empty() && self.sum > self.min_change
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn clear(&mut self) {
        self.deltas.clear();
        self.sum = 0.0;
    }
}
