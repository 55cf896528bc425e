//! # Repsense-Motion
//!
//! Rep-phase state machines that turn a stream of pose observations into
//! repetition counts and live form feedback.
//!
//! ## Exercises
//!
//! - **Bicep curl** - elbow angle cycle with a joint-lock guard, half-rep
//!   detection and a minimum rep duration
//! - **Squat** - knee angle discretized into states; a descent is judged when
//!   the subject stands up again, with posture, camera-alignment and
//!   inactivity guards alongside
//! - **Push-up** - elbow and body-line angles, with a movement window that
//!   debounces phase transitions
//!
//! ## Per-frame flow
//!
//! observation → side selection → joint angles → state machine + guards →
//! feedback aggregation → [`FrameReport`]
//!
//! Every counter implements [`RepCounter`] and owns all of its session state;
//! build one per stream with [`build_counter`].

pub mod config;
pub mod countdown;
pub mod counter;
pub mod curl;
pub mod feedback;
pub mod guards;
pub mod phase;
pub mod pushup;
pub mod report;
pub mod squat;

#[cfg(test)]
mod testing;

pub use config::*;
pub use countdown::*;
pub use counter::*;
pub use curl::*;
pub use feedback::*;
pub use guards::*;
pub use phase::*;
pub use pushup::*;
pub use report::*;
pub use squat::*;
