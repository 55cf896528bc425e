//! # Repsense-Stream
//!
//! Runs rep-counting sessions over a stream of pose observations.
//!
//! ## Pipeline
//!
//! 1. **Source**: frames arrive from a live pose adapter ([`ChannelSource`])
//!    or a recorded session ([`JsonLinesSource`])
//! 2. **Session**: one task per stream owns its counter and turns each frame
//!    into a [`FrameReport`](repsense_motion::FrameReport)
//! 3. **Output**: reports are published on a bounded channel; the session
//!    ends with a [`SessionSummary`]
//!
//! Thresholds are loaded through [`Settings`].

pub mod runner;
pub mod settings;
pub mod source;

pub use runner::*;
pub use settings::*;
pub use source::*;
