//! # Repsense-Core
//!
//! Core types and geometry for the repsense exercise tracker: pose
//! observations as delivered by the upstream estimator, joint-angle
//! computation, body-side selection and monotonic time.

pub mod clock;
pub mod error;
pub mod geometry;
pub mod side;
pub mod types;

pub use clock::*;
pub use error::{Error, Result};
pub use geometry::*;
pub use side::*;
pub use types::*;
