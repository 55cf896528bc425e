//! Pose builders for counter tests. Points are given in pixels: `px` maps
//! them onto the default 640x480 frame the squat counter projects onto,
//! `unit` scales both axes by the same factor so angles are preserved in
//! normalized coordinates.

use repsense_core::{FrameGeometry, LandmarkPoint, Timestamp};

pub fn px(x: f64, y: f64) -> LandmarkPoint {
    let frame = FrameGeometry::default();
    LandmarkPoint::new(x / frame.width, y / frame.height, 1.0)
}

pub fn unit(x: f64, y: f64) -> LandmarkPoint {
    LandmarkPoint::new(x / 640.0, y / 640.0, 1.0)
}

pub fn at(secs: f64) -> Timestamp {
    Timestamp::from_secs_f64(secs)
}

/// Point `length` pixels from `origin`, `angle_deg` clockwise from straight up
pub fn from_vertical(origin: (f64, f64), angle_deg: f64, length: f64) -> (f64, f64) {
    let rad = angle_deg.to_radians();
    (origin.0 + length * rad.sin(), origin.1 - length * rad.cos())
}
