//! Joint-angle geometry.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::types::Point2D;

/// Segments shorter than this are treated as degenerate
const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// Pixel frame the normalized landmarks are projected onto before measuring angles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width: f64,
    pub height: f64,
}

impl FrameGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Map a normalized point to pixel space
    pub fn project(&self, p: Point2D) -> Point2D {
        Point2D::new(p.x * self.width, p.y * self.height)
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::new(640.0, 480.0)
    }
}

/// Angle in degrees at vertex `b` formed by `a` and `c`, in [0, 180].
///
/// Computed as the absolute difference of the two segment headings, reflected
/// into [0, 180]. Coincident or non-finite points yield 0.
pub fn joint_angle(a: Point2D, b: Point2D, c: Point2D) -> f64 {
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return 0.0;
    }

    let ba: Vector2<f64> = a.to_nalgebra() - b.to_nalgebra();
    let bc: Vector2<f64> = c.to_nalgebra() - b.to_nalgebra();
    if ba.norm() < MIN_SEGMENT_LENGTH || bc.norm() < MIN_SEGMENT_LENGTH {
        return 0.0;
    }

    let radians = bc.y.atan2(bc.x) - ba.y.atan2(ba.x);
    let mut angle = radians.to_degrees().abs();
    if angle > 180.0 {
        angle = 360.0 - angle;
    }
    angle.clamp(0.0, 180.0)
}

/// Angle at `vertex` between `p` and the image-upward vertical through the vertex.
///
/// Image y grows downwards, so "up" is the negative y direction.
pub fn vertical_angle(p: Point2D, vertex: Point2D) -> f64 {
    let up = Point2D::new(vertex.x, vertex.y - 1.0);
    joint_angle(p, vertex, up)
}
