//! Fundamental types for the repsense system.

use std::collections::HashMap;
use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Identifier of one live exercise stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Monotonic timestamp with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * 1_000_000_000.0).round() as i64)
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Seconds elapsed since `earlier`. Negative if the clock went backwards.
    pub fn secs_since(&self, earlier: Timestamp) -> f64 {
        (self.0 - earlier.0) as f64 / 1_000_000_000.0
    }
}

/// 33-point body landmark topology produced by the upstream pose estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Landmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl Landmark {
    pub const COUNT: usize = 33;

    const ALL: [Landmark; Landmark::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    /// Look up a landmark by the estimator's output index
    pub fn from_index(idx: u8) -> Option<Self> {
        Self::ALL.get(idx as usize).copied()
    }

    pub fn index(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Body side an exercise is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Side-agnostic joint name, resolved to a [`Landmark`] through a [`Side`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Shoulder,
    Elbow,
    Wrist,
    Hip,
    Knee,
    Ankle,
    Foot,
}

impl Joint {
    /// The six joints whose visibility decides which side faces the camera
    pub const LIMB_CHAIN: [Joint; 6] = [
        Joint::Shoulder,
        Joint::Elbow,
        Joint::Wrist,
        Joint::Hip,
        Joint::Knee,
        Joint::Ankle,
    ];

    pub fn on(&self, side: Side) -> Landmark {
        match (side, self) {
            (Side::Left, Joint::Shoulder) => Landmark::LeftShoulder,
            (Side::Left, Joint::Elbow) => Landmark::LeftElbow,
            (Side::Left, Joint::Wrist) => Landmark::LeftWrist,
            (Side::Left, Joint::Hip) => Landmark::LeftHip,
            (Side::Left, Joint::Knee) => Landmark::LeftKnee,
            (Side::Left, Joint::Ankle) => Landmark::LeftAnkle,
            (Side::Left, Joint::Foot) => Landmark::LeftFootIndex,
            (Side::Right, Joint::Shoulder) => Landmark::RightShoulder,
            (Side::Right, Joint::Elbow) => Landmark::RightElbow,
            (Side::Right, Joint::Wrist) => Landmark::RightWrist,
            (Side::Right, Joint::Hip) => Landmark::RightHip,
            (Side::Right, Joint::Knee) => Landmark::RightKnee,
            (Side::Right, Joint::Ankle) => Landmark::RightAnkle,
            (Side::Right, Joint::Foot) => Landmark::RightFootIndex,
        }
    }
}

/// 2D position in normalized image coordinates ([0, 1] on both axes)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A detected landmark: position plus detection confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    /// Detection confidence in [0, 1]
    #[serde(default = "default_visibility")]
    pub visibility: f32,
}

fn default_visibility() -> f32 {
    1.0
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64, visibility: f32) -> Self {
        Self {
            x,
            y,
            visibility: visibility.clamp(0.0, 1.0),
        }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// All landmarks detected for one person in one frame. Absent landmarks have no entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseLandmarks {
    points: HashMap<Landmark, LandmarkPoint>,
}

impl PoseLandmarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, landmark: Landmark, point: LandmarkPoint) {
        self.points.insert(landmark, point);
    }

    pub fn with(mut self, landmark: Landmark, point: LandmarkPoint) -> Self {
        self.insert(landmark, point);
        self
    }

    pub fn get(&self, landmark: Landmark) -> Option<&LandmarkPoint> {
        self.points.get(&landmark)
    }

    /// Position of a landmark the caller cannot proceed without
    pub fn require(&self, landmark: Landmark) -> Result<Point2D> {
        self.get(landmark)
            .map(LandmarkPoint::position)
            .ok_or(Error::MissingLandmark { landmark })
    }

    /// Visibility score, 0 when the landmark was not detected
    pub fn visibility(&self, landmark: Landmark) -> f32 {
        self.get(landmark).map_or(0.0, |p| p.visibility)
    }

    /// Average visibility of `joints` on one side
    pub fn side_visibility(&self, side: Side, joints: &[Joint]) -> f32 {
        if joints.is_empty() {
            return 0.0;
        }
        let sum: f32 = joints.iter().map(|j| self.visibility(j.on(side))).sum();
        sum / joints.len() as f32
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Landmark, &LandmarkPoint)> {
        self.points.iter()
    }
}

impl FromIterator<(Landmark, LandmarkPoint)> for PoseLandmarks {
    fn from_iter<I: IntoIterator<Item = (Landmark, LandmarkPoint)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// Pose estimator output for a single frame
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Person(PoseLandmarks),
    NoPerson,
}

impl Observation {
    /// Wrap a landmark set; an empty set means detection failed.
    pub fn from_landmarks(landmarks: PoseLandmarks) -> Self {
        if landmarks.is_empty() {
            Observation::NoPerson
        } else {
            Observation::Person(landmarks)
        }
    }

    pub fn landmarks(&self) -> Option<&PoseLandmarks> {
        match self {
            Observation::Person(landmarks) => Some(landmarks),
            Observation::NoPerson => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_index_roundtrip() {
        for i in 0..Landmark::COUNT as u8 {
            let landmark = Landmark::from_index(i).unwrap();
            assert_eq!(landmark.index(), i);
        }
        assert_eq!(Landmark::from_index(33), None);
    }

    #[test]
    fn test_joint_sides() {
        assert_eq!(Joint::Elbow.on(Side::Left), Landmark::LeftElbow);
        assert_eq!(Joint::Foot.on(Side::Right), Landmark::RightFootIndex);
        assert_eq!(Side::Left.opposite(), Side::Right);
    }

    #[test]
    fn test_require_missing_landmark() {
        let landmarks = PoseLandmarks::new().with(Landmark::Nose, LandmarkPoint::new(0.5, 0.2, 0.9));

        assert!(landmarks.require(Landmark::Nose).is_ok());
        match landmarks.require(Landmark::LeftWrist) {
            Err(Error::MissingLandmark { landmark }) => assert_eq!(landmark, Landmark::LeftWrist),
            other => panic!("expected missing landmark, got {:?}", other),
        }
        assert_eq!(landmarks.visibility(Landmark::LeftWrist), 0.0);
    }

    #[test]
    fn test_side_visibility_counts_absent_as_zero() {
        let landmarks = PoseLandmarks::new()
            .with(Landmark::LeftShoulder, LandmarkPoint::new(0.4, 0.3, 0.9))
            .with(Landmark::LeftElbow, LandmarkPoint::new(0.4, 0.4, 0.3));

        let vis = landmarks.side_visibility(Side::Left, &[Joint::Shoulder, Joint::Elbow, Joint::Wrist]);
        assert!((vis - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_empty_landmarks_is_no_person() {
        assert_eq!(Observation::from_landmarks(PoseLandmarks::new()), Observation::NoPerson);
    }

    #[test]
    fn test_landmarks_deserialize_by_name() {
        let json = r#"{"left_elbow": {"x": 0.5, "y": 0.25, "visibility": 0.8}, "nose": {"x": 0.1, "y": 0.2}}"#;
        let landmarks: PoseLandmarks = serde_json::from_str(json).unwrap();

        assert_eq!(landmarks.len(), 2);
        assert_eq!(landmarks.get(Landmark::LeftElbow).unwrap().y, 0.25);
        assert_eq!(landmarks.visibility(Landmark::Nose), 1.0);
    }

    #[test]
    fn test_timestamp_secs() {
        let t0 = Timestamp::from_secs_f64(1.0);
        let t1 = Timestamp::from_secs_f64(1.75);
        assert!((t1.secs_since(t0) - 0.75).abs() < 1e-9);
        assert_eq!(t0.as_nanos(), 1_000_000_000);
    }
}
