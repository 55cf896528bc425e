//! Benchmarks for per-frame counter updates.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use repsense_core::{joint_angle, Landmark, LandmarkPoint, Observation, Point2D, PoseLandmarks, Timestamp};
use repsense_motion::{build_counter, Exercise, ExerciseConfig, RepCounter};

/// Full left-side body at one point of a slow oscillation
fn create_test_pose(step: usize) -> Observation {
    let phase = (step as f64 * 0.05).sin();
    let lm = |x: f64, y: f64| LandmarkPoint::new(x, y, 0.9);

    let landmarks: PoseLandmarks = [
        (Landmark::Nose, lm(0.55, 0.10)),
        (Landmark::LeftShoulder, lm(0.50, 0.25)),
        (Landmark::RightShoulder, lm(0.51, 0.25)),
        (Landmark::LeftElbow, lm(0.50, 0.40)),
        (Landmark::LeftWrist, lm(0.50 + 0.1 * phase, 0.55 - 0.1 * phase.abs())),
        (Landmark::LeftHip, lm(0.52 + 0.05 * phase, 0.60)),
        (Landmark::LeftKnee, lm(0.50, 0.75)),
        (Landmark::LeftAnkle, lm(0.50, 0.92)),
        (Landmark::LeftFootIndex, lm(0.53, 0.95)),
        (Landmark::RightFootIndex, lm(0.53, 0.93)),
    ]
    .into_iter()
    .collect();
    Observation::from_landmarks(landmarks)
}

fn benchmark_joint_angle(c: &mut Criterion) {
    let a = Point2D::new(320.0, 100.0);
    let b = Point2D::new(320.0, 200.0);
    let cc = Point2D::new(400.0, 260.0);

    c.bench_function("joint_angle", |bench| {
        bench.iter(|| joint_angle(black_box(a), black_box(b), black_box(cc)))
    });
}

fn benchmark_counters(c: &mut Criterion) {
    let frames: Vec<Observation> = (0..1000).map(create_test_pose).collect();

    for exercise in Exercise::ALL {
        c.bench_function(&format!("process_1000_frames_{exercise}"), |bench| {
            bench.iter(|| {
                let mut counter = build_counter(&ExerciseConfig::default_for(exercise)).unwrap();
                for (i, frame) in frames.iter().enumerate() {
                    let now = Timestamp::from_secs_f64(i as f64 / 30.0);
                    black_box(counter.process(black_box(frame), now));
                }
                counter.tally()
            })
        });
    }
}

criterion_group!(benches, benchmark_joint_angle, benchmark_counters);
criterion_main!(benches);
