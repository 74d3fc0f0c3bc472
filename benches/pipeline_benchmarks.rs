//! Performance benchmarks for the per-tick gaze pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gaze_estimation::{
    camera::Resolution,
    filters::{create_smoother, KalmanSmoother},
    iris::IrisCalibrator,
    landmarks::{Landmark, LandmarkFrame, LandmarkProjector},
    pipeline::{GazeTracker, TrackerSettings},
    screen::ScreenGeometry,
};
use rand::Rng;
use std::time::Duration;

/// Frontal frame with jittered landmarks
fn noisy_frame(rng: &mut impl Rng) -> LandmarkFrame {
    let landmarks = (0..478)
        .map(|_| {
            Landmark::new(
                0.5 + rng.gen_range(-0.1..0.1),
                0.55 + rng.gen_range(-0.1..0.1),
                rng.gen_range(-0.02..0.02),
            )
        })
        .collect();
    #[rustfmt::skip]
    let transform = [
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];
    LandmarkFrame::new(landmarks, Some(transform)).unwrap()
}

fn settings() -> TrackerSettings {
    TrackerSettings::new(
        80f64.to_radians(),
        12.0,
        Resolution::new(1920, 1080),
        &ScreenGeometry::Diagonal { diagonal_inches: 15.6 },
    )
    .unwrap()
}

/// Benchmark landmark projection at common capture sizes
fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");
    let frame = noisy_frame(&mut rand::thread_rng());

    for (width, height) in [(640, 480), (1280, 720), (1920, 1080)] {
        let projector = LandmarkProjector::new(Resolution::new(width, height));
        group.bench_with_input(
            BenchmarkId::new("project_478", format!("{width}x{height}")),
            &projector,
            |b, projector| {
                b.iter(|| black_box(projector.project(black_box(frame.landmarks()))));
            },
        );
    }

    group.finish();
}

/// Benchmark the iris scale ratio on a projected cloud
fn bench_iris(c: &mut Criterion) {
    let frame = noisy_frame(&mut rand::thread_rng());
    let cloud = LandmarkProjector::new(Resolution::new(1280, 720)).project(frame.landmarks());
    let calibrator = IrisCalibrator::default();

    c.bench_function("iris_scale_ratio", |b| {
        b.iter(|| black_box(calibrator.scale_ratio(black_box(&cloud))));
    });
}

/// Benchmark full ticks
fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");
    group.measurement_time(Duration::from_secs(10));

    let mut rng = rand::thread_rng();
    let frames: Vec<LandmarkFrame> = (0..100).map(|_| noisy_frame(&mut rng)).collect();

    for smoother in ["none", "kalman"] {
        group.bench_with_input(BenchmarkId::new("sequence_100", smoother), &smoother, |b, &name| {
            let mut tracker = GazeTracker::new(settings(), create_smoother(name).unwrap());
            tracker.set_resolution(Resolution::new(1280, 720)).unwrap();
            b.iter(|| {
                for frame in &frames {
                    black_box(tracker.tick(Some(frame)));
                }
            });
        });
    }

    group.bench_function("no_face", |b| {
        let mut tracker = GazeTracker::new(settings(), Box::new(KalmanSmoother::default()));
        tracker.set_resolution(Resolution::new(1280, 720)).unwrap();
        b.iter(|| black_box(tracker.tick(None)));
    });

    group.finish();
}

criterion_group!(benches, bench_projection, bench_iris, bench_tick);
criterion_main!(benches);
