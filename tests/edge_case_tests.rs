//! Edge case tests for the pipeline, smoothers and fixation detection


use gaze_estimation::{
    filters::{create_smoother, KalmanSmoother, NoSmoother},
    fixation::FixationDetector,
    landmarks::{Landmark, LandmarkFrame},
    pipeline::{advance, GazeTracker, TrackerState},
    SkipReason,
};
use nalgebra::Vector2;
use proptest::prelude::*;
use test_helpers::{default_settings, frontal_frame, FrameBuilder, CAMERA, FACING_CAMERA};

fn ready_tracker() -> GazeTracker {
    let mut tracker = GazeTracker::new(default_settings().unwrap(), Box::new(KalmanSmoother::default()));
    tracker.set_resolution(CAMERA).unwrap();
    tracker
}

#[test]
fn test_smoother_extreme_values() {
    let extreme_values = [
        Vector2::new(f64::MAX, f64::MIN),
        Vector2::new(1e100, -1e100),
        Vector2::new(0.0, 0.0),
    ];

    let none = create_smoother("none").unwrap();
    let mut state = None;
    for value in extreme_values {
        let next = none.step(state.as_ref(), value);
        assert_eq!(next.mean, value);
        state = Some(next);
    }

    for name in ["kalman", "kalman:0.5:2.0"] {
        let smoother = create_smoother(name).unwrap();
        let first = smoother.step(None, Vector2::new(1e100, -1e100));
        assert!(first.mean.iter().all(|c| c.is_finite()));
        assert!(first.covariance.iter().all(|c| c.is_finite()));
        assert!((first.mean.x / 1e100 - 1.0).abs() < 1e-3);

        let next = smoother.step(Some(&first), Vector2::new(0.0, 0.0));
        assert!(next.mean.iter().all(|c| c.is_finite()));
        assert!(next.mean.x < first.mean.x);
    }
}

#[test]
fn test_nan_landmarks_are_skipped() {
    let mut tracker = ready_tracker();
    tracker.tick(Some(&frontal_frame().unwrap()));
    let published = tracker.published_target();

    let landmarks = vec![Landmark::new(f32::NAN, f32::NAN, f32::NAN); 478];
    let frame = LandmarkFrame::new(landmarks, Some(FACING_CAMERA)).unwrap();
    let report = tracker.tick(Some(&frame));

    assert!(!report.is_smoothed());
    assert_eq!(tracker.published_target(), published);
}

#[test]
fn test_nan_transform_is_degenerate() {
    let mut tracker = ready_tracker();
    let frame = FrameBuilder::default().transform(Some([f32::NAN; 16])).build().unwrap();
    let report = tracker.tick(Some(&frame));
    assert_eq!(report.skip_reason(), Some(SkipReason::DegenerateRay));
}

#[test]
fn test_head_turned_away_is_degenerate() {
    let mut tracker = ready_tracker();
    // Head turned 180° about y: the focal plane is behind the ray
    #[rustfmt::skip]
    let away = [
        -1.0, 0.0,  0.0, 0.0,
         0.0, 1.0,  0.0, 0.0,
         0.0, 0.0, -1.0, 0.0,
         0.0, 0.0,  0.0, 1.0,
    ];
    let frame = FrameBuilder::default().transform(Some(away)).build().unwrap();
    let report = tracker.tick(Some(&frame));
    assert_eq!(report.skip_reason(), Some(SkipReason::DegenerateRay));
    assert!(report.intersection.is_none());
}

#[test]
fn test_collapsed_iris_is_invalid_calibration() {
    let mut tracker = ready_tracker();
    let frame = FrameBuilder::default().iris_width(Some(0.0)).build().unwrap();
    let report = tracker.tick(Some(&frame));
    assert_eq!(report.skip_reason(), Some(SkipReason::InvalidCalibration));
    assert!(report.scale_ratio.is_none());
}

#[test]
fn test_target_off_screen_is_still_published() {
    // Looking far to the side maps outside the screen; the raw value is kept
    // and only the pixel form is clamped
    let mut tracker = ready_tracker();
    let frame = FrameBuilder::default().anchor(0.02, 0.6).build().unwrap();
    let report = tracker.tick(Some(&frame));
    let target = report.target.unwrap();
    assert!(target.x > 1920.0);
    let (px, _) = tracker.settings().screen.to_pixel(&target).unwrap();
    assert_eq!(px, 1919);
}

#[test]
fn test_uninitialized_state_ignores_frames() {
    let settings = default_settings().unwrap();
    let frame = frontal_frame().unwrap();
    let (state, report) = advance(TrackerState::Uninitialized, Some(&frame), &settings, &NoSmoother);
    assert_eq!(state, TrackerState::Uninitialized);
    assert_eq!(report.skip_reason(), Some(SkipReason::CameraNotReady));
    assert!(report.points.is_none());
}

#[test]
fn test_fixation_window_of_one() {
    let mut detector = FixationDetector::new(1, 0.5).unwrap();
    assert!(detector.update(Vector2::new(10.0, 10.0)));
    assert!(detector.update(Vector2::new(1000.0, 10.0)));
}

proptest! {
    #[test]
    fn prop_tick_never_publishes_non_finite(
        points in prop::collection::vec((0.0f32..1.0, 0.0f32..1.0, -0.1f32..0.1), 478),
        transform in prop::array::uniform16(-1.0f32..1.0),
    ) {
        let mut tracker = ready_tracker();
        tracker.tick(Some(&frontal_frame().unwrap()));
        let before = tracker.published_target();

        let landmarks = points.into_iter().map(|(x, y, z)| Landmark::new(x, y, z)).collect();
        let frame = LandmarkFrame::new(landmarks, Some(transform)).unwrap();
        let report = tracker.tick(Some(&frame));

        match report.target {
            Some(target) => prop_assert!(target.x.is_finite() && target.y.is_finite()),
            None => prop_assert!(false, "published target disappeared"),
        }
        if !report.is_smoothed() {
            prop_assert_eq!(tracker.published_target(), before);
        }
    }
}
