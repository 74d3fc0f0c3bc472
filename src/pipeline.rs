//! Per-tick gaze pipeline.
//!
//! The tracker is an explicit state value. [`advance`] takes the current
//! [`TrackerState`] and one tick of detector output and returns the next
//! state together with a [`TickReport`] snapshot. Stages run in order:
//!
//! 1. project landmarks into camera space
//! 2. build the head-pose ray
//! 3. intersect it with the focal plane
//! 4. derive the iris scale ratio
//! 5. map the intersection to screen pixels
//! 6. smooth the target
//!
//! Any stage that cannot produce a value ends the tick with a
//! [`SkipReason`]; the filter state and the published target are then left
//! exactly as they were.

use crate::{
    camera::{CameraModel, Resolution},
    error::SkipReason,
    filters::{FilterState, GazeSmoother},
    geometry::Ray,
    head_pose::build_gaze_ray,
    iris::IrisCalibrator,
    landmarks::{LandmarkFrame, LandmarkProjector, PointCloud},
    screen::{ScreenGeometry, ScreenMapper},
    utils::is_finite2,
    Result,
};
use log::{debug, info, warn};
use nalgebra::{Vector2, Vector3};

/// Fixed configuration shared by every tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSettings {
    /// Diagonal field of view of the capture device, radians
    pub diagonal_fov: f64,
    /// Iris-based distance calibration
    pub iris: IrisCalibrator,
    /// Target screen
    pub screen: ScreenMapper,
}

impl TrackerSettings {
    /// Build settings from raw parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the iris width or the screen description is invalid.
    pub fn new(
        diagonal_fov: f64,
        iris_width_mm: f64,
        screen_resolution: Resolution,
        screen_geometry: &ScreenGeometry,
    ) -> Result<Self> {
        Ok(Self {
            diagonal_fov,
            iris: IrisCalibrator::new(iris_width_mm)?,
            screen: ScreenMapper::new(screen_resolution, screen_geometry)?,
        })
    }
}

/// Tracker state once the capture resolution is known
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyState {
    camera: CameraModel,
    projector: LandmarkProjector,
    filter: Option<FilterState>,
    published: Option<Vector2<f64>>,
}

impl ReadyState {
    /// Camera model for the current resolution
    #[must_use]
    pub const fn camera(&self) -> &CameraModel {
        &self.camera
    }

    /// Smoother state, `None` before the first valid observation
    #[must_use]
    pub const fn filter_state(&self) -> Option<&FilterState> {
        self.filter.as_ref()
    }

    /// Last published gaze target
    #[must_use]
    pub const fn published_target(&self) -> Option<Vector2<f64>> {
        self.published
    }
}

/// Gaze tracker lifecycle
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TrackerState {
    /// Capture resolution not negotiated yet
    #[default]
    Uninitialized,
    /// Camera model available; ticks produce estimates
    Ready(ReadyState),
}

impl TrackerState {
    /// Apply a negotiated capture resolution
    ///
    /// Re-applying the current resolution is a no-op. A new resolution
    /// recomputes the camera model and keeps the smoother state.
    ///
    /// # Errors
    ///
    /// Returns an error if the camera model cannot be built.
    pub fn configure(self, resolution: Resolution, settings: &TrackerSettings) -> Result<Self> {
        match self {
            Self::Ready(ready) if ready.camera.same_resolution(resolution) => Ok(Self::Ready(ready)),
            Self::Ready(ready) => {
                let camera = CameraModel::new(settings.diagonal_fov, resolution)?;
                info!(
                    "Capture resolution changed {} -> {}, focal length {:.1} px",
                    ready.camera.resolution(),
                    resolution,
                    camera.focal_length()
                );
                Ok(Self::Ready(ReadyState {
                    camera,
                    projector: LandmarkProjector::new(resolution),
                    ..ready
                }))
            }
            Self::Uninitialized => {
                let camera = CameraModel::new(settings.diagonal_fov, resolution)?;
                info!(
                    "Camera initialized at {}, focal length {:.1} px",
                    resolution,
                    camera.focal_length()
                );
                Ok(Self::Ready(ReadyState {
                    camera,
                    projector: LandmarkProjector::new(resolution),
                    filter: None,
                    published: None,
                }))
            }
        }
    }

    /// True once a resolution has been applied
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Camera model, if ready
    #[must_use]
    pub const fn camera(&self) -> Option<&CameraModel> {
        match self {
            Self::Ready(ready) => Some(&ready.camera),
            Self::Uninitialized => None,
        }
    }

    /// Smoother state, if any observation has been accepted
    #[must_use]
    pub const fn filter_state(&self) -> Option<&FilterState> {
        match self {
            Self::Ready(ready) => ready.filter.as_ref(),
            Self::Uninitialized => None,
        }
    }

    /// Last published gaze target
    #[must_use]
    pub const fn published_target(&self) -> Option<Vector2<f64>> {
        match self {
            Self::Ready(ready) => ready.published,
            Self::Uninitialized => None,
        }
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new smoothed target was published
    Smoothed,
    /// The tick was skipped; the previous target stands
    Skipped(SkipReason),
}

impl TickOutcome {
    /// Stable name used in replay output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Smoothed => "smoothed",
            Self::Skipped(reason) => reason.as_str(),
        }
    }
}

/// Read-only snapshot of everything computed during one tick
///
/// Stages that completed before a skip still report their values.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// What happened this tick
    pub outcome: TickOutcome,
    /// Landmarks in camera space
    pub points: Option<PointCloud>,
    /// Gaze ray from the anchor landmark
    pub ray: Option<Ray>,
    /// Ray hit on the focal plane
    pub intersection: Option<Vector3<f64>>,
    /// Pixels per millimetre from the iris width
    pub scale_ratio: Option<f64>,
    /// Screen target before smoothing
    pub raw_target: Option<Vector2<f64>>,
    /// Published (smoothed) target, carried over on skipped ticks
    pub target: Option<Vector2<f64>>,
}

impl TickReport {
    fn empty(target: Option<Vector2<f64>>) -> Self {
        Self {
            outcome: TickOutcome::Skipped(SkipReason::MissingFace),
            points: None,
            ray: None,
            intersection: None,
            scale_ratio: None,
            raw_target: None,
            target,
        }
    }

    /// True if this tick published a new target
    #[must_use]
    pub const fn is_smoothed(&self) -> bool {
        matches!(self.outcome, TickOutcome::Smoothed)
    }

    /// Skip reason, if the tick was skipped
    #[must_use]
    pub const fn skip_reason(&self) -> Option<SkipReason> {
        match self.outcome {
            TickOutcome::Skipped(reason) => Some(reason),
            TickOutcome::Smoothed => None,
        }
    }
}

/// Run stages 1–5, filling in the report as each stage succeeds
fn estimate(
    ready: &ReadyState,
    frame: Option<&LandmarkFrame>,
    settings: &TrackerSettings,
    report: &mut TickReport,
) -> std::result::Result<Vector2<f64>, SkipReason> {
    let frame = frame.filter(|f| !f.is_empty()).ok_or(SkipReason::MissingFace)?;

    let points = ready.projector.project(frame.landmarks());
    let scale_ratio = settings.iris.scale_ratio(&points);
    let transform = frame.transform_matrix();
    let ray = transform.and_then(|t| build_gaze_ray(&t, &points));
    report.points = Some(points);
    report.scale_ratio = scale_ratio;
    report.ray = ray;

    if transform.is_none() {
        return Err(SkipReason::MissingHeadPose);
    }
    let ray = ray.ok_or(SkipReason::DegenerateRay)?;

    let intersection = ready
        .camera
        .focal_plane()
        .intersect(&ray)
        .ok_or(SkipReason::DegenerateRay)?;
    report.intersection = Some(intersection);

    let scale_ratio = scale_ratio.ok_or(SkipReason::InvalidCalibration)?;

    let raw_target = settings
        .screen
        .map(&intersection, scale_ratio)
        .ok_or(SkipReason::InvalidObservation)?;
    report.raw_target = Some(raw_target);

    Ok(raw_target)
}

/// Advance the tracker by one tick
///
/// `frame` is `None` when the detector found no face. The returned state
/// differs from the input only when a new target was published, or when a
/// non-finite filter result forced the smoother to restart.
pub fn advance(
    state: TrackerState,
    frame: Option<&LandmarkFrame>,
    settings: &TrackerSettings,
    smoother: &dyn GazeSmoother,
) -> (TrackerState, TickReport) {
    let TrackerState::Ready(ready) = state else {
        let mut report = TickReport::empty(None);
        report.outcome = TickOutcome::Skipped(SkipReason::CameraNotReady);
        debug!("Tick skipped: {}", SkipReason::CameraNotReady);
        return (TrackerState::Uninitialized, report);
    };

    let mut report = TickReport::empty(ready.published);
    let observation = match estimate(&ready, frame, settings, &mut report) {
        Ok(observation) => observation,
        Err(reason) => {
            debug!("Tick skipped: {reason}");
            report.outcome = TickOutcome::Skipped(reason);
            return (TrackerState::Ready(ready), report);
        }
    };

    let next = smoother.step(ready.filter.as_ref(), observation);
    if !is_finite2(&next.mean) || !next.covariance.iter().all(|c| c.is_finite()) {
        warn!("Smoother produced a non-finite state, restarting it");
        report.outcome = TickOutcome::Skipped(SkipReason::InvalidObservation);
        return (TrackerState::Ready(ReadyState { filter: None, ..ready }), report);
    }

    report.outcome = TickOutcome::Smoothed;
    report.target = Some(next.mean);
    (
        TrackerState::Ready(ReadyState {
            filter: Some(next),
            published: Some(next.mean),
            ..ready
        }),
        report,
    )
}

/// Owns the tracker state, its settings and the smoother
pub struct GazeTracker {
    settings: TrackerSettings,
    smoother: Box<dyn GazeSmoother>,
    state: TrackerState,
}

impl GazeTracker {
    /// Create an uninitialized tracker
    #[must_use]
    pub fn new(settings: TrackerSettings, smoother: Box<dyn GazeSmoother>) -> Self {
        Self {
            settings,
            smoother,
            state: TrackerState::Uninitialized,
        }
    }

    /// Apply the negotiated capture resolution
    ///
    /// # Errors
    ///
    /// Returns an error if the camera model cannot be built; the tracker
    /// keeps its previous state in that case.
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<()> {
        let current = std::mem::take(&mut self.state);
        match current.clone().configure(resolution, &self.settings) {
            Ok(next) => {
                self.state = next;
                Ok(())
            }
            Err(e) => {
                self.state = current;
                Err(e)
            }
        }
    }

    /// Process one tick of detector output
    pub fn tick(&mut self, frame: Option<&LandmarkFrame>) -> TickReport {
        let current = std::mem::take(&mut self.state);
        let (next, report) = advance(current, frame, &self.settings, self.smoother.as_ref());
        self.state = next;
        report
    }

    /// Forget the smoothed estimate; the next valid tick starts fresh
    pub fn reset_smoothing(&mut self) {
        if let TrackerState::Ready(ready) = &mut self.state {
            ready.filter = None;
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Settings the tracker was built with
    #[must_use]
    pub const fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Name of the active smoother
    #[must_use]
    pub fn smoother_name(&self) -> &str {
        self.smoother.name()
    }

    /// Last published gaze target
    #[must_use]
    pub const fn published_target(&self) -> Option<Vector2<f64>> {
        self.state.published_target()
    }

    /// Smoother state
    #[must_use]
    pub const fn filter_state(&self) -> Option<&FilterState> {
        self.state.filter_state()
    }
}
