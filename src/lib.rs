//! Gaze estimation library: screen gaze targets from facial landmarks.
//!
//! The library consumes the output of an external face-mesh detector (468 or
//! 478 normalized landmarks plus a 4×4 head-pose transform) and turns it into
//! a smoothed point on a physical screen:
//!
//! 1. Landmarks are projected into camera space
//! 2. A ray is cast from the nose bridge along the head's forward axis
//! 3. The ray is intersected with the camera's focal plane
//! 4. The apparent iris width gives a pixels-per-millimetre scale
//! 5. The intersection is mapped onto the screen's pixel grid
//! 6. A constant-position Kalman filter smooths the target
//!
//! Ticks that cannot produce a target are skipped with a [`SkipReason`] and
//! the last published target stands.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use gaze_estimation::{
//!     camera::Resolution,
//!     filters::create_smoother,
//!     landmarks::{Landmark, LandmarkFrame},
//!     pipeline::{GazeTracker, TrackerSettings},
//!     screen::ScreenGeometry,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = TrackerSettings::new(
//!     80f64.to_radians(),
//!     12.0,
//!     Resolution::new(1920, 1080),
//!     &ScreenGeometry::Diagonal { diagonal_inches: 15.6 },
//! )?;
//! let mut tracker = GazeTracker::new(settings, create_smoother("kalman")?);
//!
//! // Once the capture device reports its resolution
//! tracker.set_resolution(Resolution::new(1280, 720))?;
//!
//! // Every frame
//! # let landmarks = vec![Landmark::default(); 478];
//! # let transform = [0.0f32; 16];
//! let frame = LandmarkFrame::new(landmarks, Some(transform))?;
//! let report = tracker.tick(Some(&frame));
//! if let Some(target) = report.target {
//!     println!("Gaze at ({:.0}, {:.0})", target.x, target.y);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Replaying a Recording
//!
//! ```no_run
//! use gaze_estimation::{app::ReplayApp, config::Config, recording::RecordingReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_file("gaze.yaml")?;
//! let mut app = ReplayApp::new(&config, std::io::stdout())?;
//! let summary = app.run(RecordingReader::open("session.jsonl")?)?;
//! println!("{} of {} ticks smoothed", summary.smoothed, summary.ticks);
//! # Ok(())
//! # }
//! ```
//!
//! ## Fixation Detection
//!
//! ```no_run
//! use gaze_estimation::fixation::FixationDetector;
//! use nalgebra::Vector2;
//!
//! # fn main() {
//! let mut detector = FixationDetector::default();
//!
//! let fixating = detector.update(Vector2::new(960.0, 540.0));
//!
//! if let Some((x, y)) = detector.stats() {
//!     println!("Spread: {:.1} x {:.1} px", x.std_dev, y.std_dev);
//! }
//! # let _ = fixating;
//! # }
//! ```

/// Constants used throughout the pipeline
pub mod constants;

/// Error types and result handling
pub mod error;

/// Rays, planes and the camera-space convention
pub mod geometry;

/// Capture device model and focal plane
pub mod camera;

/// Detector output and projection into camera space
pub mod landmarks;

/// Gaze ray from the head-pose transform
pub mod head_pose;

/// Iris-based distance calibration
pub mod iris;

/// Screen geometry and pixel mapping
pub mod screen;

/// Temporal smoothing of gaze targets
pub mod filters;

/// Per-tick state machine
pub mod pipeline;

/// Fixation detection over published targets
pub mod fixation;

/// JSON Lines recordings of detector output
pub mod recording;

/// Numeric helpers
pub mod utils;

/// Configuration management
pub mod config;

/// Command-line arguments
pub mod cli;

/// Replay application
pub mod app;

pub use error::{Error, Result, SkipReason};
