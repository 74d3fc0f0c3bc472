//! Error types for the gaze estimation library.
//!
//! [`Error`] covers setup and I/O failures that are surfaced to the caller.
//! Per-tick problems are never errors: they are reported as a [`SkipReason`]
//! and the pipeline keeps its previous output.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Landmark frame does not match the detector contract
    #[error("Invalid landmark frame: {0}")]
    InvalidFrame(String),

    /// Smoother initialization error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Corrupt line in a recorded session
    #[error("Recording error at line {line}: {message}")]
    Recording {
        /// 1-based line number in the recording
        line: usize,
        /// What was wrong with the line
        message: String,
    },
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Why a tick produced no new gaze target.
///
/// None of these are fatal; the previously published target is retained.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Tick arrived before the capture resolution was known
    #[error("camera not initialized")]
    CameraNotReady,

    /// Detector returned no landmarks
    #[error("no face detected")]
    MissingFace,

    /// Landmarks arrived without a head-pose transform
    #[error("no head-pose transform")]
    MissingHeadPose,

    /// Ray is parallel to the focal plane, points away from it, or is not finite
    #[error("degenerate gaze ray")]
    DegenerateRay,

    /// Iris landmarks missing or degenerate
    #[error("invalid iris calibration")]
    InvalidCalibration,

    /// A non-finite value reached the screen mapping stage
    #[error("invalid screen observation")]
    InvalidObservation,
}

impl SkipReason {
    /// All skip reasons, in pipeline order
    pub const ALL: [Self; 6] = [
        Self::CameraNotReady,
        Self::MissingFace,
        Self::MissingHeadPose,
        Self::DegenerateRay,
        Self::InvalidCalibration,
        Self::InvalidObservation,
    ];

    /// Stable snake_case name used in replay output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CameraNotReady => "camera_not_ready",
            Self::MissingFace => "missing_face",
            Self::MissingHeadPose => "missing_head_pose",
            Self::DegenerateRay => "degenerate_ray",
            Self::InvalidCalibration => "invalid_calibration",
            Self::InvalidObservation => "invalid_observation",
        }
    }
}
