//! Constants used throughout the gaze pipeline

/// Number of face mesh landmarks without iris refinement
pub const NUM_FACE_LANDMARKS: usize = 468;

/// Number of landmarks when iris refinement is enabled (mesh + 10 iris points)
pub const NUM_FACE_LANDMARKS_WITH_IRIS: usize = 478;

/// Landmark on the nose bridge between the eyes, used as the gaze ray origin
pub const ANCHOR_LANDMARK: usize = 168;

/// Horizontal extents of the right iris (subject's right)
pub const RIGHT_IRIS_EDGES: (usize, usize) = (469, 471);

/// Horizontal extents of the left iris (subject's left)
pub const LEFT_IRIS_EDGES: (usize, usize) = (474, 476);

/// Anatomical iris diameter, near-invariant across adults
pub const DEFAULT_IRIS_WIDTH_MM: f64 = 12.0;

/// Millimetres per inch, for screen diagonals
pub const MM_PER_INCH: f64 = 25.4;

/// Number of floats in a row-major 4×4 head-pose transform
pub const HEAD_POSE_TRANSFORM_LEN: usize = 16;

/// Default diagonal field of view of a typical webcam (80°)
pub const DEFAULT_DIAGONAL_FOV: f64 = 80.0 * std::f64::consts::PI / 180.0;

/// Kalman per-axis process variance
pub const DEFAULT_PROCESS_COVARIANCE: f64 = 0.005;

/// Kalman per-axis observation variance
pub const DEFAULT_OBSERVATION_COVARIANCE: f64 = 1.0;

/// Kalman prior variance before the first observation
pub const DEFAULT_INITIAL_COVARIANCE: f64 = 1e6;

/// Published targets in the fixation window
pub const DEFAULT_FIXATION_WINDOW: usize = 15;

/// Maximum per-axis standard deviation of a fixation, pixels
pub const DEFAULT_FIXATION_DISPERSION_PX: f64 = 25.0;

/// `|n·d|` below which a ray counts as parallel to a plane
pub const PARALLEL_EPSILON: f64 = 1e-9;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
