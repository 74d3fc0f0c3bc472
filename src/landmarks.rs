//! Detector output and its projection into camera space.

use crate::{
    camera::Resolution,
    constants::{HEAD_POSE_TRANSFORM_LEN, NUM_FACE_LANDMARKS, NUM_FACE_LANDMARKS_WITH_IRIS},
    geometry::detector_to_camera,
    Error, Result,
};
use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};

/// One facial keypoint in detector-native normalized units
///
/// `x` and `y` are fractions of the frame width and height measured from the
/// top-left corner; `z` is relative depth scaled like `x`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, 0 at the left edge
    pub x: f32,
    /// Vertical position, 0 at the top edge
    pub y: f32,
    /// Relative depth, growing away from the camera
    pub z: f32,
}

impl Landmark {
    /// Create a new landmark
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Landmark {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Landmarks and optional head pose for a single detected face
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    landmarks: Vec<Landmark>,
    transform: Option<[f32; HEAD_POSE_TRANSFORM_LEN]>,
}

impl LandmarkFrame {
    /// Create a frame from detector output
    ///
    /// `transform` is the row-major 4×4 head-pose matrix, if the detector
    /// produced one.
    ///
    /// # Errors
    ///
    /// Returns an error if the landmark count is neither 468 nor 478.
    pub fn new(landmarks: Vec<Landmark>, transform: Option<[f32; HEAD_POSE_TRANSFORM_LEN]>) -> Result<Self> {
        if landmarks.len() != NUM_FACE_LANDMARKS && landmarks.len() != NUM_FACE_LANDMARKS_WITH_IRIS {
            return Err(Error::InvalidFrame(format!(
                "Expected {} or {} landmarks, got {}",
                NUM_FACE_LANDMARKS,
                NUM_FACE_LANDMARKS_WITH_IRIS,
                landmarks.len()
            )));
        }
        Ok(Self { landmarks, transform })
    }

    /// Create a frame from a transform given as a slice
    ///
    /// # Errors
    ///
    /// Returns an error if the landmark count is invalid or the transform
    /// does not hold exactly 16 values.
    pub fn from_parts(landmarks: Vec<Landmark>, transform: Option<&[f32]>) -> Result<Self> {
        let transform = transform
            .map(|values| {
                <[f32; HEAD_POSE_TRANSFORM_LEN]>::try_from(values).map_err(|_| {
                    Error::InvalidFrame(format!(
                        "Expected {} transform values, got {}",
                        HEAD_POSE_TRANSFORM_LEN,
                        values.len()
                    ))
                })
            })
            .transpose()?;
        Self::new(landmarks, transform)
    }

    /// Raw landmarks, in detector order
    #[must_use]
    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Number of landmarks
    #[must_use]
    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    /// Always false for a validated frame
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// True if the detector ran with iris refinement
    #[must_use]
    pub fn has_iris(&self) -> bool {
        self.landmarks.len() == NUM_FACE_LANDMARKS_WITH_IRIS
    }

    /// Raw row-major head-pose values
    #[must_use]
    pub const fn transform(&self) -> Option<&[f32; HEAD_POSE_TRANSFORM_LEN]> {
        self.transform.as_ref()
    }

    /// Head-pose transform as a matrix
    #[must_use]
    pub fn transform_matrix(&self) -> Option<Matrix4<f64>> {
        self.transform.map(|values| {
            let values: Vec<f64> = values.iter().map(|&v| f64::from(v)).collect();
            Matrix4::from_row_slice(&values)
        })
    }
}

/// Landmarks projected into camera space, in pixel units
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloud {
    points: Vec<Vector3<f64>>,
}

impl PointCloud {
    /// Projected points, index-aligned with the detector's landmarks
    #[must_use]
    pub fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    /// Point at a landmark index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Vector3<f64>> {
        self.points.get(index)
    }

    /// Number of points
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the cloud holds no points
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Vec<Vector3<f64>>> for PointCloud {
    fn from(points: Vec<Vector3<f64>>) -> Self {
        Self { points }
    }
}

/// Maps normalized detector coordinates into camera space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkProjector {
    width: f64,
    height: f64,
}

impl LandmarkProjector {
    /// Create a projector for the given frame resolution
    #[must_use]
    pub fn new(resolution: Resolution) -> Self {
        Self {
            width: resolution.width_f64(),
            height: resolution.height_f64(),
        }
    }

    /// Project a single landmark
    ///
    /// The point is recentered on the optical axis, scaled to pixels (depth
    /// uses the frame width like the detector does) and then converted to
    /// camera space.
    #[must_use]
    pub fn project_point(&self, landmark: &Landmark) -> Vector3<f64> {
        let image = Vector3::new(
            (f64::from(landmark.x) - 0.5) * self.width,
            (f64::from(landmark.y) - 0.5) * self.height,
            f64::from(landmark.z) * self.width,
        );
        detector_to_camera(image)
    }

    /// Project every landmark, preserving count and order
    #[must_use]
    pub fn project(&self, landmarks: &[Landmark]) -> PointCloud {
        PointCloud {
            points: landmarks.iter().map(|l| self.project_point(l)).collect(),
        }
    }
}
