//! Configuration management for the gaze estimation replay tool

use crate::{
    camera::Resolution,
    constants::{
        DEFAULT_DIAGONAL_FOV, DEFAULT_FIXATION_DISPERSION_PX, DEFAULT_FIXATION_WINDOW, DEFAULT_INITIAL_COVARIANCE,
        DEFAULT_IRIS_WIDTH_MM, DEFAULT_OBSERVATION_COVARIANCE, DEFAULT_PROCESS_COVARIANCE,
    },
    filters::{create_smoother, GazeSmoother, KalmanSmoother, NoSmoother},
    fixation::FixationDetector,
    pipeline::TrackerSettings,
    screen::{ScreenGeometry, ScreenLayout},
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture device configuration
    pub camera: CameraConfig,

    /// Iris calibration
    pub iris: IrisConfig,

    /// Target screen
    pub screen: ScreenConfig,

    /// Temporal smoothing
    pub smoothing: SmoothingConfig,

    /// Fixation detection
    pub fixation: FixationConfig,
}

/// Capture device parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Diagonal field of view in degrees
    pub diagonal_fov_deg: f64,

    /// Capture resolution, if known before the first frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

/// Iris calibration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrisConfig {
    /// Anatomical iris width in millimetres
    pub width_mm: f64,
}

/// Screen description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Screen resolution in pixels
    pub resolution: Resolution,

    /// Physical size and placement relative to the camera
    pub geometry: ScreenGeometry,
}

/// Smoother configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Smoother type (`kalman`, `none`)
    pub kind: String,

    /// Kalman per-axis process variance
    pub process_covariance: f64,

    /// Kalman per-axis observation variance
    pub observation_covariance: f64,

    /// Kalman prior variance before the first observation
    pub initial_covariance: f64,
}

/// Fixation detection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixationConfig {
    /// Number of published targets in the window
    pub window_size: usize,

    /// Maximum per-axis standard deviation of a fixation, pixels
    pub dispersion_px: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            diagonal_fov_deg: DEFAULT_DIAGONAL_FOV.to_degrees(),
            resolution: None,
        }
    }
}

impl Default for IrisConfig {
    fn default() -> Self {
        Self {
            width_mm: DEFAULT_IRIS_WIDTH_MM,
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::new(1920, 1080),
            geometry: ScreenGeometry::default(),
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            kind: "kalman".to_string(),
            process_covariance: DEFAULT_PROCESS_COVARIANCE,
            observation_covariance: DEFAULT_OBSERVATION_COVARIANCE,
            initial_covariance: DEFAULT_INITIAL_COVARIANCE,
        }
    }
}

impl Default for FixationConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_FIXATION_WINDOW,
            dispersion_px: DEFAULT_FIXATION_DISPERSION_PX,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Create the configured smoother
    ///
    /// Unknown kinds fall through to [`create_smoother`], so parameterized
    /// names such as `kalman:0.01` also work.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown kinds or invalid parameters.
    pub fn create_smoother(&self) -> Result<Box<dyn GazeSmoother>> {
        let s = &self.smoothing;
        match s.kind.as_str() {
            "kalman" => {
                KalmanSmoother::validate(s.process_covariance, s.observation_covariance, s.initial_covariance)?;
                Ok(Box::new(KalmanSmoother::new(
                    s.process_covariance,
                    s.observation_covariance,
                    s.initial_covariance,
                )))
            }
            "none" => Ok(Box::new(NoSmoother)),
            name => create_smoother(name),
        }
    }

    /// Build the per-tick tracker settings
    ///
    /// # Errors
    ///
    /// Returns an error if the iris or screen configuration is invalid.
    pub fn tracker_settings(&self) -> Result<TrackerSettings> {
        TrackerSettings::new(
            self.camera.diagonal_fov_deg.to_radians(),
            self.iris.width_mm,
            self.screen.resolution,
            &self.screen.geometry,
        )
    }

    /// Build the configured fixation detector
    ///
    /// # Errors
    ///
    /// Returns an error for an empty window or a non-positive dispersion.
    pub fn fixation_detector(&self) -> Result<FixationDetector> {
        FixationDetector::new(self.fixation.window_size, self.fixation.dispersion_px)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns the first problem found as [`Error::ConfigError`].
    pub fn validate(&self) -> Result<()> {
        let config_error = |e: Error| Error::ConfigError(e.to_string());

        // Validate camera
        let fov = self.camera.diagonal_fov_deg;
        if !fov.is_finite() || fov <= 0.0 || fov >= 180.0 {
            return Err(Error::ConfigError(format!(
                "Diagonal FOV must be between 0 and 180 degrees, got {fov}"
            )));
        }
        if let Some(resolution) = self.camera.resolution {
            if !resolution.is_valid() {
                return Err(Error::ConfigError(format!(
                    "Camera resolution must be non-zero, got {resolution}"
                )));
            }
        }

        // Validate iris
        if !self.iris.width_mm.is_finite() || self.iris.width_mm <= 0.0 {
            return Err(Error::ConfigError(format!(
                "Iris width must be positive, got {} mm",
                self.iris.width_mm
            )));
        }

        // Validate screen
        ScreenLayout::from_geometry(&self.screen.geometry, self.screen.resolution).map_err(config_error)?;

        // Validate smoother
        self.create_smoother().map_err(config_error)?;

        // Validate fixation
        self.fixation_detector().map_err(config_error)?;

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Gaze Estimation Configuration

# Capture device
camera:
  diagonal_fov_deg: 80.0
  # Optional; normally announced by the recording
  # resolution:
  #   width: 1280
  #   height: 720

# Iris calibration
iris:
  width_mm: 12.0

# Target screen
screen:
  resolution:
    width: 1920
    height: 1080
  # Either a diagonal, with the camera centered on the top edge...
  geometry:
    diagonal_inches: 15.6
  # ...or the camera-space position of the top edge's -x corner and the
  # physical size
  # geometry:
  #   offset_mm:
  #     x: -172.0
  #     y: 0.0
  #   size_mm:
  #     width: 344.0
  #     height: 194.0

# Temporal smoothing
smoothing:
  kind: "kalman"
  process_covariance: 0.005
  observation_covariance: 1.0
  initial_covariance: 1000000.0

# Fixation detection
fixation:
  window_size: 15
  dispersion_px: 25.0
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::{OffsetMm, SizeMm};

    #[test]
    fn test_example_config_matches_defaults() {
        let config = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        assert!((config.camera.diagonal_fov_deg - 80.0).abs() < 1e-9);
        assert_eq!(config.screen.resolution, Resolution::new(1920, 1080));
        assert_eq!(config.smoothing, SmoothingConfig::default());
        assert_eq!(config.fixation, FixationConfig::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_yaml("iris:\n  width_mm: 11.5\n").unwrap();
        assert!((config.iris.width_mm - 11.5).abs() < f64::EPSILON);
        assert_eq!(config.smoothing.kind, "kalman");
        assert!(config.camera.resolution.is_none());
    }

    #[test]
    fn test_explicit_geometry_parses() {
        let yaml = "screen:\n  resolution: {width: 2560, height: 1440}\n  geometry:\n    offset_mm: {x: -300.0, y: 10.0}\n    size_mm: {width: 600.0, height: 340.0}\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(
            config.screen.geometry,
            ScreenGeometry::Explicit {
                offset_mm: OffsetMm { x: -300.0, y: 10.0 },
                size_mm: SizeMm {
                    width: 600.0,
                    height: 340.0
                },
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.camera.diagonal_fov_deg = 0.0;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let mut config = Config::default();
        config.iris.width_mm = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.screen.geometry = ScreenGeometry::Diagonal { diagonal_inches: 0.0 };
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.smoothing.observation_covariance = 0.0;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let mut config = Config::default();
        config.smoothing.kind = "median".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fixation.window_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_create_smoother() {
        let mut config = Config::default();
        assert_eq!(config.create_smoother().unwrap().name(), "KalmanSmoother");
        config.smoothing.kind = "none".to_string();
        assert_eq!(config.create_smoother().unwrap().name(), "NoSmoother");
        config.smoothing.kind = "kalman:0.01".to_string();
        assert_eq!(config.create_smoother().unwrap().name(), "KalmanSmoother");
    }

    #[test]
    fn test_file_round_trip() {
        let path = std::env::temp_dir().join(format!("gaze_config_{}.yaml", std::process::id()));
        let mut config = Config::default();
        config.camera.resolution = Some(Resolution::new(1280, 720));
        config.fixation.dispersion_px = 40.0;

        config.to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_tracker_settings() {
        let settings = Config::default().tracker_settings().unwrap();
        assert!((settings.diagonal_fov - DEFAULT_DIAGONAL_FOV).abs() < 1e-12);
        assert!((settings.iris.iris_width_mm() - 12.0).abs() < f64::EPSILON);
        assert_eq!(settings.screen.resolution(), Resolution::new(1920, 1080));
    }
}
