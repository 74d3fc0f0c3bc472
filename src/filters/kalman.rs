use super::{FilterState, GazeSmoother};
use crate::{
    constants::{DEFAULT_INITIAL_COVARIANCE, DEFAULT_OBSERVATION_COVARIANCE, DEFAULT_PROCESS_COVARIANCE},
    Error, Result,
};
use nalgebra::{Matrix2, Vector2};

/// Constant-position Kalman filter for the 2D screen target
///
/// The true target is assumed to stay put between ticks apart from a small
/// process noise, and the observation is the target itself.
pub struct KalmanSmoother {
    // Process noise
    process_noise: Matrix2<f64>,
    // Measurement noise
    measurement_noise: Matrix2<f64>,
    // Prior used before the first observation
    initial_covariance: Matrix2<f64>,
}

impl KalmanSmoother {
    /// Create a smoother from per-axis process, observation and prior variances
    ///
    /// # Panics
    ///
    /// Panics if any variance is not finite, or if the observation or prior
    /// variance is not positive.
    pub fn new(process_covariance: f64, observation_covariance: f64, initial_covariance: f64) -> Self {
        assert!(
            process_covariance.is_finite() && process_covariance >= 0.0,
            "Process covariance must be non-negative"
        );
        assert!(
            observation_covariance.is_finite() && observation_covariance > 0.0,
            "Observation covariance must be positive"
        );
        assert!(
            initial_covariance.is_finite() && initial_covariance > 0.0,
            "Initial covariance must be positive"
        );

        Self {
            process_noise: Matrix2::identity() * process_covariance,
            measurement_noise: Matrix2::identity() * observation_covariance,
            initial_covariance: Matrix2::identity() * initial_covariance,
        }
    }

    /// Check parameters without panicking
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid parameter.
    pub fn validate(process_covariance: f64, observation_covariance: f64, initial_covariance: f64) -> Result<()> {
        if !process_covariance.is_finite() || process_covariance < 0.0 {
            return Err(Error::FilterError(format!(
                "Process covariance must be non-negative, got {process_covariance}"
            )));
        }
        if !observation_covariance.is_finite() || observation_covariance <= 0.0 {
            return Err(Error::FilterError(format!(
                "Observation covariance must be positive, got {observation_covariance}"
            )));
        }
        if !initial_covariance.is_finite() || initial_covariance <= 0.0 {
            return Err(Error::FilterError(format!(
                "Initial covariance must be positive, got {initial_covariance}"
            )));
        }
        Ok(())
    }

    /// State assumed before the first observation
    #[must_use]
    pub fn prior(&self) -> FilterState {
        FilterState::new(Vector2::zeros(), self.initial_covariance)
    }

    /// Constant-position prediction: same mean, grown covariance
    #[must_use]
    pub fn predict(&self, state: &FilterState) -> FilterState {
        FilterState::new(state.mean, state.covariance + self.process_noise)
    }

    /// Correct a predicted state with an observation
    ///
    /// A singular innovation covariance leaves the prediction unchanged.
    #[must_use]
    pub fn correct(&self, predicted: &FilterState, observation: Vector2<f64>) -> FilterState {
        // Innovation
        let innovation = observation - predicted.mean;

        // Innovation covariance
        let innovation_cov = predicted.covariance + self.measurement_noise;
        let Some(innovation_inv) = innovation_cov.try_inverse() else {
            return *predicted;
        };

        // Kalman gain
        let gain = predicted.covariance * innovation_inv;

        FilterState::new(
            predicted.mean + gain * innovation,
            (Matrix2::identity() - gain) * predicted.covariance,
        )
    }
}

impl Default for KalmanSmoother {
    fn default() -> Self {
        Self::new(
            DEFAULT_PROCESS_COVARIANCE,
            DEFAULT_OBSERVATION_COVARIANCE,
            DEFAULT_INITIAL_COVARIANCE,
        )
    }
}

impl GazeSmoother for KalmanSmoother {
    fn step(&self, previous: Option<&FilterState>, observation: Vector2<f64>) -> FilterState {
        let prior = previous.copied().unwrap_or_else(|| self.prior());
        let predicted = self.predict(&prior);
        self.correct(&predicted, observation)
    }

    fn name(&self) -> &str {
        "KalmanSmoother"
    }
}
