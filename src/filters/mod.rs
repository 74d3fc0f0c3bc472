//! Temporal smoothing of the mapped gaze target.
//!
//! Smoothers are pure transitions: given the previous [`FilterState`] (or
//! none before the first observation) and a new observation, they return the
//! next state. Nothing is remembered between calls, so a recorded sequence of
//! observations can be replayed exactly.

/// Constant-position Kalman filter
pub mod kalman;

use crate::{utils::is_finite2, Error, Result};
use nalgebra::{Matrix2, Vector2};

pub use kalman::KalmanSmoother;

/// Estimator state carried across ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    /// Estimated target in screen pixels
    pub mean: Vector2<f64>,
    /// Estimate covariance
    pub covariance: Matrix2<f64>,
}

impl FilterState {
    /// Create a state from a mean and covariance
    #[must_use]
    pub const fn new(mean: Vector2<f64>, covariance: Matrix2<f64>) -> Self {
        Self { mean, covariance }
    }
}

/// Trait for all gaze target smoothers
pub trait GazeSmoother: Send + Sync {
    /// Advance the estimate by one valid observation
    fn step(&self, previous: Option<&FilterState>, observation: Vector2<f64>) -> FilterState;

    /// Get smoother name
    fn name(&self) -> &str;
}

/// Pass-through smoother that publishes raw observations
pub struct NoSmoother;

impl GazeSmoother for NoSmoother {
    fn step(&self, _previous: Option<&FilterState>, observation: Vector2<f64>) -> FilterState {
        FilterState::new(observation, Matrix2::zeros())
    }

    fn name(&self) -> &str {
        "NoSmoother"
    }
}

/// Create a smoother by type name
///
/// Accepts `none`, `kalman`, `kalman:<process>` and
/// `kalman:<process>:<observation>`.
///
/// # Errors
///
/// Returns an error for unknown names or invalid parameters.
pub fn create_smoother(smoother_type: &str) -> Result<Box<dyn GazeSmoother>> {
    let mut parts = smoother_type.split(':');
    let name = parts.next().unwrap_or_default().trim().to_lowercase();
    let params = parts
        .map(|p| {
            p.trim()
                .parse::<f64>()
                .map_err(|e| Error::FilterError(format!("Invalid parameter '{p}' for {name}: {e}")))
        })
        .collect::<Result<Vec<f64>>>()?;

    match (name.as_str(), params.as_slice()) {
        ("none" | "nosmoother" | "raw", []) => Ok(Box::new(NoSmoother)),
        ("kalman", []) => Ok(Box::new(KalmanSmoother::default())),
        ("kalman", &[process]) => kalman_with(process, crate::constants::DEFAULT_OBSERVATION_COVARIANCE),
        ("kalman", &[process, observation]) => kalman_with(process, observation),
        ("none" | "nosmoother" | "raw" | "kalman", _) => Err(Error::FilterError(format!(
            "Too many parameters for {name}: {smoother_type}"
        ))),
        _ => Err(Error::FilterError(format!("Unknown smoother type: {smoother_type}"))),
    }
}

fn kalman_with(process: f64, observation: f64) -> Result<Box<dyn GazeSmoother>> {
    KalmanSmoother::validate(process, observation, crate::constants::DEFAULT_INITIAL_COVARIANCE)?;
    Ok(Box::new(KalmanSmoother::new(
        process,
        observation,
        crate::constants::DEFAULT_INITIAL_COVARIANCE,
    )))
}

/// Run a recorded observation sequence through a smoother
///
/// `None` entries are skipped ticks: the state is left untouched and the
/// previous output repeats. Returns the published output after every tick.
pub fn replay_observations(
    smoother: &dyn GazeSmoother,
    observations: &[Option<Vector2<f64>>],
) -> Vec<Option<Vector2<f64>>> {
    let mut state: Option<FilterState> = None;
    observations
        .iter()
        .map(|observation| {
            if let Some(observation) = observation.filter(is_finite2) {
                state = Some(smoother.step(state.as_ref(), observation));
            }
            state.map(|s| s.mean)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_smoother() {
        let smoother = NoSmoother;
        let state = smoother.step(None, Vector2::new(10.0, 20.0));
        assert_eq!(state.mean, Vector2::new(10.0, 20.0));
    }

    #[test]
    fn test_create_smoother() {
        assert!(create_smoother("none").is_ok());
        assert!(create_smoother("kalman").is_ok());
        assert!(create_smoother("Kalman:0.01").is_ok());
        assert!(create_smoother("kalman:0.01:2.0").is_ok());
        assert_eq!(create_smoother("kalman").unwrap().name(), "KalmanSmoother");
        assert!(create_smoother("unknown").is_err());
        assert!(create_smoother("kalman:abc").is_err());
        assert!(create_smoother("kalman:-1").is_err());
        assert!(create_smoother("kalman:0.1:0").is_err());
        assert!(create_smoother("kalman:1:2:3").is_err());
        assert!(create_smoother("none:1").is_err());
    }

    #[test]
    fn test_replay_holds_output_on_skipped_ticks() {
        let smoother = NoSmoother;
        let outputs = replay_observations(
            &smoother,
            &[
                None,
                Some(Vector2::new(1.0, 2.0)),
                None,
                Some(Vector2::new(f64::NAN, 0.0)),
                Some(Vector2::new(3.0, 4.0)),
            ],
        );
        assert_eq!(
            outputs,
            vec![
                None,
                Some(Vector2::new(1.0, 2.0)),
                Some(Vector2::new(1.0, 2.0)),
                Some(Vector2::new(1.0, 2.0)),
                Some(Vector2::new(3.0, 4.0)),
            ]
        );
    }
}
