//! Fixation detection over published gaze targets.
//!
//! A fixation is a run of targets whose spread stays within a small pixel
//! dispersion on both screen axes.

use crate::{
    constants::{DEFAULT_FIXATION_DISPERSION_PX, DEFAULT_FIXATION_WINDOW},
    utils::{is_finite2, safe_cast::usize_to_f64},
    Error, Result,
};
use nalgebra::Vector2;
use std::collections::VecDeque;

/// Statistical summary of a data window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    /// Mean value of the data
    pub mean: f64,
    /// Population standard deviation of the data
    pub std_dev: f64,
    /// Minimum value in the window
    pub min: f64,
    /// Maximum value in the window
    pub max: f64,
    /// Range (max - min) of the data
    pub range: f64,
}

impl Statistics {
    /// Summarize a slice of samples, `None` if it is empty
    #[must_use]
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        Self::from_values(samples.iter().copied(), samples.len())
    }

    fn from_values<I>(samples: I, len: usize) -> Option<Self>
    where
        I: Iterator<Item = f64> + Clone,
    {
        if len == 0 {
            return None;
        }
        let n = usize_to_f64(len);
        let mean = samples.clone().sum::<f64>() / n;
        let variance = samples.clone().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

        let min = samples.clone().fold(f64::INFINITY, f64::min);
        let max = samples.fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
            range: max - min,
        })
    }
}

/// Sliding-window fixation detector
#[derive(Debug, Clone)]
pub struct FixationDetector {
    window_size: usize,
    dispersion_px: f64,
    history: VecDeque<Vector2<f64>>,
}

impl FixationDetector {
    /// Create a detector over `window_size` targets
    ///
    /// # Errors
    ///
    /// Returns an error if the window is empty or the dispersion is not
    /// finite and positive.
    pub fn new(window_size: usize, dispersion_px: f64) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::InvalidInput("Fixation window must not be empty".to_string()));
        }
        if !dispersion_px.is_finite() || dispersion_px <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "Fixation dispersion must be positive, got {dispersion_px} px"
            )));
        }
        Ok(Self {
            window_size,
            dispersion_px,
            history: VecDeque::with_capacity(window_size),
        })
    }

    /// Number of targets considered
    #[must_use]
    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    /// Maximum per-axis standard deviation of a fixation, pixels
    #[must_use]
    pub const fn dispersion_px(&self) -> f64 {
        self.dispersion_px
    }

    /// Add a published target and report whether the gaze is fixating
    ///
    /// Non-finite targets are ignored.
    pub fn update(&mut self, target: Vector2<f64>) -> bool {
        if is_finite2(&target) {
            if self.history.len() >= self.window_size {
                self.history.pop_front();
            }
            self.history.push_back(target);
        }

        self.stats()
            .is_some_and(|(x, y)| x.std_dev <= self.dispersion_px && y.std_dev <= self.dispersion_px)
    }

    /// Per-axis statistics once the window is full
    #[must_use]
    pub fn stats(&self) -> Option<(Statistics, Statistics)> {
        if self.history.len() < self.window_size {
            return None;
        }
        let len = self.history.len();
        Some((
            Statistics::from_values(self.history.iter().map(|p| p.x), len)?,
            Statistics::from_values(self.history.iter().map(|p| p.y), len)?,
        ))
    }

    /// Forget all targets
    pub fn reset(&mut self) {
        self.history.clear();
    }
}

impl Default for FixationDetector {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_FIXATION_WINDOW,
            dispersion_px: DEFAULT_FIXATION_DISPERSION_PX,
            history: VecDeque::with_capacity(DEFAULT_FIXATION_WINDOW),
        }
    }
}
