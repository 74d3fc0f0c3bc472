//! Replay application: drives recorded detector output through the tracker.

use crate::{
    config::Config,
    error::{Result, SkipReason},
    fixation::FixationDetector,
    pipeline::{GazeTracker, TickReport},
    recording::{RecordedEvent, RecordingReader},
    utils::safe_cast::usize_to_f64,
    Error,
};
use log::{debug, info};
use nalgebra::Vector2;
use serde::Serialize;
use std::{
    collections::HashMap,
    io::{BufRead, Write},
};

/// One output line per tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickRecord {
    /// 0-based tick index
    pub tick: usize,
    /// `smoothed` or the skip reason
    pub outcome: &'static str,
    /// Published target in screen pixels
    pub target: Option<[f64; 2]>,
    /// Published target clamped to the screen
    pub pixel: Option<[i32; 2]>,
    /// Unsmoothed target
    pub raw_target: Option<[f64; 2]>,
    /// Iris scale ratio, pixels per millimetre
    pub scale_ratio: Option<f64>,
    /// Whether the gaze is in a fixation
    pub fixating: bool,
}

/// Aggregate statistics of a replay
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaySummary {
    /// Ticks processed
    pub ticks: usize,
    /// Ticks that published a new target
    pub smoothed: usize,
    /// Ticks flagged as fixating
    pub fixating: usize,
    /// Resolution events applied
    pub resolution_events: usize,
    skips: HashMap<SkipReason, usize>,
    raw_motion: Motion,
    smoothed_motion: Motion,
}

/// Mean distance between consecutive targets
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Motion {
    last: Option<Vector2<f64>>,
    total: f64,
    steps: usize,
}

impl Motion {
    fn push(&mut self, target: Vector2<f64>) {
        if let Some(last) = self.last {
            self.total += (target - last).norm();
            self.steps += 1;
        }
        self.last = Some(target);
    }

    fn mean(&self) -> Option<f64> {
        (self.steps > 0).then(|| self.total / usize_to_f64(self.steps))
    }
}

impl ReplaySummary {
    /// Number of ticks skipped for `reason`
    #[must_use]
    pub fn skip_count(&self, reason: SkipReason) -> usize {
        self.skips.get(&reason).copied().unwrap_or(0)
    }

    /// Total skipped ticks
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skips.values().sum()
    }

    /// Share of ticks spent fixating
    #[must_use]
    pub fn fixation_ratio(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        usize_to_f64(self.fixating) / usize_to_f64(self.ticks)
    }

    /// Mean tick-to-tick movement of the raw target, pixels
    #[must_use]
    pub fn raw_jitter_px(&self) -> Option<f64> {
        self.raw_motion.mean()
    }

    /// Mean tick-to-tick movement of the published target, pixels
    #[must_use]
    pub fn smoothed_jitter_px(&self) -> Option<f64> {
        self.smoothed_motion.mean()
    }

    fn record(&mut self, report: &TickReport, fixating: bool) {
        self.ticks += 1;
        if fixating {
            self.fixating += 1;
        }
        match report.skip_reason() {
            Some(reason) => *self.skips.entry(reason).or_insert(0) += 1,
            None => {
                self.smoothed += 1;
                if let Some(raw) = report.raw_target {
                    self.raw_motion.push(raw);
                }
                if let Some(target) = report.target {
                    self.smoothed_motion.push(target);
                }
            }
        }
    }

    /// Log the summary at info level
    pub fn log(&self) {
        info!(
            "Replayed {} ticks: {} smoothed, {} skipped",
            self.ticks,
            self.smoothed,
            self.skipped()
        );
        for reason in SkipReason::ALL {
            let count = self.skip_count(reason);
            if count > 0 {
                info!("  {reason}: {count}");
            }
        }
        info!("Fixating {:.1}% of ticks", self.fixation_ratio() * 100.0);
        if let (Some(raw), Some(smoothed)) = (self.raw_jitter_px(), self.smoothed_jitter_px()) {
            info!("Jitter: raw {raw:.2} px/tick, smoothed {smoothed:.2} px/tick");
        }
    }
}

/// Main application struct
pub struct ReplayApp<W: Write> {
    tracker: GazeTracker,
    fixation: FixationDetector,
    fixating: bool,
    output: W,
    summary: ReplaySummary,
}

impl<W: Write> ReplayApp<W> {
    /// Create a replay application writing tick records to `output`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: &Config, output: W) -> Result<Self> {
        info!("Initializing gaze replay");
        config.validate()?;

        let smoother = config.create_smoother()?;
        info!("Using {} smoother", smoother.name());
        let mut tracker = GazeTracker::new(config.tracker_settings()?, smoother);
        if let Some(resolution) = config.camera.resolution {
            tracker.set_resolution(resolution)?;
        }

        Ok(Self {
            tracker,
            fixation: config.fixation_detector()?,
            fixating: false,
            output,
            summary: ReplaySummary::default(),
        })
    }

    /// Apply one recorded event, returning the tick report if it was a tick
    ///
    /// # Errors
    ///
    /// Returns an error if a resolution event is invalid or the output
    /// cannot be written.
    pub fn process_event(&mut self, event: &RecordedEvent) -> Result<Option<TickReport>> {
        if let Some(resolution) = event.resolution {
            self.tracker.set_resolution(resolution).map_err(|e| Error::Recording {
                line: event.line,
                message: e.to_string(),
            })?;
            self.summary.resolution_events += 1;
        }
        if !event.is_tick {
            return Ok(None);
        }

        let report = self.tracker.tick(event.frame.as_ref());
        if let (true, Some(target)) = (report.is_smoothed(), report.target) {
            self.fixating = self.fixation.update(target);
        }

        let record = TickRecord {
            tick: self.summary.ticks,
            outcome: report.outcome.as_str(),
            target: report.target.map(|t| [t.x, t.y]),
            pixel: report
                .target
                .and_then(|t| self.tracker.settings().screen.to_pixel(&t))
                .map(|(x, y)| [x, y]),
            raw_target: report.raw_target.map(|t| [t.x, t.y]),
            scale_ratio: report.scale_ratio,
            fixating: self.fixating,
        };
        serde_json::to_writer(&mut self.output, &record)?;
        self.output.write_all(b"\n")?;

        self.summary.record(&report, self.fixating);
        Ok(Some(report))
    }

    /// Replay a whole recording
    ///
    /// # Errors
    ///
    /// Stops at the first corrupt line or write failure.
    pub fn run<R: BufRead>(&mut self, reader: RecordingReader<R>) -> Result<&ReplaySummary> {
        info!("Starting replay");
        for event in reader {
            let event = event?;
            if let Some(report) = self.process_event(&event)? {
                if let Some(target) = report.target.filter(|_| report.is_smoothed()) {
                    debug!("Line {}: target ({:.1}, {:.1})", event.line, target.x, target.y);
                }
            }
        }
        self.output.flush()?;
        info!("Replay finished");
        Ok(&self.summary)
    }

    /// Statistics so far
    #[must_use]
    pub const fn summary(&self) -> &ReplaySummary {
        &self.summary
    }

    /// The underlying tracker
    #[must_use]
    pub const fn tracker(&self) -> &GazeTracker {
        &self.tracker
    }

    /// Consume the app and return its output sink
    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Resolution;

    fn event(line: usize, resolution: Option<Resolution>, is_tick: bool) -> RecordedEvent {
        RecordedEvent {
            line,
            resolution,
            is_tick,
            frame: None,
        }
    }

    #[test]
    fn test_ticks_before_resolution_are_camera_not_ready() {
        let mut app = ReplayApp::new(&Config::default(), Vec::new()).unwrap();
        let report = app.process_event(&event(1, None, true)).unwrap().unwrap();
        assert_eq!(report.skip_reason(), Some(SkipReason::CameraNotReady));
        assert_eq!(app.summary().skip_count(SkipReason::CameraNotReady), 1);
    }

    #[test]
    fn test_resolution_event_is_not_a_tick() {
        let mut app = ReplayApp::new(&Config::default(), Vec::new()).unwrap();
        let result = app
            .process_event(&event(1, Some(Resolution::new(640, 480)), false))
            .unwrap();
        assert!(result.is_none());
        assert!(app.tracker().state().is_ready());
        assert_eq!(app.summary().ticks, 0);
        assert_eq!(app.summary().resolution_events, 1);
        assert!(app.into_output().is_empty());
    }

    #[test]
    fn test_invalid_resolution_reports_line() {
        let mut app = ReplayApp::new(&Config::default(), Vec::new()).unwrap();
        let err = app
            .process_event(&event(7, Some(Resolution::new(0, 480)), false))
            .unwrap_err();
        assert!(matches!(err, Error::Recording { line: 7, .. }));
    }

    #[test]
    fn test_record_line_for_missing_face() {
        let mut config = Config::default();
        config.camera.resolution = Some(Resolution::new(640, 480));
        let mut app = ReplayApp::new(&config, Vec::new()).unwrap();
        app.process_event(&event(1, None, true)).unwrap();

        let output = String::from_utf8(app.into_output()).unwrap();
        let value: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["tick"], 0);
        assert_eq!(value["outcome"], "missing_face");
        assert!(value["target"].is_null());
        assert_eq!(value["fixating"], false);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.iris.width_mm = 0.0;
        assert!(ReplayApp::new(&config, Vec::new()).is_err());
    }

    #[test]
    fn test_motion_mean() {
        let mut motion = Motion::default();
        assert!(motion.mean().is_none());
        motion.push(Vector2::new(0.0, 0.0));
        motion.push(Vector2::new(3.0, 4.0));
        motion.push(Vector2::new(3.0, 4.0));
        assert_eq!(motion.mean(), Some(2.5));
    }
}
