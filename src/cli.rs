//! Command-line interface of the replay binary.

use crate::{camera::Resolution, config::Config, screen::ScreenGeometry};
use clap::Parser;
use std::path::PathBuf;

/// Replay recorded face-landmark sessions through the gaze pipeline
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "gaze-estimation", author, version, about, long_about = None)]
pub struct Args {
    /// Recording to replay (JSON Lines)
    #[arg(short, long, value_name = "PATH", required_unless_present = "print_config")]
    pub recording: Option<PathBuf>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Camera diagonal field of view in degrees
    #[arg(long, value_name = "DEGREES")]
    pub fov_deg: Option<f64>,

    /// Anatomical iris width in millimetres
    #[arg(long, value_name = "MM")]
    pub iris_width: Option<f64>,

    /// Screen diagonal in inches (camera centered on the top edge)
    #[arg(long, value_name = "INCHES")]
    pub screen_diagonal: Option<f64>,

    /// Screen width in pixels
    #[arg(long, value_name = "PX")]
    pub screen_width: Option<u32>,

    /// Screen height in pixels
    #[arg(long, value_name = "PX")]
    pub screen_height: Option<u32>,

    /// Smoother type (kalman, kalman:<q>, kalman:<q>:<r>, none)
    #[arg(short, long, value_name = "TYPE")]
    pub smoother: Option<String>,

    /// Write per-tick records here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,

    /// Print the effective configuration as YAML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Args {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(fov) = self.fov_deg {
            config.camera.diagonal_fov_deg = fov;
        }
        if let Some(width) = self.iris_width {
            config.iris.width_mm = width;
        }
        if let Some(diagonal_inches) = self.screen_diagonal {
            config.screen.geometry = ScreenGeometry::Diagonal { diagonal_inches };
        }
        let current = config.screen.resolution;
        config.screen.resolution = Resolution::new(
            self.screen_width.unwrap_or(current.width),
            self.screen_height.unwrap_or(current.height),
        );
        if let Some(smoother) = &self.smoother {
            config.smoothing.kind.clone_from(smoother);
        }
    }
}
