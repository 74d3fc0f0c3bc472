//! Gaze estimation replay tool.

use anyhow::{Context, Result};
use clap::Parser;
use gaze_estimation::{app::ReplayApp, cli::Args, config::Config, recording::RecordingReader};
use log::info;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path.display());
        Config::from_file(config_path)
            .with_context(|| format!("Failed to load config file {}", config_path.display()))?
    } else {
        Config::default()
    };
    args.apply_to(&mut config);

    if args.print_config {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    let Some(recording_path) = &args.recording else {
        anyhow::bail!("--recording is required");
    };
    info!("Replaying {}", recording_path.display());
    let reader = RecordingReader::open(recording_path)
        .with_context(|| format!("Failed to open recording {}", recording_path.display()))?;

    let output: Box<dyn Write> = match &args.output {
        Some(path) => {
            info!("Writing tick records to {}", path.display());
            Box::new(BufWriter::new(File::create(path)?))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    // Create and run application
    let mut app = ReplayApp::new(&config, output)?;
    app.run(reader)?.log();

    Ok(())
}
