//! facewatch — watch a camera stream, recognize enrolled faces, and save a
//! snapshot whenever someone new enters the picture.

mod config;
mod monitor;
mod pipeline;
mod references;
mod snapshot;
mod tracker;

#[cfg(test)]
mod testutil;

use anyhow::{Context, Result};
use clap::Parser;
use facewatch_core::OnnxFaceAnalyzer;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "facewatch", version, about = "Face-recognizing camera monitor")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "facewatch.toml")]
    config: PathBuf,

    /// Override the video source from the config file.
    #[arg(long)]
    source: Option<String>,

    /// Override the snapshot output directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let mut config = config::Config::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    if let Some(source) = cli.source {
        config.source = source;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    config.validate()?;

    let headless = config::headless_from_env();
    if headless {
        tracing::info!("headless mode, preview window disabled");
    }

    let mut analyzer = OnnxFaceAnalyzer::load(&config.model_dir)
        .with_context(|| format!("failed to load models from {}", config.model_dir.display()))?;
    let references = references::load_references(&config.reference_entries(), &mut analyzer);

    monitor::run(&config, &mut analyzer, &references, headless)
}
