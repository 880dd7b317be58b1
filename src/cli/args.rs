//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// Parse and validate a value in 0.0-1.0 (opacity, confidence)
fn parse_unit(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("Value must be between 0.0 and 1.0, got {}", value));
    }
    Ok(value)
}

/// Parse and validate sampling rate (1-60 fps)
fn parse_fps(s: &str) -> Result<u32, String> {
    let fps: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid frame rate", s))?;
    if !(1..=60).contains(&fps) {
        return Err(format!("Frame rate must be between 1 and 60 fps, got {}", fps));
    }
    Ok(fps)
}

/// Pose-driven virtual try-on session runner
#[derive(Parser, Debug)]
#[command(name = "virtual-tryon")]
#[command(version, about = "Pose-driven virtual try-on session", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Replay recorded frames against a local detection service
    virtual-tryon run --server 127.0.0.1:5001 --frames ./frames

    # Try on catalog item 2 and save the final overlay
    virtual-tryon run -f ./frames --garment 2 --tryon --snapshot overlay.png

    # Browse the catalog
    virtual-tryon featured
    virtual-tryon item 3")]
pub struct Args {
    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a try-on session, replaying a directory of frames as the camera
    Run(RunArgs),
    /// List featured catalog items
    Featured {
        /// Storefront API base URL
        #[arg(long)]
        api: Option<String>,
    },
    /// Show one catalog item
    Item {
        /// Catalog item id
        id: u64,
        /// Storefront API base URL
        #[arg(long)]
        api: Option<String>,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Detection service address (host:port)
    #[arg(long, short)]
    pub server: Option<String>,

    /// Directory of JPEG/PNG frames replayed as the camera
    #[arg(long, short)]
    pub frames: PathBuf,

    /// Catalog item to select once measurements arrive
    #[arg(long, short)]
    pub garment: Option<u64>,

    /// Do not request size estimates
    #[arg(long)]
    pub no_estimate: bool,

    /// Request try-on composites for the selected garment
    #[arg(long)]
    pub tryon: bool,

    /// Try-on composite opacity (0.0-1.0)
    #[arg(long, value_parser = parse_unit)]
    pub opacity: Option<f32>,

    /// Detection confidence threshold (0.0-1.0)
    #[arg(long, value_parser = parse_unit)]
    pub threshold: Option<f32>,

    /// Sampling rate in frames per second
    #[arg(long, value_parser = parse_fps)]
    pub fps: Option<u32>,

    /// Preferred fit sent with size estimates (e.g. slim, regular, loose)
    #[arg(long)]
    pub fit: Option<String>,

    /// Write the overlay to this PNG when the session ends
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<u64>,
}

impl RunArgs {
    /// Merge flags over a loaded config: CLI > environment > file > defaults.
    pub fn apply(&self, config: &mut Config) {
        if let Some(server) = &self.server {
            config.channel.address = server.clone();
        }
        if self.no_estimate {
            config.estimation.enabled = false;
        }
        if self.tryon {
            config.tryon.enabled = true;
        }
        if let Some(opacity) = self.opacity {
            config.tryon.opacity = opacity;
        }
        if let Some(threshold) = self.threshold {
            config.capture.confidence_threshold = threshold;
        }
        if let Some(fps) = self.fps {
            config.capture.sample_rate_hz = fps;
        }
        if let Some(fit) = &self.fit {
            config.estimation.preferred_fit = fit.clone();
        }
    }
}
