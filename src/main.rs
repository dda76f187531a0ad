// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use qrscan::config::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "qrscan")]
#[command(about = "Headless QR-code scanning service")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the host bridge over stdio (the default)
    Run {
        /// Camera index to use (from 'qrscan list')
        #[arg(short, long)]
        camera: Option<usize>,
    },

    /// List available cameras
    List,

    /// Decode a QR code from an image file
    Scan {
        /// Input image path
        input: PathBuf,

        /// Write an annotated copy to this path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write an annotated copy to a timestamped default path
        #[arg(long)]
        annotate: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;

    // Initialize logging
    // RUST_LOG overrides the configured level
    // Examples: RUST_LOG=debug, RUST_LOG=qrscan=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.logging.level.clone())
            }),
        )
        .with_target(true)
        .with_level(true)
        .init();

    match cli.command {
        Some(Commands::Run { camera }) => cli::run_bridge(&config, camera)?,
        Some(Commands::List) => cli::list_cameras()?,
        Some(Commands::Scan {
            input,
            output,
            annotate,
        }) => cli::scan_image(&input, output, annotate, &config)?,
        None => cli::run_bridge(&config, None)?,
    }

    Ok(())
}
