//! Slidecast CLI: command-line interface for rendering slideshow videos.
//!
//! Usage:
//!   slidecast                    Render ./video_data.json into ./output/
//!   slidecast render [OPTIONS]   Render a job file
//!   slidecast validate [PATH]    Validate a job file without encoding
//!   slidecast check              Check that the encoder is installed

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use slidecast_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "slidecast",
    about = "Assemble slideshow videos from embedded images and an audio track",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a job file to video (the default)
    Render {
        /// Job file (defaults to video_data.json)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (defaults to output/)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Validate a job file without encoding
    Validate {
        /// Job file (defaults to video_data.json)
        path: Option<PathBuf>,
    },

    /// Check that the encoder is available
    Check,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    slidecast_common::logging::init_logging(&config.logging);
    tracing::debug!(
        config_file = %slidecast_common::config::config_file_path().display(),
        input = %config.input_path.display(),
        output_dir = %config.output_dir.display(),
        encoder = %config.encoder.binary,
        "Configuration resolved"
    );

    let command = cli.command.unwrap_or(Commands::Render {
        input: None,
        output_dir: None,
    });

    match command {
        Commands::Render { input, output_dir } => commands::render::run(&config, input, output_dir),
        Commands::Validate { path } => commands::validate::run(&config, path),
        Commands::Check => commands::check::run(&config),
    }
}
