//! Watermill CLI - Batch watermarking for directories of images.
//!
//! Watermill composites a semi-transparent logo onto every image in a
//! directory tree, optionally resizing and converting, and writes the results
//! to a mirrored output tree with a CSV processing log.
//!
//! # Usage
//!
//! ```bash
//! # Watermark a directory
//! watermill run -i ./photos -o ./export -w logo.png
//!
//! # Try settings on one image first
//! watermill preview ./photos/beach.jpg -w logo.png --anchor TL --opacity 60
//!
//! # Save settings for later
//! watermill preset save instagram --anchor BC --scale 20 --format jpeg
//! watermill run -i ./photos -o ./export -w logo.png --preset instagram
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Watermill - Batch watermarking for directories of images.
#[derive(Parser, Debug)]
#[command(name = "watermill")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Watermark every image in a directory
    Run(cli::run::RunArgs),

    /// Render a single watermarked image without touching the batch output
    Preview(cli::preview::PreviewArgs),

    /// Count the images a run would pick up
    Scan(cli::scan::ScanArgs),

    /// Save, list and inspect settings presets
    Preset(cli::preset::PresetArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match watermill_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `watermill config path`."
            );
            watermill_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Watermill v{}", watermill_core::VERSION);

    match cli.command {
        Commands::Run(args) => cli::run::execute(args, config).await,
        Commands::Preview(args) => cli::preview::execute(args, config).await,
        Commands::Scan(args) => cli::scan::execute(args, &config),
        Commands::Preset(args) => cli::preset::execute(args, &config),
        Commands::Config(args) => cli::config::execute(args, &config),
    }
}
