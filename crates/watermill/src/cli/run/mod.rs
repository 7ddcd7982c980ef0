//! The `watermill run` command: watermark a whole directory.

mod batch;
mod setup;

use clap::Args;
use std::path::PathBuf;
use watermill_core::Config;

use super::settings::WatermarkArgs;
use super::types::ConflictArg;

/// Arguments for the `run` command.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory of images to watermark
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory for the watermarked images (must not be inside the input)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Watermark image (PNG or WebP with transparency)
    #[arg(short, long)]
    pub watermark: PathBuf,

    #[command(flatten)]
    pub look: WatermarkArgs,

    /// Run everything but write no files
    #[arg(long)]
    pub dry_run: bool,

    /// Zip the output directory when done
    #[arg(long)]
    pub zip: bool,

    /// What to do when an output file already exists
    #[arg(long, value_enum)]
    pub conflict: Option<ConflictArg>,

    /// Only process images directly inside the input directory
    #[arg(long)]
    pub no_recursive: bool,

    /// Number of images processed at once (default: CPU count, at most 8)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Execute the run command.
pub async fn execute(args: RunArgs, config: Config) -> anyhow::Result<()> {
    let Some(plan) = setup::prepare(&args, config)? else {
        return Ok(());
    };
    batch::run_batch(plan, &args).await
}
