//! The `watermill scan` command: count the images a run would pick up.

use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use watermill_core::pipeline::decode::format_to_string;
use watermill_core::pipeline::{Discovery, FileDiscovery};
use watermill_core::Config;

use super::settings::expand_path;
use super::theme;

/// Arguments for the `scan` command.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directory to scan
    pub dir: PathBuf,

    /// Only look at files directly inside the directory
    #[arg(long)]
    pub no_recursive: bool,

    /// Print the report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ScanReport {
    directory: PathBuf,
    found: usize,
    ignored: usize,
    truncated: bool,
    formats: BTreeMap<String, usize>,
}

impl ScanReport {
    fn new(directory: PathBuf, discovery: &Discovery) -> Self {
        let mut formats = BTreeMap::new();
        for asset in &discovery.assets {
            *formats.entry(format_to_string(asset.format)).or_insert(0) += 1;
        }
        Self {
            directory,
            found: discovery.assets.len(),
            ignored: discovery.ignored,
            truncated: discovery.truncated,
            formats,
        }
    }
}

/// Execute the scan command.
pub fn execute(args: ScanArgs, config: &Config) -> anyhow::Result<()> {
    let dir = expand_path(&args.dir);
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }

    let mut discovery_config = config.discovery.clone();
    if args.no_recursive {
        discovery_config.recursive = false;
    }
    let found = FileDiscovery::new(discovery_config).discover(&dir);
    let report = ScanReport::new(dir, &found);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    eprintln!("{}", theme::heading().apply_to(report.directory.display()));
    eprintln!("  Images:   {:>6}", report.found);
    for (format, count) in &report.formats {
        eprintln!("    {format:<8}{count:>6}");
    }
    if report.ignored > 0 {
        eprintln!("  Ignored:  {:>6}", theme::warning().apply_to(report.ignored));
    }
    if report.truncated {
        eprintln!(
            "  {}",
            theme::warning().apply_to(format!(
                "Stopped at the batch limit of {} images",
                config.discovery.max_batch_size
            ))
        );
    }
    Ok(())
}
