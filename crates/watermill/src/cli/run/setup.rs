//! Run setup: settings layering, path checks, discovery and the conflict prompt.

use anyhow::Context;
use dialoguer::Select;
use watermill_core::pipeline::{output_stem, ConflictResolver, FileDiscovery};
use watermill_core::{BatchRequest, Config, ConflictMode, ImageAsset};

use super::RunArgs;
use crate::cli::settings::expand_path;
use crate::cli::theme::watermill_theme;

/// Everything needed to start the batch.
pub(crate) struct RunPlan {
    pub config: Config,
    pub request: BatchRequest,
    pub assets: Vec<ImageAsset>,
    pub ignored: usize,
}

/// Validate the request and find the images to process.
///
/// Returns `None` when there is nothing to do or the user aborted.
pub(crate) fn prepare(args: &RunArgs, mut config: Config) -> anyhow::Result<Option<RunPlan>> {
    let mut settings = args.look.resolve(&config)?;
    if args.dry_run {
        settings.dry_run = true;
    }
    if args.zip {
        settings.create_archive = true;
    }
    if let Some(conflict) = args.conflict {
        settings.conflict_mode = conflict.into();
    }
    if let Some(parallel) = args.parallel {
        config.scheduler.parallel_workers = parallel;
    }
    if args.no_recursive {
        config.discovery.recursive = false;
    }

    let mut request = BatchRequest::new(
        expand_path(&args.input),
        expand_path(&args.output),
        expand_path(&args.watermark),
        settings,
    );
    request.validate().context("Cannot start run")?;

    let found = FileDiscovery::new(config.discovery.clone()).discover(&request.input_dir);
    if found.truncated {
        tracing::warn!(
            "Only the first {} images will be processed",
            config.discovery.max_batch_size
        );
    }
    if found.assets.is_empty() {
        tracing::warn!(
            "No supported image files found in {:?} ({} ignored)",
            request.input_dir,
            found.ignored
        );
        return Ok(None);
    }

    let mut assets = found.assets;
    assets.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::info!(
        "Found {} image(s) to process ({} ignored)",
        assets.len(),
        found.ignored
    );

    if request.config.conflict_mode == ConflictMode::Ask && !request.config.dry_run {
        let existing = count_existing(&request, &assets);
        if existing > 0 {
            match ask_conflict_mode(existing)? {
                Some(mode) => request.config.conflict_mode = mode,
                None => {
                    eprintln!("Aborted. Nothing was written.");
                    return Ok(None);
                }
            }
        }
    }

    Ok(Some(RunPlan {
        config,
        request,
        assets,
        ignored: found.ignored,
    }))
}

/// Number of assets with at least one output already on disk.
pub(crate) fn count_existing(request: &BatchRequest, assets: &[ImageAsset]) -> usize {
    assets
        .iter()
        .filter(|asset| {
            let stem = output_stem(&request.input_dir, &request.output_dir, &asset.path);
            ConflictResolver::exists(&stem, request.config.output_format, request.config.extra_format)
        })
        .count()
}

/// Ask once how to treat existing outputs. Without a terminal, overwrite.
fn ask_conflict_mode(existing: usize) -> anyhow::Result<Option<ConflictMode>> {
    if !console::Term::stderr().is_term() {
        tracing::warn!(
            "{existing} output file(s) already exist and there is no terminal to ask; overwriting"
        );
        return Ok(Some(ConflictMode::Overwrite));
    }

    let items = [
        "Overwrite existing files",
        "Skip images whose output exists",
        "Abort",
    ];
    let choice = Select::with_theme(&watermill_theme())
        .with_prompt(format!("{existing} output file(s) already exist"))
        .items(&items)
        .default(0)
        .interact_opt()?;

    Ok(match choice {
        Some(0) => Some(ConflictMode::Overwrite),
        Some(1) => Some(ConflictMode::Skip),
        _ => None,
    })
}
