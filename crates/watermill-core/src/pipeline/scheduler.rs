//! Bounded fan-out of a batch over a worker pool.
//!
//! One tokio task per asset, gated by a semaphore; the CPU-bound work runs on
//! the blocking pool. Finished results go through a bounded channel to a
//! single aggregator task, which owns the result list and the completion
//! counter and emits progress events in completion order.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;

use crate::config::{OutputConfig, ProcessingConfig, SchedulerConfig};
use crate::error::{ConfigError, PipelineError, Result};
use crate::report;
use crate::types::{ImageAsset, ProcessingResult, RunSummary};

use super::channel::{bounded_channel, CancelToken, ProgressEvent, RunStage};
use super::processor::ImageProcessor;
use super::validate::Validator;
use super::watermark::Watermark;

/// Everything a front end must supply to start a batch.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub watermark_path: PathBuf,
    pub config: ProcessingConfig,
}

impl BatchRequest {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        watermark_path: impl Into<PathBuf>,
        config: ProcessingConfig,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            watermark_path: watermark_path.into(),
            config,
        }
    }

    /// Settings and path checks that must pass before any file is touched.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.config.validate()?;
        Validator::validate_paths(&self.input_dir, &self.output_dir, &self.watermark_path)
    }
}

/// Results of a finished (or cancelled) run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub summary: RunSummary,
    /// One entry per dispatched asset, in completion order
    pub results: Vec<ProcessingResult>,
}

/// Runs batches with bounded concurrency.
pub struct Scheduler {
    config: SchedulerConfig,
    output: OutputConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, output: OutputConfig) -> Self {
        Self { config, output }
    }

    /// Number of files processed at the same time.
    pub fn workers(&self) -> usize {
        self.config.worker_count()
    }

    /// Process `assets` according to `request`.
    ///
    /// Fails only for configuration problems, which are detected before the
    /// first file is dispatched. Per-file failures become error results;
    /// log and archive failures become summary warnings. A source whose output
    /// path is already claimed by an earlier source of the batch gets an error
    /// result instead of overwriting it. When `cancel` fires,
    /// no further files are dispatched and in-flight files still finish.
    pub async fn run(
        &self,
        request: &BatchRequest,
        assets: Vec<ImageAsset>,
        progress: Option<UnboundedSender<ProgressEvent>>,
        cancel: CancelToken,
    ) -> Result<BatchOutcome> {
        let start = Instant::now();
        request.validate()?;
        let watermark = Arc::new(Watermark::load(&request.watermark_path)?);

        let config = request.config.clone();
        if !config.dry_run {
            tokio::fs::create_dir_all(&request.output_dir).await?;
        }

        let total = assets.len();
        let workers = self.workers();
        tracing::info!(
            "Processing {} images with {} workers{}",
            total,
            workers,
            if config.dry_run { " (dry run)" } else { "" }
        );

        let processor = Arc::new(ImageProcessor::new(
            &request.input_dir,
            &request.output_dir,
            config.clone(),
            watermark,
        ));
        let semaphore = Arc::new(Semaphore::new(workers));
        let (tx, mut rx) = bounded_channel::<ProcessingResult>(&self.config);

        let aggregator_progress = progress.clone();
        let aggregator = tokio::spawn(async move {
            let mut results = Vec::with_capacity(total);
            while let Some(result) = rx.recv().await {
                if let Some(progress) = &aggregator_progress {
                    let _ = progress.send(ProgressEvent::FileDone {
                        completed: results.len() + 1,
                        total,
                        result: result.clone(),
                    });
                }
                results.push(result);
            }
            results
        });

        let mut handles = Vec::with_capacity(total);
        let mut cancelled = false;
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();

        for asset in assets {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            // First source in dispatch order owns an output path
            let planned = processor.planned_outputs(&asset.path);
            if let Some((output, owner)) = planned
                .iter()
                .find_map(|out| claimed.get(out).map(|owner| (out.clone(), owner.clone())))
            {
                let error = PipelineError::OutputCollision {
                    path: asset.path.clone(),
                    output,
                    claimed_by: owner,
                };
                tracing::warn!("{}", error);
                let result =
                    ProcessingResult::failure(asset.path, error.to_string(), config.dry_run, Duration::ZERO);
                let _ = tx.send(result).await;
                continue;
            }
            for out in planned {
                claimed.insert(out, asset.path.clone());
            }
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("Worker semaphore closed unexpectedly, stopping batch");
                    break;
                }
            };
            // Cancellation may have arrived while waiting for a slot
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let processor = processor.clone();
            let tx = tx.clone();
            let source = asset.path.clone();
            let dry_run = config.dry_run;

            let handle = tokio::spawn(async move {
                let path = asset.path.clone();
                let worker = tokio::task::spawn_blocking(move || processor.process(&asset)).await;
                drop(permit);

                let result = worker.unwrap_or_else(|e| {
                    tracing::error!("Worker for {:?} failed: {e}", path);
                    worker_failure(path, e.to_string(), dry_run)
                });
                let _ = tx.send(result).await;
            });
            handles.push((source, handle));
        }
        drop(tx);

        if cancelled {
            tracing::warn!(
                "Cancelled: {} of {} images dispatched",
                handles.len(),
                total
            );
        }

        let mut orphans = Vec::new();
        for (source, handle) in handles {
            if let Err(e) = handle.await {
                tracing::error!("Task for {:?} did not report: {e}", source);
                orphans.push(worker_failure(source, e.to_string(), config.dry_run));
            }
        }

        let mut results = aggregator.await.map_err(|e| PipelineError::Worker {
            path: request.output_dir.clone(),
            message: format!("result aggregator failed: {e}"),
        })?;
        for orphan in orphans {
            if let Some(progress) = &progress {
                let _ = progress.send(ProgressEvent::FileDone {
                    completed: results.len() + 1,
                    total,
                    result: orphan.clone(),
                });
            }
            results.push(orphan);
        }

        let mut summary = RunSummary::from_results(total, &results);
        summary.cancelled = cancelled;
        summary.dry_run = config.dry_run;

        if !config.dry_run {
            self.finish_outputs(request, &config, &results, &progress, &mut summary)
                .await;
        }

        summary.elapsed = start.elapsed();
        tracing::info!(
            "Finished: {} succeeded, {} failed, {} skipped in {:?}",
            summary.succeeded,
            summary.failed,
            summary.skipped,
            summary.elapsed
        );
        Ok(BatchOutcome { summary, results })
    }

    /// Write the processing log and the archive. Failures are recorded in
    /// `summary.warnings` and never fail the run.
    async fn finish_outputs(
        &self,
        request: &BatchRequest,
        config: &ProcessingConfig,
        results: &[ProcessingResult],
        progress: &Option<UnboundedSender<ProgressEvent>>,
        summary: &mut RunSummary,
    ) {
        let announce = |stage| {
            if let Some(progress) = progress {
                let _ = progress.send(ProgressEvent::Stage(stage));
            }
        };

        if !results.is_empty() {
            announce(RunStage::WritingLog);
            let dir = request.output_dir.clone();
            let name = self.output.log_file_name.clone();
            let rows = results.to_vec();
            match tokio::task::spawn_blocking(move || report::write_log(&dir, &name, &rows)).await {
                Ok(Ok(path)) => summary.log_path = Some(path),
                Ok(Err(e)) => record_warning(summary, format!("Failed to create CSV log: {e}")),
                Err(e) => record_warning(summary, format!("Failed to create CSV log: {e}")),
            }
        }

        if config.create_archive {
            announce(RunStage::Archiving);
            let dir = request.output_dir.clone();
            let prefix = self.output.archive_prefix.clone();
            match tokio::task::spawn_blocking(move || report::archive(&dir, None, &prefix)).await {
                Ok(Ok(path)) => summary.archive_path = Some(path),
                Ok(Err(e)) => record_warning(summary, format!("Failed to create ZIP archive: {e}")),
                Err(e) => record_warning(summary, format!("Failed to create ZIP archive: {e}")),
            }
        }
    }
}

fn worker_failure(path: PathBuf, message: String, dry_run: bool) -> ProcessingResult {
    let error = PipelineError::Worker {
        path: path.clone(),
        message,
    };
    ProcessingResult::failure(path, error.to_string(), dry_run, Duration::ZERO)
}

fn record_warning(summary: &mut RunSummary, message: String) {
    tracing::error!("{}", message);
    summary.warnings.push(message);
}
