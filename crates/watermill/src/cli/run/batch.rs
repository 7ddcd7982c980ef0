//! Batch execution with a live progress bar, Ctrl-C handling and the final summary.

use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use watermill_core::pipeline::{CancelToken, ProgressEvent, RunStage, Scheduler};
use watermill_core::{ProcessStatus, RunSummary};

use super::setup::RunPlan;
use super::RunArgs;
use crate::cli::theme;

/// Run the planned batch and report the outcome.
pub(crate) async fn run_batch(plan: RunPlan, args: &RunArgs) -> anyhow::Result<()> {
    let RunPlan {
        config,
        request,
        assets,
        ignored,
    } = plan;

    let progress = create_progress_bar(assets.len() as u64)?;
    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();

    let bar = progress.clone();
    let reporter = tokio::spawn(async move {
        let start = Instant::now();
        while let Some(event) = rx.recv().await {
            match event {
                ProgressEvent::FileDone {
                    completed, result, ..
                } => {
                    bar.set_position(completed as u64);
                    if result.status == ProcessStatus::Error {
                        bar.suspend(|| {
                            tracing::warn!("Failed: {:?} - {}", result.source, result.error)
                        });
                    }
                    let elapsed = start.elapsed().as_secs_f64();
                    if elapsed > 0.0 {
                        bar.set_message(format!("{:.1} img/sec", completed as f64 / elapsed));
                    }
                }
                ProgressEvent::Stage(RunStage::WritingLog) => {
                    bar.set_message("writing log...");
                }
                ProgressEvent::Stage(RunStage::Archiving) => {
                    bar.set_message("archiving...");
                }
            }
        }
    });

    let cancel = CancelToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        let bar = progress.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                bar.set_message("cancelling, finishing in-flight images...");
                cancel.cancel();
            }
        })
    };

    let scheduler = Scheduler::new(config.scheduler.clone(), config.output.clone());
    let outcome = scheduler.run(&request, assets, Some(tx), cancel).await;

    interrupt.abort();
    // The scheduler dropped its sender, so the reporter drains and exits.
    let _ = reporter.await;
    progress.finish_and_clear();

    let outcome = outcome?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
    } else {
        print_summary(&outcome.summary, ignored);
    }

    if outcome.summary.cancelled {
        tracing::warn!("Run cancelled before all images were dispatched");
    }
    Ok(())
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    Ok(pb)
}

/// Images per second over the whole run, counting only written images.
fn throughput(summary: &RunSummary) -> f64 {
    let secs = summary.elapsed.as_secs_f64();
    if secs > 0.0 {
        summary.succeeded as f64 / secs
    } else {
        0.0
    }
}

/// Print a formatted summary table after the run.
fn print_summary(summary: &RunSummary, ignored: usize) {
    let warn = theme::warning();

    eprintln!();
    eprintln!("  ====================================");
    eprintln!(
        "               {}",
        theme::heading().apply_to(if summary.dry_run {
            "Summary (dry run)"
        } else {
            "Summary"
        })
    );
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", summary.succeeded);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", warn.apply_to(summary.failed));
    }
    if summary.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", summary.skipped);
    }
    if ignored > 0 {
        eprintln!("    Ignored:      {:>8}", ignored);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", summary.total);
    eprintln!("    Duration:     {:>7.1}s", summary.elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", throughput(summary));
    eprintln!("  ====================================");

    if let Some(log) = &summary.log_path {
        eprintln!("    Log:     {}", log.display());
    }
    if let Some(archive) = &summary.archive_path {
        eprintln!("    Archive: {}", archive.display());
    }
    for warning in &summary.warnings {
        eprintln!("    {} {}", warn.apply_to("warning:"), warning);
    }
    if summary.cancelled {
        eprintln!(
            "    {}",
            warn.apply_to(format!(
                "Cancelled: {} of {} images were not started",
                summary.total - summary.processed(),
                summary.total
            ))
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_throughput_counts_successes() {
        let summary = RunSummary {
            total: 10,
            succeeded: 8,
            failed: 2,
            elapsed: Duration::from_secs(4),
            ..Default::default()
        };
        assert!((throughput(&summary) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_throughput_zero_elapsed() {
        let summary = RunSummary {
            total: 1,
            succeeded: 1,
            ..Default::default()
        };
        assert_eq!(throughput(&summary), 0.0);
    }

    #[test]
    fn test_progress_bar_template_parses() {
        let pb = create_progress_bar(5).unwrap();
        assert_eq!(pb.length(), Some(5));
    }
}
