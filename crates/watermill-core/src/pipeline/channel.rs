//! Channels and signals shared between the scheduler and its callers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::SchedulerConfig;
use crate::types::ProcessingResult;

/// Create a bounded channel pair with the configured buffer size.
///
/// When the buffer is full, workers wait before reporting, which keeps
/// finished results from piling up faster than the aggregator drains them.
pub fn bounded_channel<T>(config: &SchedulerConfig) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(config.buffer_size.max(1))
}

/// Post-processing stages announced after all files settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    WritingLog,
    Archiving,
}

/// Progress notifications emitted during a run, in completion order.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// One more file finished. `completed` counts from 1 to at most `total`.
    FileDone {
        completed: usize,
        total: usize,
        result: ProcessingResult,
    },
    Stage(RunStage),
}

/// Cooperative cancellation flag.
///
/// Only dispatch checks it: a file that has started processing always runs
/// to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
