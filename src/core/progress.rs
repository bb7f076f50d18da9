// FileMill - core/progress.rs
//
// Progress sink collaborator interface. The engine reports ticks through
// this trait and never depends on what a sink does with them; rendering a
// progress bar is somebody else's problem.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Receiver for run progress. Implementations must tolerate concurrent
/// `update` calls — parallel mode ticks from worker completion order.
pub trait ProgressSink: Send + Sync {
    /// A run over `total` files is starting.
    fn start(&self, total: usize);

    /// `current` of `total` files have completed.
    fn update(&self, current: usize, total: usize);

    /// The run finished (successfully or not).
    fn stop(&self);
}

/// Discards all ticks. Used when progress display is disabled and in
/// benchmark runs, where progress would distort timing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn start(&self, _total: usize) {}
    fn update(&self, _current: usize, _total: usize) {}
    fn stop(&self) {}
}

/// Emits ticks to the tracing subscriber. The CLI default.
#[derive(Debug, Default)]
pub struct LogProgress {
    last: AtomicUsize,
}

impl ProgressSink for LogProgress {
    fn start(&self, total: usize) {
        self.last.store(0, Ordering::Relaxed);
        tracing::info!(total, "Processing started");
    }

    fn update(&self, current: usize, total: usize) {
        // Single-value semantics: only ever move forward, even when ticks
        // arrive out of order from parallel workers.
        let prev = self.last.fetch_max(current, Ordering::Relaxed);
        if current > prev {
            tracing::info!(current, total, "Progress");
        }
    }

    fn stop(&self) {
        tracing::info!("Processing finished");
    }
}
