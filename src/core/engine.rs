// FileMill - core/engine.rs
//
// Engine facade: the single public entry point composing discovery, an
// execution mode, and report aggregation. Once at least one input is
// classified or skipped, the engine always returns a report — failures are
// per-file results, never exceptions.

use crate::core::discovery::{self, Input};
use crate::core::model::{ExecutionMode, ExecutionReport};
use crate::core::modes::{self, ModeConfig};
use crate::core::progress::{NoopProgress, ProgressSink};
use crate::core::report;
use crate::core::retry::RetryPolicy;
use crate::util::constants::{
    DEFAULT_MAX_RETRIES, DEFAULT_MAX_WORKERS, DEFAULT_OUTPUT_DIR, DEFAULT_RETRY_DELAY_MS,
    DEFAULT_TIMEOUT_MS, FALLBACK_CORES, MIN_TIMEOUT_MS, WORKERS_PER_CORE_CAP,
};
use crate::util::error::{DiscoveryError, EngineError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// =============================================================================
// Options
// =============================================================================

/// The full recognised option set, one struct, no open-ended key/value bag.
///
/// Deserialisation rejects unknown fields, so an options document with a
/// misspelled key fails at validation time instead of being ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EngineOptions {
    /// Execution strategy. Overridden by `benchmark`.
    pub mode: ExecutionMode,

    /// When true, runs the benchmark regardless of `mode`.
    pub benchmark: bool,

    /// Per-file deadline (ms) in parallel and benchmark modes.
    pub timeout_ms: u64,

    /// Parallel pool size.
    pub max_workers: usize,

    /// Total processing attempts per file.
    pub max_retries: u32,

    /// Base delay (ms) between retry attempts.
    pub retry_delay_ms: u64,

    /// Where the report formatter collaborator writes its output.
    pub output_dir: PathBuf,

    /// Whether to tick the progress sink.
    pub show_progress: bool,

    /// Emit a discovery summary before processing.
    pub verbose: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Parallel,
            benchmark: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_workers: DEFAULT_MAX_WORKERS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            show_progress: true,
            verbose: false,
        }
    }
}

impl EngineOptions {
    /// Normalise out-of-range values to their clamped equivalents:
    /// `max_workers` lands in [1, 2 x cores], `timeout_ms` is raised to the
    /// 1000 ms floor, `max_retries` to at least one attempt.
    pub fn validated(&self) -> EngineOptions {
        let mut options = self.clone();

        let cap = WORKERS_PER_CORE_CAP * available_cores();
        let clamped_workers = options.max_workers.clamp(1, cap);
        if clamped_workers != options.max_workers {
            tracing::debug!(
                requested = options.max_workers,
                effective = clamped_workers,
                "max_workers clamped"
            );
        }
        options.max_workers = clamped_workers;

        if options.timeout_ms < MIN_TIMEOUT_MS {
            tracing::debug!(
                requested = options.timeout_ms,
                effective = MIN_TIMEOUT_MS,
                "timeout_ms raised to floor"
            );
            options.timeout_ms = MIN_TIMEOUT_MS;
        }

        options.max_retries = options.max_retries.max(1);
        options
    }

    /// The mode that will actually run: `benchmark` overrides `mode`.
    pub fn effective_mode(&self) -> ExecutionMode {
        if self.benchmark {
            ExecutionMode::Benchmark
        } else {
            self.mode
        }
    }

    fn mode_config(&self) -> ModeConfig {
        ModeConfig {
            max_workers: self.max_workers,
            timeout_ms: self.timeout_ms,
            retry: RetryPolicy {
                max_retries: self.max_retries,
                retry_delay_ms: self.retry_delay_ms,
            },
        }
    }
}

/// Worker-pool clamp basis. Falls back when parallelism cannot be queried.
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_CORES)
}

// =============================================================================
// Facade
// =============================================================================

/// Process `input` with a silent progress sink.
pub fn process(input: &Input, options: &EngineOptions) -> Result<ExecutionReport> {
    process_with_progress(input, options, &NoopProgress)
}

/// Process `input`, ticking `progress` unless `show_progress` is off.
///
/// Returns `EngineError::NoFiles` only when discovery produced neither
/// classified files nor skipped entries; any other outcome is a report.
pub fn process_with_progress(
    input: &Input,
    options: &EngineOptions,
    progress: &dyn ProgressSink,
) -> Result<ExecutionReport> {
    let options = options.validated();
    let start_time = Utc::now();

    let discovered = match discovery::discover(input) {
        Ok(d) => d,
        Err(DiscoveryError::NoFiles { .. }) => return Err(EngineError::NoFiles.into()),
        Err(e) => return Err(e.into()),
    };
    if discovered.files.is_empty() && discovered.skipped.is_empty() {
        return Err(EngineError::NoFiles.into());
    }

    if options.verbose {
        tracing::info!(
            classified = discovered.files.len(),
            skipped = discovered.skipped.len(),
            mode = %options.effective_mode(),
            workers = options.max_workers,
            "Discovery summary"
        );
    }

    let noop = NoopProgress;
    let sink: &dyn ProgressSink = if options.show_progress {
        progress
    } else {
        &noop
    };

    let mode = options.effective_mode();
    let outcome = modes::run(mode, &discovered.files, &options.mode_config(), sink);

    Ok(report::aggregate(
        mode,
        start_time,
        input.directory(),
        outcome.results,
        &discovered.skipped,
        outcome.duration_ms,
        outcome.benchmark,
    ))
}

// =============================================================================
// Convenience wrappers
// =============================================================================

/// Process every supported file under a directory.
pub fn process_directory(path: &Path, options: &EngineOptions) -> Result<ExecutionReport> {
    process(&Input::Directory(path.to_path_buf()), options)
}

/// Process an explicit list of files.
pub fn process_files(paths: &[PathBuf], options: &EngineOptions) -> Result<ExecutionReport> {
    process(&Input::Files(paths.to_vec()), options)
}

/// Process a single file.
pub fn process_file(path: &Path, options: &EngineOptions) -> Result<ExecutionReport> {
    process(&Input::File(path.to_path_buf()), options)
}

// =============================================================================
// Tests
// =============================================================================
