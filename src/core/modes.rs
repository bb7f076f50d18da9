// FileMill - core/modes.rs
//
// Execution modes: sequential, bounded-pool parallel, and benchmark.
//
// Parallel discipline: a fixed pool of worker threads pulls (index, task)
// pairs from a shared channel. Each task body runs on its own helper thread
// so the worker can enforce the per-file deadline with recv_timeout and
// abandon a hung task without losing its pool slot. Workers share nothing;
// the collector owns result assembly and re-establishes input order by
// index. Completion order is visible only through the progress sink.

use crate::core::metrics::{round1, round2};
use crate::core::model::{
    BenchmarkComparison, BenchmarkData, BenchmarkRun, ExecutionMode, FileResult, FileType,
    Status,
};
use crate::core::progress::{NoopProgress, ProgressSink};
use crate::core::retry::{self, RetryPolicy};
use crate::util::memory;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

// =============================================================================
// Configuration and outcome
// =============================================================================

/// The execution knobs a mode needs, pre-validated by the engine facade.
#[derive(Debug, Clone, Copy)]
pub struct ModeConfig {
    /// Parallel pool size. Already clamped to [1, 2 x cores].
    pub max_workers: usize,

    /// Per-file deadline (ms) in parallel and benchmark modes.
    pub timeout_ms: u64,

    /// Retry policy applied around every processor call.
    pub retry: RetryPolicy,
}

/// What a mode run produced.
#[derive(Debug)]
pub struct ModeOutcome {
    /// Per-file results in input order.
    pub results: Vec<FileResult>,

    /// Wall-clock duration of the run (the parallel arm for benchmark).
    pub duration_ms: u64,

    /// Present in benchmark mode only.
    pub benchmark: Option<BenchmarkData>,
}

/// Drive the classified list through the pipeline under `mode`.
pub fn run(
    mode: ExecutionMode,
    files: &[(FileType, PathBuf)],
    config: &ModeConfig,
    progress: &dyn ProgressSink,
) -> ModeOutcome {
    match mode {
        ExecutionMode::Sequential => {
            let start = Instant::now();
            let results = run_sequential(files, config, progress);
            ModeOutcome {
                results,
                duration_ms: start.elapsed().as_millis() as u64,
                benchmark: None,
            }
        }
        ExecutionMode::Parallel => {
            let start = Instant::now();
            let results = run_parallel(files, config, progress);
            ModeOutcome {
                results,
                duration_ms: start.elapsed().as_millis() as u64,
                benchmark: None,
            }
        }
        ExecutionMode::Benchmark => run_benchmark(files, config),
    }
}

// =============================================================================
// Sequential
// =============================================================================

/// One file at a time, in input order, a progress tick after each.
fn run_sequential(
    files: &[(FileType, PathBuf)],
    config: &ModeConfig,
    progress: &dyn ProgressSink,
) -> Vec<FileResult> {
    let total = files.len();
    progress.start(total);

    let mut results = Vec::with_capacity(total);
    for (idx, (file_type, path)) in files.iter().enumerate() {
        results.push(retry::process_with_retry(*file_type, path, &config.retry));
        progress.update(idx + 1, total);
    }

    progress.stop();
    results
}

// =============================================================================
// Parallel
// =============================================================================

/// Bounded worker pool. Output is ordered by input index, not completion.
fn run_parallel(
    files: &[(FileType, PathBuf)],
    config: &ModeConfig,
    progress: &dyn ProgressSink,
) -> Vec<FileResult> {
    let total = files.len();
    progress.start(total);
    if total == 0 {
        progress.stop();
        return Vec::new();
    }

    let workers = config.max_workers.min(total).max(1);
    tracing::debug!(total, workers, timeout_ms = config.timeout_ms, "Parallel run starting");

    let (task_tx, task_rx) = mpsc::channel::<(usize, FileType, PathBuf)>();
    let task_rx = Arc::new(Mutex::new(task_rx));
    let (result_tx, result_rx) = mpsc::channel::<(usize, FileResult)>();

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let task_rx = Arc::clone(&task_rx);
        let result_tx = result_tx.clone();
        let config = *config;

        let handle = thread::Builder::new()
            .name(format!("filemill-worker-{worker_id}"))
            .spawn(move || loop {
                // Hold the lock only for the pop itself.
                let task = match task_rx.lock() {
                    Ok(rx) => rx.recv().ok(),
                    Err(_) => None,
                };
                let Some((idx, file_type, path)) = task else {
                    break;
                };

                let task_path = path.clone();
                let result = run_with_deadline(
                    move || retry::process_with_retry(file_type, &path, &config.retry),
                    file_type,
                    &task_path,
                    idx,
                    config.timeout_ms,
                );
                if result_tx.send((idx, result)).is_err() {
                    break;
                }
            });

        match handle {
            Ok(h) => handles.push(h),
            Err(e) => tracing::warn!(worker_id, error = %e, "Could not spawn worker"),
        }
    }
    drop(result_tx);

    for (idx, (file_type, path)) in files.iter().enumerate() {
        let _ = task_tx.send((idx, *file_type, path.clone()));
    }
    drop(task_tx);

    // Collect keyed by input index; tick progress in completion order.
    let mut slots: Vec<Option<FileResult>> = (0..total).map(|_| None).collect();
    let mut completed = 0usize;
    while let Ok((idx, result)) = result_rx.recv() {
        slots[idx] = Some(result);
        completed += 1;
        progress.update(completed, total);
    }

    for handle in handles {
        let _ = handle.join();
    }
    progress.stop();

    // A slot can only be empty if its worker died before reporting.
    slots
        .into_iter()
        .enumerate()
        .map(|(idx, slot)| {
            slot.unwrap_or_else(|| {
                synthetic_failure(&files[idx].1, files[idx].0, "worker exited without result")
            })
        })
        .collect()
}

/// Run `task` on a helper thread, joined with a deadline.
///
/// On expiry the helper is abandoned — whenever it eventually finishes, its
/// send lands on a dropped receiver and the thread exits — and the slot is
/// filled with a synthetic error. A panic inside the task is caught and
/// converted the same way, so neither outcome disturbs the pool.
fn run_with_deadline<F>(
    task: F,
    file_type: FileType,
    path: &Path,
    idx: usize,
    timeout_ms: u64,
) -> FileResult
where
    F: FnOnce() -> FileResult + Send + 'static,
{
    let (done_tx, done_rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name(format!("filemill-task-{idx}"))
        .spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(task));
            let _ = done_tx.send(outcome);
        });

    let handle = match spawned {
        Ok(h) => h,
        Err(e) => {
            return synthetic_failure(
                path,
                file_type,
                &format!("could not spawn task thread: {e}"),
            )
        }
    };

    match done_rx.recv_timeout(Duration::from_millis(timeout_ms)) {
        Ok(Ok(result)) => {
            let _ = handle.join();
            result
        }
        Ok(Err(panic_payload)) => {
            let _ = handle.join();
            let reason = panic_message(&panic_payload);
            tracing::warn!(idx, reason, "Worker task panicked");
            synthetic_failure(
                path,
                file_type,
                &format!("worker process crashed: {reason}"),
            )
        }
        Err(RecvTimeoutError::Timeout) => {
            tracing::warn!(idx, timeout_ms, "Worker task deadline expired");
            synthetic_failure(
                path,
                file_type,
                &format!("processing timeout after {timeout_ms} ms"),
            )
        }
        Err(RecvTimeoutError::Disconnected) => {
            synthetic_failure(path, file_type, "worker exited without result")
        }
    }
}

/// The synthetic error result used for timeouts and crashed tasks.
/// Duration is deliberately 0: the pipeline never ran to completion.
fn synthetic_failure(path: &Path, file_type: FileType, reason: &str) -> FileResult {
    FileResult::error(
        path,
        file_type,
        format!("Task crashed or timed out: {reason}"),
    )
}

/// Human-readable text from a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

// =============================================================================
// Benchmark
// =============================================================================

/// Sequential then parallel over the same input, progress disabled, with a
/// comparison record. The parallel arm's results are the official ones.
fn run_benchmark(files: &[(FileType, PathBuf)], config: &ModeConfig) -> ModeOutcome {
    let progress = NoopProgress;
    let total = files.len();

    tracing::info!(total, "Benchmark: sequential arm");
    let (seq_results, seq_ms, seq_mem_kb) = measured(|| run_sequential(files, config, &progress));

    tracing::info!(total, "Benchmark: parallel arm");
    let (par_results, par_ms, par_mem_kb) = measured(|| run_parallel(files, config, &progress));

    let comparison = BenchmarkComparison {
        speedup_factor: if par_ms == 0 {
            0.0
        } else {
            round2(seq_ms as f64 / par_ms as f64)
        },
        time_saved_ms: seq_ms as i64 - par_ms as i64,
        time_saved_percent: if seq_ms == 0 {
            0.0
        } else {
            round1((seq_ms as f64 - par_ms as f64) / seq_ms as f64 * 100.0)
        },
        faster_mode: if par_ms < seq_ms {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        },
    };

    let benchmark = BenchmarkData {
        total_files: total,
        processes_used: total,
        sequential: benchmark_run(&seq_results, seq_ms, seq_mem_kb, total),
        parallel: benchmark_run(&par_results, par_ms, par_mem_kb, total),
        comparison,
    };

    ModeOutcome {
        results: par_results,
        duration_ms: par_ms,
        benchmark: Some(benchmark),
    }
}

/// Time a run and sample memory around it. The reported figure is
/// max(before, after) — a peak indicator, not an accounting number.
fn measured<F>(run: F) -> (Vec<FileResult>, u64, u64)
where
    F: FnOnce() -> Vec<FileResult>,
{
    let mem_before = memory::process_rss_kb();
    let start = Instant::now();
    let results = run();
    let duration_ms = start.elapsed().as_millis() as u64;
    let mem_after = memory::process_rss_kb();
    (results, duration_ms, mem_before.max(mem_after))
}

fn benchmark_run(
    results: &[FileResult],
    duration_ms: u64,
    memory_kb: u64,
    total: usize,
) -> BenchmarkRun {
    BenchmarkRun {
        duration_ms,
        duration_sec: round2(duration_ms as f64 / 1000.0),
        success_count: results.iter().filter(|r| r.status == Status::Ok).count(),
        error_count: results.iter().filter(|r| r.status == Status::Error).count(),
        avg_time_per_file: if total == 0 {
            0.0
        } else {
            round2(duration_ms as f64 / total as f64)
        },
        memory_kb,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config() -> ModeConfig {
        ModeConfig {
            max_workers: 4,
            timeout_ms: 5_000,
            retry: RetryPolicy {
                max_retries: 1,
                retry_delay_ms: 0,
            },
        }
    }

    /// N valid log files plus one malformed JSON at a chosen position.
    fn make_inputs(dir: &TempDir, good: usize, bad_at: Option<usize>) -> Vec<(FileType, PathBuf)> {
        let mut files = Vec::new();
        for i in 0..good {
            let path = dir.path().join(format!("app{i}.log"));
            fs::write(
                &path,
                format!("2024-03-01 0{}:00:00 [INFO] [web] request {i}\n", i % 10),
            )
            .unwrap();
            files.push((FileType::Log, path));
        }
        if let Some(pos) = bad_at {
            let path = dir.path().join("broken.json");
            fs::write(&path, "{nope}").unwrap();
            files.insert(pos, (FileType::Json, path));
        }
        files
    }

    #[test]
    fn test_sequential_preserves_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let files = make_inputs(&dir, 4, None);

        let outcome = run(ExecutionMode::Sequential, &files, &config(), &NoopProgress);
        assert_eq!(outcome.results.len(), 4);
        for (result, (_, path)) in outcome.results.iter().zip(&files) {
            assert_eq!(&result.path, path);
            assert_eq!(result.status, Status::Ok);
        }
        assert!(outcome.benchmark.is_none());
    }

    #[test]
    fn test_parallel_preserves_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let files = make_inputs(&dir, 8, Some(3));

        let outcome = run(ExecutionMode::Parallel, &files, &config(), &NoopProgress);
        assert_eq!(outcome.results.len(), 9);
        for (result, (_, path)) in outcome.results.iter().zip(&files) {
            assert_eq!(&result.path, path, "results must be input-ordered");
        }
        assert_eq!(outcome.results[3].status, Status::Error);
        assert_eq!(
            outcome.results.iter().filter(|r| r.status == Status::Ok).count(),
            8,
            "one bad file must not affect the others"
        );
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let dir = tempfile::tempdir().unwrap();
        let files = make_inputs(&dir, 5, Some(2));

        let seq = run(ExecutionMode::Sequential, &files, &config(), &NoopProgress);
        let par = run(ExecutionMode::Parallel, &files, &config(), &NoopProgress);

        for (s, p) in seq.results.iter().zip(&par.results) {
            assert_eq!(s.status, p.status);
            assert_eq!(s.metrics, p.metrics);
            assert_eq!(s.errors, p.errors);
        }
    }

    #[test]
    fn test_parallel_empty_input() {
        let outcome = run(ExecutionMode::Parallel, &[], &config(), &NoopProgress);
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_deadline_expiry_yields_synthetic_error() {
        let result = run_with_deadline(
            || {
                thread::sleep(Duration::from_millis(500));
                FileResult::error(Path::new("/slow.csv"), FileType::Csv, "never seen")
            },
            FileType::Csv,
            Path::new("/slow.csv"),
            0,
            50,
        );
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.filename, "slow.csv");
        let message = result.first_error().unwrap();
        assert!(message.starts_with("Task crashed or timed out:"), "{message}");
        assert!(message.contains("timeout"), "{message}");
        assert_eq!(result.duration_ms, 0);
    }

    #[test]
    fn test_task_panic_yields_synthetic_error() {
        let result = run_with_deadline(
            || panic!("parser exploded"),
            FileType::Xml,
            Path::new("/boom.xml"),
            1,
            1_000,
        );
        assert_eq!(result.status, Status::Error);
        let message = result.first_error().unwrap();
        assert!(message.contains("worker process crashed"), "{message}");
        assert!(message.contains("parser exploded"), "{message}");
    }

    /// A hung or panicking task must not poison the pool: the remaining
    /// files all complete.
    #[test]
    fn test_pool_survives_slow_task() {
        let dir = tempfile::tempdir().unwrap();
        let files = make_inputs(&dir, 6, None);

        let tight = ModeConfig {
            max_workers: 2,
            timeout_ms: 2_000,
            retry: RetryPolicy {
                max_retries: 1,
                retry_delay_ms: 0,
            },
        };
        let outcome = run(ExecutionMode::Parallel, &files, &tight, &NoopProgress);
        assert_eq!(outcome.results.len(), 6);
        assert!(outcome.results.iter().all(|r| r.status == Status::Ok));
    }

    #[test]
    fn test_benchmark_produces_comparison() {
        let dir = tempfile::tempdir().unwrap();
        let files = make_inputs(&dir, 7, None);

        let outcome = run(ExecutionMode::Benchmark, &files, &config(), &NoopProgress);
        let data = outcome.benchmark.expect("benchmark data");

        assert_eq!(data.total_files, 7);
        assert_eq!(data.processes_used, 7);
        assert_eq!(data.sequential.success_count, 7);
        assert_eq!(data.parallel.success_count, 7);
        assert!(data.comparison.speedup_factor >= 0.0);
        assert!(matches!(
            data.comparison.faster_mode,
            ExecutionMode::Sequential | ExecutionMode::Parallel
        ));

        // Official results are the parallel run's.
        assert_eq!(outcome.results.len(), 7);
        assert_eq!(outcome.duration_ms, data.parallel.duration_ms);
    }

    #[test]
    fn test_progress_ticks_reach_total() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        #[derive(Default)]
        struct CountingSink {
            started: AtomicUsize,
            updates: AtomicUsize,
            stopped: AtomicUsize,
        }
        impl ProgressSink for CountingSink {
            fn start(&self, _total: usize) {
                self.started.fetch_add(1, Ordering::SeqCst);
            }
            fn update(&self, _current: usize, _total: usize) {
                self.updates.fetch_add(1, Ordering::SeqCst);
            }
            fn stop(&self) {
                self.stopped.fetch_add(1, Ordering::SeqCst);
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let files = make_inputs(&dir, 5, None);
        let sink = CountingSink::default();

        run(ExecutionMode::Parallel, &files, &config(), &sink);
        assert_eq!(sink.started.load(Ordering::SeqCst), 1);
        assert_eq!(sink.updates.load(Ordering::SeqCst), 5);
        assert_eq!(sink.stopped.load(Ordering::SeqCst), 1);
    }
}
