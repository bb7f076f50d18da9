// FileMill - core/retry.rs
//
// Retry wrapper around the single-file processor. Only transient failures
// (I/O, timeouts, crashed workers) are re-attempted; schema and validation
// failures are final no matter how many attempts remain.

use crate::core::model::{FileResult, FileType, Status};
use crate::core::processor;
use crate::util::constants::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS, MAX_BACKOFF_MS, PERMANENT_PATTERNS,
    RETRYABLE_PATTERNS,
};
use std::path::Path;

/// Attempt limits and pacing for one file's retries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, first attempt included.
    pub max_retries: u32,

    /// Base delay between attempts (ms); doubled per attempt up to
    /// MAX_BACKOFF_MS.
    pub retry_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the sleep after `attempt` (1-based), capped.
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let factor = 1u64 << (attempt.saturating_sub(1)).min(16);
        self.retry_delay_ms
            .saturating_mul(factor)
            .min(MAX_BACKOFF_MS)
    }
}

/// Run the processor under `policy`, retrying transient failures.
///
/// Retries are serialised with respect to this file only; the caller
/// decides how files interleave.
pub fn process_with_retry(file_type: FileType, path: &Path, policy: &RetryPolicy) -> FileResult {
    let attempts = policy.max_retries.max(1);
    let mut attempt = 1;

    loop {
        let result = processor::process(file_type, path);

        if result.status != Status::Error || attempt >= attempts || !is_retryable(&result) {
            return result;
        }

        let delay = policy.backoff_ms(attempt);
        tracing::debug!(
            file = %result.filename,
            attempt,
            delay_ms = delay,
            error = result.first_error().unwrap_or(""),
            "Transient failure, retrying"
        );
        if delay > 0 {
            std::thread::sleep(std::time::Duration::from_millis(delay));
        }
        attempt += 1;
    }
}

/// Classify an error result. Retryable iff some message matches a transient
/// pattern and no message matches a permanent one (case-insensitive).
pub fn is_retryable(result: &FileResult) -> bool {
    let messages: Vec<String> = result
        .errors
        .iter()
        .map(|e| e.message().to_lowercase())
        .collect();

    let transient = messages
        .iter()
        .any(|m| RETRYABLE_PATTERNS.iter().any(|p| m.contains(p)));
    let permanent = messages
        .iter()
        .any(|m| PERMANENT_PATTERNS.iter().any(|p| m.contains(p)));

    transient && !permanent
}

// =============================================================================
// Tests
// =============================================================================
