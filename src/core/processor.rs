// FileMill - core/processor.rs
//
// Single-file pipeline stage: parse, then metrics, then status
// normalisation. This function never fails — every problem ends up inside
// the returned FileResult, which is what keeps one bad file from touching
// the rest of a run.

use crate::core::metrics;
use crate::core::model::{FileResult, FileType, ResultError, Status};
use crate::core::parse::{self, ParseOutcome};
use std::path::Path;
use std::time::Instant;

/// Process one classified file into a FileResult.
pub fn process(file_type: FileType, path: &Path) -> FileResult {
    let start = Instant::now();
    let mut result = FileResult::new(path, file_type);

    let parsed = match parse::parse_file(file_type, path) {
        ParseOutcome::Ok(data) => Some(data),
        ParseOutcome::Partial(data, line_errors) => {
            result.lines_failed = line_errors.len() as u64;
            result.errors.extend(line_errors.into_iter().map(|e| {
                ResultError::Line {
                    line: e.line,
                    message: e.message,
                }
            }));
            Some(data)
        }
        ParseOutcome::Error(reason) => {
            result.errors.push(ResultError::Message(reason));
            None
        }
    };

    if let Some(data) = parsed {
        match metrics::compute(&data) {
            Ok(map) => result.metrics = map,
            Err(reason) => {
                result.errors.push(ResultError::Message(reason));
                result.metrics.clear();
            }
        }
    }

    result.lines_processed = lines_processed(&result);
    result.status = normalize_status(&result);
    if result.status == Status::Error {
        result.metrics.clear();
    }
    result.duration_ms = start.elapsed().as_millis() as u64;

    tracing::debug!(
        file = %result.filename,
        status = %result.status,
        duration_ms = result.duration_ms,
        "File processed"
    );
    result
}

/// The record count a file contributed, read back from its own metrics.
fn lines_processed(result: &FileResult) -> u64 {
    let key = match result.file_type {
        FileType::Csv => "total_records",
        FileType::Log => "total_entries",
        FileType::Xml => "total_products",
        FileType::Json => "total_sessions",
        FileType::Unknown => return 0,
    };
    result
        .metrics
        .get(key)
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0)
}

/// Status rule: errors alongside metrics means partial; errors without
/// metrics means failure; otherwise success.
fn normalize_status(result: &FileResult) -> Status {
    match (result.errors.is_empty(), result.metrics.is_empty()) {
        (false, false) => Status::Partial,
        (false, true) => Status::Error,
        (true, _) => Status::Ok,
    }
}

// =============================================================================
// Tests
// =============================================================================
