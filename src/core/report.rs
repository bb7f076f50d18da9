// FileMill - core/report.rs
//
// Report aggregation: folds the ordered FileResult list into an
// ExecutionReport with per-type and per-status tallies, appending one
// synthetic error result for every input discovery refused.

use crate::core::model::{
    BenchmarkData, ExecutionMode, ExecutionReport, FileResult, FileType, Status,
};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Build the execution report for one engine run.
///
/// `results` must already be in input order; skipped entries are appended
/// after them as `Unknown`-type error results so the caller sees every
/// input it asked about exactly once.
pub fn aggregate(
    mode: ExecutionMode,
    start_time: DateTime<Utc>,
    directory: Option<&Path>,
    mut results: Vec<FileResult>,
    skipped: &[(PathBuf, String)],
    total_duration_ms: u64,
    benchmark_data: Option<BenchmarkData>,
) -> ExecutionReport {
    for (path, reason) in skipped {
        results.push(FileResult::error(path, FileType::Unknown, reason.clone()));
    }

    let mut report = ExecutionReport {
        mode,
        start_time,
        directory: directory.map(Path::to_path_buf),
        total_files: results.len(),
        csv_count: 0,
        json_count: 0,
        log_count: 0,
        xml_count: 0,
        success_count: 0,
        error_count: 0,
        partial_count: 0,
        total_duration_ms,
        results,
        benchmark_data,
    };

    for result in &report.results {
        match result.file_type {
            FileType::Csv => report.csv_count += 1,
            FileType::Json => report.json_count += 1,
            FileType::Log => report.log_count += 1,
            FileType::Xml => report.xml_count += 1,
            FileType::Unknown => {}
        }
        match result.status {
            Status::Ok => report.success_count += 1,
            Status::Error => report.error_count += 1,
            Status::Partial => report.partial_count += 1,
        }
    }

    tracing::info!(
        total = report.total_files,
        ok = report.success_count,
        errors = report.error_count,
        partial = report.partial_count,
        duration_ms = report.total_duration_ms,
        "Report aggregated"
    );
    report
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Metrics;
    use serde_json::json;

    fn result(name: &str, file_type: FileType, status: Status) -> FileResult {
        let mut r = FileResult::new(Path::new(name), file_type);
        r.status = status;
        match status {
            Status::Ok => {
                r.metrics = Metrics::from([("total_records".to_string(), json!(1))]);
            }
            Status::Error => {
                r.errors
                    .push(crate::core::model::ResultError::Message("boom".into()));
            }
            Status::Partial => {
                r.metrics = Metrics::from([("total_entries".to_string(), json!(1))]);
                r.errors.push(crate::core::model::ResultError::Line {
                    line: 2,
                    message: "bad".into(),
                });
            }
        }
        r
    }

    #[test]
    fn test_counters_sum_to_total() {
        let results = vec![
            result("a.csv", FileType::Csv, Status::Ok),
            result("b.json", FileType::Json, Status::Error),
            result("c.log", FileType::Log, Status::Partial),
            result("d.xml", FileType::Xml, Status::Ok),
        ];
        let report = aggregate(
            ExecutionMode::Sequential,
            Utc::now(),
            None,
            results,
            &[],
            123,
            None,
        );

        assert_eq!(report.total_files, 4);
        assert_eq!(report.results.len(), report.total_files);
        assert_eq!(
            report.csv_count + report.json_count + report.log_count + report.xml_count,
            4
        );
        assert_eq!(
            report.success_count + report.error_count + report.partial_count,
            4
        );
        assert_eq!(report.success_count, 2);
        assert_eq!(report.partial_count, 1);
        assert_eq!(report.total_duration_ms, 123);
    }

    #[test]
    fn test_skipped_inputs_become_unknown_error_results() {
        let skipped = vec![
            (PathBuf::from("/data/a.bin"), "Unsupported file type (.bin)".to_string()),
            (PathBuf::from("/data/gone.csv"), "File not found".to_string()),
        ];
        let report = aggregate(
            ExecutionMode::Parallel,
            Utc::now(),
            Some(Path::new("/data")),
            vec![result("a.csv", FileType::Csv, Status::Ok)],
            &skipped,
            10,
            None,
        );

        assert_eq!(report.total_files, 3);
        assert_eq!(report.error_count, 2);
        // Unknown counts under none of the four type counters.
        assert_eq!(
            report.csv_count + report.json_count + report.log_count + report.xml_count,
            1
        );

        let synthetic = &report.results[1];
        assert_eq!(synthetic.file_type, FileType::Unknown);
        assert_eq!(synthetic.status, Status::Error);
        assert_eq!(synthetic.duration_ms, 0);
        assert_eq!(
            synthetic.first_error(),
            Some("Unsupported file type (.bin)")
        );
        assert_eq!(report.directory.as_deref(), Some(Path::new("/data")));
    }

    #[test]
    fn test_empty_run_aggregates_to_empty_report() {
        let report = aggregate(
            ExecutionMode::Sequential,
            Utc::now(),
            None,
            vec![],
            &[],
            0,
            None,
        );
        assert_eq!(report.total_files, 0);
        assert!(report.results.is_empty());
    }
}
