// FileMill - tests/e2e_engine.rs
//
// End-to-end tests for the processing engine.
//
// These tests exercise the real filesystem, real parsers, real worker
// threads, and real report aggregation — no mocks, no stubs. Fixture files
// are generated into tempdirs so every run starts from a clean tree.

use filemill::core::discovery::Input;
use filemill::core::engine::{self, EngineOptions};
use filemill::core::model::{ExecutionMode, FileType, Status};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// Helpers
// =============================================================================

const CSV_HEADER: &str = "fecha,producto,categoria,precio_unitario,cantidad,descuento";

fn options(mode: ExecutionMode) -> EngineOptions {
    EngineOptions {
        mode,
        retry_delay_ms: 0,
        show_progress: false,
        ..Default::default()
    }
}

/// A 30-row sales file with known aggregate figures:
/// quantity sums to 171, totals sum to ~24400.
fn write_sales_csv(dir: &TempDir, name: &str) -> PathBuf {
    let mut content = format!("{CSV_HEADER}\n");
    for i in 0..30 {
        let (price, quantity) = if i < 29 { (100.0, 5) } else { (380.77, 26) };
        content.push_str(&format!(
            "2024-03-{:02},Product{},Category{},{price},{quantity},0\n",
            i % 28 + 1,
            i % 7,
            i % 3,
        ));
    }
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write sales fixture");
    path
}

fn write_valid_log(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(
        &path,
        "2024-03-01 09:15:00 [INFO] [auth] User login ok\n\
         2024-03-01 09:16:30 [WARN] [auth] Slow response\n\
         2024-03-01 21:00:00 [ERROR] [db] Connection timeout after 30s\n",
    )
    .expect("write log fixture");
    path
}

fn write_valid_json(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(
        &path,
        r#"{
            "usuarios": [
                {"id": 1, "nombre": "Ana", "email": "ana@example.com", "activo": true},
                {"id": 2, "nombre": "Luis", "email": "luis@example.com", "activo": false}
            ],
            "sesiones": [
                {"usuario_id": 1, "inicio": "2024-03-01T09:15:00",
                 "duracion_segundos": 900, "paginas_visitadas": 4,
                 "acciones": ["login", "search"]}
            ]
        }"#,
    )
    .expect("write json fixture");
    path
}

fn write_valid_xml(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(
        &path,
        r#"<catalog>
            <metadata><generated>2024-03-01</generated><source>sync</source></metadata>
            <products>
                <product id="P1"><name>Widget</name><category>Tools</category>
                    <price currency="EUR">19.99</price><stock>5</stock>
                    <supplier>Acme</supplier></product>
            </products>
        </catalog>"#,
    )
    .expect("write xml fixture");
    path
}

/// One valid file of each type plus one malformed JSON.
fn mixed_tree() -> (TempDir, usize) {
    let dir = tempfile::tempdir().expect("tempdir");
    write_sales_csv(&dir, "sales.csv");
    write_valid_log(&dir, "app.log");
    write_valid_json(&dir, "activity.json");
    write_valid_xml(&dir, "catalog.xml");
    fs::write(dir.path().join("broken.json"), "{not valid json}").unwrap();
    (dir, 5)
}

// =============================================================================
// Universal invariants
// =============================================================================

/// Invariants 1-6: counter sums, status/metrics coupling, input ordering,
/// and ok(report) for any non-empty input — checked across both modes.
#[test]
fn e2e_universal_invariants_hold_in_both_modes() {
    let (dir, total) = mixed_tree();

    for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
        let report = engine::process_directory(dir.path(), &options(mode)).unwrap();

        assert_eq!(report.total_files, total);
        assert_eq!(report.results.len(), report.total_files);
        assert_eq!(
            report.success_count + report.error_count + report.partial_count,
            report.total_files
        );
        assert_eq!(
            report.csv_count + report.json_count + report.log_count + report.xml_count,
            report.total_files
        );

        for result in &report.results {
            match result.status {
                Status::Ok => {
                    assert!(!result.metrics.is_empty(), "{}", result.filename);
                    assert!(result.errors.is_empty(), "{}", result.filename);
                }
                Status::Error => {
                    assert!(result.metrics.is_empty(), "{}", result.filename);
                    assert!(!result.errors.is_empty(), "{}", result.filename);
                }
                Status::Partial => {
                    assert!(!result.metrics.is_empty(), "{}", result.filename);
                    assert!(!result.errors.is_empty(), "{}", result.filename);
                }
            }
        }

        // Directory discovery orders by (type, path); results must follow.
        let types: Vec<FileType> = report.results.iter().map(|r| r.file_type).collect();
        let mut sorted = types.clone();
        sorted.sort();
        assert_eq!(types, sorted, "results must be in discovery order");
    }
}

/// Property 7: sequential and parallel agree per file on status, metrics,
/// and errors.
#[test]
fn e2e_sequential_and_parallel_produce_identical_results() {
    let (dir, _) = mixed_tree();

    let seq = engine::process_directory(dir.path(), &options(ExecutionMode::Sequential)).unwrap();
    let par = engine::process_directory(dir.path(), &options(ExecutionMode::Parallel)).unwrap();

    assert_eq!(seq.total_files, par.total_files);
    for (s, p) in seq.results.iter().zip(&par.results) {
        assert_eq!(s.path, p.path);
        assert_eq!(s.status, p.status, "{}", s.filename);
        assert_eq!(s.metrics, p.metrics, "{}", s.filename);
        assert_eq!(s.errors, p.errors, "{}", s.filename);
        assert_eq!(s.lines_processed, p.lines_processed);
        assert_eq!(s.lines_failed, p.lines_failed);
    }
}

// =============================================================================
// Concrete scenarios
// =============================================================================

/// S1: a valid 30-row sales file.
#[test]
fn e2e_valid_csv_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_sales_csv(&dir, "sales.csv");

    let report = engine::process_file(&path, &options(ExecutionMode::Sequential)).unwrap();
    let result = &report.results[0];

    assert_eq!(result.status, Status::Ok);
    assert_eq!(result.metrics["total_records"], serde_json::json!(30));
    assert_eq!(result.metrics["total_quantity"], serde_json::json!(171));

    let total_sales = result.metrics["total_sales"].as_f64().unwrap();
    assert!(
        (total_sales - 24399.93).abs() <= 2.0,
        "total_sales {total_sales} out of tolerance"
    );

    let unique = result.metrics["unique_products"].as_u64().unwrap();
    assert!(unique > 0);
    assert_eq!(result.metrics["date_range"]["from"], "2024-03-01");
    assert_eq!(result.lines_processed, 30);
}

/// S2: a corrupt sales file fails as a whole, quoting offending rows.
#[test]
fn e2e_corrupt_csv_fails_whole_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut content = format!("{CSV_HEADER}\n");
    for i in 0..7 {
        content.push_str(&format!("2024-03-0{},Item{i},Cat,10.0,2,5\n", i % 9 + 1));
    }
    content.push_str("2024-03-08,Item,Cat,ERROR,2,5\n"); // bad price
    content.push_str("2024-03-09,Item,Cat,10.0,,5\n"); // empty quantity
    content.push_str("2024-03-10,Item,Cat,-4.0,2,5\n"); // negative price
    content.push_str("2024-03-11,Item,Cat,10.0,2,150\n"); // discount out of range
    let path = dir.path().join("corrupt.csv");
    fs::write(&path, content).unwrap();

    let report = engine::process_file(&path, &options(ExecutionMode::Sequential)).unwrap();
    let result = &report.results[0];

    assert_eq!(result.status, Status::Error);
    assert!(result.metrics.is_empty());
    let message = result.first_error().unwrap();
    for line in ["line 9", "line 10", "line 11"] {
        assert!(message.contains(line), "missing {line} in: {message}");
    }
}

/// S3: malformed JSON produces a single syntax error message.
#[test]
fn e2e_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{not valid json}").unwrap();

    let report = engine::process_file(&path, &options(ExecutionMode::Sequential)).unwrap();
    let result = &report.results[0];

    assert_eq!(result.status, Status::Error);
    assert_eq!(result.errors.len(), 1);
    assert!(result.first_error().unwrap().starts_with("Invalid JSON"));
}

/// S4: a log with one bad line among good ones is a partial result.
#[test]
fn e2e_partial_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    fs::write(
        &path,
        "2024-03-01 09:15:00 [INFO] [auth] ok\n\
         this line is bad\n\
         2024-03-01 10:00:00 [ERROR] [db] query failed\n",
    )
    .unwrap();

    let report = engine::process_file(&path, &options(ExecutionMode::Sequential)).unwrap();
    let result = &report.results[0];

    assert_eq!(result.status, Status::Partial);
    assert_eq!(result.metrics["total_entries"], serde_json::json!(2));
    assert_eq!(result.metrics["critical_errors_count"], serde_json::json!(1));
    assert_eq!(result.lines_failed, 1);
    assert_eq!(report.partial_count, 1);
}

/// S5: one bad file among ten never affects the other nine, and the output
/// stays in input order.
#[test]
fn e2e_parallel_failure_isolation() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = Vec::new();
    for i in 0..9 {
        paths.push(write_valid_log(&dir, &format!("ok{i}.log")));
    }
    let bad = dir.path().join("bad.json");
    fs::write(&bad, "{nope}").unwrap();
    paths.insert(4, bad);

    let report = engine::process_files(&paths, &options(ExecutionMode::Parallel)).unwrap();

    assert_eq!(report.results.len(), 10);
    assert_eq!(report.success_count, 9);
    assert_eq!(report.error_count, 1);
    for (result, path) in report.results.iter().zip(&paths) {
        assert_eq!(&result.path, path, "input order must be preserved");
    }
    assert_eq!(report.results[4].status, Status::Error);
}

/// S6: benchmark over seven small files produces a consistent comparison.
#[test]
fn e2e_benchmark_comparison() {
    let dir = tempfile::tempdir().unwrap();
    for i in 0..7 {
        write_valid_log(&dir, &format!("app{i}.log"));
    }

    let opts = EngineOptions {
        benchmark: true,
        ..options(ExecutionMode::Sequential)
    };
    let report = engine::process_directory(dir.path(), &opts).unwrap();

    assert_eq!(report.mode, ExecutionMode::Benchmark);
    let data = report.benchmark_data.as_ref().expect("benchmark data");

    assert_eq!(data.total_files, 7);
    assert_eq!(data.sequential.success_count, 7);
    assert_eq!(data.parallel.success_count, 7);
    assert!(data.comparison.speedup_factor >= 0.0);
    assert!(matches!(
        data.comparison.faster_mode,
        ExecutionMode::Sequential | ExecutionMode::Parallel
    ));
    let consistent = if data.parallel.duration_ms < data.sequential.duration_ms {
        data.comparison.faster_mode == ExecutionMode::Parallel
    } else {
        data.comparison.faster_mode == ExecutionMode::Sequential
    };
    assert!(consistent, "faster_mode must match measured durations");

    // Property 8: the report's results are the parallel arm's.
    assert_eq!(report.total_files, 7);
    assert_eq!(report.success_count, data.parallel.success_count);
    assert_eq!(report.total_duration_ms, data.parallel.duration_ms);
}

// =============================================================================
// Boundary behaviours
// =============================================================================

/// Boundary 9: an empty input list is the one top-level failure.
#[test]
fn e2e_empty_input_list_errors() {
    let result = engine::process_files(&[], &options(ExecutionMode::Parallel));
    let err = result.err().expect("empty list must error");
    assert_eq!(err.to_string(), "Engine error: No files to process");
}

/// Boundary 10: a single unsupported path yields a report with one
/// synthetic unknown/error entry.
#[test]
fn e2e_unsupported_file_becomes_synthetic_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.parquet");
    fs::write(&path, "binary").unwrap();

    let report =
        engine::process_files(&[path], &options(ExecutionMode::Parallel)).unwrap();
    assert_eq!(report.total_files, 1);
    assert_eq!(report.results[0].file_type, FileType::Unknown);
    assert_eq!(report.results[0].status, Status::Error);
    assert_eq!(report.error_count, 1);
}

/// Boundaries 11 and 12: worker and timeout clamps applied end to end.
#[test]
fn e2e_option_clamps_do_not_break_processing() {
    let dir = tempfile::tempdir().unwrap();
    write_valid_log(&dir, "app.log");

    let opts = EngineOptions {
        max_workers: 0,
        timeout_ms: 1,
        ..options(ExecutionMode::Parallel)
    };
    let report = engine::process_directory(dir.path(), &opts).unwrap();
    assert_eq!(report.success_count, 1, "clamped run must still succeed");
}

/// Mixed directory and list inputs agree on per-file outcomes.
#[test]
fn e2e_explicit_list_matches_directory_scan() {
    let (dir, _) = mixed_tree();
    let report_dir =
        engine::process_directory(dir.path(), &options(ExecutionMode::Sequential)).unwrap();

    let list: Vec<PathBuf> = report_dir.results.iter().map(|r| r.path.clone()).collect();
    let report_list =
        engine::process_files(&list, &options(ExecutionMode::Sequential)).unwrap();

    assert_eq!(report_dir.total_files, report_list.total_files);
    for (d, l) in report_dir.results.iter().zip(&report_list.results) {
        assert_eq!(d.status, l.status);
        assert_eq!(d.metrics, l.metrics);
    }
    assert_eq!(report_list.directory, None, "list input has no directory");
}

/// The report cache round-trips engine output for the web collaborator.
#[test]
fn e2e_report_survives_cache_round_trip() {
    use filemill::cache::ReportCache;

    let (dir, _) = mixed_tree();
    let report =
        engine::process_directory(dir.path(), &options(ExecutionMode::Parallel)).unwrap();

    let cache = ReportCache::new();
    let id = cache.insert(report.clone());
    let fetched = cache.get(&id).expect("fresh report must hit");

    assert_eq!(fetched.total_files, report.total_files);
    assert_eq!(fetched.success_count, report.success_count);
    assert_eq!(fetched.results.len(), report.results.len());
}

/// The text renderer accepts any engine output and writes a file.
#[test]
fn e2e_render_report_to_disk() {
    use filemill::core::render;

    let (dir, _) = mixed_tree();
    let report =
        engine::process_directory(dir.path(), &options(ExecutionMode::Parallel)).unwrap();

    let out_dir = dir.path().join("reports");
    let path = render::generate_and_save(&report, &out_dir).unwrap();
    let content = fs::read_to_string(&path).unwrap();

    assert!(content.contains("EXECUTIVE SUMMARY"));
    assert!(content.contains("ERRORS & WARNINGS"));
    assert!(content.contains("broken.json"));
}

/// Directory input variant of the facade input enum resolves correctly.
#[test]
fn e2e_input_enum_directory_accessor() {
    let input = Input::Directory(PathBuf::from("/data"));
    assert_eq!(input.directory(), Some(std::path::Path::new("/data")));
    assert_eq!(Input::Files(vec![]).directory(), None);
}
