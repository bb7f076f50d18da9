// FileMill - core/render.rs
//
// Report formatter collaborator: writes the fixed-width human-readable
// report and the JSON export. The engine itself never calls this; callers
// feed it a finished ExecutionReport.

use crate::core::model::{ExecutionReport, FileType, Status};
use crate::util::constants::{APP_NAME, APP_VERSION, REPORT_WIDTH};
use crate::util::error::RenderError;
use std::path::{Path, PathBuf};

/// Render the report and save it under `output_dir`, creating the
/// directory as needed. Returns the written file's path.
pub fn generate_and_save(
    report: &ExecutionReport,
    output_dir: &Path,
) -> Result<PathBuf, RenderError> {
    let text = render(report);
    let filename = format!(
        "report_{}.txt",
        report.start_time.format("%Y%m%d_%H%M%S")
    );
    let path = output_dir.join(filename);

    std::fs::create_dir_all(output_dir).map_err(|e| RenderError::Io {
        path: output_dir.to_path_buf(),
        source: e,
    })?;
    std::fs::write(&path, text).map_err(|e| RenderError::Io {
        path: path.clone(),
        source: e,
    })?;

    tracing::info!(path = %path.display(), "Text report written");
    Ok(path)
}

/// Serialise the report to pretty JSON next to the text report.
pub fn save_json(report: &ExecutionReport, output_dir: &Path) -> Result<PathBuf, RenderError> {
    let filename = format!(
        "report_{}.json",
        report.start_time.format("%Y%m%d_%H%M%S")
    );
    let path = output_dir.join(filename);

    std::fs::create_dir_all(output_dir).map_err(|e| RenderError::Io {
        path: output_dir.to_path_buf(),
        source: e,
    })?;
    let json = serde_json::to_string_pretty(report).map_err(|e| RenderError::Json {
        path: path.clone(),
        source: e,
    })?;
    std::fs::write(&path, json).map_err(|e| RenderError::Io {
        path: path.clone(),
        source: e,
    })?;

    tracing::info!(path = %path.display(), "JSON report written");
    Ok(path)
}

// =============================================================================
// Rendering
// =============================================================================

/// Render the full 80-column report.
pub fn render(report: &ExecutionReport) -> String {
    let mut out = String::new();

    header(&mut out, report);
    metadata(&mut out, report);
    executive_summary(&mut out, report);
    for file_type in [FileType::Csv, FileType::Json, FileType::Log, FileType::Xml] {
        metrics_block(&mut out, report, file_type);
    }
    performance(&mut out, report);
    errors_and_warnings(&mut out, report);
    footer(&mut out);

    out
}

fn rule(out: &mut String, ch: char) {
    out.push_str(&ch.to_string().repeat(REPORT_WIDTH));
    out.push('\n');
}

fn centered(out: &mut String, text: &str) {
    let pad = REPORT_WIDTH.saturating_sub(text.len()) / 2;
    out.push_str(&" ".repeat(pad));
    out.push_str(text);
    out.push('\n');
}

fn section(out: &mut String, title: &str) {
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    rule(out, '-');
}

/// Wrap `text` at the report width with a left indent, breaking on spaces
/// where possible.
fn wrapped(out: &mut String, text: &str, indent: usize) {
    let width = REPORT_WIDTH.saturating_sub(indent).max(10);
    let pad = " ".repeat(indent);
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        // Hard-split words longer than a full line.
        while word.len() > width {
            if !line.is_empty() {
                out.push_str(&format!("{pad}{line}\n"));
                line.clear();
            }
            out.push_str(&format!("{pad}{}\n", &word[..width]));
            word = &word[width..];
        }
        if line.is_empty() {
            line.push_str(word);
        } else if line.len() + 1 + word.len() <= width {
            line.push(' ');
            line.push_str(word);
        } else {
            out.push_str(&format!("{pad}{line}\n"));
            line = word.to_string();
        }
    }
    if !line.is_empty() {
        out.push_str(&format!("{pad}{line}\n"));
    }
}

fn header(out: &mut String, report: &ExecutionReport) {
    rule(out, '=');
    centered(out, &format!("{APP_NAME} EXECUTION REPORT"));
    centered(out, &format!("mode: {}", report.mode));
    rule(out, '=');
}

fn metadata(out: &mut String, report: &ExecutionReport) {
    section(out, "METADATA");
    out.push_str(&format!(
        "Started:       {}\n",
        report.start_time.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(dir) = &report.directory {
        out.push_str(&format!("Directory:     {}\n", dir.display()));
    }
    out.push_str(&format!("Engine:        {APP_NAME} v{APP_VERSION}\n"));
}

fn executive_summary(out: &mut String, report: &ExecutionReport) {
    section(out, "EXECUTIVE SUMMARY");
    out.push_str(&format!("Files processed:  {}\n", report.total_files));
    out.push_str(&format!(
        "By type:          csv {} | json {} | log {} | xml {}\n",
        report.csv_count, report.json_count, report.log_count, report.xml_count
    ));
    out.push_str(&format!(
        "By status:        ok {} | partial {} | error {}\n",
        report.success_count, report.partial_count, report.error_count
    ));
    out.push_str(&format!(
        "Total duration:   {} ms\n",
        report.total_duration_ms
    ));
}

fn metrics_block(out: &mut String, report: &ExecutionReport, file_type: FileType) {
    let files: Vec<_> = report
        .results
        .iter()
        .filter(|r| r.file_type == file_type && !r.metrics.is_empty())
        .collect();
    if files.is_empty() {
        return;
    }

    section(out, &format!("{} METRICS", file_type.label()));
    for result in files {
        out.push_str(&format!(
            "{} [{}] ({} ms)\n",
            result.filename, result.status, result.duration_ms
        ));
        for (key, value) in &result.metrics {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            wrapped(out, &format!("{key}: {rendered}"), 2);
        }
        out.push('\n');
    }
}

fn performance(out: &mut String, report: &ExecutionReport) {
    section(out, "PERFORMANCE ANALYSIS");
    let processed: u64 = report.results.iter().map(|r| r.duration_ms).sum();
    out.push_str(&format!("Cumulative file time:  {processed} ms\n"));
    out.push_str(&format!(
        "Wall-clock duration:   {} ms\n",
        report.total_duration_ms
    ));

    if let Some(bench) = &report.benchmark_data {
        out.push_str(&format!(
            "Sequential arm:        {} ms ({} ok, {} errors, {} KB)\n",
            bench.sequential.duration_ms,
            bench.sequential.success_count,
            bench.sequential.error_count,
            bench.sequential.memory_kb
        ));
        out.push_str(&format!(
            "Parallel arm:          {} ms ({} ok, {} errors, {} KB)\n",
            bench.parallel.duration_ms,
            bench.parallel.success_count,
            bench.parallel.error_count,
            bench.parallel.memory_kb
        ));
        out.push_str(&format!(
            "Speedup:               {:.2}x, {} ms saved ({:.1}%), faster: {}\n",
            bench.comparison.speedup_factor,
            bench.comparison.time_saved_ms,
            bench.comparison.time_saved_percent,
            bench.comparison.faster_mode
        ));
    }
}

fn errors_and_warnings(out: &mut String, report: &ExecutionReport) {
    let failed: Vec<_> = report
        .results
        .iter()
        .filter(|r| r.status != Status::Ok)
        .collect();

    section(out, "ERRORS & WARNINGS");
    if failed.is_empty() {
        out.push_str("None.\n");
        return;
    }
    for result in failed {
        out.push_str(&format!("{} [{}]\n", result.filename, result.status));
        if let Some(message) = result.first_error() {
            wrapped(out, message, 2);
        }
    }
}

fn footer(out: &mut String) {
    out.push('\n');
    rule(out, '=');
    centered(out, &format!("generated by {APP_NAME} v{APP_VERSION}"));
    rule(out, '=');
}

// =============================================================================
// Tests
// =============================================================================
