// FileMill - core/parse/app_log.rs
//
// Line-oriented log parser. Unlike the CSV and JSON parsers this one is
// tolerant: bad lines are collected per-line and good lines still count,
// producing a Partial outcome. Only a file with zero parseable lines is a
// hard error.

use crate::core::model::{LogEntry, LogLevel};
use crate::core::parse::{read_file, LineError, ParseOutcome};
use chrono::NaiveDateTime;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Line shape: `YYYY-MM-DD  HH:MM:SS  [LEVEL]  [COMPONENT]  message`.
/// Level membership and timestamp validity are checked after capture so the
/// failure reason can name the exact offending field.
fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2})\s+(\d{2}:\d{2}:\d{2})\s+\[(\w+)\]\s+\[([^\]]+)\]\s+(.+)$")
            .expect("app_log: invalid line pattern")
    })
}

/// Parse a log file.
///
/// Empty lines are skipped. Returns:
///   - `Ok(entries)` when every non-empty line parsed,
///   - `Partial(entries, errors)` when at least one line parsed and at
///     least one failed,
///   - `Error(first failure)` when no line parsed at all.
pub fn parse(path: &Path) -> ParseOutcome<Vec<LogEntry>> {
    let content = match read_file(path) {
        Ok(c) => c,
        Err(reason) => return ParseOutcome::Error(reason),
    };

    let mut entries = Vec::new();
    let mut errors: Vec<LineError> = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_number = idx as u64 + 1;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(entry) => entries.push(entry),
            Err(reason) => errors.push(LineError::new(line_number, reason)),
        }
    }

    tracing::debug!(
        file = %path.display(),
        entries = entries.len(),
        errors = errors.len(),
        "Log parsed"
    );

    // Two-arm policy: a file where nothing matched is an error carrying the
    // first failure; a file where something matched is ok or partial.
    if entries.is_empty() {
        return match errors.first() {
            Some(first) => ParseOutcome::Error(format!(
                "line {}: {}",
                first.line, first.message
            )),
            None => ParseOutcome::Error("Log file is empty".to_string()),
        };
    }
    if errors.is_empty() {
        ParseOutcome::Ok(entries)
    } else {
        ParseOutcome::Partial(entries, errors)
    }
}

/// Parse one non-empty line into a LogEntry.
fn parse_line(line: &str) -> Result<LogEntry, String> {
    let caps = line_pattern()
        .captures(line.trim_end())
        .ok_or("line does not match expected log format")?;

    let level_token = &caps[3];
    let level = LogLevel::parse(level_token)
        .ok_or_else(|| format!("unknown level '{level_token}'"))?;

    // chrono rejects out-of-range fields (hour 24, month 13, ...) here.
    let raw_ts = format!("{} {}", &caps[1], &caps[2]);
    let timestamp = NaiveDateTime::parse_from_str(&raw_ts, "%Y-%m-%d %H:%M:%S")
        .map_err(|_| format!("invalid timestamp '{raw_ts}'"))?;

    use chrono::Timelike;
    Ok(LogEntry {
        hour: timestamp.hour(),
        timestamp,
        level,
        component: caps[4].to_string(),
        message: caps[5].to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
