// FileMill - core/parse/mod.rs
//
// Format parsers. Each parser is a pure function from a path to a
// ParseOutcome: it reads the whole file, validates against its schema,
// and never panics or propagates an error to the caller.

pub mod activity_json;
pub mod app_log;
pub mod catalog_xml;
pub mod sales_csv;

use crate::core::model::{Catalog, FileType, LogEntry, Sale, UserActivity};
use std::path::Path;

// =============================================================================
// Outcome types
// =============================================================================

/// A parse failure scoped to one line of a line-oriented file.
#[derive(Debug, Clone, PartialEq)]
pub struct LineError {
    pub line: u64,
    pub message: String,
}

impl LineError {
    pub fn new(line: u64, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Result of parsing one file.
///
/// `Partial` carries both usable data and the per-line failures that were
/// tolerated while producing it; only the log parser emits it. The other
/// formats are all-or-nothing by policy.
#[derive(Debug)]
pub enum ParseOutcome<T> {
    Ok(T),
    Partial(T, Vec<LineError>),
    Error(String),
}

impl<T> ParseOutcome<T> {
    /// Map the payload, preserving the outcome tag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ParseOutcome<U> {
        match self {
            ParseOutcome::Ok(data) => ParseOutcome::Ok(f(data)),
            ParseOutcome::Partial(data, errors) => ParseOutcome::Partial(f(data), errors),
            ParseOutcome::Error(reason) => ParseOutcome::Error(reason),
        }
    }
}

/// Parsed payload, tagged by format. Consumed exactly once by the matching
/// metrics function.
#[derive(Debug)]
pub enum ParsedData {
    Sales(Vec<Sale>),
    Activity(UserActivity),
    Log(Vec<LogEntry>),
    Catalog(Catalog),
}

// =============================================================================
// Dispatch
// =============================================================================

/// Dispatch to the parser for `file_type`.
///
/// `FileType::Unknown` never reaches here in normal operation (discovery
/// refuses such inputs); it maps to an error outcome for completeness.
pub fn parse_file(file_type: FileType, path: &Path) -> ParseOutcome<ParsedData> {
    match file_type {
        FileType::Csv => sales_csv::parse(path).map(ParsedData::Sales),
        FileType::Json => activity_json::parse(path).map(ParsedData::Activity),
        FileType::Log => app_log::parse(path).map(ParsedData::Log),
        FileType::Xml => catalog_xml::parse(path).map(ParsedData::Catalog),
        FileType::Unknown => ParseOutcome::Error(format!(
            "No parser for unclassified file '{}'",
            path.display()
        )),
    }
}

/// Read a file to a string, mapping any I/O failure to the canonical
/// transient-error message shape shared by all parsers.
pub(crate) fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {e}", path.display()))
}
