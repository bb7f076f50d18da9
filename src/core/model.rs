// FileMill - core/model.rs
//
// Core data model types. Pure data definitions with no I/O.
// These types are the shared vocabulary across discovery, parsing,
// metrics, execution modes, and reporting.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Metric maps use BTreeMap so serialised output has deterministic key order.
pub type Metrics = BTreeMap<String, serde_json::Value>;

// =============================================================================
// File type
// =============================================================================

/// The closed set of supported file formats, classified by extension.
///
/// `Unknown` is reserved for synthetic results attached for skipped inputs;
/// discovery never classifies a real file as `Unknown`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Json,
    Log,
    Xml,
    Unknown,
}

impl FileType {
    /// Classify a path by its extension (case-insensitive).
    /// Returns `None` for unsupported or missing extensions — content is
    /// never sniffed.
    pub fn from_path(path: &Path) -> Option<FileType> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(FileType::Csv),
            "json" => Some(FileType::Json),
            "log" => Some(FileType::Log),
            "xml" => Some(FileType::Xml),
            _ => None,
        }
    }

    /// Human-readable label for display and report sections.
    pub fn label(&self) -> &'static str {
        match self {
            FileType::Csv => "CSV",
            FileType::Json => "JSON",
            FileType::Log => "LOG",
            FileType::Xml => "XML",
            FileType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Status
// =============================================================================

/// Outcome of processing a single file.
///
/// `Partial` means the parser produced usable data AND per-line errors;
/// it is a first-class status counted separately from success and failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
    Partial,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::Error => "error",
            Status::Partial => "partial",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Per-file errors
// =============================================================================

/// A single error attached to a FileResult: either a free-text message or
/// a line-scoped `(line, message)` pair from a line-oriented parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultError {
    Message(String),
    Line { line: u64, message: String },
}

impl ResultError {
    /// The message text regardless of variant.
    pub fn message(&self) -> &str {
        match self {
            ResultError::Message(m) => m,
            ResultError::Line { message, .. } => message,
        }
    }
}

impl std::fmt::Display for ResultError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultError::Message(m) => f.write_str(m),
            ResultError::Line { line, message } => write!(f, "line {line}: {message}"),
        }
    }
}

// =============================================================================
// FileResult
// =============================================================================

/// The per-file unit of output produced by the processing pipeline.
///
/// Invariants (enforced by the processor's status normalisation):
///   - status = Ok      => errors empty, metrics non-empty
///   - status = Error   => metrics empty
///   - status = Partial => metrics AND errors both non-empty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// Full path to the source file.
    pub path: PathBuf,

    /// Base name of the source file.
    pub filename: String,

    /// Classified type (Unknown for synthetic skipped-input results).
    pub file_type: FileType,

    /// Processing outcome.
    pub status: Status,

    /// Format-specific metrics. Empty when status = Error.
    pub metrics: Metrics,

    /// Ordered error list.
    pub errors: Vec<ResultError>,

    /// Wall-clock time the pipeline spent on this file.
    pub duration_ms: u64,

    /// Records/entries successfully processed.
    pub lines_processed: u64,

    /// Parse-time line failures.
    pub lines_failed: u64,
}

impl FileResult {
    /// An empty shell for `path`, before parsing has run.
    pub fn new(path: &Path, file_type: FileType) -> Self {
        Self {
            path: path.to_path_buf(),
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_type,
            status: Status::Error,
            metrics: Metrics::new(),
            errors: Vec::new(),
            duration_ms: 0,
            lines_processed: 0,
            lines_failed: 0,
        }
    }

    /// A terminal error result carrying a single message.
    /// Used for synthetic results: skipped inputs, timeouts, worker crashes.
    pub fn error(path: &Path, file_type: FileType, message: impl Into<String>) -> Self {
        let mut result = Self::new(path, file_type);
        result.errors.push(ResultError::Message(message.into()));
        result
    }

    /// First error message, if any. Used by the retry classifier and the
    /// report renderer.
    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message())
    }
}

// =============================================================================
// Execution mode
// =============================================================================

/// How the classified input list is driven through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Sequential,
    #[default]
    Parallel,
    Benchmark,
}

impl ExecutionMode {
    pub fn label(&self) -> &'static str {
        match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::Parallel => "parallel",
            ExecutionMode::Benchmark => "benchmark",
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(ExecutionMode::Sequential),
            "parallel" => Ok(ExecutionMode::Parallel),
            "benchmark" => Ok(ExecutionMode::Benchmark),
            other => Err(format!(
                "unknown mode '{other}' (expected sequential, parallel, or benchmark)"
            )),
        }
    }
}

// =============================================================================
// Benchmark data
// =============================================================================

/// Measurements for one arm (sequential or parallel) of a benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub duration_ms: u64,
    pub duration_sec: f64,
    pub success_count: usize,
    pub error_count: usize,
    pub avg_time_per_file: f64,
    /// Peak-memory approximation: max(before, after) of process RSS, in KB.
    pub memory_kb: u64,
}

/// Head-to-head comparison of the two benchmark arms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    /// sequential_ms / parallel_ms, 2 dp. 0.0 when the parallel run took 0 ms.
    pub speedup_factor: f64,
    pub time_saved_ms: i64,
    pub time_saved_percent: f64,
    pub faster_mode: ExecutionMode,
}

/// Full benchmark record attached to the report in benchmark mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkData {
    pub total_files: usize,
    pub processes_used: usize,
    pub sequential: BenchmarkRun,
    pub parallel: BenchmarkRun,
    pub comparison: BenchmarkComparison,
}

// =============================================================================
// ExecutionReport
// =============================================================================

/// The aggregated result of processing a classified input list.
///
/// Invariants:
///   - total_files = results.len()
///   - success_count + error_count + partial_count = total_files
///   - per-type counters (plus Unknown entries) sum to total_files
///   - results is ordered by input index regardless of execution mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub mode: ExecutionMode,
    pub start_time: DateTime<Utc>,
    pub directory: Option<PathBuf>,

    pub total_files: usize,
    pub csv_count: usize,
    pub json_count: usize,
    pub log_count: usize,
    pub xml_count: usize,

    pub success_count: usize,
    pub error_count: usize,
    pub partial_count: usize,

    /// Wall-clock duration of the mode execution (parallel-run duration in
    /// benchmark mode).
    pub total_duration_ms: u64,

    pub results: Vec<FileResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_data: Option<BenchmarkData>,
}

// =============================================================================
// Domain records (parser outputs)
// =============================================================================

/// One validated row of a sales CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub date: NaiveDate,
    pub product: String,
    pub category: String,
    pub unit_price: f64,
    pub quantity: i64,
    /// Percentage in [0, 100].
    pub discount: f64,
    /// Derived: unit_price * quantity * (1 - discount/100).
    pub total: f64,
}

/// A registered user from an activity JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub active: bool,
    pub last_access: Option<String>,
}

/// One user session from an activity JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: i64,
    /// ISO timestamp string, verbatim from the document.
    pub start: Option<String>,
    pub duration_seconds: Option<f64>,
    pub pages_visited: Option<i64>,
    pub actions: Vec<String>,
}

/// Parsed activity document: the two required top-level collections.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserActivity {
    pub users: Vec<User>,
    pub sessions: Vec<Session>,
}

/// The closed set of log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    /// All variants in ascending severity order.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Fatal,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Parse an upper-case level token. Returns `None` for anything outside
    /// the closed set.
    pub fn parse(token: &str) -> Option<LogLevel> {
        match token {
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" => Some(LogLevel::Warn),
            "ERROR" => Some(LogLevel::Error),
            "FATAL" => Some(LogLevel::Fatal),
            _ => None,
        }
    }

    /// ERROR and FATAL entries count as critical in log metrics.
    pub fn is_critical(&self) -> bool {
        matches!(self, LogLevel::Error | LogLevel::Fatal)
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One parsed log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub level: LogLevel,
    pub component: String,
    pub message: String,
    /// Hour of day in [0, 23], extracted from the timestamp.
    pub hour: u32,
}

/// Catalog document header metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CatalogMetadata {
    pub generated: Option<String>,
    pub source: Option<String>,
}

/// One product node of a catalog document.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub currency: String,
    pub stock: i64,
    pub supplier: String,
}

/// Parsed product catalog.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Catalog {
    pub metadata: CatalogMetadata,
    pub products: Vec<Product>,
    pub total_products: usize,
    pub total_stock: i64,
    /// Distinct categories in first-occurrence order.
    pub categories: Vec<String>,
}

// =============================================================================
// Tests
// =============================================================================
