// FileMill - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.
// Every configurable knob in the engine references a constant here so the
// bounds are auditable in one place.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "FileMill";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Discovery
// =============================================================================

/// File extensions (lower-case, without dot) the engine knows how to process.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "json", "log", "xml"];

// =============================================================================
// Execution
// =============================================================================

/// Default worker-pool size for parallel mode.
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Multiplier applied to available cores for the worker-pool upper clamp.
pub const WORKERS_PER_CORE_CAP: usize = 2;

/// Fallback core count when `available_parallelism` cannot be determined.
pub const FALLBACK_CORES: usize = 4;

/// Default per-file deadline in parallel and benchmark modes (ms).
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Lower clamp for the per-file deadline (ms). Values below this are raised;
/// the web collaborator relies on this floor.
pub const MIN_TIMEOUT_MS: u64 = 1_000;

// =============================================================================
// Retry policy
// =============================================================================

/// Default total attempt cap per file (first attempt included).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between retry attempts (ms).
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

/// Hard cap on a single backoff sleep (ms), regardless of attempt count.
pub const MAX_BACKOFF_MS: u64 = 5_000;

/// Case-insensitive substrings that mark an error message as transient.
pub const RETRYABLE_PATTERNS: &[&str] = &[
    "failed to read",
    "timeout",
    "timed out",
    "processing timeout",
    "worker process crashed",
    "killed",
    "exit:",
];

/// Case-insensitive substrings that mark an error message as permanent,
/// overriding any transient match. Schema and validation failures are
/// never retried.
pub const PERMANENT_PATTERNS: &[&str] = &["validation", "invalid"];

// =============================================================================
// Parsing
// =============================================================================

/// Expected CSV header for sales files (compared case-insensitively).
pub const SALES_CSV_HEADER: &[&str] = &[
    "fecha",
    "producto",
    "categoria",
    "precio_unitario",
    "cantidad",
    "descuento",
];

/// Number of failing rows quoted in a CSV validation error message.
pub const CSV_ERROR_SAMPLE_ROWS: usize = 3;

/// Maximum length of a log message retained in the frequent-errors metric.
pub const ERROR_MESSAGE_TRUNCATE_LEN: usize = 100;

// =============================================================================
// Metrics
// =============================================================================

/// Number of entries reported by top-N metrics (actions, errors, suppliers).
pub const TOP_N: usize = 5;

/// Number of classified error patterns reported for log files.
pub const TOP_ERROR_PATTERNS: usize = 3;

/// Stock level at or below which a product counts as low-stock (exclusive
/// of zero: out-of-stock items are not "low stock").
pub const LOW_STOCK_THRESHOLD: i64 = 10;

// =============================================================================
// Report cache
// =============================================================================

/// How long a cached report stays retrievable (seconds). 1 hour.
pub const CACHE_TTL_SECS: u64 = 3_600;

/// Interval between background sweeps of expired cache entries (seconds).
/// 15 minutes.
pub const CACHE_SWEEP_INTERVAL_SECS: u64 = 900;

/// How often the sweeper thread checks its cancel flag within a sleep
/// interval (ms). Keeps shutdown latency low without busy-waiting.
pub const CACHE_SWEEP_CANCEL_CHECK_MS: u64 = 200;

/// Number of random bytes in a report identifier (before base64 encoding).
pub const REPORT_ID_BYTES: usize = 16;

// =============================================================================
// Report rendering
// =============================================================================

/// Column width of the generated text report.
pub const REPORT_WIDTH: usize = 80;

/// Default directory where text reports are written.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
