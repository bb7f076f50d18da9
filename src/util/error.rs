// FileMill - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation between subsystems; per-file failures
// never surface here — they live inside FileResult (see core::model).
// These types cover the few operations that can fail outright: discovery
// of an empty directory, invalid engine options, and report rendering.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all FileMill operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum FileMillError {
    /// Input discovery failed.
    Discovery(DiscoveryError),

    /// Engine facade rejected the run before any file was processed.
    Engine(EngineError),

    /// Report rendering or export failed.
    Render(RenderError),
}

impl fmt::Display for FileMillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Engine(e) => write!(f, "Engine error: {e}"),
            Self::Render(e) => write!(f, "Render error: {e}"),
        }
    }
}

impl std::error::Error for FileMillError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Discovery(e) => Some(e),
            Self::Engine(e) => Some(e),
            Self::Render(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to input discovery and classification.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The input path does not exist.
    InputNotFound { path: PathBuf },

    /// A directory scan found zero supported files and nothing to skip.
    NoFiles { path: PathBuf },

    /// Directory traversal failed at the root (per-entry failures are
    /// collected as skipped inputs instead).
    Traversal {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputNotFound { path } => {
                write!(f, "Input path '{}' does not exist", path.display())
            }
            Self::NoFiles { path } => {
                write!(
                    f,
                    "No supported files found under '{}' (looking for .csv, .json, .log, .xml)",
                    path.display()
                )
            }
            Self::Traversal { path, source } => {
                write!(f, "Error traversing '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Traversal { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for FileMillError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Engine errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the engine facade before processing starts.
/// Once at least one input is classified (or skipped), the engine always
/// returns an ExecutionReport — individual failures are per-file results.
#[derive(Debug)]
pub enum EngineError {
    /// The classified input list is empty and nothing was skipped.
    NoFiles,

    /// An option value failed validation.
    InvalidOption {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFiles => write!(f, "No files to process"),
            Self::InvalidOption {
                field,
                value,
                expected,
            } => write!(
                f,
                "Option '{field}' = '{value}' is invalid. Expected: {expected}"
            ),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<EngineError> for FileMillError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

// ---------------------------------------------------------------------------
// Render errors
// ---------------------------------------------------------------------------

/// Errors related to writing the text or JSON report.
#[derive(Debug)]
pub enum RenderError {
    /// I/O error writing the report file.
    Io { path: PathBuf, source: io::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Report I/O error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "Report JSON error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<RenderError> for FileMillError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}

/// Convenience type alias for FileMill results.
pub type Result<T> = std::result::Result<T, FileMillError>;
