// FileMill - core/discovery.rs
//
// Input normalisation and classification.
//
// An input is a directory, a single file, or an explicit file list; the
// output is always the same shape: classified (type, path) pairs plus a
// skipped list with per-path reasons. Extension is the sole classifier —
// file content is never sniffed here.
//
// Per-entry I/O problems are non-fatal: they land in `skipped` and the walk
// continues. The only fatal outcome is a directory that yields nothing.

use crate::core::model::FileType;
use crate::util::error::DiscoveryError;
use std::path::{Path, PathBuf};

// =============================================================================
// Input
// =============================================================================

/// The three accepted input shapes.
#[derive(Debug, Clone)]
pub enum Input {
    /// Recursively scan a directory for supported files.
    Directory(PathBuf),

    /// Process a single file.
    File(PathBuf),

    /// Process an explicit list of files, preserving the given order.
    Files(Vec<PathBuf>),
}

impl Input {
    /// The directory associated with this input, recorded on the report.
    pub fn directory(&self) -> Option<&Path> {
        match self {
            Input::Directory(path) => Some(path),
            _ => None,
        }
    }
}

// =============================================================================
// Discovery result
// =============================================================================

/// Classified inputs ready for the execution mode, plus everything that was
/// refused with a human-readable reason.
#[derive(Debug, Clone, Default)]
pub struct Discovered {
    /// `(type, path)` pairs in canonical input order.
    pub files: Vec<(FileType, PathBuf)>,

    /// Refused inputs as `(path, reason)` pairs.
    pub skipped: Vec<(PathBuf, String)>,
}

// =============================================================================
// Discovery
// =============================================================================

/// Normalise `input` into a classified file list.
///
/// Directory inputs are walked recursively; results are sorted by
/// `(type, path)` so runs over the same tree are deterministic. File and
/// list inputs preserve the caller's order.
///
/// Fails with `DiscoveryError::NoFiles` only when a directory scan produced
/// neither classified files nor skipped entries. File and list inputs never
/// fail: an unusable path becomes a skipped entry.
pub fn discover(input: &Input) -> Result<Discovered, DiscoveryError> {
    match input {
        Input::Directory(path) => discover_directory(path),
        Input::File(path) => {
            let mut discovered = Discovered::default();
            classify_file(path, &mut discovered);
            Ok(discovered)
        }
        Input::Files(paths) => {
            let mut discovered = Discovered::default();
            for path in paths {
                classify_file(path, &mut discovered);
            }
            Ok(discovered)
        }
    }
}

/// Recursively walk `root`, collecting every regular file with a supported
/// extension.
fn discover_directory(root: &Path) -> Result<Discovered, DiscoveryError> {
    if !root.exists() {
        return Err(DiscoveryError::InputNotFound {
            path: root.to_path_buf(),
        });
    }

    tracing::debug!(root = %root.display(), "Discovery starting");

    let mut discovered = Discovered::default();

    for entry_result in walkdir::WalkDir::new(root).follow_links(false) {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                // Inaccessible entry: record and continue.
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                let reason = format!("Cannot access: {e}");
                tracing::debug!(path = %path.display(), reason, "Discovery skip");
                discovered.skipped.push((path, reason));
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        match FileType::from_path(path) {
            Some(file_type) => discovered.files.push((file_type, path.to_path_buf())),
            // Unsupported extensions inside a scanned directory are ignored,
            // not skipped: the caller asked for "everything supported here".
            None => tracing::trace!(path = %path.display(), "Unsupported extension, ignoring"),
        }
    }

    // Deterministic ordering for directory scans.
    discovered.files.sort();

    if discovered.files.is_empty() && discovered.skipped.is_empty() {
        return Err(DiscoveryError::NoFiles {
            path: root.to_path_buf(),
        });
    }

    tracing::debug!(
        files = discovered.files.len(),
        skipped = discovered.skipped.len(),
        "Discovery complete"
    );

    Ok(discovered)
}

/// Classify a single explicit path into `files` or `skipped`.
fn classify_file(path: &Path, discovered: &mut Discovered) {
    if !path.exists() {
        discovered
            .skipped
            .push((path.to_path_buf(), "File not found".to_string()));
        return;
    }
    if !path.is_file() {
        discovered
            .skipped
            .push((path.to_path_buf(), "Not a regular file".to_string()));
        return;
    }
    match FileType::from_path(path) {
        Some(file_type) => discovered.files.push((file_type, path.to_path_buf())),
        None => {
            let ext = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_else(|| "no extension".to_string());
            discovered.skipped.push((
                path.to_path_buf(),
                format!("Unsupported file type ({ext})"),
            ));
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
