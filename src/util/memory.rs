// FileMill - util/memory.rs
//
// Best-effort process memory sampling for the benchmark memory indicator.
// The value is a coarse peak approximation, not an accounting figure: the
// benchmark samples before and after each run and reports the maximum.

/// Resident set size of the current process in bytes.
///
/// Linux: parsed from `/proc/self/statm` (resident pages x page size).
/// Other platforms: returns 0 — the benchmark then reports `memory_kb = 0`,
/// which callers must treat as "not measured" rather than "no memory".
pub fn process_rss_bytes() -> u64 {
    #[cfg(target_os = "linux")]
    {
        // statm fields: size resident shared text lib data dt (in pages)
        if let Ok(statm) = std::fs::read_to_string("/proc/self/statm") {
            if let Some(resident) = statm.split_whitespace().nth(1) {
                if let Ok(pages) = resident.parse::<u64>() {
                    return pages * 4096;
                }
            }
        }
        0
    }

    #[cfg(not(target_os = "linux"))]
    {
        0
    }
}

/// Resident set size in kilobytes, as reported in benchmark data.
pub fn process_rss_kb() -> u64 {
    process_rss_bytes() / 1024
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The sample must never be negative-equivalent (u64) and on Linux
    /// a running test process always has resident pages.
    #[test]
    fn test_rss_sample_is_plausible() {
        let kb = process_rss_kb();
        #[cfg(target_os = "linux")]
        assert!(kb > 0, "a live process should have a nonzero RSS, got {kb}");
        #[cfg(not(target_os = "linux"))]
        assert_eq!(kb, 0);
    }
}
