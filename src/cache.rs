// FileMill - cache.rs
//
// TTL report cache for the web collaborator: a report is stored under a
// short random identifier at upload time and fetched by later GETs until
// its age exceeds the TTL. Expired entries are evicted lazily on lookup
// and eagerly by a periodic background sweep.

use crate::core::model::ExecutionReport;
use crate::util::constants::{
    CACHE_SWEEP_CANCEL_CHECK_MS, CACHE_SWEEP_INTERVAL_SECS, CACHE_TTL_SECS, REPORT_ID_BYTES,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

// =============================================================================
// Cache
// =============================================================================

struct Entry {
    stored_at: Instant,
    report: ExecutionReport,
}

/// Occupancy snapshot returned by `stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
}

/// In-memory report store with age-based eviction.
///
/// Thread-safe: the web front-end writes from upload handlers and reads
/// from report GETs concurrently.
pub struct ReportCache {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportCache {
    /// Cache with the default 1 hour TTL.
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(CACHE_TTL_SECS))
    }

    /// Cache with a custom TTL (tests use milliseconds).
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// A fresh URL-safe report identifier: 16 random bytes, base64 without
    /// padding (~22 characters).
    pub fn generate_id() -> String {
        let mut bytes = [0u8; REPORT_ID_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Store `report` under `report_id`, stamped with the current time.
    /// An existing entry under the same id is replaced and its age reset.
    pub fn put(&self, report_id: &str, report: ExecutionReport) {
        self.lock().insert(
            report_id.to_string(),
            Entry {
                stored_at: Instant::now(),
                report,
            },
        );
        tracing::debug!(report_id, "Report cached");
    }

    /// Store `report` under a newly generated id and return it.
    pub fn insert(&self, report: ExecutionReport) -> String {
        let report_id = Self::generate_id();
        self.put(&report_id, report);
        report_id
    }

    /// Fetch a report. A miss is returned both for unknown ids and for
    /// entries past the TTL; the latter are evicted as a side effect.
    pub fn get(&self, report_id: &str) -> Option<ExecutionReport> {
        let mut entries = self.lock();
        match entries.get(report_id) {
            Some(entry) if entry.stored_at.elapsed() <= self.ttl => {
                Some(entry.report.clone())
            }
            Some(_) => {
                entries.remove(report_id);
                tracing::debug!(report_id, "Expired report evicted on lookup");
                None
            }
            None => None,
        }
    }

    /// Occupancy counts. `expired` entries are those a sweep would remove.
    pub fn stats(&self) -> CacheStats {
        let entries = self.lock();
        let total = entries.len();
        let active = entries
            .values()
            .filter(|e| e.stored_at.elapsed() <= self.ttl)
            .count();
        CacheStats {
            total,
            active,
            expired: total - active,
        }
    }

    /// Remove every expired entry; returns how many were evicted.
    pub fn sweep(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| e.stored_at.elapsed() <= self.ttl);
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, remaining = entries.len(), "Cache swept");
        }
        evicted
    }

    // A poisoned mutex means a panic mid-insert on another thread; the map
    // itself is still structurally sound, so keep serving.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// =============================================================================
// Background sweeper
// =============================================================================

/// Handle for the periodic sweep thread. Dropping it stops the thread.
pub struct SweeperGuard {
    cancel: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Drop for SweeperGuard {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Spawn a sweep thread that calls `cache.sweep()` every
/// `CACHE_SWEEP_INTERVAL_SECS`. The cancel flag is checked at a short
/// sub-interval so shutdown does not wait out a full sweep period.
pub fn start_sweeper(cache: Arc<ReportCache>) -> SweeperGuard {
    start_sweeper_with_interval(cache, Duration::from_secs(CACHE_SWEEP_INTERVAL_SECS))
}

/// Sweeper with a custom interval (tests use milliseconds).
pub fn start_sweeper_with_interval(
    cache: Arc<ReportCache>,
    interval: Duration,
) -> SweeperGuard {
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_flag = Arc::clone(&cancel);

    let handle = thread::Builder::new()
        .name("filemill-cache-sweeper".to_string())
        .spawn(move || {
            let check = Duration::from_millis(CACHE_SWEEP_CANCEL_CHECK_MS);
            loop {
                let mut slept = Duration::ZERO;
                while slept < interval {
                    if cancel_flag.load(Ordering::Relaxed) {
                        return;
                    }
                    let step = check.min(interval - slept);
                    thread::sleep(step);
                    slept += step;
                }
                cache.sweep();
            }
        })
        .ok();

    SweeperGuard { cancel, handle }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::ExecutionMode;
    use chrono::Utc;

    fn sample_report() -> ExecutionReport {
        ExecutionReport {
            mode: ExecutionMode::Sequential,
            start_time: Utc::now(),
            directory: None,
            total_files: 0,
            csv_count: 0,
            json_count: 0,
            log_count: 0,
            xml_count: 0,
            success_count: 0,
            error_count: 0,
            partial_count: 0,
            total_duration_ms: 0,
            results: vec![],
            benchmark_data: None,
        }
    }

    #[test]
    fn test_generated_ids_are_url_safe_and_unique() {
        let a = ReportCache::generate_id();
        let b = ReportCache::generate_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 22, "16 bytes base64 no-pad is 22 chars");
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_put_then_get_round_trips() {
        let cache = ReportCache::new();
        let id = cache.insert(sample_report());
        let fetched = cache.get(&id).expect("fresh entry must hit");
        assert_eq!(fetched.mode, ExecutionMode::Sequential);
    }

    #[test]
    fn test_unknown_id_is_miss() {
        let cache = ReportCache::new();
        assert!(cache.get("does-not-exist").is_none());
    }

    #[test]
    fn test_expired_entry_misses_and_is_evicted() {
        let cache = ReportCache::with_ttl(Duration::from_millis(10));
        let id = cache.insert(sample_report());
        thread::sleep(Duration::from_millis(30));

        assert!(cache.get(&id).is_none(), "aged-out entry must miss");
        // Eviction happened as a side effect of the lookup.
        assert_eq!(cache.stats().total, 0);
    }

    #[test]
    fn test_stats_counts_active_and_expired() {
        let cache = ReportCache::with_ttl(Duration::from_millis(40));
        cache.insert(sample_report());
        thread::sleep(Duration::from_millis(60));
        cache.insert(sample_report());

        let stats = cache.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.expired, 1);
    }

    #[test]
    fn test_sweep_removes_only_expired_entries() {
        let cache = ReportCache::with_ttl(Duration::from_millis(40));
        cache.insert(sample_report());
        thread::sleep(Duration::from_millis(60));
        let keep = cache.insert(sample_report());

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.stats().total, 1);
        assert!(cache.get(&keep).is_some());
    }

    #[test]
    fn test_put_same_id_resets_age() {
        let cache = ReportCache::with_ttl(Duration::from_millis(300));
        let id = cache.insert(sample_report());
        thread::sleep(Duration::from_millis(200));
        cache.put(&id, sample_report());
        thread::sleep(Duration::from_millis(200));
        // 400ms after the first insert but only 200ms after the refresh.
        assert!(cache.get(&id).is_some());
    }

    #[test]
    fn test_background_sweeper_evicts() {
        let cache = Arc::new(ReportCache::with_ttl(Duration::from_millis(20)));
        cache.insert(sample_report());

        let guard =
            start_sweeper_with_interval(Arc::clone(&cache), Duration::from_millis(50));
        thread::sleep(Duration::from_millis(150));
        assert_eq!(cache.stats().total, 0, "sweeper should have evicted");
        drop(guard);
    }

    #[test]
    fn test_sweeper_guard_stops_thread_on_drop() {
        let cache = Arc::new(ReportCache::new());
        let guard =
            start_sweeper_with_interval(Arc::clone(&cache), Duration::from_millis(50));
        drop(guard); // must not hang
    }
}
