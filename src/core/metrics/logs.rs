// FileMill - core/metrics/logs.rs
//
// Log metrics: level distribution, frequent errors, error components,
// hourly load, and classified error patterns.

use crate::core::metrics::{ranked_counts, round1};
use crate::core::model::{LogEntry, LogLevel, Metrics};
use crate::util::constants::{ERROR_MESSAGE_TRUNCATE_LEN, TOP_ERROR_PATTERNS, TOP_N};
use serde_json::json;

/// Ordered substring classifiers for error messages. The first match wins,
/// so "connection timeout" classifies as a timeout, not a connection error.
const ERROR_PATTERNS: &[(&str, &str)] = &[
    ("timeout", "Timeout errors"),
    ("connection", "Connection errors"),
    ("deadlock", "Database deadlock"),
    ("null", "Null pointer errors"),
    ("permission", "Permission errors"),
];

/// Compute the log metrics map.
pub fn compute(entries: &[LogEntry]) -> Result<Metrics, String> {
    if entries.is_empty() {
        return Err("No log entries to analyze".to_string());
    }

    let total = entries.len();

    // All five levels always appear, zeroed when absent.
    let mut distribution = serde_json::Map::new();
    for level in LogLevel::all() {
        let count = entries.iter().filter(|e| e.level == *level).count();
        distribution.insert(
            level.label().to_string(),
            json!({
                "count": count,
                "percentage": round1(count as f64 / total as f64 * 100.0),
            }),
        );
    }

    let critical: Vec<&LogEntry> =
        entries.iter().filter(|e| e.level.is_critical()).collect();

    let most_frequent_errors: Vec<_> =
        ranked_counts(critical.iter().map(|e| truncate(&e.message)))
            .into_iter()
            .take(TOP_N)
            .map(|(message, count)| json!({ "message": message, "count": count }))
            .collect();

    let top_error_components: Vec<_> =
        ranked_counts(critical.iter().map(|e| e.component.as_str()))
            .into_iter()
            .take(TOP_N)
            .map(|(component, count)| {
                json!({ "component": component, "error_count": count })
            })
            .collect();

    let mut hour_counts = [0usize; 24];
    for entry in entries {
        hour_counts[entry.hour as usize] += 1;
    }
    let hourly_distribution: Vec<_> = hour_counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(hour, count)| json!({ "hour": hour, "count": count }))
        .collect();

    let error_patterns: Vec<_> =
        ranked_counts(critical.iter().map(|e| classify(&e.message, &e.component)))
            .into_iter()
            .take(TOP_ERROR_PATTERNS)
            .map(|(pattern, count)| json!({ "pattern": pattern, "count": count }))
            .collect();

    let mut metrics = Metrics::new();
    metrics.insert("total_entries".into(), json!(total));
    metrics.insert(
        "level_distribution".into(),
        serde_json::Value::Object(distribution),
    );
    metrics.insert("most_frequent_errors".into(), json!(most_frequent_errors));
    metrics.insert("top_error_components".into(), json!(top_error_components));
    metrics.insert("hourly_distribution".into(), json!(hourly_distribution));
    metrics.insert("critical_errors_count".into(), json!(critical.len()));
    metrics.insert("error_patterns".into(), json!(error_patterns));

    Ok(metrics)
}

/// Cap a message for ranking so near-identical long messages still group.
fn truncate(message: &str) -> String {
    if message.len() <= ERROR_MESSAGE_TRUNCATE_LEN {
        message.to_string()
    } else {
        let mut end = ERROR_MESSAGE_TRUNCATE_LEN;
        while !message.is_char_boundary(end) {
            end -= 1;
        }
        message[..end].to_string()
    }
}

/// Classify an error message by the first matching substring, falling back
/// to the component name.
fn classify(message: &str, component: &str) -> String {
    let lower = message.to_lowercase();
    for (needle, label) in ERROR_PATTERNS {
        if lower.contains(needle) {
            return (*label).to_string();
        }
    }
    format!("{component} errors")
}

// =============================================================================
// Tests
// =============================================================================
