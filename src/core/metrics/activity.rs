// FileMill - core/metrics/activity.rs
//
// User-activity metrics: account totals, session durations, action
// rankings, and the busiest hour of the day.

use crate::core::metrics::{ranked_counts, round1};
use crate::core::model::{Metrics, UserActivity};
use crate::util::constants::TOP_N;
use chrono::NaiveDateTime;
use serde_json::json;

/// Compute the user-activity metrics map.
pub fn compute(activity: &UserActivity) -> Result<Metrics, String> {
    if activity.users.is_empty() && activity.sessions.is_empty() {
        return Err("No users or sessions to analyze".to_string());
    }

    let total_users = activity.users.len();
    let active_users = activity.users.iter().filter(|u| u.active).count();
    let inactive_users = total_users - active_users;
    let active_percentage = if total_users == 0 {
        0.0
    } else {
        round1(active_users as f64 / total_users as f64 * 100.0)
    };

    let durations: Vec<f64> = activity
        .sessions
        .iter()
        .filter_map(|s| s.duration_seconds)
        .collect();
    let avg_session_duration = if durations.is_empty() {
        0
    } else {
        (durations.iter().sum::<f64>() / durations.len() as f64).round() as i64
    };

    let total_pages_visited: i64 = activity
        .sessions
        .iter()
        .filter_map(|s| s.pages_visited)
        .sum();

    let top_actions: Vec<_> = ranked_counts(
        activity
            .sessions
            .iter()
            .flat_map(|s| s.actions.iter().map(String::as_str)),
    )
    .into_iter()
    .take(TOP_N)
    .map(|(action, count)| json!({ "action": action, "count": count }))
    .collect();

    let (peak_hour, peak_sessions) = peak_hour(activity);

    let mut metrics = Metrics::new();
    metrics.insert("total_users".into(), json!(total_users));
    metrics.insert("active_users".into(), json!(active_users));
    metrics.insert("inactive_users".into(), json!(inactive_users));
    metrics.insert("active_percentage".into(), json!(active_percentage));
    metrics.insert("total_sessions".into(), json!(activity.sessions.len()));
    metrics.insert("avg_session_duration".into(), json!(avg_session_duration));
    metrics.insert("total_pages_visited".into(), json!(total_pages_visited));
    metrics.insert("top_actions".into(), json!(top_actions));
    metrics.insert(
        "peak_hour".into(),
        json!({ "hour": peak_hour, "session_count": peak_sessions }),
    );

    Ok(metrics)
}

/// Busiest hour of day across session start timestamps. Sessions without a
/// parseable ISO `inicio` are dropped; with none left, (0, 0) is reported.
fn peak_hour(activity: &UserActivity) -> (u32, usize) {
    let hours: Vec<u32> = activity
        .sessions
        .iter()
        .filter_map(|s| s.start.as_deref())
        .filter_map(start_hour)
        .collect();

    let mut counts = [0usize; 24];
    for hour in &hours {
        counts[*hour as usize] += 1;
    }

    counts
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        .map(|(hour, count)| (hour as u32, *count))
        .unwrap_or((0, 0))
}

/// Extract the hour from an ISO timestamp string.
fn start_hour(start: &str) -> Option<u32> {
    use chrono::Timelike;
    NaiveDateTime::parse_from_str(start, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|ts| ts.hour())
}

// =============================================================================
// Tests
// =============================================================================
