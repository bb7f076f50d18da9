// FileMill - core/metrics/mod.rs
//
// Per-format metric computations. Pure functions from parsed data to a
// metrics map; no I/O, no shared state. Empty input is always an error —
// a file with nothing to measure is not a success.

pub mod activity;
pub mod catalog;
pub mod logs;
pub mod sales;

use crate::core::model::Metrics;
use crate::core::parse::ParsedData;
use std::collections::HashMap;

/// Dispatch to the metrics function matching the parsed payload.
pub fn compute(data: &ParsedData) -> Result<Metrics, String> {
    match data {
        ParsedData::Sales(sales) => sales::compute(sales),
        ParsedData::Activity(activity) => activity::compute(activity),
        ParsedData::Log(entries) => logs::compute(entries),
        ParsedData::Catalog(catalog) => catalog::compute(catalog),
    }
}

// =============================================================================
// Shared numeric helpers
// =============================================================================

/// Round to 2 decimal places (money, averages).
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to 1 decimal place (percentages).
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Tally occurrences and rank by count descending. Ties break by first
/// occurrence in the input, which keeps every top-N metric deterministic.
pub(crate) fn ranked_counts<I, S>(items: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (idx, item) in items.into_iter().enumerate() {
        let entry = counts
            .entry(item.as_ref().to_string())
            .or_insert((0, idx));
        entry.0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(key, (count, first))| (key, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().map(|(key, count, _)| (key, count)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_helpers() {
        assert_eq!(round2(1.005), 1.01);
        assert_eq!(round2(24399.93001), 24399.93);
        assert_eq!(round1(33.349), 33.3);
    }

    #[test]
    fn test_ranked_counts_ties_break_by_first_occurrence() {
        let ranked = ranked_counts(["b", "a", "b", "a", "c"]);
        // b and a both have 2; b appeared first.
        assert_eq!(
            ranked,
            vec![
                ("b".to_string(), 2),
                ("a".to_string(), 2),
                ("c".to_string(), 1)
            ]
        );
    }
}
