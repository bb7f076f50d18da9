// FileMill - core/metrics/sales.rs
//
// Sales metrics: revenue totals, best sellers, category ranking, discount
// and date-range summaries over validated CSV rows.

use crate::core::metrics::round2;
use crate::core::model::{Metrics, Sale};
use serde_json::json;
use std::collections::HashMap;

/// Compute the sales metrics map.
pub fn compute(sales: &[Sale]) -> Result<Metrics, String> {
    if sales.is_empty() {
        return Err("No sales records to analyze".to_string());
    }

    let total_sales: f64 = sales.iter().map(|s| s.total).sum();
    let total_quantity: i64 = sales.iter().map(|s| s.quantity).sum();

    let unique_products = sales
        .iter()
        .map(|s| s.product.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();

    // Quantity by product; ties resolved by first occurrence in the file.
    let (best_product, best_quantity) =
        grouped_max(sales.iter().map(|s| (s.product.as_str(), s.quantity as f64)));
    let (top_category, top_revenue) =
        grouped_max(sales.iter().map(|s| (s.category.as_str(), s.total)));

    let average_discount =
        sales.iter().map(|s| s.discount).sum::<f64>() / sales.len() as f64;

    let from = sales.iter().map(|s| s.date).min().unwrap_or_default();
    let to = sales.iter().map(|s| s.date).max().unwrap_or_default();

    let mut metrics = Metrics::new();
    metrics.insert("total_sales".into(), json!(round2(total_sales)));
    metrics.insert("unique_products".into(), json!(unique_products));
    metrics.insert("total_quantity".into(), json!(total_quantity));
    metrics.insert("total_records".into(), json!(sales.len()));
    metrics.insert(
        "best_selling_product".into(),
        json!({ "name": best_product, "quantity": best_quantity as i64 }),
    );
    metrics.insert(
        "top_category".into(),
        json!({ "name": top_category, "revenue": round2(top_revenue) }),
    );
    metrics.insert("average_discount".into(), json!(round2(average_discount)));
    metrics.insert(
        "date_range".into(),
        json!({
            "from": from.format("%Y-%m-%d").to_string(),
            "to": to.format("%Y-%m-%d").to_string(),
        }),
    );

    Ok(metrics)
}

/// Sum `value` grouped by `key` and return the maximal group. Ties break by
/// the key's first occurrence in the iteration order.
fn grouped_max<'a, I>(pairs: I) -> (String, f64)
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
    for (idx, (key, value)) in pairs.into_iter().enumerate() {
        let entry = sums.entry(key).or_insert((0.0, idx));
        entry.0 += value;
    }

    let mut best: Option<(&str, f64, usize)> = None;
    for (key, (sum, first)) in sums {
        let replace = match best {
            None => true,
            Some((_, best_sum, best_first)) => {
                sum > best_sum || (sum == best_sum && first < best_first)
            }
        };
        if replace {
            best = Some((key, sum, first));
        }
    }

    best.map(|(key, sum, _)| (key.to_string(), sum))
        .unwrap_or_default()
}

// =============================================================================
// Tests
// =============================================================================
