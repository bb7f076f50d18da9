// FileMill - core/metrics/catalog.rs
//
// Catalog metrics: inventory valuation, category breakdown, low-stock
// surfacing, supplier ranking, and price extremes.

use crate::core::metrics::round2;
use crate::core::model::{Catalog, Metrics, Product};
use crate::util::constants::{LOW_STOCK_THRESHOLD, TOP_N};
use serde_json::json;
use std::collections::HashMap;

/// Compute the catalog metrics map.
pub fn compute(catalog: &Catalog) -> Result<Metrics, String> {
    let products = &catalog.products;
    if products.is_empty() {
        return Err("No products to analyze".to_string());
    }

    let total_stock_units: i64 = products.iter().map(|p| p.stock).sum();
    let total_inventory_value: f64 =
        products.iter().map(|p| p.price * p.stock as f64).sum();
    let average_price =
        products.iter().map(|p| p.price).sum::<f64>() / products.len() as f64;

    let mut metrics = Metrics::new();
    metrics.insert("total_products".into(), json!(products.len()));
    metrics.insert("total_stock_units".into(), json!(total_stock_units));
    metrics.insert(
        "total_inventory_value".into(),
        json!(round2(total_inventory_value)),
    );
    metrics.insert("average_price".into(), json!(round2(average_price)));
    metrics.insert("categories_count".into(), json!(catalog.categories.len()));
    metrics.insert("products_by_category".into(), products_by_category(products));
    metrics.insert("low_stock_items".into(), low_stock_items(products));
    metrics.insert("top_suppliers".into(), top_suppliers(products));

    let min_price = products.iter().map(|p| p.price).fold(f64::INFINITY, f64::min);
    let max_price = products
        .iter()
        .map(|p| p.price)
        .fold(f64::NEG_INFINITY, f64::max);
    metrics.insert(
        "price_range".into(),
        json!({ "min": round2(min_price), "max": round2(max_price) }),
    );

    // Ties keep the first product in document order.
    let most_expensive = products
        .iter()
        .fold(None::<&Product>, |best, p| match best {
            Some(b) if b.price >= p.price => Some(b),
            _ => Some(p),
        })
        .map(|p| p.name.clone())
        .unwrap_or_default();
    metrics.insert("most_expensive_product".into(), json!(most_expensive));

    Ok(metrics)
}

/// Per-category rollup, sorted by total value descending.
fn products_by_category(products: &[Product]) -> serde_json::Value {
    let mut rollup: HashMap<&str, (usize, i64, f64, usize)> = HashMap::new();
    for (idx, product) in products.iter().enumerate() {
        let entry = rollup
            .entry(product.category.as_str())
            .or_insert((0, 0, 0.0, idx));
        entry.0 += 1;
        entry.1 += product.stock;
        entry.2 += product.price * product.stock as f64;
    }

    let mut rows: Vec<_> = rollup.into_iter().collect();
    rows.sort_by(|a, b| {
        b.1 .2
            .partial_cmp(&a.1 .2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1 .3.cmp(&b.1 .3))
    });

    json!(rows
        .into_iter()
        .map(|(category, (count, stock, value, _))| json!({
            "category": category,
            "product_count": count,
            "total_stock": stock,
            "total_value": round2(value),
        }))
        .collect::<Vec<_>>())
}

/// Items with 0 < stock <= threshold, sorted by stock ascending.
fn low_stock_items(products: &[Product]) -> serde_json::Value {
    let mut low: Vec<&Product> = products
        .iter()
        .filter(|p| p.stock > 0 && p.stock <= LOW_STOCK_THRESHOLD)
        .collect();
    low.sort_by_key(|p| p.stock);

    json!(low
        .into_iter()
        .map(|p| json!({
            "name": p.name,
            "stock": p.stock,
            "category": p.category,
        }))
        .collect::<Vec<_>>())
}

/// Top suppliers by product count, with their stock totals.
fn top_suppliers(products: &[Product]) -> serde_json::Value {
    let mut rollup: HashMap<&str, (usize, i64, usize)> = HashMap::new();
    for (idx, product) in products.iter().enumerate() {
        let entry = rollup
            .entry(product.supplier.as_str())
            .or_insert((0, 0, idx));
        entry.0 += 1;
        entry.1 += product.stock;
    }

    let mut rows: Vec<_> = rollup.into_iter().collect();
    rows.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .2.cmp(&b.1 .2)));

    json!(rows
        .into_iter()
        .take(TOP_N)
        .map(|(supplier, (count, stock, _))| json!({
            "supplier": supplier,
            "product_count": count,
            "total_stock": stock,
        }))
        .collect::<Vec<_>>())
}

// =============================================================================
// Tests
// =============================================================================
