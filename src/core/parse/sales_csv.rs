// FileMill - core/parse/sales_csv.rs
//
// Sales CSV parser. Strict policy: a single invalid row fails the whole
// file. This is intentionally harsher than the log parser's per-line
// tolerance — sales figures are aggregated, so one bad row would silently
// skew every downstream metric.

use crate::core::model::Sale;
use crate::core::parse::{read_file, ParseOutcome};
use crate::util::constants::{CSV_ERROR_SAMPLE_ROWS, SALES_CSV_HEADER};
use chrono::NaiveDate;
use std::path::Path;

/// Parse a sales CSV file.
///
/// The header row must equal `fecha,producto,categoria,precio_unitario,
/// cantidad,descuento` (case-insensitive) and every data row must carry
/// exactly six fields that validate. The error message for a failed file
/// quotes up to the first three offending rows as `line N: reason`.
pub fn parse(path: &Path) -> ParseOutcome<Vec<Sale>> {
    let content = match read_file(path) {
        Ok(c) => c,
        Err(reason) => return ParseOutcome::Error(reason),
    };

    if content.trim().is_empty() {
        return ParseOutcome::Error("CSV validation failed: file is empty".to_string());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    // Header check. A malformed header fails the file before any row is read.
    match reader.headers() {
        Ok(headers) => {
            if let Some(reason) = header_mismatch(headers) {
                return ParseOutcome::Error(format!("CSV validation failed: {reason}"));
            }
        }
        Err(e) => {
            return ParseOutcome::Error(format!("CSV validation failed: unreadable header: {e}"))
        }
    }

    let mut sales = Vec::new();
    let mut row_errors: Vec<(u64, String)> = Vec::new();

    for (idx, record) in reader.records().enumerate() {
        // Data rows start on line 2 (line 1 is the header).
        let line = idx as u64 + 2;
        match record {
            Ok(record) => match validate_row(&record) {
                Ok(sale) => sales.push(sale),
                Err(reason) => row_errors.push((line, reason)),
            },
            Err(e) => row_errors.push((line, format!("unreadable row: {e}"))),
        }
    }

    if !row_errors.is_empty() {
        let quoted: Vec<String> = row_errors
            .iter()
            .take(CSV_ERROR_SAMPLE_ROWS)
            .map(|(line, reason)| format!("line {line}: {reason}"))
            .collect();
        return ParseOutcome::Error(format!(
            "CSV validation failed on {} row(s): {}",
            row_errors.len(),
            quoted.join("; ")
        ));
    }

    if sales.is_empty() {
        return ParseOutcome::Error("CSV validation failed: no data rows".to_string());
    }

    tracing::debug!(file = %path.display(), rows = sales.len(), "Sales CSV parsed");
    ParseOutcome::Ok(sales)
}

/// Returns a mismatch description, or `None` when the header is valid.
fn header_mismatch(headers: &csv::StringRecord) -> Option<String> {
    if headers.len() != SALES_CSV_HEADER.len() {
        return Some(format!(
            "expected {} header columns, found {}",
            SALES_CSV_HEADER.len(),
            headers.len()
        ));
    }
    for (found, expected) in headers.iter().zip(SALES_CSV_HEADER) {
        if !found.trim().eq_ignore_ascii_case(expected) {
            return Some(format!(
                "header column '{}' does not match expected '{expected}'",
                found.trim()
            ));
        }
    }
    None
}

/// Validate one data row and derive the sale total.
fn validate_row(record: &csv::StringRecord) -> Result<Sale, String> {
    if record.len() != SALES_CSV_HEADER.len() {
        return Err(format!(
            "expected {} fields, found {}",
            SALES_CSV_HEADER.len(),
            record.len()
        ));
    }

    let field = |i: usize| record.get(i).unwrap_or("").trim();

    let date = NaiveDate::parse_from_str(field(0), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", field(0)))?;

    let product = field(1).to_string();
    let category = field(2).to_string();

    let unit_price: f64 = field(3)
        .parse()
        .map_err(|_| format!("invalid price '{}'", field(3)))?;
    if unit_price <= 0.0 {
        return Err(format!("price must be greater than 0, got {unit_price}"));
    }

    let quantity: i64 = field(4)
        .parse()
        .map_err(|_| format!("invalid quantity '{}'", field(4)))?;
    if quantity <= 0 {
        return Err(format!("quantity must be greater than 0, got {quantity}"));
    }

    let discount: f64 = field(5)
        .parse()
        .map_err(|_| format!("invalid discount '{}'", field(5)))?;
    if !(0.0..=100.0).contains(&discount) {
        return Err(format!("discount must be within [0, 100], got {discount}"));
    }

    let total = unit_price * quantity as f64 * (1.0 - discount / 100.0);

    Ok(Sale {
        date,
        product,
        category,
        unit_price,
        quantity,
        discount,
        total,
    })
}

// =============================================================================
// Tests
// =============================================================================
