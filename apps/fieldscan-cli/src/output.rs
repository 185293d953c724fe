//! Plain-text rendering of command results.

use std::fmt::Write;

use fieldscan_capture::{CommitOutcome, DeleteOutcome};
use fieldscan_core::validation::is_valid_gtin;
use fieldscan_core::{ProductInfo, ScanContext, ScannedBarcode};

pub fn commit(context: &ScanContext, outcome: &CommitOutcome) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Recorded {} new item(s) for {} ({} skipped)",
        outcome.added.len(),
        context,
        outcome.skipped.len()
    );
    for item in &outcome.added {
        let _ = writeln!(out, "  + {:<16} {}", item.barcode, item.product_info.name);
    }
    for code in &outcome.skipped {
        let _ = writeln!(out, "  = {}", code);
    }
    if let Some(e) = &outcome.persistence_error {
        let _ = writeln!(out, "warning: batch not saved ({}); it will be missing after reload", e);
    }

    out
}

pub fn delete(context: &ScanContext, outcome: &DeleteOutcome) -> String {
    let mut out = format!("Deleted {} item(s) from {}\n", outcome.removed, context);
    for e in &outcome.persistence_errors {
        let _ = writeln!(out, "warning: {}", e);
    }
    out
}

pub fn items_table(items: &[ScannedBarcode]) -> String {
    if items.is_empty() {
        return "No scanned items\n".to_string();
    }

    let mut out = format!(
        "{:<20} {:<10} {:<10} {:<16} {}\n",
        "SCANNED AT", "STORE", "EVENT", "BARCODE", "PRODUCT"
    );
    for item in items {
        let _ = writeln!(
            out,
            "{:<20} {:<10} {:<10} {:<16} {}",
            item.timestamp.format("%Y-%m-%d %H:%M:%S"),
            item.store_id,
            item.event_id,
            item.barcode,
            item.product_info.name
        );
    }
    let _ = writeln!(out, "{} item(s)", items.len());
    out
}

pub fn product(code: &str, info: &ProductInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", code);
    let _ = writeln!(out, "  name:          {}", info.name);
    let _ = writeln!(out, "  brand:         {}", info.brand);
    let _ = writeln!(out, "  quantity:      {}", info.quantity);
    let _ = writeln!(out, "  categories:    {}", info.categories);
    let _ = writeln!(out, "  ingredients:   {}", info.ingredients);
    if let Some(image) = &info.image {
        let _ = writeln!(out, "  image:         {}", image);
    }
    let n = &info.nutriments;
    let _ = writeln!(
        out,
        "  per 100g:      energy {} / proteins {} / carbohydrates {} / fat {}",
        n.energy, n.proteins, n.carbohydrates, n.fat
    );
    if !is_valid_gtin(code.trim()) {
        let _ = writeln!(out, "  note: not a valid EAN/UPC check digit");
    }
    out
}
