//! Handler for the `sloptrack history` command.

use std::path::Path;

use anyhow::Result;
use serde_json::json;
use sloptrack_store::load_store;
use sloptrack_types::SUPPRESSION_RATE_WINDOW;

pub(crate) fn handle(store_path: &Path) -> Result<()> {
    let store = load_store(store_path);

    // Suppression trend over the recent window: rising means ignore
    // patterns are hiding a growing share of raw findings.
    let window: Vec<f64> = store
        .scan_history
        .iter()
        .rev()
        .take(SUPPRESSION_RATE_WINDOW)
        .map(|entry| entry.suppressed_pct)
        .collect();
    let suppression_trend = if window.is_empty() {
        0.0
    } else {
        let sum: f64 = window.iter().sum();
        (sum / window.len() as f64 * 10.0).round() / 10.0
    };

    let payload = json!({
        "scan_count": store.scan_count,
        "last_scan": store.last_scan,
        "entries": store.scan_history,
        "suppression_trend_pct": suppression_trend,
        "suppression_window": SUPPRESSION_RATE_WINDOW,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
