//! Deterministic finding identity.

use serde_json::Value;
use sloptrack_types::{Confidence, Finding, FindingStatus, now_utc};

/// Composite finding key: `detector::file::symbol`, or `detector::file`
/// when the symbol is empty. Regenerating from the same inputs always
/// yields the same string, which is what makes merges idempotent.
pub fn finding_id(detector: &str, file: &str, symbol: &str) -> String {
    let file = normalize_file(file);
    if symbol.is_empty() {
        format!("{detector}::{file}")
    } else {
        format!("{detector}::{file}::{symbol}")
    }
}

/// Short content fingerprint appended to an ID on collision: two raw
/// findings with the same composite key but different content stay
/// distinct without breaking determinism.
pub fn content_fingerprint(summary: &str, detail: &Value) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(summary.as_bytes());
    hasher.update(detail.to_string().as_bytes());
    let hash = hasher.finalize();
    hash.to_hex()[..8].to_string()
}

/// Create a normalized open finding with a stable ID. Pure: no I/O beyond
/// reading the clock for the seen timestamps.
#[allow(clippy::too_many_arguments)]
pub fn new_finding(
    detector: &str,
    file: &str,
    symbol: &str,
    tier: u8,
    confidence: Confidence,
    summary: &str,
    detail: Value,
) -> Finding {
    let now = now_utc();
    Finding {
        id: finding_id(detector, file, symbol),
        detector: detector.to_string(),
        file: normalize_file(file),
        tier: tier.clamp(1, 4),
        confidence,
        summary: summary.to_string(),
        detail,
        status: FindingStatus::Open,
        note: None,
        first_seen: now.clone(),
        last_seen: now,
        resolved_at: None,
        reopen_count: 0,
        lang: None,
        zone: None,
    }
}

fn normalize_file(file: &str) -> String {
    let file = file.replace('\\', "/");
    file.strip_prefix("./").unwrap_or(&file).to_string()
}
