//! The persisted store document: one JSON object per tracked scope.
//!
//! The loader never rejects an unexpected shape. `Store::from_document`
//! fills missing top-level fields with defaults, drops malformed finding
//! entries, and clamps invalid statuses/tiers, mirroring what a permissive
//! migration layer would do.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Confidence, Finding, FindingStatus, SCAN_HISTORY_LIMIT, SCHEMA_VERSION, ScanHistoryEntry,
    StoreStats, Zone, now_utc,
};

/// A single persisted document per tracked scope: the finding map plus
/// aggregates. Exclusively mutated by the reconciler during a merge;
/// read-shared by the scoring engine and work queue builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub version: u32,
    pub created: String,
    #[serde(default)]
    pub last_scan: Option<String>,
    #[serde(default)]
    pub scan_count: u64,
    #[serde(default)]
    pub overall_score: f64,
    #[serde(default)]
    pub strict_score: f64,
    #[serde(default)]
    pub stats: StoreStats,
    #[serde(default)]
    pub findings: BTreeMap<String, Finding>,
    #[serde(default)]
    pub scan_history: Vec<ScanHistoryEntry>,
    /// Language tag -> detector -> checkable units examined.
    #[serde(default)]
    pub potentials: BTreeMap<String, BTreeMap<String, u64>>,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub scan_path: Option<String>,
    /// Subjective dimension key -> assessed score (0-100), consumed by the
    /// work queue builder.
    #[serde(default)]
    pub assessments: BTreeMap<String, f64>,
}

impl Default for Store {
    fn default() -> Self {
        Self::empty()
    }
}

impl Store {
    /// A fresh store, as created on first scan.
    pub fn empty() -> Self {
        Self {
            version: SCHEMA_VERSION,
            created: now_utc(),
            last_scan: None,
            scan_count: 0,
            overall_score: 0.0,
            strict_score: 0.0,
            stats: StoreStats::default(),
            findings: BTreeMap::new(),
            scan_history: Vec::new(),
            potentials: BTreeMap::new(),
            ignore: Vec::new(),
            scan_path: None,
            assessments: BTreeMap::new(),
        }
    }

    /// Normalize a loosely-shaped JSON document into a valid store.
    ///
    /// Missing top-level fields get defaults; non-object findings are
    /// dropped; per-finding fields are coerced (`resolved` -> `fixed`,
    /// out-of-range tiers clamped, unknown confidences defaulted).
    pub fn from_document(doc: &Value) -> Self {
        let mut store = Self::empty();
        let Some(map) = doc.as_object() else {
            return store;
        };

        if let Some(version) = map.get("version").and_then(Value::as_u64) {
            store.version = version as u32;
        }
        if let Some(created) = map.get("created").and_then(Value::as_str) {
            store.created = created.to_string();
        }
        store.last_scan = map
            .get("last_scan")
            .and_then(Value::as_str)
            .map(str::to_string);
        store.scan_count = map.get("scan_count").and_then(Value::as_u64).unwrap_or(0);
        store.overall_score = map
            .get("overall_score")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        store.strict_score = map
            .get("strict_score")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        store.scan_path = map
            .get("scan_path")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(findings) = map.get("findings").and_then(Value::as_object) {
            for (id, entry) in findings {
                if let Some(finding) = finding_from_value(id, entry, &store.created) {
                    store.findings.insert(id.clone(), finding);
                }
            }
        }

        if let Some(history) = map.get("scan_history").and_then(Value::as_array) {
            for entry in history {
                if let Ok(parsed) = serde_json::from_value::<ScanHistoryEntry>(entry.clone()) {
                    store.scan_history.push(parsed);
                }
            }
            let excess = store.scan_history.len().saturating_sub(SCAN_HISTORY_LIMIT);
            store.scan_history.drain(..excess);
        }

        if let Some(potentials) = map.get("potentials").and_then(Value::as_object) {
            for (lang, per_detector) in potentials {
                let Some(per_detector) = per_detector.as_object() else {
                    continue;
                };
                let lang_entry = store.potentials.entry(lang.clone()).or_default();
                for (detector, count) in per_detector {
                    if let Some(count) = count.as_u64() {
                        lang_entry.insert(detector.clone(), count);
                    }
                }
            }
        }

        if let Some(ignore) = map.get("ignore").and_then(Value::as_array) {
            store.ignore = ignore
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
        }

        if let Some(assessments) = map.get("assessments").and_then(Value::as_object) {
            for (dimension, score) in assessments {
                if let Some(score) = score.as_f64() {
                    store
                        .assessments
                        .insert(dimension.clone(), score.clamp(0.0, 100.0));
                }
            }
        }

        store.recompute_stats();
        store
    }

    /// Re-tally per-status and per-tier counters from the finding map.
    pub fn recompute_stats(&mut self) {
        let mut stats = StoreStats::default();
        for finding in self.findings.values() {
            stats.counts.bump(finding.status);
            stats.by_tier.entry(finding.tier).or_default().bump(finding.status);
        }
        stats.total = stats.counts.total();
        self.stats = stats;
    }

    /// Potentials summed across languages, per detector.
    pub fn merged_potentials(&self) -> BTreeMap<String, u64> {
        let mut merged: BTreeMap<String, u64> = BTreeMap::new();
        for per_detector in self.potentials.values() {
            for (detector, count) in per_detector {
                *merged.entry(detector.clone()).or_insert(0) += count;
            }
        }
        merged
    }

    /// Append a scan summary, trimming the ring to its cap.
    pub fn push_history(&mut self, entry: ScanHistoryEntry) {
        self.scan_history.push(entry);
        let excess = self.scan_history.len().saturating_sub(SCAN_HISTORY_LIMIT);
        self.scan_history.drain(..excess);
    }
}

/// True when a file path belongs to the active scan scope.
pub fn in_scan_scope(file: &str, scan_path: Option<&str>) -> bool {
    match scan_path {
        None | Some(".") | Some("") => true,
        Some(scope) => {
            let prefix = format!("{}/", scope.trim_end_matches('/'));
            file.starts_with(&prefix) || file == scope || file == "."
        }
    }
}

fn finding_from_value(id: &str, entry: &Value, created: &str) -> Option<Finding> {
    let map = entry.as_object()?;
    let field = |key: &str| map.get(key).and_then(Value::as_str).unwrap_or_default();

    let tier = map.get("tier").and_then(Value::as_u64).unwrap_or(3);
    let first_seen = map
        .get("first_seen")
        .and_then(Value::as_str)
        .unwrap_or(created)
        .to_string();
    let last_seen = map
        .get("last_seen")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| first_seen.clone());

    let detector = field("detector");
    Some(Finding {
        id: id.to_string(),
        detector: if detector.is_empty() {
            "unknown".to_string()
        } else {
            detector.to_string()
        },
        file: field("file").to_string(),
        tier: tier.clamp(1, 4) as u8,
        confidence: Confidence::parse(field("confidence")).unwrap_or(Confidence::Low),
        summary: field("summary").to_string(),
        detail: map.get("detail").cloned().unwrap_or(Value::Null),
        status: FindingStatus::parse(field("status")).unwrap_or(FindingStatus::Open),
        note: map
            .get("note")
            .and_then(Value::as_str)
            .map(str::to_string),
        first_seen,
        last_seen,
        resolved_at: map
            .get("resolved_at")
            .and_then(Value::as_str)
            .map(str::to_string),
        reopen_count: map
            .get("reopen_count")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32,
        lang: map.get("lang").and_then(Value::as_str).map(str::to_string),
        zone: map.get("zone").and_then(Value::as_str).and_then(Zone::parse),
    })
}
