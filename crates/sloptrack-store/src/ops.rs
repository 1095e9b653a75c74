//! Explicit human operations on the store: resolve and ignore.
//!
//! These are the only mutations outside scan reconciliation. Resolution
//! changes status; the ignore list is the one path that deletes findings.

use sloptrack_types::{Finding, FindingStatus, Store, now_utc};

use crate::patterns::{matched_ignore_pattern, wildcard_match};

/// Whether a selector names this finding. Selectors accept, in order:
/// a wildcard pattern, an exact or prefix finding ID, a bare detector
/// name, or a file path (exact or directory prefix).
pub fn matches_selector(finding: &Finding, selector: &str) -> bool {
    if selector.contains('*') || selector.contains('?') {
        let target = if selector.contains("::") {
            finding.id.as_str()
        } else {
            finding.file.as_str()
        };
        return wildcard_match(target, selector);
    }
    if selector.contains("::") {
        return finding.id == selector || finding.id.starts_with(&format!("{selector}::"));
    }
    if finding.detector == selector {
        return true;
    }
    finding.file == selector || finding.file.starts_with(&format!("{selector}/"))
}

/// Mark every open finding matching `selector` with `status`, recording
/// the resolution time and optional note. Returns the IDs changed, in
/// store order.
pub fn resolve_findings(
    store: &mut Store,
    selector: &str,
    status: FindingStatus,
    note: Option<&str>,
) -> Vec<String> {
    let now = now_utc();
    let mut changed = Vec::new();
    for (id, finding) in &mut store.findings {
        if finding.status != FindingStatus::Open || !matches_selector(finding, selector) {
            continue;
        }
        finding.status = status;
        finding.resolved_at = Some(now.clone());
        finding.last_seen = now.clone();
        if let Some(note) = note {
            finding.note = Some(note.to_string());
        }
        changed.push(id.clone());
    }
    if !changed.is_empty() {
        store.recompute_stats();
    }
    changed
}

/// Remove every stored finding matched by the ignore list. Returns the
/// removed IDs. This is the only operation that deletes findings.
pub fn sweep_ignored(store: &mut Store) -> Vec<String> {
    if store.ignore.is_empty() {
        return Vec::new();
    }
    let patterns = store.ignore.clone();
    let removed: Vec<String> = store
        .findings
        .iter()
        .filter(|(id, finding)| {
            matched_ignore_pattern(id, &finding.file, &patterns).is_some()
        })
        .map(|(id, _)| id.clone())
        .collect();
    for id in &removed {
        store.findings.remove(id);
    }
    if !removed.is_empty() {
        store.recompute_stats();
    }
    removed
}

/// Add an ignore pattern and immediately sweep matching findings out of
/// the store. Returns the removed IDs; adding a duplicate pattern is a
/// no-op for the list but still sweeps.
pub fn add_ignore(store: &mut Store, pattern: &str) -> Vec<String> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Vec::new();
    }
    if !store.ignore.iter().any(|p| p == pattern) {
        store.ignore.push(pattern.to_string());
    }
    sweep_ignored(store)
}

/// Remove an ignore pattern. Already-removed findings do not come back;
/// the next scan rediscovers anything still present in the code.
pub fn remove_ignore(store: &mut Store, pattern: &str) -> bool {
    let before = store.ignore.len();
    store.ignore.retain(|p| p != pattern);
    store.ignore.len() != before
}
