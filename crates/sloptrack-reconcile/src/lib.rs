//! # sloptrack-reconcile
//!
//! The scan merge state machine: reconciles one scan's raw detector
//! output against the persisted finding history.
//!
//! ## What belongs here
//! * Raw-record validation and upsert (new/refresh/reopen/sticky)
//! * Ignore suppression
//! * Suspect-detector protection and auto-resolution of disappeared
//!   findings
//! * Scan bookkeeping: potentials, history ring, score snapshots
//!
//! ## What does NOT belong here
//! * Detector execution (upstream collaborators hand one combined batch)
//! * Persistence (sloptrack-store)
//!
//! Reconciliation is deliberately single-threaded: reopen and
//! auto-resolve decisions need a consistent, ordered view of everything
//! this scan found.

#![forbid(unsafe_code)]

mod suspect;
mod validate;

use std::collections::{BTreeMap, BTreeSet};

use sloptrack_registry::DetectorRegistry;
use sloptrack_store::{content_fingerprint, finding_id, matched_ignore_pattern, new_finding};
use sloptrack_types::{
    CHRONIC_REOPEN_THRESHOLD, DroppedRecord, FindingStatus, RawFinding, ScanDiff,
    ScanHistoryEntry, Store, in_scan_scope, now_utc,
};

pub use suspect::{SUSPECT_MIN_PRIOR_OPEN, find_suspect_detectors};
pub use validate::{ValidFinding, validate_raw};

/// Configuration bundle for merging one scan into the store.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    pub lang: Option<String>,
    pub scan_path: Option<String>,
    /// File patterns excluded from auto-resolution sweeps.
    pub exclude: Vec<String>,
    /// Detector name -> checkable units. Doubles as the "detectors that
    /// ran" set; `None` means the producer gave no coverage signal.
    pub potentials: Option<BTreeMap<String, u64>>,
    /// Extend the stored per-language potentials instead of replacing them.
    pub merge_potentials: bool,
    /// Trust absence unconditionally: disables suspect-detector protection.
    pub force_resolve: bool,
    /// Override the store's persisted ignore list for this merge.
    pub ignore: Option<Vec<String>>,
}

/// Merge a fresh scan into the store and return a diff summary.
///
/// Mutates the store in place: upserts findings, auto-resolves verified
/// disappearances, refreshes stats and score snapshots, and appends one
/// history entry. Persistence stays with the caller.
pub fn merge_scan(
    store: &mut Store,
    raw_findings: &[RawFinding],
    registry: &DetectorRegistry,
    options: &MergeOptions,
) -> ScanDiff {
    let now = now_utc();
    let mut diff = ScanDiff {
        raw_findings: raw_findings.len(),
        ..ScanDiff::default()
    };

    store.last_scan = Some(now.clone());
    store.scan_count += 1;
    store.scan_path = options.scan_path.clone();
    record_potentials(store, options);

    let ignore_patterns = options
        .ignore
        .clone()
        .unwrap_or_else(|| store.ignore.clone());
    diff.ignore_patterns = ignore_patterns.len();

    let mut current_ids: BTreeSet<String> = BTreeSet::new();
    let mut by_detector: BTreeMap<String, usize> = BTreeMap::new();
    let mut batch_fingerprints: BTreeMap<String, String> = BTreeMap::new();

    for (index, raw) in raw_findings.iter().enumerate() {
        let valid = match validate_raw(raw) {
            Ok(valid) => valid,
            Err(reason) => {
                diff.dropped.push(DroppedRecord {
                    index,
                    reason,
                    detector: raw.detector.clone(),
                });
                continue;
            }
        };

        let mut id = finding_id(&valid.detector, &valid.file, &valid.symbol);
        let fingerprint = content_fingerprint(&valid.summary, &valid.detail);
        match batch_fingerprints.get(&id) {
            // Same composite key, different content, same batch: keep both
            // by appending the content fingerprint to the second one.
            Some(seen) if *seen != fingerprint => {
                id = format!("{id}::{fingerprint}");
                batch_fingerprints.insert(id.clone(), fingerprint);
            }
            Some(_) => {}
            None => {
                batch_fingerprints.insert(id.clone(), fingerprint);
            }
        }

        // Suppressed raws count for nothing: not stored, not part of the
        // current set, and not credited to the detector (an all-ignored
        // detector must still look absent to the suspect heuristic).
        if matched_ignore_pattern(&id, &valid.file, &ignore_patterns).is_some() {
            diff.ignored += 1;
            store.findings.remove(&id);
            continue;
        }

        current_ids.insert(id.clone());
        *by_detector.entry(valid.detector.clone()).or_insert(0) += 1;

        match store.findings.get_mut(&id) {
            None => {
                let mut finding = new_finding(
                    &valid.detector,
                    &valid.file,
                    &valid.symbol,
                    valid.tier,
                    valid.confidence,
                    &valid.summary,
                    valid.detail.clone(),
                );
                finding.id = id.clone();
                finding.zone = valid.zone;
                finding.lang = options.lang.clone();
                store.findings.insert(id, finding);
                diff.new += 1;
            }
            Some(previous) => {
                previous.last_seen = now.clone();
                previous.tier = valid.tier;
                previous.confidence = valid.confidence;
                previous.summary = valid.summary.clone();
                previous.detail = valid.detail.clone();
                if valid.zone.is_some() {
                    previous.zone = valid.zone;
                }
                if previous.lang.is_none() {
                    previous.lang = options.lang.clone();
                }

                match previous.status {
                    FindingStatus::Fixed | FindingStatus::AutoResolved => {
                        let was = previous.status.as_str();
                        previous.reopen_count += 1;
                        previous.status = FindingStatus::Open;
                        previous.resolved_at = None;
                        previous.note = Some(format!(
                            "Reopened (x{}) - reappeared in scan (was {was})",
                            previous.reopen_count
                        ));
                        diff.reopened += 1;
                    }
                    // Human decisions are sticky; open stays open.
                    FindingStatus::Open
                    | FindingStatus::Wontfix
                    | FindingStatus::FalsePositive => {}
                }
            }
        }
    }

    diff.total_current = current_ids.len();
    diff.suppressed_pct = if diff.raw_findings > 0 {
        (diff.ignored as f64 / diff.raw_findings as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    let ran: Option<BTreeSet<String>> = options
        .potentials
        .as_ref()
        .map(|p| p.keys().cloned().collect());
    let suspect = find_suspect_detectors(
        store,
        &by_detector,
        options.force_resolve,
        ran.as_ref(),
        &registry.import_only(),
    );

    auto_resolve_disappeared(store, &current_ids, &suspect, &now, options, &mut diff);
    diff.suspect_detectors = suspect.into_iter().collect();

    diff.chronic_reopeners = store
        .findings
        .values()
        .filter(|f| f.status == FindingStatus::Open && f.reopen_count >= CHRONIC_REOPEN_THRESHOLD)
        .map(|f| f.id.clone())
        .collect();

    store.recompute_stats();
    let scores = sloptrack_score::compute_scores(store, registry);
    store.overall_score = scores.overall;
    store.strict_score = scores.strict;

    store.push_history(ScanHistoryEntry {
        timestamp: now,
        lang: options.lang.clone(),
        overall_score: store.overall_score,
        strict_score: store.strict_score,
        open: store.stats.counts.open,
        diff_new: diff.new,
        diff_resolved: diff.auto_resolved,
        ignored: diff.ignored,
        raw_findings: diff.raw_findings,
        suppressed_pct: diff.suppressed_pct,
        ignore_patterns: diff.ignore_patterns,
    });

    diff
}

fn record_potentials(store: &mut Store, options: &MergeOptions) {
    let Some(potentials) = &options.potentials else {
        return;
    };
    let lang_key = options.lang.clone().unwrap_or_else(|| "any".to_string());
    let entry = store.potentials.entry(lang_key).or_default();
    if !options.merge_potentials {
        entry.clear();
    }
    for (detector, count) in potentials {
        entry.insert(detector.clone(), *count);
    }
}

/// Auto-resolve stored findings that this scan no longer reports, except
/// those protected by language, scope, exclusion, or a suspect detector.
fn auto_resolve_disappeared(
    store: &mut Store,
    current_ids: &BTreeSet<String>,
    suspect: &BTreeSet<String>,
    now: &str,
    options: &MergeOptions,
    diff: &mut ScanDiff,
) {
    for finding in store.findings.values_mut() {
        if current_ids.contains(&finding.id) {
            continue;
        }
        // Only open and wontfix findings are eligible: fixed and
        // false_positive carry a human decision that absence must not
        // overwrite.
        let eligible = matches!(
            finding.status,
            FindingStatus::Open | FindingStatus::Wontfix
        );
        if !eligible {
            continue;
        }

        if let (Some(lang), Some(finding_lang)) = (&options.lang, &finding.lang)
            && finding_lang != lang
        {
            diff.skipped_other_lang += 1;
            continue;
        }

        if let Some(scan_path) = options.scan_path.as_deref()
            && scan_path != "."
            && !in_scan_scope(&finding.file, Some(scan_path))
        {
            diff.skipped_out_of_scope += 1;
            continue;
        }

        if options
            .exclude
            .iter()
            .any(|pattern| matches_exclusion(&finding.file, pattern))
        {
            continue;
        }

        if suspect.contains(&finding.detector) {
            continue;
        }

        let was_wontfix = finding.status == FindingStatus::Wontfix;
        finding.status = FindingStatus::AutoResolved;
        finding.resolved_at = Some(now.to_string());
        finding.note = Some(if was_wontfix {
            "Fixed despite wontfix - disappeared from scan".to_string()
        } else {
            "Disappeared from scan - likely fixed".to_string()
        });
        diff.auto_resolved += 1;
    }
}

fn matches_exclusion(file: &str, pattern: &str) -> bool {
    if pattern.contains('*') || pattern.contains('?') {
        return sloptrack_store::wildcard_match(file, pattern);
    }
    file == pattern || file.starts_with(&format!("{}/", pattern.trim_end_matches('/')))
}
