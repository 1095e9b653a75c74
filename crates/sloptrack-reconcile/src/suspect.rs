//! Suspect-detector detection.
//!
//! A detector that previously had open findings and suddenly reports zero
//! usually crashed or was skipped, it did not fix the codebase. Its stored
//! findings must survive the scan untouched instead of auto-resolving.

use std::collections::{BTreeMap, BTreeSet};

use sloptrack_types::{FindingStatus, Store};

/// Heuristic floor: with fewer prior open findings than this, a drop to
/// zero is plausible legitimate progress and no ran-set is required.
pub const SUSPECT_MIN_PRIOR_OPEN: usize = 3;

/// Detectors that had open findings but likely did not run this scan.
///
/// When `ran` is supplied it is authoritative: a detector absent from it
/// is suspect, a detector present in it is trusted even at zero findings.
/// Without a ran-set, the fallback heuristic flags detectors that go from
/// `SUSPECT_MIN_PRIOR_OPEN`+ open findings to exactly zero. Import-only
/// detectors never arrive via scan batches, so they are always suspect.
pub fn find_suspect_detectors(
    store: &Store,
    current_by_detector: &BTreeMap<String, usize>,
    force_resolve: bool,
    ran: Option<&BTreeSet<String>>,
    import_only: &BTreeSet<&'static str>,
) -> BTreeSet<String> {
    if force_resolve {
        return BTreeSet::new();
    }

    let mut previous_open: BTreeMap<&str, usize> = BTreeMap::new();
    for finding in store.findings.values() {
        if finding.status == FindingStatus::Open {
            *previous_open.entry(finding.detector.as_str()).or_insert(0) += 1;
        }
    }

    let mut suspect = BTreeSet::new();
    for (detector, previous_count) in previous_open {
        if import_only.contains(detector) {
            suspect.insert(detector.to_string());
            continue;
        }
        if current_by_detector.get(detector).copied().unwrap_or(0) > 0 {
            continue;
        }
        match ran {
            Some(ran) => {
                if !ran.contains(detector) {
                    suspect.insert(detector.to_string());
                }
            }
            None => {
                if previous_count >= SUSPECT_MIN_PRIOR_OPEN {
                    suspect.insert(detector.to_string());
                }
            }
        }
    }
    suspect
}
