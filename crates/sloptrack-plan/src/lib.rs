//! # sloptrack-plan
//!
//! The work queue builder: turns the finding map into a deterministic,
//! ranked queue plus parallel-safe execution lanes.
//!
//! ## What belongs here
//! * Queue item construction (findings + synthetic subjective items)
//! * Ranking, tier counts, tier fallback
//! * Lane partitioning (cascade-ordered cleanup, union-find refactor lanes)
//!
//! ## What does NOT belong here
//! * Scoring (sloptrack-score)
//! * Store mutation of any kind; planning is read-only

#![forbid(unsafe_code)]

mod lanes;
mod rank;

use serde::Serialize;
use serde_json::Value;
use sloptrack_registry::{ActionKind, DetectorRegistry};
use sloptrack_types::{Confidence, Finding, FindingStatus, Store, in_scan_scope};

pub use lanes::{Automation, Lane, PlanLanes, build_lanes};
pub use rank::{choose_fallback_tier, compare_items, tier_counts};

/// Weight multiplier for holistic review findings (`file == "."` with the
/// holistic detail marker): whole-codebase design debt surfaces before
/// single-file review notes.
pub const HOLISTIC_MULTIPLIER: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Finding,
    /// Synthetic item for a human-assessed dimension below threshold.
    SubjectiveDimension,
}

/// One ranked unit of work.
#[derive(Debug, Clone, Serialize)]
pub struct QueueItem {
    pub id: String,
    pub kind: ItemKind,
    pub detector: String,
    pub file: String,
    /// Files this item touches; drives lane partitioning.
    pub files: Vec<String>,
    pub summary: String,
    pub tier: u8,
    /// Ranking tier: review is forced to 1, subjective items to 4.
    pub effective_tier: u8,
    pub confidence: Confidence,
    /// Detector-specific magnitude (`detail.count`), larger first.
    pub count: i64,
    pub is_review: bool,
    pub review_weight: f64,
    pub subjective_score: Option<f64>,
    pub action: ActionKind,
}

/// Which finding statuses enter the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    Open,
    All,
    Only(FindingStatus),
}

impl StatusFilter {
    fn matches(&self, status: FindingStatus) -> bool {
        match self {
            Self::Open => status == FindingStatus::Open,
            Self::All => true,
            Self::Only(wanted) => status == *wanted,
        }
    }
}

/// Queue construction and tier selection behavior.
#[derive(Debug, Clone)]
pub struct QueueOptions {
    pub tier: Option<u8>,
    /// Truncate the queue after ranking; `None` keeps everything.
    pub count: Option<usize>,
    pub status: StatusFilter,
    pub include_subjective: bool,
    /// Assessed dimensions scoring below this synthesize queue items.
    pub subjective_threshold: f64,
    /// Only open findings that reopened at least twice.
    pub chronic: bool,
    pub no_tier_fallback: bool,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            tier: None,
            count: None,
            status: StatusFilter::Open,
            include_subjective: true,
            subjective_threshold: 100.0,
            chronic: false,
            no_tier_fallback: false,
        }
    }
}

/// Ranked queue plus tier metadata, the consumer-contract payload.
#[derive(Debug, Clone, Serialize)]
pub struct WorkQueue {
    pub items: Vec<QueueItem>,
    /// Matching items before truncation.
    pub total: usize,
    pub tier_counts: std::collections::BTreeMap<u8, usize>,
    pub requested_tier: Option<u8>,
    pub selected_tier: Option<u8>,
    pub fallback_reason: Option<String>,
    pub available_tiers: Vec<u8>,
}

fn is_holistic(detail: &Value, file: &str) -> bool {
    file == "." && detail.get("holistic").and_then(Value::as_bool).unwrap_or(false)
}

fn item_files(finding: &Finding) -> Vec<String> {
    if let Some(files) = finding.detail.get("files").and_then(Value::as_array) {
        let listed: Vec<String> = files
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        if !listed.is_empty() {
            return listed;
        }
    }
    if finding.file.is_empty() || finding.file == "." {
        Vec::new()
    } else {
        vec![finding.file.clone()]
    }
}

/// Build a queue item from one stored finding.
pub fn queue_item(finding: &Finding, registry: &DetectorRegistry) -> QueueItem {
    let action = registry.action_kind(&finding.detector);
    let is_review = action == ActionKind::Review;
    let review_weight = if is_review {
        let base = finding.confidence.weight();
        if is_holistic(&finding.detail, &finding.file) {
            base * HOLISTIC_MULTIPLIER
        } else {
            base
        }
    } else {
        0.0
    };

    QueueItem {
        id: finding.id.clone(),
        kind: ItemKind::Finding,
        detector: finding.detector.clone(),
        file: finding.file.clone(),
        files: item_files(finding),
        summary: finding.summary.clone(),
        tier: finding.tier,
        effective_tier: if is_review { 1 } else { finding.tier },
        confidence: finding.confidence,
        count: finding.detail_count(),
        is_review,
        review_weight,
        subjective_score: None,
        action,
    }
}

fn subjective_items(store: &Store, threshold: f64) -> Vec<QueueItem> {
    let threshold = threshold.clamp(0.0, 100.0);
    store
        .assessments
        .iter()
        .filter(|(_, score)| **score < threshold)
        .map(|(dimension, score)| QueueItem {
            id: format!("subjective::{}", slugify(dimension)),
            kind: ItemKind::SubjectiveDimension,
            detector: String::new(),
            file: String::new(),
            files: Vec::new(),
            summary: format!("Assessed dimension \"{dimension}\" scored {score:.1}"),
            tier: 4,
            effective_tier: 4,
            confidence: Confidence::Low,
            count: 0,
            is_review: false,
            review_weight: 0.0,
            subjective_score: Some(*score),
            action: ActionKind::ManualFix,
        })
        .collect()
}

fn slugify(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Build the ranked work queue for a store.
pub fn build_work_queue(
    store: &Store,
    registry: &DetectorRegistry,
    options: &QueueOptions,
) -> WorkQueue {
    let scan_path = store.scan_path.as_deref();
    let mut items: Vec<QueueItem> = store
        .findings
        .values()
        .filter(|f| in_scan_scope(&f.file, scan_path))
        .filter(|f| options.status.matches(f.status))
        .filter(|f| {
            !options.chronic
                || (f.status == FindingStatus::Open
                    && f.reopen_count >= sloptrack_types::CHRONIC_REOPEN_THRESHOLD)
        })
        .map(|f| queue_item(f, registry))
        .collect();

    if options.include_subjective
        && matches!(options.status, StatusFilter::Open | StatusFilter::All)
        && !options.chronic
    {
        items.extend(subjective_items(store, options.subjective_threshold));
    }

    items.sort_by(compare_items);
    let counts = tier_counts(&items);

    let mut selected_tier = options.tier;
    let mut fallback_reason = None;
    let mut filtered = items;
    if let Some(requested) = options.tier {
        let matching: Vec<QueueItem> = filtered
            .iter()
            .filter(|i| i.effective_tier == requested)
            .cloned()
            .collect();
        if matching.is_empty() && !options.no_tier_fallback {
            match choose_fallback_tier(requested, &counts) {
                Some(chosen) => {
                    selected_tier = Some(chosen);
                    fallback_reason = Some(format!(
                        "Requested T{requested} has 0 open -> showing T{chosen} (nearest non-empty)."
                    ));
                    filtered.retain(|i| i.effective_tier == chosen);
                }
                None => {
                    fallback_reason = Some(format!("Requested T{requested} has 0 open."));
                    filtered.clear();
                }
            }
        } else {
            if matching.is_empty() {
                fallback_reason = Some(format!("Requested T{requested} has 0 open."));
            }
            filtered = matching;
        }
    }

    let total = filtered.len();
    if let Some(count) = options.count
        && count > 0
    {
        filtered.truncate(count);
    }

    let available_tiers = counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(tier, _)| *tier)
        .collect();

    WorkQueue {
        items: filtered,
        total,
        tier_counts: counts,
        requested_tier: options.tier,
        selected_tier,
        fallback_reason,
        available_tiers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sloptrack_types::now_utc;

    fn finding(detector: &str, file: &str, tier: u8, confidence: Confidence) -> Finding {
        let now = now_utc();
        Finding {
            id: format!("{detector}::{file}"),
            detector: detector.into(),
            file: file.into(),
            tier,
            confidence,
            summary: format!("{detector} issue"),
            detail: Value::Null,
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

    fn store_with(findings: Vec<Finding>) -> Store {
        let mut store = Store::empty();
        for f in findings {
            store.findings.insert(f.id.clone(), f);
        }
        store
    }

    #[test]
    fn queue_ranks_by_tier_then_confidence() {
        let registry = DetectorRegistry::builtin();
        let store = store_with(vec![
            finding("security", "src/a.rs", 4, Confidence::High),
            finding("unused", "src/b.rs", 3, Confidence::Low),
            finding("smells", "src/c.rs", 3, Confidence::High),
        ]);
        let queue = build_work_queue(&store, &registry, &QueueOptions::default());
        let ids: Vec<&str> = queue.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["smells::src/c.rs", "unused::src/b.rs", "security::src/a.rs"]);
        assert_eq!(queue.total, 3);
    }

    #[test]
    fn review_findings_surface_first_with_holistic_weight() {
        let registry = DetectorRegistry::builtin();
        let mut holistic = finding("review", ".", 4, Confidence::Medium);
        holistic.id = "review::.::coherence".into();
        holistic.detail = json!({"holistic": true});
        let plain_review = finding("review", "src/a.rs", 4, Confidence::High);
        let mechanical = finding("unused", "src/b.rs", 3, Confidence::High);
        let store = store_with(vec![holistic, plain_review, mechanical]);

        let queue = build_work_queue(&store, &registry, &QueueOptions::default());
        assert_eq!(queue.items[0].id, "review::.::coherence");
        assert!((queue.items[0].review_weight - 7.0).abs() < 1e-9);
        assert_eq!(queue.items[0].effective_tier, 1);
        assert_eq!(queue.items[1].id, "review::src/a.rs");
    }

    #[test]
    fn tier_fallback_reports_reason() {
        let registry = DetectorRegistry::builtin();
        let store = store_with(vec![finding("security", "src/a.rs", 4, Confidence::High)]);
        let options = QueueOptions {
            tier: Some(1),
            ..QueueOptions::default()
        };
        let queue = build_work_queue(&store, &registry, &options);
        assert_eq!(queue.selected_tier, Some(4));
        assert_eq!(queue.items.len(), 1);
        assert!(queue.fallback_reason.as_deref().unwrap().contains("T4"));
    }

    #[test]
    fn no_tier_fallback_returns_empty() {
        let registry = DetectorRegistry::builtin();
        let store = store_with(vec![finding("security", "src/a.rs", 4, Confidence::High)]);
        let options = QueueOptions {
            tier: Some(1),
            no_tier_fallback: true,
            ..QueueOptions::default()
        };
        let queue = build_work_queue(&store, &registry, &options);
        assert!(queue.items.is_empty());
        assert_eq!(queue.selected_tier, Some(1));
        assert!(queue.fallback_reason.is_some());
    }

    #[test]
    fn subjective_items_synthesize_below_threshold() {
        let registry = DetectorRegistry::builtin();
        let mut store = store_with(vec![]);
        store.assessments.insert("Test health".into(), 55.0);
        store.assessments.insert("Architecture".into(), 95.0);

        let options = QueueOptions {
            subjective_threshold: 80.0,
            ..QueueOptions::default()
        };
        let queue = build_work_queue(&store, &registry, &options);
        assert_eq!(queue.items.len(), 1);
        assert_eq!(queue.items[0].id, "subjective::test-health");
        assert_eq!(queue.items[0].effective_tier, 4);
        assert_eq!(queue.items[0].subjective_score, Some(55.0));
    }

    #[test]
    fn chronic_filter_keeps_only_repeat_offenders() {
        let registry = DetectorRegistry::builtin();
        let mut chronic = finding("smells", "src/a.rs", 3, Confidence::High);
        chronic.reopen_count = 2;
        let fresh = finding("smells", "src/b.rs", 3, Confidence::High);
        let store = store_with(vec![chronic, fresh]);

        let options = QueueOptions {
            chronic: true,
            ..QueueOptions::default()
        };
        let queue = build_work_queue(&store, &registry, &options);
        assert_eq!(queue.items.len(), 1);
        assert_eq!(queue.items[0].id, "smells::src/a.rs");
    }

    #[test]
    fn scan_path_scopes_the_queue_but_keeps_holistic() {
        let registry = DetectorRegistry::builtin();
        let mut holistic = finding("review", ".", 4, Confidence::High);
        holistic.detail = json!({"holistic": true});
        let mut store = store_with(vec![
            finding("smells", "src/a.rs", 3, Confidence::High),
            finding("smells", "tests/t.rs", 3, Confidence::High),
            holistic,
        ]);
        store.scan_path = Some("src".into());

        let queue = build_work_queue(&store, &registry, &QueueOptions::default());
        let ids: Vec<&str> = queue.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["review::.", "smells::src/a.rs"]);
    }

    #[test]
    fn count_truncates_after_ranking() {
        let registry = DetectorRegistry::builtin();
        let store = store_with(vec![
            finding("smells", "src/a.rs", 3, Confidence::High),
            finding("smells", "src/b.rs", 3, Confidence::Low),
        ]);
        let options = QueueOptions {
            count: Some(1),
            ..QueueOptions::default()
        };
        let queue = build_work_queue(&store, &registry, &options);
        assert_eq!(queue.items.len(), 1);
        assert_eq!(queue.total, 2);
        assert_eq!(queue.items[0].id, "smells::src/a.rs");
    }

    #[test]
    fn status_filter_selects_resolved_findings() {
        let registry = DetectorRegistry::builtin();
        let mut resolved = finding("smells", "src/a.rs", 3, Confidence::High);
        resolved.status = FindingStatus::AutoResolved;
        let store = store_with(vec![resolved, finding("unused", "src/b.rs", 3, Confidence::High)]);

        let options = QueueOptions {
            status: StatusFilter::Only(FindingStatus::AutoResolved),
            ..QueueOptions::default()
        };
        let queue = build_work_queue(&store, &registry, &options);
        assert_eq!(queue.items.len(), 1);
        assert_eq!(queue.items[0].id, "smells::src/a.rs");
    }
}
