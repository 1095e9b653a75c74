//! # sloptrack-score
//!
//! Dimension and overall health scoring over findings + potentials.
//!
//! ## What belongs here
//! * Per-detector pass rates (confidence-weighted, zone-filtered,
//!   file-capped)
//! * Dimension scores in lenient and strict modes
//! * The sample-damped, tier-weighted overall score
//! * Score-impact simulation ("what if I fixed N issues of detector D")
//!
//! ## What does NOT belong here
//! * Reconciliation or persistence
//! * Work-queue ranking (sloptrack-plan)

#![forbid(unsafe_code)]

mod detector;

use std::collections::BTreeMap;

use serde::Serialize;
use sloptrack_registry::DetectorRegistry;
use sloptrack_types::{Finding, Store};

pub use detector::{DetectorBreakdown, detector_breakdown};

/// Minimum checks for full dimension weight. Below this the dimension's
/// weight shrinks proportionally so low-sample dimensions cannot swing
/// the overall score.
pub const MIN_SAMPLE: u64 = 200;

/// Per-file cap on weighted failures for file-based detectors.
pub const FILE_CAP: f64 = 1.0;

/// Which statuses count as failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    /// Only `open` fails.
    Lenient,
    /// `open` and `wontfix` fail; marking everything wontfix cannot game
    /// the number that matters.
    Strict,
}

/// Score and supporting figures for one mode of one dimension.
#[derive(Debug, Clone, Serialize)]
pub struct ModeStats {
    pub score: f64,
    pub issues: usize,
    pub weighted_failures: f64,
    pub detectors: BTreeMap<String, DetectorBreakdown>,
}

/// One dimension's scores, both modes computed in a single pass.
#[derive(Debug, Clone, Serialize)]
pub struct DimensionScore {
    pub name: String,
    pub tier: u8,
    /// Pooled potential across the dimension's detectors.
    pub checks: u64,
    pub lenient: ModeStats,
    pub strict: ModeStats,
}

/// All score channels from one engine pass.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreBundle {
    pub dimensions: Vec<DimensionScore>,
    pub overall: f64,
    pub strict: f64,
}

fn tier_weight(tier: u8) -> f64 {
    f64::from(tier.clamp(1, 4))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Compute per-dimension scores. Dimensions with zero pooled potential
/// are omitted entirely rather than scored 0 or 100.
pub fn compute_dimension_scores(
    findings: &BTreeMap<String, Finding>,
    potentials: &BTreeMap<String, u64>,
    registry: &DetectorRegistry,
) -> Vec<DimensionScore> {
    let mut out = Vec::new();

    for dim in registry.dimensions() {
        let mut checks = 0u64;
        let mut modes = [
            (ScoreMode::Lenient, ModeStats {
                score: 0.0,
                issues: 0,
                weighted_failures: 0.0,
                detectors: BTreeMap::new(),
            }),
            (ScoreMode::Strict, ModeStats {
                score: 0.0,
                issues: 0,
                weighted_failures: 0.0,
                detectors: BTreeMap::new(),
            }),
        ];

        for detector in &dim.detectors {
            let potential = potentials.get(detector).copied().unwrap_or(0);
            if potential == 0 {
                continue;
            }
            checks += potential;
            for (mode, stats) in &mut modes {
                let row = detector_breakdown(detector, findings, potential, registry, *mode);
                stats.issues += row.issues;
                stats.weighted_failures += row.weighted_failures;
                stats.detectors.insert(detector.clone(), row);
            }
        }

        if checks == 0 {
            continue;
        }
        for (_, stats) in &mut modes {
            let rate = ((checks as f64 - stats.weighted_failures) / checks as f64).max(0.0);
            stats.score = round1(rate * 100.0);
        }

        let [(_, lenient), (_, strict)] = modes;
        out.push(DimensionScore {
            name: dim.name.to_string(),
            tier: dim.tier,
            checks,
            lenient,
            strict,
        });
    }

    out
}

/// Tier-weighted average of dimension scores, each weight damped by
/// `min(1, checks / MIN_SAMPLE)`. No scored dimensions means a clean
/// slate: 100.
pub fn overall_score(dimensions: &[DimensionScore], mode: ScoreMode) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for dim in dimensions {
        let sample_factor = (dim.checks as f64 / MIN_SAMPLE as f64).min(1.0);
        let weight = tier_weight(dim.tier) * sample_factor;
        let score = match mode {
            ScoreMode::Lenient => dim.lenient.score,
            ScoreMode::Strict => dim.strict.score,
        };
        weighted_sum += score * weight;
        weight_total += weight;
    }
    if weight_total > 0.0 {
        round1(weighted_sum / weight_total)
    } else {
        100.0
    }
}

/// One full scoring pass over a store.
pub fn compute_scores(store: &Store, registry: &DetectorRegistry) -> ScoreBundle {
    let potentials = store.merged_potentials();
    let dimensions = compute_dimension_scores(&store.findings, &potentials, registry);
    let overall = overall_score(&dimensions, ScoreMode::Lenient);
    let strict = overall_score(&dimensions, ScoreMode::Strict);
    ScoreBundle {
        dimensions,
        overall,
        strict,
    }
}

/// Estimate the overall-score delta from fixing `issues_to_fix` issues of
/// one detector. Pure simulation over already-computed dimension scores;
/// real state is never mutated.
pub fn score_impact(
    dimensions: &[DimensionScore],
    registry: &DetectorRegistry,
    detector: &str,
    issues_to_fix: usize,
) -> f64 {
    let Some(dim_name) = registry.dimension_for(detector) else {
        return 0.0;
    };
    let Some(target) = dimensions.iter().find(|d| d.name == dim_name) else {
        return 0.0;
    };
    let Some(row) = target.lenient.detectors.get(detector) else {
        return 0.0;
    };
    if target.checks == 0 {
        return 0.0;
    }

    let old_overall = overall_score(dimensions, ScoreMode::Lenient);

    // Each fixed issue removes weight 1.0, the most conservative estimate.
    let new_detector_weighted = (row.weighted_failures - issues_to_fix as f64).max(0.0);
    let new_weighted =
        target.lenient.weighted_failures - row.weighted_failures + new_detector_weighted;
    let new_dim_score = round1(
        ((target.checks as f64 - new_weighted) / target.checks as f64).max(0.0) * 100.0,
    );

    let simulated: Vec<DimensionScore> = dimensions
        .iter()
        .map(|dim| {
            let mut dim = dim.clone();
            if dim.name == dim_name {
                dim.lenient.score = new_dim_score;
            }
            dim
        })
        .collect();

    round1(overall_score(&simulated, ScoreMode::Lenient) - old_overall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::Value;
    use sloptrack_types::{Confidence, FindingStatus, now_utc};

    fn open_finding(detector: &str, file: &str, confidence: Confidence) -> Finding {
        let now = now_utc();
        Finding {
            id: format!("{detector}::{file}"),
            detector: detector.into(),
            file: file.into(),
            tier: 3,
            confidence,
            summary: "issue".into(),
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

    fn findings_map(findings: Vec<Finding>) -> BTreeMap<String, Finding> {
        findings.into_iter().map(|f| (f.id.clone(), f)).collect()
    }

    #[test]
    fn zero_potential_dimensions_are_omitted() {
        let registry = DetectorRegistry::builtin();
        let potentials: BTreeMap<String, u64> = [("unused".to_string(), 50)].into();
        let dims = compute_dimension_scores(&BTreeMap::new(), &potentials, &registry);
        assert_eq!(dims.len(), 1);
        assert_eq!(dims[0].name, "Code quality");
    }

    #[test]
    fn clean_dimension_scores_one_hundred() {
        let registry = DetectorRegistry::builtin();
        let potentials: BTreeMap<String, u64> = [("unused".to_string(), 50)].into();
        let dims = compute_dimension_scores(&BTreeMap::new(), &potentials, &registry);
        assert_eq!(dims[0].lenient.score, 100.0);
        assert_eq!(dims[0].strict.score, 100.0);
    }

    #[test]
    fn strict_never_exceeds_lenient() {
        let registry = DetectorRegistry::builtin();
        let mut wontfix = open_finding("unused", "b.rs", Confidence::High);
        wontfix.status = FindingStatus::Wontfix;
        let findings = findings_map(vec![
            open_finding("unused", "a.rs", Confidence::High),
            wontfix,
        ]);
        let potentials: BTreeMap<String, u64> = [("unused".to_string(), 10)].into();
        let dims = compute_dimension_scores(&findings, &potentials, &registry);
        assert!(dims[0].strict.score < dims[0].lenient.score);
    }

    #[test]
    fn strict_equals_lenient_without_wontfix() {
        let registry = DetectorRegistry::builtin();
        let findings = findings_map(vec![open_finding("unused", "a.rs", Confidence::High)]);
        let potentials: BTreeMap<String, u64> = [("unused".to_string(), 10)].into();
        let dims = compute_dimension_scores(&findings, &potentials, &registry);
        assert_eq!(dims[0].strict.score, dims[0].lenient.score);
    }

    #[test]
    fn empty_input_scores_one_hundred_overall() {
        assert_eq!(overall_score(&[], ScoreMode::Lenient), 100.0);
        let registry = DetectorRegistry::builtin();
        let bundle = compute_scores(&Store::empty(), &registry);
        assert_eq!(bundle.overall, 100.0);
        assert_eq!(bundle.strict, 100.0);
    }

    #[test]
    fn low_sample_dimension_is_damped() {
        let registry = DetectorRegistry::builtin();
        // Big clean dimension, tiny failing one.
        let findings = findings_map(vec![open_finding("security", "a.rs", Confidence::High)]);
        let potentials: BTreeMap<String, u64> =
            [("unused".to_string(), 400), ("security".to_string(), 2)].into();
        let dims = compute_dimension_scores(&findings, &potentials, &registry);
        let overall = overall_score(&dims, ScoreMode::Lenient);
        // Security scored 50 but with 2/200 sample weight; near-clean overall.
        assert!(overall > 95.0, "overall was {overall}");
    }

    #[test]
    fn score_impact_is_positive_and_bounded() {
        let registry = DetectorRegistry::builtin();
        let findings = findings_map(
            (0..10)
                .map(|i| open_finding("unused", &format!("f{i}.rs"), Confidence::High))
                .collect(),
        );
        let potentials: BTreeMap<String, u64> = [("unused".to_string(), 200)].into();
        let dims = compute_dimension_scores(&findings, &potentials, &registry);
        let delta = score_impact(&dims, &registry, "unused", 5);
        assert!(delta > 0.0);
        let full = score_impact(&dims, &registry, "unused", 10);
        assert!(full >= delta);
        // Unknown detector and no-dimension detector have no impact.
        assert_eq!(score_impact(&dims, &registry, "nonsense", 5), 0.0);
        assert_eq!(score_impact(&dims, &registry, "review", 5), 0.0);
    }

    #[test]
    fn score_impact_does_not_mutate_inputs() {
        let registry = DetectorRegistry::builtin();
        let findings = findings_map(vec![open_finding("unused", "a.rs", Confidence::High)]);
        let potentials: BTreeMap<String, u64> = [("unused".to_string(), 10)].into();
        let dims = compute_dimension_scores(&findings, &potentials, &registry);
        let before = dims[0].lenient.score;
        let _ = score_impact(&dims, &registry, "unused", 1);
        assert_eq!(dims[0].lenient.score, before);
    }

    proptest! {
        #[test]
        fn dimension_scores_stay_in_bounds(
            open_count in 0usize..30,
            potential in 1u64..500,
        ) {
            let registry = DetectorRegistry::builtin();
            let findings = findings_map(
                (0..open_count)
                    .map(|i| open_finding("unused", &format!("f{i}.rs"), Confidence::High))
                    .collect(),
            );
            let potentials: BTreeMap<String, u64> =
                [("unused".to_string(), potential)].into();
            let dims = compute_dimension_scores(&findings, &potentials, &registry);
            for dim in &dims {
                prop_assert!((0.0..=100.0).contains(&dim.lenient.score));
                prop_assert!((0.0..=100.0).contains(&dim.strict.score));
                prop_assert!(dim.strict.score <= dim.lenient.score);
            }
            let overall = overall_score(&dims, ScoreMode::Lenient);
            prop_assert!((0.0..=100.0).contains(&overall));
        }

        #[test]
        fn more_failures_never_raise_the_score(extra in 1usize..20) {
            let registry = DetectorRegistry::builtin();
            let base: Vec<Finding> = (0..5)
                .map(|i| open_finding("unused", &format!("f{i}.rs"), Confidence::High))
                .collect();
            let mut bigger = base.clone();
            for i in 0..extra {
                bigger.push(open_finding("unused", &format!("g{i}.rs"), Confidence::High));
            }
            let potentials: BTreeMap<String, u64> = [("unused".to_string(), 100)].into();
            let small = compute_dimension_scores(&findings_map(base), &potentials, &registry);
            let large = compute_dimension_scores(&findings_map(bigger), &potentials, &registry);
            prop_assert!(large[0].lenient.score < small[0].lenient.score);
        }
    }
}
