//! Per-detector scoring stats.

use std::collections::BTreeMap;

use sloptrack_registry::DetectorRegistry;
use sloptrack_types::{Finding, FindingStatus, Zone};

use crate::{FILE_CAP, ScoreMode};

/// One detector's contribution to a dimension, per mode.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct DetectorBreakdown {
    pub potential: u64,
    pub pass_rate: f64,
    pub issues: usize,
    pub weighted_failures: f64,
}

fn fails_in_mode(status: FindingStatus, mode: ScoreMode) -> bool {
    match mode {
        ScoreMode::Lenient => status == FindingStatus::Open,
        ScoreMode::Strict => matches!(status, FindingStatus::Open | FindingStatus::Wontfix),
    }
}

/// Stats for one detector in one mode over the full finding map.
///
/// File-based detectors cap each file's weighted contribution at
/// `FILE_CAP`: the denominator counts files, so one file with many
/// same-detector findings must never out-weigh "this file fails".
pub fn detector_breakdown(
    detector: &str,
    findings: &BTreeMap<String, Finding>,
    potential: u64,
    registry: &DetectorRegistry,
    mode: ScoreMode,
) -> DetectorBreakdown {
    if potential == 0 {
        return DetectorBreakdown {
            potential,
            pass_rate: 1.0,
            issues: 0,
            weighted_failures: 0.0,
        };
    }

    let policy = registry.policy(detector);
    let mut issues = 0usize;
    let mut flat_weight = 0.0f64;
    let mut by_file: BTreeMap<&str, f64> = BTreeMap::new();

    for finding in findings.values() {
        if finding.detector != detector || !fails_in_mode(finding.status, mode) {
            continue;
        }
        let zone = finding.zone.unwrap_or(Zone::Production);
        if policy.excluded_zones.contains(&zone) {
            continue;
        }

        issues += 1;
        let weight = finding.confidence.weight();
        if policy.file_based {
            *by_file.entry(finding.file.as_str()).or_insert(0.0) += weight;
        } else {
            flat_weight += weight;
        }
    }

    let weighted_failures =
        flat_weight + by_file.values().map(|w| w.min(FILE_CAP)).sum::<f64>();
    let pass_rate = ((potential as f64 - weighted_failures) / potential as f64).max(0.0);

    DetectorBreakdown {
        potential,
        pass_rate,
        issues,
        weighted_failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use sloptrack_types::{Confidence, now_utc};

    fn finding(detector: &str, file: &str, status: FindingStatus, confidence: Confidence) -> Finding {
        let now = now_utc();
        Finding {
            id: format!("{detector}::{file}::{}", rand_suffix(file, status)),
            detector: detector.into(),
            file: file.into(),
            tier: 3,
            confidence,
            summary: "issue".into(),
            detail: Value::Null,
            status,
            note: None,
            first_seen: now.clone(),
            last_seen: now,
            resolved_at: None,
            reopen_count: 0,
            lang: None,
            zone: None,
        }
    }

    fn rand_suffix(file: &str, status: FindingStatus) -> String {
        format!("{file}-{}", status.as_str())
    }

    fn map(findings: Vec<Finding>) -> BTreeMap<String, Finding> {
        findings
            .into_iter()
            .enumerate()
            .map(|(i, f)| (format!("{}-{i}", f.id), f))
            .collect()
    }

    #[test]
    fn confidence_weights_accumulate() {
        let registry = DetectorRegistry::builtin();
        let findings = map(vec![
            finding("unused", "a.rs", FindingStatus::Open, Confidence::High),
            finding("unused", "b.rs", FindingStatus::Open, Confidence::Medium),
            finding("unused", "c.rs", FindingStatus::Open, Confidence::Low),
        ]);
        let row = detector_breakdown("unused", &findings, 10, &registry, ScoreMode::Lenient);
        assert_eq!(row.issues, 3);
        assert!((row.weighted_failures - 2.0).abs() < 1e-9);
        assert!((row.pass_rate - 0.8).abs() < 1e-9);
    }

    #[test]
    fn strict_counts_wontfix_lenient_does_not() {
        let registry = DetectorRegistry::builtin();
        let findings = map(vec![
            finding("unused", "a.rs", FindingStatus::Open, Confidence::High),
            finding("unused", "b.rs", FindingStatus::Wontfix, Confidence::High),
            finding("unused", "c.rs", FindingStatus::Fixed, Confidence::High),
        ]);
        let lenient = detector_breakdown("unused", &findings, 10, &registry, ScoreMode::Lenient);
        let strict = detector_breakdown("unused", &findings, 10, &registry, ScoreMode::Strict);
        assert_eq!(lenient.issues, 1);
        assert_eq!(strict.issues, 2);
        assert!(strict.pass_rate < lenient.pass_rate);
    }

    #[test]
    fn file_based_contribution_caps_at_one_per_file() {
        let registry = DetectorRegistry::builtin();
        // Five high-confidence findings in one file for a file-based detector.
        let findings = map(
            (0..5)
                .map(|i| {
                    let mut f =
                        finding("smells", "src/big.rs", FindingStatus::Open, Confidence::High);
                    f.id = format!("smells::src/big.rs::{i}");
                    f
                })
                .collect(),
        );
        let row = detector_breakdown("smells", &findings, 10, &registry, ScoreMode::Lenient);
        assert_eq!(row.issues, 5);
        assert!((row.weighted_failures - 1.0).abs() < 1e-9);
    }

    #[test]
    fn security_ignores_excluded_zones() {
        let registry = DetectorRegistry::builtin();
        let mut test_zone = finding("security", "tests/a.rs", FindingStatus::Open, Confidence::High);
        test_zone.zone = Some(Zone::Test);
        let prod = finding("security", "src/a.rs", FindingStatus::Open, Confidence::High);
        let findings = map(vec![test_zone, prod]);
        let row = detector_breakdown("security", &findings, 10, &registry, ScoreMode::Lenient);
        assert_eq!(row.issues, 1);
    }

    #[test]
    fn zero_potential_is_a_clean_pass() {
        let registry = DetectorRegistry::builtin();
        let findings = map(vec![finding(
            "unused",
            "a.rs",
            FindingStatus::Open,
            Confidence::High,
        )]);
        let row = detector_breakdown("unused", &findings, 0, &registry, ScoreMode::Lenient);
        assert_eq!(row.pass_rate, 1.0);
        assert_eq!(row.issues, 0);
    }

    #[test]
    fn pass_rate_floors_at_zero() {
        let registry = DetectorRegistry::builtin();
        let findings = map(
            (0..8)
                .map(|i| {
                    let mut f =
                        finding("unused", &format!("f{i}.rs"), FindingStatus::Open, Confidence::High);
                    f.id = format!("unused::f{i}.rs");
                    f
                })
                .collect(),
        );
        let row = detector_breakdown("unused", &findings, 4, &registry, ScoreMode::Lenient);
        assert_eq!(row.pass_rate, 0.0);
    }
}
