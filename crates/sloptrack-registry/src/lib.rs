//! # sloptrack-registry
//!
//! Canonical detector registry - single source of truth.
//!
//! All detector metadata lives here: dimension assignment, severity tier,
//! action kind, file-based scoring, and zone exclusions. The registry is an
//! explicit value built once at startup and passed by reference; there is no
//! process-wide self-registration, so tests can build isolated registries
//! with exactly the detectors they need.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sloptrack_types::Zone;

/// What kind of remediation a detector's findings call for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A fixer can resolve these mechanically.
    AutoFix,
    /// Move/rename/delete work.
    Reorganize,
    /// Hands-on code changes.
    Refactor,
    /// Human judgment, no tool support.
    ManualFix,
    /// Human design assessment; enters via review import, not scans.
    Review,
}

/// Scoring and planning policy for one detector.
#[derive(Debug, Clone)]
pub struct DetectorMeta {
    pub name: &'static str,
    /// Scoring dimension; `None` keeps the detector out of mechanical scoring.
    pub dimension: Option<&'static str>,
    pub tier: u8,
    pub action: ActionKind,
    /// Potential counts files and per-file weighted failures are capped.
    pub file_based: bool,
    /// Findings in these zones are excluded from scoring.
    pub excluded_zones: &'static [Zone],
}

/// A named group of related detectors sharing a severity tier.
#[derive(Debug, Clone)]
pub struct Dimension {
    pub name: String,
    pub tier: u8,
    pub detectors: Vec<String>,
}

/// Zones where security findings carry no scoring weight.
pub const SECURITY_EXCLUDED_ZONES: &[Zone] =
    &[Zone::Test, Zone::Config, Zone::Generated, Zone::Vendor];

const NO_EXCLUDED_ZONES: &[Zone] = &[];

/// Detector names whose findings enter via review import rather than scan
/// phases. The reconciler always treats them as suspect so a scan never
/// auto-resolves them.
pub const IMPORT_ONLY_DETECTORS: &[&str] = &["review"];

/// Automated-fix scheduling order. Earlier fixers can resolve stale findings
/// owned by later detectors (removing an unused import can kill a dead
/// export, which can kill a smell), so the cleanup lane runs in this order.
pub const DETECTOR_CASCADE: &[&str] = &["unused", "logs", "exports", "smells"];

static DIMENSION_SPECS: &[(&str, u8)] = &[
    ("File health", 3),
    ("Code quality", 3),
    ("Duplication", 3),
    ("Test health", 4),
    ("Security", 4),
];

/// The explicit registry value. Build once with [`DetectorRegistry::builtin`]
/// and pass by reference to the scoring engine and work queue builder.
#[derive(Debug, Clone, Default)]
pub struct DetectorRegistry {
    detectors: BTreeMap<&'static str, DetectorMeta>,
}

impl DetectorRegistry {
    /// The standard detector set.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for meta in builtin_detectors() {
            registry.detectors.insert(meta.name, meta);
        }
        registry
    }

    /// Empty registry for tests that want full control.
    pub fn bare() -> Self {
        Self::default()
    }

    /// Add or replace a detector entry.
    pub fn with_detector(mut self, meta: DetectorMeta) -> Self {
        self.detectors.insert(meta.name, meta);
        self
    }

    pub fn get(&self, detector: &str) -> Option<&DetectorMeta> {
        self.detectors.get(detector)
    }

    /// Policy lookup with a safe default for unknown detectors: no
    /// dimension, tier 3, manual fix, no zone exclusions.
    pub fn policy(&self, detector: &str) -> DetectorMeta {
        self.detectors.get(detector).cloned().unwrap_or(DetectorMeta {
            name: "",
            dimension: None,
            tier: 3,
            action: ActionKind::ManualFix,
            file_based: false,
            excluded_zones: NO_EXCLUDED_ZONES,
        })
    }

    pub fn action_kind(&self, detector: &str) -> ActionKind {
        self.policy(detector).action
    }

    pub fn is_file_based(&self, detector: &str) -> bool {
        self.policy(detector).file_based
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.detectors.keys().copied()
    }

    /// Dimensions derived from the current detector set, in declaration
    /// order, each listing its member detectors.
    pub fn dimensions(&self) -> Vec<Dimension> {
        let mut grouped: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for meta in self.detectors.values() {
            if let Some(dimension) = meta.dimension {
                grouped
                    .entry(dimension)
                    .or_default()
                    .push(meta.name.to_string());
            }
        }
        DIMENSION_SPECS
            .iter()
            .filter_map(|(name, tier)| {
                grouped.remove(name).map(|detectors| Dimension {
                    name: (*name).to_string(),
                    tier: *tier,
                    detectors,
                })
            })
            .collect()
    }

    /// Which dimension a detector belongs to.
    pub fn dimension_for(&self, detector: &str) -> Option<&'static str> {
        self.detectors.get(detector).and_then(|meta| meta.dimension)
    }

    /// Detectors that never enter via scan phases.
    pub fn import_only(&self) -> BTreeSet<&'static str> {
        IMPORT_ONLY_DETECTORS.iter().copied().collect()
    }

    /// Rank in the automated-fix cascade; unlisted detectors sort last.
    pub fn cascade_rank(&self, detector: &str) -> usize {
        DETECTOR_CASCADE
            .iter()
            .position(|name| *name == detector)
            .unwrap_or(DETECTOR_CASCADE.len())
    }
}

fn builtin_detectors() -> Vec<DetectorMeta> {
    let plain = |name, dimension, tier, action| DetectorMeta {
        name,
        dimension: Some(dimension),
        tier,
        action,
        file_based: false,
        excluded_zones: NO_EXCLUDED_ZONES,
    };
    vec![
        // File health
        plain("structural", "File health", 3, ActionKind::Refactor),
        // Code quality
        plain("unused", "Code quality", 3, ActionKind::AutoFix),
        plain("logs", "Code quality", 3, ActionKind::AutoFix),
        plain("exports", "Code quality", 3, ActionKind::AutoFix),
        DetectorMeta {
            name: "smells",
            dimension: Some("Code quality"),
            tier: 3,
            action: ActionKind::AutoFix,
            file_based: true,
            excluded_zones: NO_EXCLUDED_ZONES,
        },
        plain("naming", "Code quality", 3, ActionKind::Reorganize),
        plain("orphaned", "Code quality", 3, ActionKind::Reorganize),
        plain("coupling", "Code quality", 3, ActionKind::Reorganize),
        plain("patterns", "Code quality", 3, ActionKind::Refactor),
        // Duplication
        plain("dupes", "Duplication", 3, ActionKind::Refactor),
        // Test health
        DetectorMeta {
            name: "test_coverage",
            dimension: Some("Test health"),
            tier: 4,
            action: ActionKind::Refactor,
            file_based: true,
            excluded_zones: NO_EXCLUDED_ZONES,
        },
        // Security
        DetectorMeta {
            name: "security",
            dimension: Some("Security"),
            tier: 4,
            action: ActionKind::ManualFix,
            file_based: true,
            excluded_zones: SECURITY_EXCLUDED_ZONES,
        },
        plain("cycles", "Security", 4, ActionKind::Reorganize),
        // Review findings are ranked by the planner, never scored mechanically.
        DetectorMeta {
            name: "review",
            dimension: None,
            tier: 1,
            action: ActionKind::Review,
            file_based: true,
            excluded_zones: NO_EXCLUDED_ZONES,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_dimensions_follow_declaration_order() {
        let registry = DetectorRegistry::builtin();
        let dimensions = registry.dimensions();
        let names: Vec<&str> = dimensions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            ["File health", "Code quality", "Duplication", "Test health", "Security"]
        );
    }

    #[test]
    fn review_detector_has_no_dimension() {
        let registry = DetectorRegistry::builtin();
        assert_eq!(registry.dimension_for("review"), None);
        assert_eq!(registry.action_kind("review"), ActionKind::Review);
        for dimension in registry.dimensions() {
            assert!(!dimension.detectors.iter().any(|d| d == "review"));
        }
    }

    #[test]
    fn unknown_detector_gets_safe_default_policy() {
        let registry = DetectorRegistry::builtin();
        let policy = registry.policy("not_a_detector");
        assert_eq!(policy.dimension, None);
        assert_eq!(policy.tier, 3);
        assert!(!policy.file_based);
    }

    #[test]
    fn cascade_rank_orders_fixers() {
        let registry = DetectorRegistry::builtin();
        assert!(registry.cascade_rank("unused") < registry.cascade_rank("smells"));
        assert_eq!(registry.cascade_rank("dupes"), DETECTOR_CASCADE.len());
    }

    #[test]
    fn with_detector_is_isolated_per_value() {
        let custom = DetectorRegistry::bare().with_detector(DetectorMeta {
            name: "custom",
            dimension: Some("Code quality"),
            tier: 2,
            action: ActionKind::AutoFix,
            file_based: false,
            excluded_zones: &[],
        });
        assert!(custom.get("custom").is_some());
        assert!(DetectorRegistry::builtin().get("custom").is_none());
    }

    #[test]
    fn security_zone_exclusions_apply() {
        let registry = DetectorRegistry::builtin();
        let policy = registry.policy("security");
        assert!(policy.excluded_zones.contains(&Zone::Test));
        assert!(!policy.excluded_zones.contains(&Zone::Production));
    }
}
