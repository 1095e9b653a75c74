//! # sloptrack-types
//!
//! **Tier 0 (Core Types)**
//!
//! This crate defines the core data structures and contracts for `sloptrack`.
//! It contains only data types, Serde definitions, and `SCHEMA_VERSION`.
//!
//! ## Stability Policy
//!
//! **JSON-first stability**: the primary contract is the persisted JSON
//! document and the producer/consumer payloads, not Rust struct literals.
//! New fields get `#[serde(default)]`; removed/renamed fields bump
//! `SCHEMA_VERSION`.
//!
//! ## What belongs here
//! * Pure data structs (Finding, Store document, ScanDiff, raw batches)
//! * Serialization/deserialization logic, including the tolerant
//!   document normalizer used by the loader
//! * Stability markers (SCHEMA_VERSION)
//!
//! ## What does NOT belong here
//! * File I/O
//! * CLI argument parsing
//! * Reconciliation or scoring logic

pub mod document;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub use document::{Store, in_scan_scope};

/// The current schema version of the persisted store document.
pub const SCHEMA_VERSION: u32 = 1;

/// How many prior scan summaries the store retains.
pub const SCAN_HISTORY_LIMIT: usize = 20;

/// Recent history entries considered when reporting the suppression-rate
/// trend.
pub const SUPPRESSION_RATE_WINDOW: usize = 10;

/// Open findings that reopened at least this many times are "chronic".
pub const CHRONIC_REOPEN_THRESHOLD: u32 = 2;

/// Current UTC timestamp, RFC 3339, second precision.
pub fn now_utc() -> String {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0)
        .unwrap_or(now)
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

/// Lifecycle status of a persisted finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    #[default]
    Open,
    Fixed,
    Wontfix,
    FalsePositive,
    AutoResolved,
}

impl FindingStatus {
    /// Lenient parse used by the document normalizer. `resolved` is the
    /// legacy spelling of `fixed` from before the status rename.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "open" => Some(Self::Open),
            "fixed" | "resolved" => Some(Self::Fixed),
            "wontfix" => Some(Self::Wontfix),
            "false_positive" => Some(Self::FalsePositive),
            "auto_resolved" => Some(Self::AutoResolved),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Fixed => "fixed",
            Self::Wontfix => "wontfix",
            Self::FalsePositive => "false_positive",
            Self::AutoResolved => "auto_resolved",
        }
    }
}

/// Detector confidence in a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Scoring weight of one failure at this confidence.
    pub fn weight(&self) -> f64 {
        match self {
            Self::High => 1.0,
            Self::Medium => 0.7,
            Self::Low => 0.3,
        }
    }

    /// Sort rank: high first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }
}

/// Zone classification of the file a finding lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    #[default]
    Production,
    Test,
    Config,
    Generated,
    Script,
    Vendor,
}

impl Zone {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "production" => Some(Self::Production),
            "test" => Some(Self::Test),
            "config" => Some(Self::Config),
            "generated" => Some(Self::Generated),
            "script" => Some(Self::Script),
            "vendor" => Some(Self::Vendor),
            _ => None,
        }
    }
}

/// One persisted, trackable quality issue reported by a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub detector: String,
    pub file: String,
    /// Severity/effort class, 1 (auto-fixable) through 4 (major refactor).
    pub tier: u8,
    pub confidence: Confidence,
    pub summary: String,
    /// Opaque structured payload owned by the detector.
    #[serde(default)]
    pub detail: Value,
    pub status: FindingStatus,
    #[serde(default)]
    pub note: Option<String>,
    pub first_seen: String,
    pub last_seen: String,
    #[serde(default)]
    pub resolved_at: Option<String>,
    #[serde(default)]
    pub reopen_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<Zone>,
}

impl Finding {
    /// `detail.count` when present; the detector-specific magnitude used
    /// for ranking.
    pub fn detail_count(&self) -> i64 {
        self.detail.get("count").and_then(Value::as_i64).unwrap_or(0)
    }

    /// True when the finding describes the whole codebase rather than one
    /// file (`file == "."` with a holistic marker in the detail payload).
    pub fn is_holistic(&self) -> bool {
        self.file == "."
            && self
                .detail
                .get("holistic")
                .and_then(Value::as_bool)
                .unwrap_or(false)
    }
}

/// A raw finding record as handed over by a detector pass.
///
/// Fields are deliberately permissive: validation happens in the reconciler,
/// which drops malformed records with an enumerated reason instead of
/// failing the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFinding {
    #[serde(default)]
    pub detector: String,
    #[serde(default)]
    pub file: String,
    /// Disambiguating symbol within the file; empty for file-scoped findings.
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub tier: u8,
    #[serde(default)]
    pub confidence: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub detail: Value,
    #[serde(default)]
    pub zone: Option<String>,
}

/// Outcome of one detector phase: what it found, what it examined, and
/// whether it failed. The orchestrator decides whether an error degrades
/// completeness without aborting the scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseOutcome {
    pub detector: String,
    #[serde(default)]
    pub findings: u64,
    #[serde(default)]
    pub potential: u64,
    #[serde(default)]
    pub error: Option<String>,
}

/// Producer contract: one combined batch from the detector collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBatch {
    #[serde(default)]
    pub findings: Vec<RawFinding>,
    /// Detector name -> checkable units examined this scan. Also serves as
    /// the "detectors that ran" set.
    #[serde(default)]
    pub potentials: BTreeMap<String, u64>,
    #[serde(default)]
    pub phases: Vec<PhaseOutcome>,
}

/// Whether a scan covered everything it set out to cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Complete,
    Partial,
}

/// Why a raw record was dropped during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    EmptyDetector,
    EmptyFile,
    TierOutOfRange,
    BadConfidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroppedRecord {
    /// Index into the raw batch.
    pub index: usize,
    pub reason: DropReason,
    pub detector: String,
}

/// Transient summary of one reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanDiff {
    pub new: usize,
    pub reopened: usize,
    pub auto_resolved: usize,
    /// Raw findings suppressed by an ignore pattern; never stored.
    pub ignored: usize,
    /// Distinct finding IDs present in this scan.
    pub total_current: usize,
    pub suspect_detectors: Vec<String>,
    /// Open finding IDs whose reopen_count crossed the chronic threshold.
    pub chronic_reopeners: Vec<String>,
    pub skipped_other_lang: usize,
    pub skipped_out_of_scope: usize,
    pub raw_findings: usize,
    pub suppressed_pct: f64,
    pub ignore_patterns: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<DroppedRecord>,
}

/// Per-status tallies, also kept per tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub open: usize,
    pub fixed: usize,
    pub wontfix: usize,
    pub false_positive: usize,
    pub auto_resolved: usize,
}

impl StatusCounts {
    pub fn bump(&mut self, status: FindingStatus) {
        match status {
            FindingStatus::Open => self.open += 1,
            FindingStatus::Fixed => self.fixed += 1,
            FindingStatus::Wontfix => self.wontfix += 1,
            FindingStatus::FalsePositive => self.false_positive += 1,
            FindingStatus::AutoResolved => self.auto_resolved += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.open + self.fixed + self.wontfix + self.false_positive + self.auto_resolved
    }
}

/// Aggregate finding statistics, recomputed on every mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total: usize,
    #[serde(flatten)]
    pub counts: StatusCounts,
    #[serde(default)]
    pub by_tier: BTreeMap<u8, StatusCounts>,
}

/// One entry in the capped ring of prior scan summaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanHistoryEntry {
    pub timestamp: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub overall_score: f64,
    #[serde(default)]
    pub strict_score: f64,
    #[serde(default)]
    pub open: usize,
    #[serde(default)]
    pub diff_new: usize,
    #[serde(default)]
    pub diff_resolved: usize,
    #[serde(default)]
    pub ignored: usize,
    #[serde(default)]
    pub raw_findings: usize,
    #[serde(default)]
    pub suppressed_pct: f64,
    #[serde(default)]
    pub ignore_patterns: usize,
}
