//! Raw-record validation. Malformed records are dropped with an
//! enumerated reason, never raised.

use serde_json::Value;
use sloptrack_types::{Confidence, DropReason, RawFinding, Zone};

/// A raw finding that passed validation, with parsed fields.
#[derive(Debug, Clone)]
pub struct ValidFinding {
    pub detector: String,
    pub file: String,
    pub symbol: String,
    pub tier: u8,
    pub confidence: Confidence,
    pub summary: String,
    pub detail: Value,
    pub zone: Option<Zone>,
}

/// Validate one raw record. An unparseable zone degrades to `None`
/// rather than dropping the record; the zone only affects scoring.
pub fn validate_raw(raw: &RawFinding) -> Result<ValidFinding, DropReason> {
    if raw.detector.trim().is_empty() {
        return Err(DropReason::EmptyDetector);
    }
    if raw.file.trim().is_empty() {
        return Err(DropReason::EmptyFile);
    }
    if !(1..=4).contains(&raw.tier) {
        return Err(DropReason::TierOutOfRange);
    }
    let confidence = Confidence::parse(&raw.confidence).ok_or(DropReason::BadConfidence)?;

    Ok(ValidFinding {
        detector: raw.detector.clone(),
        file: raw.file.clone(),
        symbol: raw.symbol.clone(),
        tier: raw.tier,
        confidence,
        summary: raw.summary.clone(),
        detail: raw.detail.clone(),
        zone: raw.zone.as_deref().and_then(Zone::parse),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(detector: &str, file: &str, tier: u8, confidence: &str) -> RawFinding {
        RawFinding {
            detector: detector.into(),
            file: file.into(),
            tier,
            confidence: confidence.into(),
            ..RawFinding::default()
        }
    }

    #[test]
    fn well_formed_record_passes() {
        let valid = validate_raw(&raw("smells", "src/a.rs", 3, "high")).unwrap();
        assert_eq!(valid.detector, "smells");
        assert_eq!(valid.confidence, Confidence::High);
    }

    #[test]
    fn each_drop_reason_triggers() {
        assert_eq!(
            validate_raw(&raw("", "src/a.rs", 3, "high")).unwrap_err(),
            DropReason::EmptyDetector
        );
        assert_eq!(
            validate_raw(&raw("smells", " ", 3, "high")).unwrap_err(),
            DropReason::EmptyFile
        );
        assert_eq!(
            validate_raw(&raw("smells", "src/a.rs", 0, "high")).unwrap_err(),
            DropReason::TierOutOfRange
        );
        assert_eq!(
            validate_raw(&raw("smells", "src/a.rs", 5, "high")).unwrap_err(),
            DropReason::TierOutOfRange
        );
        assert_eq!(
            validate_raw(&raw("smells", "src/a.rs", 3, "certain")).unwrap_err(),
            DropReason::BadConfidence
        );
    }

    #[test]
    fn unknown_zone_degrades_to_none() {
        let mut record = raw("security", "src/a.rs", 4, "medium");
        record.zone = Some("mystery".into());
        let valid = validate_raw(&record).unwrap();
        assert!(valid.zone.is_none());
    }
}
