//! Deterministic queue ordering and tier selection.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::{ItemKind, QueueItem};

/// Total order over queue items.
///
/// Review items always rank first (heaviest review first), then everything
/// else by effective tier. Within a tier, mechanical findings sort before
/// synthetic subjective items; mechanical ties break by confidence, then
/// magnitude, then ID, so equal inputs always produce equal queues.
pub fn compare_items(a: &QueueItem, b: &QueueItem) -> Ordering {
    let class_a = rank_class(a);
    let class_b = rank_class(b);
    if class_a != class_b {
        return class_a.cmp(&class_b);
    }

    if a.is_review {
        return b
            .review_weight
            .total_cmp(&a.review_weight)
            .then_with(|| a.confidence.rank().cmp(&b.confidence.rank()))
            .then_with(|| a.id.cmp(&b.id));
    }

    let subjective_a = u8::from(a.kind == ItemKind::SubjectiveDimension);
    let subjective_b = u8::from(b.kind == ItemKind::SubjectiveDimension);
    if subjective_a != subjective_b {
        return subjective_a.cmp(&subjective_b);
    }
    if a.kind == ItemKind::SubjectiveDimension {
        let score_a = a.subjective_score.unwrap_or(100.0);
        let score_b = b.subjective_score.unwrap_or(100.0);
        return score_a.total_cmp(&score_b).then_with(|| a.id.cmp(&b.id));
    }

    a.confidence
        .rank()
        .cmp(&b.confidence.rank())
        .then_with(|| b.count.cmp(&a.count))
        .then_with(|| a.id.cmp(&b.id))
}

fn rank_class(item: &QueueItem) -> u8 {
    if item.is_review { 0 } else { item.effective_tier }
}

pub fn tier_counts(items: &[QueueItem]) -> BTreeMap<u8, usize> {
    let mut counts: BTreeMap<u8, usize> = (1..=4).map(|tier| (tier, 0)).collect();
    for item in items {
        *counts.entry(item.effective_tier).or_insert(0) += 1;
    }
    counts
}

/// Nearest non-empty tier to the requested one; ties prefer the lower
/// tier. `None` when nothing is queued at all.
pub fn choose_fallback_tier(requested: u8, counts: &BTreeMap<u8, usize>) -> Option<u8> {
    counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(tier, _)| *tier)
        .min_by_key(|tier| (tier.abs_diff(requested), *tier))
}
