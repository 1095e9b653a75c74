//! Handler for the `sloptrack next` command.

use std::path::Path;

use anyhow::Result;
use serde_json::json;
use sloptrack_plan::{QueueOptions, build_work_queue};
use sloptrack_registry::DetectorRegistry;
use sloptrack_store::load_store;

use crate::NextArgs;

pub(crate) fn handle(store_path: &Path, args: NextArgs) -> Result<()> {
    let store = load_store(store_path);
    let registry = DetectorRegistry::builtin();
    let options = QueueOptions {
        tier: args.tier,
        count: Some(args.count),
        status: args.status.to_filter(),
        include_subjective: true,
        subjective_threshold: args.threshold,
        chronic: args.chronic,
        no_tier_fallback: args.no_tier_fallback,
    };
    let queue = build_work_queue(&store, &registry, &options);

    if let Some(reason) = &queue.fallback_reason {
        eprintln!("  {reason}");
    }
    let payload = json!({
        "items": queue.items,
        "total": queue.total,
        "tier_counts": queue.tier_counts,
        "requested_tier": queue.requested_tier,
        "selected_tier": queue.selected_tier,
        "fallback_reason": queue.fallback_reason,
        "available_tiers": queue.available_tiers,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
