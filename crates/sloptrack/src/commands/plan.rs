//! Handler for the `sloptrack plan` command.

use std::path::Path;

use anyhow::Result;
use serde_json::json;
use sloptrack_plan::{QueueOptions, build_lanes, build_work_queue};
use sloptrack_registry::DetectorRegistry;
use sloptrack_store::load_store;

use crate::PlanArgs;

pub(crate) fn handle(store_path: &Path, args: PlanArgs) -> Result<()> {
    let store = load_store(store_path);
    let registry = DetectorRegistry::builtin();
    let options = QueueOptions {
        subjective_threshold: args.threshold,
        ..QueueOptions::default()
    };
    let queue = build_work_queue(&store, &registry, &options);
    let lanes = build_lanes(&queue.items, &registry);

    let payload = json!({
        "items": queue.items,
        "tier_counts": queue.tier_counts,
        "lanes": lanes.lanes,
        "can_parallelize": lanes.can_parallelize,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}
