//! Handler for the `sloptrack score` command.

use std::path::Path;

use anyhow::Result;
use sloptrack_registry::DetectorRegistry;
use sloptrack_score::compute_scores;
use sloptrack_store::load_store;

use crate::ScoreArgs;

pub(crate) fn handle(store_path: &Path, args: ScoreArgs) -> Result<()> {
    let store = load_store(store_path);
    let registry = DetectorRegistry::builtin();
    let bundle = compute_scores(&store, &registry);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
        return Ok(());
    }

    if bundle.dimensions.is_empty() {
        println!("No scored dimensions yet; run a scan with potentials first.");
    }
    for dim in &bundle.dimensions {
        println!(
            "{:<14} T{}  score {:>5.1}  strict {:>5.1}  checks {:>6}  issues {}",
            dim.name, dim.tier, dim.lenient.score, dim.strict.score, dim.checks, dim.lenient.issues
        );
    }
    let headline = if args.strict { bundle.strict } else { bundle.overall };
    let label = if args.strict { "strict" } else { "overall" };
    println!("{label}: {headline:.1}");
    Ok(())
}
