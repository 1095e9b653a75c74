//! Handler for the `sloptrack scan` command.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;
use sloptrack_reconcile::{MergeOptions, merge_scan};
use sloptrack_registry::DetectorRegistry;
use sloptrack_store::StoreFile;
use sloptrack_types::{RawBatch, ScanStatus};

use crate::ScanArgs;

pub(crate) fn handle(store_path: &Path, args: ScanArgs) -> Result<()> {
    let batch = read_batch(&args.input)?;

    // A failed phase degrades completeness; it never aborts the merge.
    let failed: Vec<_> = batch
        .phases
        .iter()
        .filter(|phase| phase.error.is_some())
        .collect();
    for phase in &failed {
        eprintln!(
            "  warning: phase {} failed: {}",
            phase.detector,
            phase.error.as_deref().unwrap_or("unknown error")
        );
    }
    let status = if failed.is_empty() {
        ScanStatus::Complete
    } else {
        ScanStatus::Partial
    };

    let registry = DetectorRegistry::builtin();
    let mut handle = StoreFile::load(store_path);
    let options = MergeOptions {
        lang: args.lang,
        scan_path: args.path,
        exclude: args.exclude,
        potentials: if batch.potentials.is_empty() {
            None
        } else {
            Some(batch.potentials.clone())
        },
        merge_potentials: args.merge_potentials,
        force_resolve: args.force_resolve,
        ignore: None,
    };

    let diff = merge_scan(&mut handle.store, &batch.findings, &registry, &options);
    handle
        .save()
        .with_context(|| format!("saving store at {}", store_path.display()))?;

    for dropped in &diff.dropped {
        eprintln!(
            "  warning: dropped record #{} from {}: {:?}",
            dropped.index, dropped.detector, dropped.reason
        );
    }
    eprintln!(
        "  scan merged: {} new, {} reopened, {} auto-resolved, {} ignored",
        diff.new, diff.reopened, diff.auto_resolved, diff.ignored
    );

    let payload = json!({
        "status": status,
        "diff": diff,
        "overall_score": handle.store.overall_score,
        "strict_score": handle.store.strict_score,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn read_batch(input: &str) -> Result<RawBatch> {
    let text = if input == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("reading batch from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading batch from {input}"))?
    };
    serde_json::from_str(&text).with_context(|| format!("parsing batch JSON from {input}"))
}
