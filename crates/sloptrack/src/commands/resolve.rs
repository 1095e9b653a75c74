//! Handler for the `sloptrack resolve` command.

use std::path::Path;

use anyhow::{Context, Result};
use sloptrack_store::{StoreFile, resolve_findings};

use crate::ResolveArgs;

pub(crate) fn handle(store_path: &Path, args: ResolveArgs) -> Result<()> {
    let mut handle = StoreFile::load(store_path);
    let changed = resolve_findings(
        &mut handle.store,
        &args.selector,
        args.status.to_status(),
        args.note.as_deref(),
    );
    if changed.is_empty() {
        eprintln!("  no open findings match '{}'", args.selector);
        return Ok(());
    }
    handle
        .save()
        .with_context(|| format!("saving store at {}", store_path.display()))?;

    eprintln!("  resolved {} finding(s)", changed.len());
    for id in &changed {
        println!("{id}");
    }
    Ok(())
}
