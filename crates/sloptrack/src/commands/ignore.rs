//! Handler for the `sloptrack ignore` command.

use std::path::Path;

use anyhow::{Context, Result};
use sloptrack_store::{StoreFile, add_ignore, remove_ignore};

use crate::{IgnoreAction, IgnoreArgs};

pub(crate) fn handle(store_path: &Path, args: IgnoreArgs) -> Result<()> {
    let mut handle = StoreFile::load(store_path);
    match args.action {
        IgnoreAction::Add { pattern } => {
            let removed = add_ignore(&mut handle.store, &pattern);
            handle
                .save()
                .with_context(|| format!("saving store at {}", store_path.display()))?;
            eprintln!(
                "  added '{pattern}', removed {} tracked finding(s)",
                removed.len()
            );
            for id in removed {
                println!("{id}");
            }
        }
        IgnoreAction::Remove { pattern } => {
            if remove_ignore(&mut handle.store, &pattern) {
                handle
                    .save()
                    .with_context(|| format!("saving store at {}", store_path.display()))?;
                eprintln!("  removed '{pattern}'; the next scan rediscovers anything still present");
            } else {
                eprintln!("  no such pattern '{pattern}'");
            }
        }
        IgnoreAction::List => {
            for pattern in &handle.store.ignore {
                println!("{pattern}");
            }
        }
    }
    Ok(())
}
