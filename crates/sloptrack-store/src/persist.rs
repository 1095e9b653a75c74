//! Load/save for the state document.
//!
//! Load never fails: missing -> empty, corrupted -> backup -> empty, with
//! the corrupted artifact preserved under a renamed path for forensics.
//! Save is atomic (write-temp-then-rename) and rotates the previous valid
//! document into a `.bak` slot so each save can recover the prior
//! generation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sloptrack_types::Store;

use crate::StoreError;

const BACKUP_SUFFIX: &str = "bak";
const CORRUPTED_SUFFIX: &str = "corrupted";

/// Load the store at `path`, or an empty store when the document is
/// missing or unrecoverable.
pub fn load_store(path: &Path) -> Store {
    if !path.exists() {
        return Store::empty();
    }

    match read_document(path) {
        Ok(doc) => {
            let store = Store::from_document(&doc);
            if store.version > sloptrack_types::SCHEMA_VERSION {
                eprintln!(
                    "  warning: state file schema v{} is newer than supported v{}, loading best-effort",
                    store.version,
                    sloptrack_types::SCHEMA_VERSION
                );
            }
            store
        }
        Err(err) => {
            let backup = sibling(path, BACKUP_SUFFIX);
            if backup.exists()
                && let Ok(doc) = read_document(&backup)
            {
                eprintln!("  warning: state file corrupted ({err}), loaded from backup");
                return Store::from_document(&doc);
            }

            eprintln!("  warning: state file corrupted ({err}), starting fresh");
            // Keep the corrupted artifact for forensics; never overwrite it.
            let quarantine = sibling(path, CORRUPTED_SUFFIX);
            if let Err(rename_err) = fs::rename(path, &quarantine) {
                eprintln!(
                    "  warning: could not preserve corrupted state at {}: {rename_err}",
                    quarantine.display()
                );
            }
            Store::empty()
        }
    }
}

/// Save the store atomically. `expected_generation` enables the optimistic
/// concurrency check: when set, the save is rejected if the on-disk
/// `scan_count` no longer matches what the caller loaded.
pub fn save_store(
    store: &mut Store,
    path: &Path,
    expected_generation: Option<u64>,
) -> Result<(), StoreError> {
    store.recompute_stats();

    if let Some(expected) = expected_generation
        && path.exists()
        && let Ok(doc) = read_document(path)
    {
        let found = doc.get("scan_count").and_then(Value::as_u64).unwrap_or(0);
        if found != expected {
            return Err(StoreError::Conflict { expected, found });
        }
    }

    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut content = serde_json::to_string_pretty(store)?;
    content.push('\n');

    // Rotate the previous valid document into the backup slot.
    if path.exists()
        && let Err(backup_err) = fs::copy(path, sibling(path, BACKUP_SUFFIX))
    {
        eprintln!("  warning: could not rotate state backup: {backup_err}");
    }

    let dir = parent.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(|source| StoreError::Io {
        path: dir.clone(),
        source,
    })?;
    temp.write_all(content.as_bytes())
        .map_err(|source| StoreError::Io {
            path: temp.path().to_path_buf(),
            source,
        })?;
    temp.persist(path).map_err(|err| StoreError::Io {
        path: path.to_path_buf(),
        source: err.error,
    })?;
    Ok(())
}

/// A loaded store bound to its path, carrying the generation observed at
/// load time so saves can detect concurrent writers.
#[derive(Debug)]
pub struct StoreFile {
    path: PathBuf,
    loaded_generation: u64,
    pub store: Store,
}

impl StoreFile {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let store = load_store(&path);
        Self {
            loaded_generation: store.scan_count,
            path,
            store,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save with the optimistic generation check, then track the new
    /// generation so subsequent saves from this handle keep working.
    pub fn save(&mut self) -> Result<(), StoreError> {
        save_store(&mut self.store, &self.path, Some(self.loaded_generation))?;
        self.loaded_generation = self.store.scan_count;
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<Value, String> {
    let text = fs::read_to_string(path).map_err(|err| err.to_string())?;
    let doc: Value = serde_json::from_str(&text).map_err(|err| err.to_string())?;
    if doc.is_object() {
        Ok(doc)
    } else {
        Err("state file root must be a JSON object".to_string())
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push('.');
    name.push_str(suffix);
    path.with_file_name(name)
}
