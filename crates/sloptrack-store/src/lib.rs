//! # sloptrack-store
//!
//! Finding identity and on-disk persistence for the sloptrack state
//! document.
//!
//! ## What belongs here
//! * Deterministic finding ID derivation (pure, no I/O)
//! * Load/save with backup rotation, corruption fallback, and atomic
//!   temp-then-rename writes
//! * Explicit human operations outside scanning: resolve, ignore
//!
//! ## What does NOT belong here
//! * Scan reconciliation (sloptrack-reconcile)
//! * Scoring (sloptrack-score)

#![forbid(unsafe_code)]

mod ident;
mod ops;
mod patterns;
mod persist;

use std::path::PathBuf;

pub use ident::{content_fingerprint, finding_id, new_finding};
pub use ops::{add_ignore, matches_selector, remove_ignore, resolve_findings, sweep_ignored};
pub use patterns::{matched_ignore_pattern, wildcard_match};
pub use persist::{StoreFile, load_store, save_store};

/// Errors from store persistence. Everything else in this crate degrades
/// instead of failing: a half-written document is the one outcome that
/// would corrupt history, so I/O failures on save are hard errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(
        "store changed on disk since load (scan_count {expected} -> {found}); \
         reload before saving"
    )]
    Conflict { expected: u64, found: u64 },
}
