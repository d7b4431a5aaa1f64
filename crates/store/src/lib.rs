//! Persisted host configuration (apps.json) for Sunshine-style hosts.
//!
//! The store is the only component allowed to touch the file: it loads
//! the document tolerating absence, and saves it crash-safely: backup
//! first, then an atomic temp-file-and-rename write. Unknown fields are
//! preserved on round-trip so hand edits and host upgrades survive.

mod config;
mod stock;

pub use config::{ConfiguredApp, HostConfiguration, clear_dir_files, load, save};
pub use stock::{HostVariant, stock_apps};

use std::path::PathBuf;

/// Errors from configuration persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("malformed host configuration {path}: {detail}")]
    Malformed { path: PathBuf, detail: String },

    #[error("permission denied writing {path}: {guidance}")]
    PermissionDenied { path: PathBuf, guidance: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
