//! Source adapters: turn heterogeneous launcher metadata into a
//! normalized set of installed titles.
//!
//! Each adapter is a discovery function from its on-disk location(s) to a
//! `Vec<InstalledTitle>`. A missing location is never an error: the
//! adapter logs at debug level and reports an empty collection.

pub mod appdetails;
pub mod custom;
pub mod epic;
pub mod steam;
pub mod types;
pub mod xbox;

pub use appdetails::{AppDetailsClient, NameCache};
pub use types::{InstalledTitle, Source};

/// Errors produced during title discovery.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("VDF error: {0}")]
    Vdf(String),

    #[error("HTTP error: {0}")]
    Http(String),
}
