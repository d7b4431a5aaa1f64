//! Reconciliation engine: diffs discovered titles against the persisted
//! host configuration and applies the result.
//!
//! The engine owns no I/O primitives of its own. Discovery comes from the
//! source adapters, artwork from the resolver, persistence from the
//! store; process control is behind [`ProcessLifecycle`] so the binary
//! can supply a real implementation and tests a recording one.

pub mod diff;
pub mod engine;
pub mod launcher;
pub mod lifecycle;
pub mod owner;
pub mod report;
pub mod settings;

pub use engine::{Engine, RunMode};
pub use gamesphere_sources::Source;
pub use lifecycle::ProcessLifecycle;
pub use report::{ReconciliationResult, SourceChanges};
pub use settings::Settings;

/// Errors that abort a reconciliation run.
///
/// Single-title failures (a name that never resolves, artwork that never
/// downloads) are not here on purpose; they degrade the title, not the run.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Source(#[from] gamesphere_sources::SourceError),

    #[error(transparent)]
    Artwork(#[from] gamesphere_artwork::ArtworkError),

    #[error(transparent)]
    Store(#[from] gamesphere_store::StoreError),

    #[error("missing required input: {0}")]
    MissingInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
