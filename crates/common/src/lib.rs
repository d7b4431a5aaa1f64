//! Shared building blocks for GameSphere Sync.
//!
//! One retry policy used by every network fan-out, and the path helpers
//! that keep deletion confined to managed directories.

pub mod paths;
pub mod retry;

pub use paths::{clean_path, identity_stem, is_within_dir};
pub use retry::RetryPolicy;
