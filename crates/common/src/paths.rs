//! Path normalization and containment checks.
//!
//! Removal logic must never delete files outside the managed artwork and
//! shortcut directories, so every deletion goes through [`is_within_dir`].

use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};

/// Normalizes a path without touching the filesystem.
///
/// Resolves `.` and `..` components lexically. Used to build stable
/// identities for executable paths, so two spellings of the same location
/// compare equal.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Returns true when `path` lives inside `dir` (lexically).
///
/// Both sides are cleaned first; the check never follows symlinks, so a
/// configured entry pointing elsewhere through a link is treated as
/// outside the managed directory and left alone.
pub fn is_within_dir(path: &Path, dir: &Path) -> bool {
    let path = clean_path(path);
    let dir = clean_path(dir);
    path.starts_with(&dir) && path != dir
}

/// Derives a filesystem-safe file stem from a source identity.
///
/// First 16 bytes of SHA-256, hex encoded (32 characters). Steam titles
/// use their numeric app id directly and never need this.
pub fn identity_stem(identity: &str) -> String {
    let hash = Sha256::digest(identity.as_bytes());
    hex::encode(&hash[..16])
}
