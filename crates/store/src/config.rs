//! apps.json document model and crash-safe persistence.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::StoreError;

/// One launch-menu entry in the host configuration.
///
/// The host expects the full fixed field set on every entry, empty values
/// included, so none of the string fields are skipped on serialization.
/// Unknown per-entry keys pass through `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredApp {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cmd: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub detached: String,
    #[serde(default)]
    pub elevated: String,
    #[serde(default)]
    pub hidden: String,
    #[serde(rename = "wait-all", default)]
    pub wait_all: String,
    #[serde(rename = "exit-timeout", default)]
    pub exit_timeout: String,
    #[serde(rename = "image-path", default)]
    pub image_path: String,
    /// Pre/post launch hooks, used by stock entries.
    #[serde(rename = "prep-cmd", default, skip_serializing_if = "Option::is_none")]
    pub prep_cmd: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConfiguredApp {
    /// New managed entry with the host's standard execution flags.
    pub fn new(name: impl Into<String>, cmd: impl Into<String>, image_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            output: String::new(),
            detached: String::new(),
            elevated: "false".into(),
            hidden: "true".into(),
            wait_all: "true".into(),
            exit_timeout: "5".into(),
            image_path: image_path.into(),
            prep_cmd: None,
            extra: Map::new(),
        }
    }
}

/// The full persisted document: `{ env, apps, ...anything else }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfiguration {
    #[serde(default = "default_env")]
    pub env: Value,
    #[serde(default)]
    pub apps: Vec<ConfiguredApp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_env() -> Value {
    Value::String(String::new())
}

impl Default for HostConfiguration {
    fn default() -> Self {
        Self {
            env: default_env(),
            apps: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// Loads the host configuration.
///
/// A missing file yields the empty default document; a present but
/// malformed file is fatal for the run, never silently repaired.
pub fn load(path: &Path) -> Result<HostConfiguration, StoreError> {
    if !path.exists() {
        info!(path = %path.display(), "host configuration not found, starting from empty document");
        return Ok(HostConfiguration::default());
    }

    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| StoreError::Malformed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Saves the host configuration crash-safely.
///
/// An existing file is first copied to a `.backup` sibling (falling back
/// to a user-writable location when the primary directory refuses the
/// write); the document is then written to a temp file in the target
/// directory and renamed into place, so the old content survives any
/// interruption.
pub fn save(path: &Path, doc: &HostConfiguration) -> Result<(), StoreError> {
    if path.exists() {
        backup(path)?;
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| classify_write(e, parent))?;
    }

    let json = serde_json::to_string_pretty(doc).map_err(|e| StoreError::Malformed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let tmp = sibling_with_suffix(path, ".tmp");
    std::fs::write(&tmp, format!("{json}\n")).map_err(|e| classify_write(e, &tmp))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        classify_write(e, path)
    })?;

    info!(path = %path.display(), apps = doc.apps.len(), "saved host configuration");
    Ok(())
}

/// Copies the current file to its backup location.
fn backup(path: &Path) -> Result<(), StoreError> {
    let primary = sibling_with_suffix(path, ".backup");
    match std::fs::copy(path, &primary) {
        Ok(_) => {
            debug!(path = %primary.display(), "created backup");
            return Ok(());
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            debug!(path = %primary.display(), "primary backup location denied, trying fallback");
        }
        Err(e) => return Err(e.into()),
    }

    let fallback_dir = fallback_backup_dir();
    std::fs::create_dir_all(&fallback_dir).map_err(|e| classify_write(e, &fallback_dir))?;
    let fallback = fallback_dir.join(backup_file_name(path));
    std::fs::copy(path, &fallback).map_err(|e| classify_write(e, &fallback))?;
    info!(path = %fallback.display(), "created backup in fallback location");
    Ok(())
}

fn backup_file_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "apps.json".into());
    format!("{name}.backup")
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "apps.json".into());
    name.push_str(suffix);
    path.with_file_name(name)
}

/// Per-user location used when the host's config directory denies writes.
fn fallback_backup_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("GameSphere")
    }

    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".local").join("share"))
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join("gamesphere")
    }
}

/// Distinguishes permission failures so the caller can present
/// remediation guidance instead of a bare I/O error.
fn classify_write(e: std::io::Error, path: &Path) -> StoreError {
    if e.kind() == ErrorKind::PermissionDenied {
        StoreError::PermissionDenied {
            path: path.to_path_buf(),
            guidance: "run elevated or point the host configuration at a user-writable directory"
                .into(),
        }
    } else {
        e.into()
    }
}

/// Deletes every regular file directly inside `dir`. Subdirectories and
/// a missing directory are left alone. Returns the number removed.
pub fn clear_dir_files(dir: &Path) -> Result<u32, StoreError> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0u32;
    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.is_file() {
            std::fs::remove_file(&path).map_err(|e| classify_write(e, &path))?;
            removed += 1;
        }
    }
    debug!(dir = %dir.display(), removed, "cleared managed directory");
    Ok(removed)
}
