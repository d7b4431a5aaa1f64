//! Epic Games Store adapter.
//!
//! The launcher drops one `*.item` JSON manifest per installed title
//! under its `Manifests` data directory. `AppName` is the stable internal
//! identity; a manifest without one is useless and skipped.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::{InstalledTitle, Source};
use crate::SourceError;

/// The fields we consume from an Epic `*.item` manifest.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemManifest {
    #[serde(default)]
    app_name: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    install_location: String,
    #[serde(default)]
    launch_executable: String,
}

/// Discovers installed Epic titles from a manifest directory.
///
/// The executable path is only populated when it exists on disk at scan
/// time; the title is still reported without one (it can be named and
/// given artwork, just not launched through its binary).
pub fn discover(manifest_dir: Option<&Path>) -> Result<Vec<InstalledTitle>, SourceError> {
    let Some(dir) = manifest_dir else {
        return Ok(Vec::new());
    };
    if !dir.is_dir() {
        debug!(path = %dir.display(), "epic manifest directory not present, skipping source");
        return Ok(Vec::new());
    }

    let mut manifest_paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "item"))
        .collect();
    manifest_paths.sort();

    let mut titles = Vec::new();
    for path in manifest_paths {
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable epic manifest, skipping");
                continue;
            }
        };
        let manifest: ItemManifest = match serde_json::from_str(&text) {
            Ok(m) => m,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed epic manifest, skipping");
                continue;
            }
        };

        if manifest.app_name.is_empty() {
            debug!(path = %path.display(), "epic manifest has no AppName, skipping");
            continue;
        }

        let exe_path = resolve_executable(&manifest);
        let display_name = if manifest.display_name.is_empty() {
            manifest.app_name.clone()
        } else {
            manifest.display_name.clone()
        };

        titles.push(InstalledTitle {
            source: Source::Epic,
            identity: manifest.app_name,
            display_name,
            exe_path,
            image_hint: None,
        });
    }

    Ok(titles)
}

/// Joins install location and launch executable, if the result exists.
fn resolve_executable(manifest: &ItemManifest) -> Option<PathBuf> {
    if manifest.install_location.is_empty() || manifest.launch_executable.is_empty() {
        return None;
    }
    let path = Path::new(&manifest.install_location).join(&manifest.launch_executable);
    path.is_file().then_some(path)
}
