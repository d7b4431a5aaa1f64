//! Run settings, assembled by the binary from flags and environment.

use std::path::PathBuf;

use gamesphere_store::HostVariant;

use crate::EngineError;

/// Everything a reconciliation run needs to know.
///
/// The three mandatory paths mirror the host's own layout: the Steam
/// library index to read, the apps.json to reconcile, and the directory
/// the host serves cover images from.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Steam `libraryfolders.vdf`.
    pub library_vdf: PathBuf,
    /// The host's `apps.json`.
    pub apps_json: PathBuf,
    /// Directory where resolved covers are written.
    pub artwork_dir: PathBuf,

    /// When set, Epic/Xbox/Custom launches go through generated shortcut
    /// files in this directory instead of raw commands.
    pub shortcuts_dir: Option<PathBuf>,
    /// SteamGridDB API key; absent means the CDN-only artwork tier.
    pub api_key: Option<String>,
    /// Epic launcher `Manifests` directory.
    pub epic_manifest_dir: Option<PathBuf>,
    /// Xbox installation roots.
    pub xbox_roots: Vec<PathBuf>,
    /// Custom app list JSON file.
    pub custom_apps_file: Option<PathBuf>,

    pub host: HostVariant,
    /// Steam executable, for the lifecycle implementation.
    pub steam_exe: Option<PathBuf>,
    /// Host executable, for the post-save restart.
    pub host_exe: Option<PathBuf>,
}

impl Settings {
    /// Minimal settings for the mandatory inputs.
    pub fn new(library_vdf: PathBuf, apps_json: PathBuf, artwork_dir: PathBuf) -> Self {
        Self {
            library_vdf,
            apps_json,
            artwork_dir,
            shortcuts_dir: None,
            api_key: None,
            epic_manifest_dir: None,
            xbox_roots: Vec::new(),
            custom_apps_file: None,
            host: HostVariant::default(),
            steam_exe: None,
            host_exe: None,
        }
    }

    /// Rejects settings that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.library_vdf.as_os_str().is_empty() {
            return Err(EngineError::MissingInput("steam library file path".into()));
        }
        if self.apps_json.as_os_str().is_empty() {
            return Err(EngineError::MissingInput("host configuration path".into()));
        }
        if self.artwork_dir.as_os_str().is_empty() {
            return Err(EngineError::MissingInput("artwork directory".into()));
        }
        Ok(())
    }
}
