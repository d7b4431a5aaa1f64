//! Launch-command construction and shortcut indirection.
//!
//! Steam titles always launch through the `steam://rungameid/` URI (with
//! a launcher wrapper on non-Windows platforms). Epic, Xbox and custom
//! titles launch either by their raw command or, when a shortcuts
//! directory is configured, through a generated `.bat` the host invokes
//! with `cmd /C`. The indirection keeps apps.json stable when install
//! locations move: only the shortcut body changes.

use std::path::{Path, PathBuf};

use gamesphere_common::identity_stem;
use gamesphere_sources::{InstalledTitle, Source};
use tracing::debug;

use crate::EngineError;

/// Launch command for a Steam app id.
#[cfg(target_os = "windows")]
pub fn steam_command(app_id: &str) -> String {
    format!("steam://rungameid/{app_id}")
}

/// Launch command for a Steam app id, wrapped for the local launcher.
#[cfg(not(target_os = "windows"))]
pub fn steam_command(app_id: &str) -> String {
    steam_command_with(flatpak_steam_installed(), app_id)
}

#[cfg(not(target_os = "windows"))]
fn steam_command_with(flatpak: bool, app_id: &str) -> String {
    if flatpak {
        format!("flatpak run com.valvesoftware.Steam steam://rungameid/{app_id}")
    } else {
        format!("steam steam://rungameid/{app_id}")
    }
}

/// The Flatpak Steam exports a launcher binary under the system or user
/// flatpak tree; its presence decides which wrapper to emit.
#[cfg(not(target_os = "windows"))]
fn flatpak_steam_installed() -> bool {
    const EXPORT: &str = "exports/bin/com.valvesoftware.Steam";
    if Path::new("/var/lib/flatpak").join(EXPORT).is_file() {
        return true;
    }
    std::env::var("HOME")
        .map(|home| {
            Path::new(&home)
                .join(".local/share/flatpak")
                .join(EXPORT)
                .is_file()
        })
        .unwrap_or(false)
}

/// Silent-launch URI for an Epic app name.
pub fn epic_uri(app_name: &str) -> String {
    format!("com.epicgames.launcher://apps/{app_name}?action=launch&silent=true")
}

/// The direct (non-indirected) launch command for a discovered title.
pub fn raw_command(title: &InstalledTitle) -> String {
    match title.source {
        Source::Steam => steam_command(&title.identity),
        Source::Epic => epic_uri(&title.identity),
        Source::Xbox | Source::Custom => title.identity.clone(),
    }
}

/// Produces the command to persist for a title, generating the shortcut
/// file when indirection applies.
///
/// Steam URIs are understood by the host directly and are never
/// indirected. Existing shortcut files are overwritten unconditionally so
/// a moved install self-heals on the next run.
pub fn realize_command(
    title: &InstalledTitle,
    shortcuts_dir: Option<&Path>,
) -> Result<String, EngineError> {
    let raw = raw_command(title);
    let Some(dir) = shortcuts_dir else {
        return Ok(raw);
    };
    if title.source == Source::Steam {
        return Ok(raw);
    }

    let path = shortcut_path(dir, &title.identity);
    std::fs::create_dir_all(dir)?;
    std::fs::write(&path, format!("@echo off\r\nstart \"\" \"{raw}\"\r\n"))?;
    debug!(path = %path.display(), name = %title.display_name, "wrote launch shortcut");

    Ok(format!(r#"cmd /C "{}""#, path.display()))
}

/// Deterministic shortcut location for a source identity.
pub fn shortcut_path(dir: &Path, identity: &str) -> PathBuf {
    dir.join(format!("{}.bat", identity_stem(identity)))
}

/// Removes every generated `.bat` in the shortcuts directory. Missing
/// directory is a no-op.
pub fn clear_shortcuts(dir: &Path) -> Result<u32, EngineError> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0u32;
    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("bat")) {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    debug!(dir = %dir.display(), removed, "cleared launch shortcuts");
    Ok(removed)
}
