//! Xbox / Microsoft Store adapter.
//!
//! Games installed through the Xbox app live as one directory per title
//! under a configured root. Each directory carries a
//! `MicrosoftGame.config` descriptor (sometimes under `Content/`) naming
//! the display title and the shipping executable; directories without a
//! usable descriptor fall back to scanning for a plausible `.exe`.

use std::path::{Path, PathBuf};

use gamesphere_common::clean_path;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::{InstalledTitle, Source};
use crate::SourceError;

/// `MicrosoftGame.config` root element, attribute-style XML.
#[derive(Debug, Deserialize)]
struct GameConfig {
    #[serde(rename = "ExecutableList")]
    executable_list: Option<ExecutableList>,
    #[serde(rename = "ShellVisuals")]
    shell_visuals: Option<ShellVisuals>,
}

#[derive(Debug, Deserialize)]
struct ExecutableList {
    #[serde(rename = "Executable", default)]
    executables: Vec<ExecutableEntry>,
}

#[derive(Debug, Deserialize)]
struct ExecutableEntry {
    #[serde(rename = "@Name")]
    name: String,
    #[serde(rename = "@IsDevOnly", default)]
    is_dev_only: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShellVisuals {
    #[serde(rename = "@DefaultDisplayName", default)]
    default_display_name: Option<String>,
}

/// Discovers installed Xbox titles under the configured roots.
///
/// A directory yielding no resolvable executable is skipped. Identity is
/// the cleaned absolute executable path.
pub fn discover(roots: &[PathBuf]) -> Result<Vec<InstalledTitle>, SourceError> {
    let mut titles = Vec::new();

    for root in roots {
        if !root.is_dir() {
            debug!(path = %root.display(), "xbox root not present, skipping");
            continue;
        }

        let mut game_dirs: Vec<PathBuf> = std::fs::read_dir(root)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        game_dirs.sort();

        for dir in game_dirs {
            match scan_game_dir(&dir) {
                Some((display_name, exe)) => {
                    let exe = clean_path(&exe);
                    titles.push(InstalledTitle {
                        source: Source::Xbox,
                        identity: exe.to_string_lossy().into_owned(),
                        display_name,
                        exe_path: Some(exe),
                        image_hint: None,
                    });
                }
                None => {
                    debug!(path = %dir.display(), "no resolvable executable, skipping directory");
                }
            }
        }
    }

    Ok(titles)
}

/// Resolves one game directory to a display name and executable.
fn scan_game_dir(dir: &Path) -> Option<(String, PathBuf)> {
    let mut name_from_config = None;
    let mut exe_from_config = None;

    for config_dir in [dir.to_path_buf(), dir.join("Content")] {
        let config_path = config_dir.join("MicrosoftGame.config");
        if !config_path.is_file() {
            continue;
        }
        match parse_game_config(&config_path) {
            Ok(config) => {
                name_from_config = config
                    .shell_visuals
                    .and_then(|sv| sv.default_display_name)
                    .filter(|name| !name.is_empty() && !name.starts_with("ms-resource:"));
                exe_from_config = config
                    .executable_list
                    .into_iter()
                    .flat_map(|list| list.executables)
                    .find(|exe| exe.is_dev_only.as_deref() != Some("true"))
                    .map(|exe| config_dir.join(exe.name))
                    .filter(|path| path.is_file());
                break;
            }
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "unreadable game descriptor");
            }
        }
    }

    let exe = exe_from_config.or_else(|| find_fallback_exe(dir))?;
    let name = name_from_config.unwrap_or_else(|| name_from_folder(dir));
    Some((name, exe))
}

fn parse_game_config(path: &Path) -> Result<GameConfig, SourceError> {
    let text = std::fs::read_to_string(path)?;
    quick_xml::de::from_str(&text).map_err(|e| SourceError::Vdf(format!("bad descriptor: {e}")))
}

/// First `.exe` in the directory (or one level down), excluding anything
/// named like an uninstaller.
fn find_fallback_exe(dir: &Path) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    collect_exes(dir, 2, &mut candidates);
    candidates.sort();
    candidates.into_iter().find(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        !name.starts_with("unins") && !name.contains("uninstall")
    })
}

fn collect_exes(dir: &Path, depth: u32, out: &mut Vec<PathBuf>) {
    if depth == 0 {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_exes(&path, depth - 1, out);
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"))
        {
            out.push(path);
        }
    }
}

/// Derives a display name from a package-style folder name.
///
/// `Publisher.GameName_1.0.0.0_x64__hash` becomes `GameName`.
fn name_from_folder(dir: &Path) -> String {
    let folder = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = folder.split('_').next().unwrap_or(&folder);
    base.rsplit('.').next().unwrap_or(base).to_string()
}
