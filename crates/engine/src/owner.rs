//! Ownership inference for persisted launch entries.
//!
//! Every configured app is classified exactly once per run by ordered
//! rules over its `cmd` string. Entries the tool cannot claim are
//! [`AppOwner::Opaque`] and pass through every run untouched, so
//! hand-written and host-stock entries survive indefinitely.

use std::collections::HashSet;
use std::path::Path;

use gamesphere_common::{clean_path, is_within_dir};
use gamesphere_store::ConfiguredApp;
use tracing::{debug, warn};

const STEAM_URI_MARKER: &str = "steam://rungameid/";
const EPIC_URI_MARKER: &str = "com.epicgames.launcher://apps/";

/// Who owns a configured entry, carrying the recovered source identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppOwner {
    Steam(String),
    Epic(String),
    Xbox(String),
    Custom(String),
    /// Not ours. Never modified, never removed.
    Opaque,
}

impl AppOwner {
    /// The recovered identity, when the entry is owned.
    pub fn identity(&self) -> Option<&str> {
        match self {
            AppOwner::Steam(id)
            | AppOwner::Epic(id)
            | AppOwner::Xbox(id)
            | AppOwner::Custom(id) => Some(id),
            AppOwner::Opaque => None,
        }
    }
}

/// Discovery-derived lookup sets the classifier matches raw commands
/// against.
pub struct OwnershipContext<'a> {
    pub shortcuts_dir: Option<&'a Path>,
    /// Cleaned executable paths of discovered Xbox titles.
    pub xbox_identities: &'a HashSet<String>,
    /// Verbatim commands of discovered custom titles.
    pub custom_identities: &'a HashSet<String>,
}

/// Classifies one configured entry.
///
/// Rules apply in order; the first match wins. URI markers are matched by
/// containment so platform launch wrappers (`steam …`, `flatpak run …`)
/// still classify.
pub fn classify(app: &ConfiguredApp, ctx: &OwnershipContext<'_>) -> AppOwner {
    let cmd = app.cmd.trim();

    if let Some(id) = extract_after(cmd, STEAM_URI_MARKER, |c| c.is_ascii_digit())
        && !id.is_empty()
    {
        return AppOwner::Steam(id);
    }

    if let Some(name) = extract_epic_app(cmd) {
        return AppOwner::Epic(name);
    }

    if let Some(dir) = ctx.shortcuts_dir
        && let Some(file) = indirection_target(cmd)
        && is_within_dir(Path::new(&file), dir)
    {
        return classify_indirection(&file, ctx);
    }

    let unquoted = cmd.trim_matches('"');
    if !unquoted.is_empty() {
        let cleaned = clean_path(Path::new(unquoted)).to_string_lossy().into_owned();
        if ctx.xbox_identities.contains(&cleaned) {
            return AppOwner::Xbox(cleaned);
        }
    }

    if ctx.custom_identities.contains(cmd) {
        return AppOwner::Custom(cmd.to_string());
    }

    AppOwner::Opaque
}

/// Takes the run of characters satisfying `keep` right after `marker`.
fn extract_after(cmd: &str, marker: &str, keep: impl Fn(char) -> bool) -> Option<String> {
    let start = cmd.find(marker)? + marker.len();
    Some(cmd[start..].chars().take_while(|&c| keep(c)).collect())
}

/// Epic app names run until the query string or a delimiter.
fn extract_epic_app(cmd: &str) -> Option<String> {
    let name = extract_after(cmd, EPIC_URI_MARKER, |c| {
        c != '?' && c != '"' && !c.is_whitespace()
    })?;
    (!name.is_empty()).then_some(name)
}

/// Extracts the shortcut file path from a `cmd /C "<file>"` invocation.
pub(crate) fn indirection_target(cmd: &str) -> Option<String> {
    let rest = cmd.strip_prefix("cmd /C ")?;
    let quoted = rest.strip_prefix('"')?;
    let end = quoted.find('"')?;
    Some(quoted[..end].to_string())
}

/// Recovers ownership from a generated shortcut's body.
///
/// An unreadable shortcut classifies as a custom entry that matches no
/// discovery, so the stale entry is swept away instead of lingering.
fn classify_indirection(file: &str, ctx: &OwnershipContext<'_>) -> AppOwner {
    let body = match std::fs::read_to_string(file) {
        Ok(body) => body,
        Err(e) => {
            warn!(file, error = %e, "shortcut file unreadable, entry treated as stale");
            return AppOwner::Custom(file.to_string());
        }
    };

    if let Some(name) = extract_epic_app(&body) {
        return AppOwner::Epic(name);
    }

    let Some(target) = shortcut_launch_target(&body) else {
        debug!(file, "shortcut has no launch target, entry treated as stale");
        return AppOwner::Custom(file.to_string());
    };

    let cleaned = clean_path(Path::new(&target)).to_string_lossy().into_owned();
    if ctx.xbox_identities.contains(&cleaned) {
        AppOwner::Xbox(cleaned)
    } else {
        AppOwner::Custom(target)
    }
}

/// Pulls the quoted target out of a `start "" "<target>"` line.
fn shortcut_launch_target(body: &str) -> Option<String> {
    for line in body.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(r#"start "" ""#)
            && let Some(end) = rest.find('"')
        {
            return Some(rest[..end].to_string());
        }
    }
    None
}
