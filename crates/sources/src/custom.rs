//! User-defined custom app list.
//!
//! A flat JSON array of `{name, command, image}` entries. The command is
//! the identity verbatim; entries without one cannot be matched or
//! launched and are skipped.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::types::{InstalledTitle, Source};
use crate::SourceError;

#[derive(Debug, Deserialize)]
struct CustomEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    command: String,
    #[serde(default)]
    image: String,
}

/// Discovers titles from the custom app list.
///
/// A missing file yields an empty collection; a present but malformed
/// file is a configuration error and fails the run.
pub fn discover(list_path: Option<&Path>) -> Result<Vec<InstalledTitle>, SourceError> {
    let Some(path) = list_path else {
        return Ok(Vec::new());
    };
    if !path.is_file() {
        debug!(path = %path.display(), "custom app list not present, skipping source");
        return Ok(Vec::new());
    }

    let text = std::fs::read_to_string(path)?;
    let entries: Vec<CustomEntry> = serde_json::from_str(&text)?;

    let mut titles = Vec::new();
    for entry in entries {
        if entry.command.is_empty() {
            warn!(name = %entry.name, "custom entry without command, skipping");
            continue;
        }
        let display_name = if entry.name.is_empty() {
            entry.command.clone()
        } else {
            entry.name
        };
        titles.push(InstalledTitle {
            source: Source::Custom,
            identity: entry.command.clone(),
            display_name,
            exe_path: None,
            image_hint: (!entry.image.is_empty()).then_some(entry.image),
        });
    }

    Ok(titles)
}
