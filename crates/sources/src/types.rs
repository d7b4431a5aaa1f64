//! Normalized title model shared by all source adapters.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Which launcher a title was discovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Steam,
    Epic,
    Xbox,
    Custom,
}

impl Source {
    /// All sources in reconciliation order.
    pub fn all() -> [Source; 4] {
        [Source::Steam, Source::Epic, Source::Xbox, Source::Custom]
    }

    /// Human-readable label for reports and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Source::Steam => "Steam",
            Source::Epic => "Epic",
            Source::Xbox => "Xbox",
            Source::Custom => "Custom",
        }
    }
}

/// One discovered game, rebuilt from scratch on every run.
///
/// `identity` is the source-scoped stable key used to match against
/// persisted entries: the Steam numeric app id, the Epic internal app
/// name, the normalized Xbox executable path, or the custom entry's
/// command verbatim. Display names may change between runs; identities
/// must not.
#[derive(Debug, Clone, PartialEq)]
pub struct InstalledTitle {
    pub source: Source,
    pub identity: String,
    pub display_name: String,
    /// Resolved executable, when one exists on disk at scan time.
    pub exe_path: Option<PathBuf>,
    /// Caller-supplied artwork path (custom entries only).
    pub image_hint: Option<String>,
}

impl InstalledTitle {
    /// Steam's numeric app id, when this is a Steam title.
    pub fn steam_app_id(&self) -> Option<u32> {
        if self.source == Source::Steam {
            self.identity.parse().ok()
        } else {
            None
        }
    }
}
