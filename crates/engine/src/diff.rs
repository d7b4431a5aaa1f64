//! Identity diff between the persisted configuration and discovery.
//!
//! Matching is identity-only. A kept entry is carried byte-for-byte even
//! when its display name changed upstream, so user edits and already
//! resolved artwork never churn.

use std::collections::HashSet;

use gamesphere_sources::{InstalledTitle, Source};
use gamesphere_store::ConfiguredApp;

use crate::owner::{AppOwner, OwnershipContext, classify};

/// One owned entry from the existing configuration.
#[derive(Debug, Clone)]
pub struct OwnedEntry {
    pub app: ConfiguredApp,
    pub source: Source,
    pub identity: String,
}

/// The computed change set for one run.
#[derive(Debug, Default)]
pub struct DiffPlan {
    /// Entries the tool does not own, in configuration order.
    pub opaque: Vec<ConfiguredApp>,
    /// Owned entries whose identity is still installed, in configuration
    /// order.
    pub kept: Vec<OwnedEntry>,
    /// Owned entries whose identity vanished from discovery.
    pub removed: Vec<OwnedEntry>,
    /// Discovered titles with no existing entry, in discovery order.
    pub added: Vec<InstalledTitle>,
}

impl DiffPlan {
    /// True when applying the plan would alter the configuration.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

fn owner_parts(owner: AppOwner) -> Option<(Source, String)> {
    match owner {
        AppOwner::Steam(id) => Some((Source::Steam, id)),
        AppOwner::Epic(id) => Some((Source::Epic, id)),
        AppOwner::Xbox(id) => Some((Source::Xbox, id)),
        AppOwner::Custom(id) => Some((Source::Custom, id)),
        AppOwner::Opaque => None,
    }
}

/// Partitions the existing apps against the discovered titles.
pub fn compute(
    existing: &[ConfiguredApp],
    discovered: &[InstalledTitle],
    ctx: &OwnershipContext<'_>,
) -> DiffPlan {
    let installed: HashSet<(Source, &str)> = discovered
        .iter()
        .map(|t| (t.source, t.identity.as_str()))
        .collect();

    let mut plan = DiffPlan::default();
    let mut matched: HashSet<(Source, String)> = HashSet::new();

    for app in existing {
        match owner_parts(classify(app, ctx)) {
            None => plan.opaque.push(app.clone()),
            Some((source, identity)) => {
                let entry = OwnedEntry {
                    app: app.clone(),
                    source,
                    identity: identity.clone(),
                };
                if installed.contains(&(source, identity.as_str())) {
                    matched.insert((source, identity));
                    plan.kept.push(entry);
                } else {
                    plan.removed.push(entry);
                }
            }
        }
    }

    plan.added = discovered
        .iter()
        .filter(|t| !matched.contains(&(t.source, t.identity.clone())))
        .cloned()
        .collect();

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn steam_title(id: &str, name: &str) -> InstalledTitle {
        InstalledTitle {
            source: Source::Steam,
            identity: id.into(),
            display_name: name.into(),
            exe_path: None,
            image_hint: None,
        }
    }

    fn steam_app(id: &str, name: &str) -> ConfiguredApp {
        ConfiguredApp::new(name, format!("steam://rungameid/{id}"), "")
    }

    fn empty_ctx<'a>(
        xbox: &'a HashSet<String>,
        custom: &'a HashSet<String>,
    ) -> OwnershipContext<'a> {
        OwnershipContext {
            shortcuts_dir: None,
            xbox_identities: xbox,
            custom_identities: custom,
        }
    }

    #[test]
    fn partitions_kept_removed_added() {
        let xbox = HashSet::new();
        let custom = HashSet::new();
        let ctx = empty_ctx(&xbox, &custom);

        let existing = vec![steam_app("100", "Old Hundred"), steam_app("300", "Gone")];
        let discovered = vec![steam_title("100", "Hundred"), steam_title("200", "Two Hundred")];

        let plan = compute(&existing, &discovered, &ctx);
        assert_eq!(plan.kept.len(), 1);
        assert_eq!(plan.kept[0].identity, "100");
        assert_eq!(plan.removed.len(), 1);
        assert_eq!(plan.removed[0].identity, "300");
        assert_eq!(plan.added.len(), 1);
        assert_eq!(plan.added[0].identity, "200");
        assert!(plan.has_changes());
    }

    #[test]
    fn rename_upstream_keeps_entry_untouched() {
        let xbox = HashSet::new();
        let custom = HashSet::new();
        let ctx = empty_ctx(&xbox, &custom);

        let existing = vec![steam_app("100", "Hand-Edited Name")];
        let discovered = vec![steam_title("100", "Official New Name")];

        let plan = compute(&existing, &discovered, &ctx);
        assert!(!plan.has_changes());
        assert_eq!(plan.kept[0].app.name, "Hand-Edited Name");
    }

    #[test]
    fn opaque_entries_pass_through() {
        let xbox = HashSet::new();
        let custom = HashSet::new();
        let ctx = empty_ctx(&xbox, &custom);

        let existing = vec![
            ConfiguredApp::new("Desktop", "", "desktop.png"),
            steam_app("100", "Hundred"),
        ];
        let discovered = vec![steam_title("100", "Hundred")];

        let plan = compute(&existing, &discovered, &ctx);
        assert_eq!(plan.opaque.len(), 1);
        assert_eq!(plan.opaque[0].name, "Desktop");
        assert!(!plan.has_changes());
    }

    #[test]
    fn same_identity_across_sources_is_distinct() {
        let xbox = HashSet::new();
        let custom: HashSet<String> = ["440".to_string()].into();
        let ctx = empty_ctx(&xbox, &custom);

        // A custom command that happens to be "440" must not satisfy the
        // Steam entry with app id 440.
        let existing = vec![steam_app("440", "TF2")];
        let discovered = vec![InstalledTitle {
            source: Source::Custom,
            identity: "440".into(),
            display_name: "Odd Tool".into(),
            exe_path: None,
            image_hint: None,
        }];

        let plan = compute(&existing, &discovered, &ctx);
        assert_eq!(plan.removed.len(), 1);
        assert_eq!(plan.added.len(), 1);
        assert_eq!(plan.added[0].source, Source::Custom);
    }

    #[test]
    fn empty_discovery_removes_all_owned() {
        let xbox = HashSet::new();
        let custom = HashSet::new();
        let ctx = empty_ctx(&xbox, &custom);

        let existing = vec![steam_app("100", "A"), steam_app("200", "B")];
        let plan = compute(&existing, &[], &ctx);
        assert_eq!(plan.removed.len(), 2);
        assert!(plan.kept.is_empty());
        assert!(plan.added.is_empty());
    }
}
