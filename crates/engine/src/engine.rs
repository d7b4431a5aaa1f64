//! Reconciliation orchestrator.
//!
//! Phases run strictly in sequence: lifecycle, load, discovery, diff,
//! apply, save, restart. Concurrency exists only inside the bounded
//! pools (name lookups in the Steam adapter, artwork downloads here).

use std::collections::HashSet;
use std::path::Path;

use futures_util::StreamExt;
use gamesphere_artwork::{ArtworkRequest, ArtworkResolver};
use gamesphere_common::{identity_stem, is_within_dir};
use gamesphere_sources::{AppDetailsClient, InstalledTitle, NameCache, Source};
use gamesphere_sources::{custom, epic, steam, xbox};
use gamesphere_store::{ConfiguredApp, HostConfiguration, StoreError, clear_dir_files, stock_apps};
use tracing::{debug, info, warn};

use crate::EngineError;
use crate::diff::{self, DiffPlan, OwnedEntry};
use crate::launcher;
use crate::lifecycle::ProcessLifecycle;
use crate::owner::{self, OwnershipContext};
use crate::report::ReconciliationResult;
use crate::settings::Settings;

/// Concurrent artwork downloads for newly added titles.
pub const ARTWORK_WORKERS: usize = 5;

/// What kind of run to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Discover, diff, apply, save.
    Sync,
    /// Discover and diff only; report what would change.
    DryRun,
    /// Wipe managed state back to the host's stock entries.
    Reset,
}

/// The reconciliation engine.
pub struct Engine {
    settings: Settings,
    appdetails: AppDetailsClient,
    resolver: ArtworkResolver,
}

impl Engine {
    /// Builds an engine with production clients derived from the settings.
    pub fn new(settings: Settings) -> Result<Self, EngineError> {
        settings.validate()?;
        let appdetails = AppDetailsClient::new()?;
        let resolver =
            ArtworkResolver::new(settings.api_key.as_deref(), settings.artwork_dir.clone())?;
        Ok(Self {
            settings,
            appdetails,
            resolver,
        })
    }

    /// Assembles an engine from pre-built clients (test servers).
    pub fn with_clients(
        settings: Settings,
        appdetails: AppDetailsClient,
        resolver: ArtworkResolver,
    ) -> Self {
        Self {
            settings,
            appdetails,
            resolver,
        }
    }

    /// Runs one reconciliation in the given mode.
    pub async fn run(
        &self,
        mode: RunMode,
        lifecycle: &dyn ProcessLifecycle,
    ) -> Result<ReconciliationResult, EngineError> {
        self.settings.validate()?;

        if mode == RunMode::Reset {
            self.reset(lifecycle)?;
            return Ok(ReconciliationResult::from_plan(&DiffPlan::default(), false));
        }
        let dry_run = mode == RunMode::DryRun;

        if !dry_run
            && let Err(e) = lifecycle.ensure_steam_running()
        {
            warn!(error = %e, "could not ensure steam is running, discovery may be stale");
        }

        let doc = gamesphere_store::load(&self.settings.apps_json)?;
        let discovered = self.discover().await?;
        info!(titles = discovered.len(), "discovery complete");

        let xbox_identities: HashSet<String> = discovered
            .iter()
            .filter(|t| t.source == Source::Xbox)
            .map(|t| t.identity.clone())
            .collect();
        let custom_identities: HashSet<String> = discovered
            .iter()
            .filter(|t| t.source == Source::Custom)
            .map(|t| t.identity.clone())
            .collect();
        let ctx = OwnershipContext {
            shortcuts_dir: self.settings.shortcuts_dir.as_deref(),
            xbox_identities: &xbox_identities,
            custom_identities: &custom_identities,
        };

        let plan = diff::compute(&doc.apps, &discovered, &ctx);
        let report = ReconciliationResult::from_plan(&plan, dry_run);

        if !plan.has_changes() {
            info!("configuration already matches installed titles, nothing to do");
            return Ok(report);
        }
        if dry_run {
            info!(
                added = report.total_added(),
                removed = report.total_removed(),
                "dry run, leaving everything untouched"
            );
            return Ok(report);
        }

        for entry in &plan.removed {
            self.remove_side_effects(entry);
        }

        let added_apps = self.build_added_entries(&plan.added).await;

        let mut next = HostConfiguration {
            env: doc.env,
            apps: Vec::with_capacity(plan.opaque.len() + plan.kept.len() + added_apps.len()),
            extra: doc.extra,
        };
        next.apps.extend(plan.opaque.iter().cloned());
        next.apps.extend(plan.kept.iter().map(|e| e.app.clone()));
        next.apps.extend(added_apps);

        gamesphere_store::save(&self.settings.apps_json, &next)?;

        if let Err(e) = lifecycle.restart_host() {
            warn!(error = %e, "host restart failed, changes apply on its next start");
        }

        Ok(report)
    }

    /// Runs all four source adapters and concatenates their titles in
    /// reconciliation order.
    async fn discover(&self) -> Result<Vec<InstalledTitle>, EngineError> {
        let cache = NameCache::new();
        let mut titles =
            steam::discover(&self.settings.library_vdf, &self.appdetails, &cache).await?;
        titles.extend(epic::discover(self.settings.epic_manifest_dir.as_deref())?);
        titles.extend(xbox::discover(&self.settings.xbox_roots)?);
        titles.extend(custom::discover(self.settings.custom_apps_file.as_deref())?);
        Ok(titles)
    }

    /// Deletes the artifacts a removed entry owned, never reaching outside
    /// the managed directories.
    fn remove_side_effects(&self, entry: &OwnedEntry) {
        info!(name = %entry.app.name, source = entry.source.label(), "removing entry");

        if !entry.app.image_path.is_empty() {
            let image = Path::new(&entry.app.image_path);
            if is_within_dir(image, &self.settings.artwork_dir) {
                if let Err(e) = remove_existing_file(image) {
                    warn!(path = %image.display(), error = %e, "could not delete artwork");
                }
            } else {
                debug!(path = %image.display(), "artwork outside managed directory, leaving in place");
            }
        }

        if let Some(dir) = self.settings.shortcuts_dir.as_deref()
            && let Some(file) = owner::indirection_target(&entry.app.cmd)
            && is_within_dir(Path::new(&file), dir)
            && let Err(e) = remove_existing_file(Path::new(&file))
        {
            warn!(path = %file, error = %e, "could not delete launch shortcut");
        }
    }

    /// Resolves artwork (bounded pool) and realizes commands for every
    /// added title, in discovery order.
    async fn build_added_entries(&self, added: &[InstalledTitle]) -> Vec<ConfiguredApp> {
        let mut resolved: Vec<(usize, String)> = futures_util::stream::iter(
            added.iter().enumerate().map(|(i, title)| async move {
                (i, self.resolve_image_path(title).await)
            }),
        )
        .buffer_unordered(ARTWORK_WORKERS)
        .collect()
        .await;
        resolved.sort_by_key(|(i, _)| *i);

        let mut apps = Vec::with_capacity(added.len());
        for (title, (_, image_path)) in added.iter().zip(resolved) {
            let cmd = match launcher::realize_command(title, self.settings.shortcuts_dir.as_deref())
            {
                Ok(cmd) => cmd,
                Err(e) => {
                    warn!(name = %title.display_name, error = %e,
                        "shortcut generation failed, storing direct command");
                    launcher::raw_command(title)
                }
            };
            info!(name = %title.display_name, source = title.source.label(), "adding entry");
            apps.push(ConfiguredApp::new(&title.display_name, cmd, image_path));
        }
        apps
    }

    /// Picks the image path for a new entry: the caller-supplied hint for
    /// custom titles, otherwise the resolver's fallback chain.
    async fn resolve_image_path(&self, title: &InstalledTitle) -> String {
        if let Some(hint) = &title.image_hint {
            return hint.clone();
        }

        let stem = match title.steam_app_id() {
            Some(id) => id.to_string(),
            None => identity_stem(&title.identity),
        };
        let request = ArtworkRequest {
            file_stem: &stem,
            display_name: &title.display_name,
            steam_app_id: title.steam_app_id(),
        };
        match self.resolver.resolve(&request).await {
            Some(path) => path.to_string_lossy().into_owned(),
            None => String::new(),
        }
    }

    /// Restores the managed state to the host's stock entries.
    ///
    /// Tolerates a malformed existing document: reset exists precisely to
    /// recover from a broken state, so it rebuilds from an empty base
    /// instead of refusing.
    fn reset(&self, lifecycle: &dyn ProcessLifecycle) -> Result<(), EngineError> {
        let cleared = clear_dir_files(&self.settings.artwork_dir)?;
        info!(cleared, "cleared artwork directory");

        if let Some(dir) = self.settings.shortcuts_dir.as_deref() {
            let cleared = launcher::clear_shortcuts(dir)?;
            info!(cleared, "cleared launch shortcuts");
        }

        let mut doc = match gamesphere_store::load(&self.settings.apps_json) {
            Ok(doc) => doc,
            Err(StoreError::Malformed { path, detail }) => {
                warn!(path = %path.display(), detail, "existing configuration unreadable, rebuilding");
                HostConfiguration::default()
            }
            Err(e) => return Err(e.into()),
        };
        doc.apps = stock_apps(self.settings.host);
        gamesphere_store::save(&self.settings.apps_json, &doc)?;
        info!(host = %self.settings.host, "configuration reset to stock entries");

        if let Err(e) = lifecycle.restart_host() {
            warn!(error = %e, "host restart failed, changes apply on its next start");
        }
        Ok(())
    }
}

fn remove_existing_file(path: &Path) -> std::io::Result<()> {
    if path.is_file() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}
