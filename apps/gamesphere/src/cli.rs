//! Command-line interface.
//!
//! Every path and credential can come from the environment, so the tool
//! drops into scheduled tasks and host launch hooks without a wrapper
//! script.

use std::path::PathBuf;

use clap::Parser;
use gamesphere_engine::Settings;
use gamesphere_store::HostVariant;

#[derive(Debug, Parser)]
#[command(
    name = "gamesphere-sync",
    version,
    about = "Reconciles a game-streaming host's launch menu with the games installed on the machine"
)]
pub struct Cli {
    /// Steam libraryfolders.vdf to read installed app ids from.
    #[arg(long, env = "STEAM_LIBRARY_VDF_PATH")]
    pub library_vdf: PathBuf,

    /// The host's apps.json.
    #[arg(long, env = "SUNSHINE_APPS_JSON_PATH")]
    pub apps_json: PathBuf,

    /// Directory where cover images are written.
    #[arg(long, env = "SUNSHINE_GRIDS_FOLDER")]
    pub artwork_dir: PathBuf,

    /// SteamGridDB API key; without one artwork falls back to the Steam CDN.
    #[arg(long, env = "STEAMGRIDDB_API_KEY")]
    pub api_key: Option<String>,

    /// Directory for generated launch shortcuts (enables indirection for
    /// Epic, Xbox and custom titles).
    #[arg(long)]
    pub shortcuts_dir: Option<PathBuf>,

    /// Epic Games launcher Manifests directory.
    #[arg(long)]
    pub epic_manifests: Option<PathBuf>,

    /// Xbox installation root; repeatable.
    #[arg(long = "xbox-root")]
    pub xbox_roots: Vec<PathBuf>,

    /// JSON file listing custom apps to include.
    #[arg(long)]
    pub custom_apps: Option<PathBuf>,

    /// Which streaming host owns the configuration.
    #[arg(long, env = "HOST", default_value = "sunshine")]
    pub host: HostVariant,

    /// Steam executable, launched when Steam is not running.
    #[arg(long, env = "STEAM_EXE_PATH")]
    pub steam_exe: Option<PathBuf>,

    /// Host executable, restarted after a successful write.
    #[arg(long, env = "SUNSHINE_EXE_PATH")]
    pub host_exe: Option<PathBuf>,

    /// Report what would change without writing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Restore the host's stock entries and clear managed artwork and
    /// shortcuts.
    #[arg(long, conflicts_with = "dry_run")]
    pub reset: bool,

    /// Skip the host restart after saving.
    #[arg(long)]
    pub no_restart: bool,

    /// Verbose (debug-level) logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn into_settings(self) -> Settings {
        let mut settings = Settings::new(self.library_vdf, self.apps_json, self.artwork_dir);
        settings.shortcuts_dir = self.shortcuts_dir;
        settings.api_key = self.api_key.filter(|k| !k.is_empty());
        settings.epic_manifest_dir = self.epic_manifests;
        settings.xbox_roots = self.xbox_roots;
        settings.custom_apps_file = self.custom_apps;
        settings.host = self.host;
        settings.steam_exe = self.steam_exe;
        settings.host_exe = self.host_exe;
        settings
    }
}
