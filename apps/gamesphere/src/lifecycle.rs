//! Process lifecycle backed by the system process table.

use std::path::PathBuf;
use std::time::Duration;

use gamesphere_engine::{EngineError, ProcessLifecycle};
use gamesphere_store::HostVariant;
use sysinfo::System;
use tracing::{debug, info, warn};

/// How long to give Steam to populate its local state after a cold start.
const STEAM_STARTUP_GRACE: Duration = Duration::from_secs(10);

/// Lifecycle implementation using `sysinfo` process enumeration.
pub struct SystemLifecycle {
    steam_exe: Option<PathBuf>,
    host_exe: Option<PathBuf>,
    host: HostVariant,
    restart_enabled: bool,
}

impl SystemLifecycle {
    pub fn new(
        steam_exe: Option<PathBuf>,
        host_exe: Option<PathBuf>,
        host: HostVariant,
        restart_enabled: bool,
    ) -> Self {
        Self {
            steam_exe,
            host_exe,
            host,
            restart_enabled,
        }
    }

    fn process_running(name_fragment: &str) -> bool {
        let system = System::new_all();
        system.processes().values().any(|p| {
            p.name()
                .to_string_lossy()
                .to_lowercase()
                .contains(name_fragment)
        })
    }

    fn kill_processes(name_fragment: &str) -> u32 {
        let system = System::new_all();
        let mut killed = 0u32;
        for process in system.processes().values() {
            if process
                .name()
                .to_string_lossy()
                .to_lowercase()
                .contains(name_fragment)
                && process.kill()
            {
                killed += 1;
            }
        }
        killed
    }
}

impl ProcessLifecycle for SystemLifecycle {
    fn ensure_steam_running(&self) -> Result<(), EngineError> {
        if Self::process_running("steam") {
            debug!("steam already running");
            return Ok(());
        }

        let Some(exe) = &self.steam_exe else {
            warn!("steam not running and no executable configured, library data may be stale");
            return Ok(());
        };

        info!(exe = %exe.display(), "starting steam");
        std::process::Command::new(exe).spawn()?;
        std::thread::sleep(STEAM_STARTUP_GRACE);
        Ok(())
    }

    fn restart_host(&self) -> Result<(), EngineError> {
        if !self.restart_enabled {
            info!("host restart disabled, changes apply on its next start");
            return Ok(());
        }

        let name = self.host.label().to_lowercase();
        let killed = Self::kill_processes(&name);
        debug!(host = %self.host, killed, "stopped host processes");

        let Some(exe) = &self.host_exe else {
            if killed > 0 {
                warn!(host = %self.host, "host stopped but no executable configured to restart it");
            } else {
                info!(host = %self.host, "host not running, nothing to restart");
            }
            return Ok(());
        };

        info!(exe = %exe.display(), "restarting host");
        std::process::Command::new(exe).spawn()?;
        Ok(())
    }
}
