//! Process-lifecycle seam between the engine and the operating system.

use crate::EngineError;

/// External process control the engine needs around a run.
///
/// The binary supplies an implementation backed by the process table;
/// tests supply a recording one. Lifecycle failures are reported by the
/// implementation and must not abort reconciliation.
pub trait ProcessLifecycle {
    /// Called before discovery so Steam's local state is current.
    fn ensure_steam_running(&self) -> Result<(), EngineError>;

    /// Called after a successful save so the host picks up the new
    /// configuration.
    fn restart_host(&self) -> Result<(), EngineError>;
}

/// Lifecycle that does nothing, for `--no-restart` and dry runs.
#[derive(Debug, Default)]
pub struct NoopLifecycle;

impl ProcessLifecycle for NoopLifecycle {
    fn ensure_steam_running(&self) -> Result<(), EngineError> {
        Ok(())
    }

    fn restart_host(&self) -> Result<(), EngineError> {
        Ok(())
    }
}
