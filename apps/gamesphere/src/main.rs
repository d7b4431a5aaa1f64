//! GameSphere Sync entry point.

mod cli;
mod lifecycle;

use clap::Parser;
use gamesphere_engine::{Engine, ReconciliationResult, RunMode, Source, SourceChanges};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize structured logging.
    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %args.host,
        "starting GameSphere sync"
    );

    let mode = if args.reset {
        RunMode::Reset
    } else if args.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Sync
    };
    let lifecycle = lifecycle::SystemLifecycle::new(
        args.steam_exe.clone(),
        args.host_exe.clone(),
        args.host,
        restart_enabled(args.no_restart, mode),
    );

    let engine = Engine::new(args.into_settings())?;

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(engine.run(mode, &lifecycle))?;

    if mode == RunMode::Reset {
        println!("Configuration reset to stock entries.");
        return Ok(());
    }

    print_summary(&report);
    Ok(())
}

/// Both sync and reset rewrite apps.json, so both restart the host;
/// only `--no-restart` and dry runs suppress it.
fn restart_enabled(no_restart: bool, mode: RunMode) -> bool {
    !no_restart && mode != RunMode::DryRun
}

fn print_summary(report: &ReconciliationResult) {
    if report.no_changes() {
        println!("No changes: launch menu already matches installed games.");
        return;
    }

    let prefix = if report.dry_run { "[dry run] " } else { "" };
    for source in Source::all() {
        print_source(prefix, source.label(), report.changes(source));
    }
    println!(
        "{prefix}{} added, {} removed, {} kept.",
        report.total_added(),
        report.total_removed(),
        report.total_kept()
    );
}

fn print_source(prefix: &str, label: &str, changes: &SourceChanges) {
    for title in &changes.added {
        println!("{prefix}+ [{label}] {} ({})", title.name, title.identity);
    }
    for title in &changes.removed {
        println!("{prefix}- [{label}] {} ({})", title.name, title.identity);
    }
}
