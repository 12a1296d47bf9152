// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, default_config_path, load_and_validate};

pub use crate::errors::WatcherError;
pub use crate::types::{EventKind, FileKind, WatchFlags};
pub use crate::watch::{ScanHandle, ScanSummary, UpdateEvent, Watcher};

/// High-level entry point used by `main.rs`.
///
/// Prints every event to stdout, one per line. With `--monitor` the process
/// keeps running after the scan and prints changes until Ctrl-C.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;
    let watcher = Watcher::from_config(&cfg)?;

    let (_id, mut events) = watcher.subscribe_channel()?;
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{event}");
        }
    });

    // Ctrl-C stops the scan, or the monitoring phase after it.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                return;
            }
            cancel.cancel();
        });
    }

    match watcher.scan(Some(cancel.clone()))?.await {
        Ok(summary) => {
            info!(
                directories = summary.directories,
                files = summary.files,
                "initial scan complete"
            );
            if watcher.flags().monitor {
                info!(
                    directories = watcher.monitored_dirs().len(),
                    "watching for changes, press Ctrl+C to stop"
                );
                cancel.cancelled().await;
            }
        }
        Err(err) if err.is_cancelled() => info!("scan cancelled"),
        Err(err) => return Err(err).context("scan failed"),
    }

    // Closing the event channel lets the printer drain and finish.
    drop(watcher);
    printer.await?;
    Ok(())
}

/// Combine the config file (if any) with the command line.
///
/// Directories given on the command line replace the configured roots;
/// patterns are added to the configured ones. The default config file is
/// only read when no directories are given.
fn resolve_config(args: &CliArgs) -> Result<ConfigFile> {
    let config_path = args
        .config
        .clone()
        .or_else(|| args.roots.is_empty().then(default_config_path));

    let mut raw = RawConfigFile::default();
    if let Some(path) = config_path {
        let file = load_and_validate(&path)
            .with_context(|| format!("loading config {}", path.display()))?;
        raw = RawConfigFile {
            roots: file.roots,
            matches: file.matches,
            ignores: file.ignores,
            monitor: file.monitor,
        };
    }

    if !args.roots.is_empty() {
        raw.roots = args.roots.clone();
    }
    raw.matches.extend(args.matches.iter().cloned());
    raw.ignores.extend(args.ignores.iter().cloned());
    raw.monitor |= args.monitor;

    Ok(ConfigFile::try_from(raw)?)
}
