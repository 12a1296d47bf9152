// src/logging.rs

//! Logging setup: `tracing` events go to STDERR through `tracing-subscriber`,
//! keeping STDOUT free for the event stream.
//!
//! The filter comes from `--log-level` when given. Otherwise
//! `DIRWATCHER_LOG` is read as `EnvFilter` directives, so
//! `DIRWATCHER_LOG=warn,dirwatcher::watch=trace` works. Without either the
//! level is `info`.

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "DIRWATCHER_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let (filter, rejected) = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    if let Some(err) = rejected {
        warn!("ignoring {LOG_ENV_VAR}: {err}");
    }
    Ok(())
}

/// The filter to install, plus the parse error when the environment
/// directives had to be thrown away.
fn build_filter(
    cli_level: Option<LogLevel>,
    env: Option<&str>,
) -> (EnvFilter, Option<tracing_subscriber::filter::ParseError>) {
    if let Some(level) = cli_level {
        return (level_filter(level.into()), None);
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => match EnvFilter::try_new(directives) {
            Ok(filter) => (filter, None),
            Err(err) => (level_filter(LevelFilter::INFO), Some(err)),
        },
        None => (level_filter(LevelFilter::INFO), None),
    }
}

fn level_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::new(level.to_string())
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}
