// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dirwatcher`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dirwatcher",
    version,
    about = "Scan directory trees and report files, optionally watching for changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Directories to scan. When omitted, roots come from the config file.
    #[arg(value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Only report files whose path matches this regular expression.
    /// May be repeated; added to the patterns from the config file.
    #[arg(long = "match", value_name = "REGEX")]
    pub matches: Vec<String>,

    /// Never enter directories whose path matches this regular expression,
    /// and drop change notifications for matching paths. Files found by the
    /// scan are not checked against it. May be repeated.
    #[arg(long = "ignore", value_name = "REGEX")]
    pub ignores: Vec<String>,

    /// Keep watching the scanned directories and report changes until Ctrl-C.
    #[arg(long)]
    pub monitor: bool,

    /// Path to the config file (TOML).
    ///
    /// Default: `Dirwatcher.toml` in the current working directory, read
    /// only when no directories are given.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DIRWATCHER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
