// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `relayvisor`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "relayvisor",
    version,
    about = "Supervise a relay child process: template its config, watch its output, reap it on stop.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the supervisor config file (TOML).
    ///
    /// Default: `Relayvisor.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Relayvisor.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RELAYVISOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve the instance, render the relay config and print the launch
    /// plan, but don't spawn anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Kill leftover relay processes from a previous run and exit.
    #[arg(long, conflicts_with = "dry_run")]
    pub sweep: bool,
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
