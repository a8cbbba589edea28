// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `reloadwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reloadwatch",
    version,
    about = "Watch a source tree and run a command once changes settle.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// If the default file does not exist, built-in defaults are used.
    #[arg(long, value_name = "PATH", default_value = "Reloadwatch.toml")]
    pub config: String,

    /// Directory to watch, overriding `[watch].root`.
    #[arg(long, value_name = "DIR")]
    pub root: Option<String>,

    /// Quiet period in milliseconds, overriding `[watch].debounce_ms`.
    #[arg(long, value_name = "MS", allow_negative_numbers = true)]
    pub debounce_ms: Option<i64>,

    /// Shell command to run on change, overriding `[hook].cmd`.
    #[arg(long, value_name = "CMD")]
    pub cmd: Option<String>,

    /// Do not run the hook once before watching starts.
    #[arg(long)]
    pub skip_initial: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RELOADWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved settings, but don't watch.
    #[arg(long)]
    pub dry_run: bool,
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
