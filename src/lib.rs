// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::{load_or_default, DEFAULT_CONFIG_FILE};
use crate::config::model::ConfigFile;
use crate::config::validate_config;
use crate::engine::start_session;
use crate::errors::ReloadwatchError;
use crate::exec::{CommandHook, ReloadHook};
use crate::fs::RealFileSystem;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the hook command
/// - the watch session
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let allow_missing = args.config == DEFAULT_CONFIG_FILE;
    let mut cfg = load_or_default(&config_path, allow_missing)?;

    apply_overrides(&mut cfg, &args);
    validate_config(&cfg)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let cmd = cfg.hook.cmd.clone().ok_or_else(|| {
        ReloadwatchError::ConfigError(
            "no hook command: set [hook].cmd or pass --cmd".to_string(),
        )
    })?;
    let mut hook = CommandHook::new(cmd, cfg.hook.long_lived);

    if !cfg.watch.enabled {
        info!("watching disabled; running hook once");
        hook.fire().await;
        hook.wait().await?;
        return Ok(());
    }

    if args.skip_initial {
        debug!("skipping initial hook run");
    } else {
        hook.fire().await;
    }

    let fs = Arc::new(RealFileSystem);
    let handle = start_session(cfg.to_settings(), fs, hook).await?;
    info!(root = ?handle.root(), "watching; press Ctrl-C to stop");

    // Ctrl-C → graceful shutdown.
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Ctrl-C received; stopping");
            handle.stop().await?;
        }
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl-C; running until the session ends");
            handle.wait().await?;
        }
    }

    Ok(())
}

/// Apply `--root`, `--debounce-ms` and `--cmd` on top of the loaded config.
pub fn apply_overrides(cfg: &mut ConfigFile, args: &CliArgs) {
    if let Some(root) = &args.root {
        cfg.watch.root = root.clone();
    }
    if let Some(ms) = args.debounce_ms {
        cfg.watch.debounce_ms = ms;
    }
    if let Some(cmd) = &args.cmd {
        cfg.hook.cmd = Some(cmd.clone());
    }
}

/// Print the resolved settings.
fn print_dry_run(cfg: &ConfigFile) {
    let settings = cfg.to_settings();

    println!("reloadwatch dry-run");
    println!("  watch.enabled = {}", cfg.watch.enabled);
    println!("  watch.root = {:?}", settings.root);
    println!("  watch.recursive = {}", settings.recursive);
    println!(
        "  watch.debounce = {:?} (configured {} ms)",
        settings.debounce(),
        settings.debounce_ms
    );
    if !settings.filter.is_empty() {
        println!("  watch.filter = {:?}", settings.filter);
    }
    if !settings.ignore.is_empty() {
        println!("  watch.ignore = {:?}", settings.ignore);
    }
    println!("  watch.use_gitignore = {}", settings.use_ignore_file);
    println!();

    match &cfg.hook.cmd {
        Some(cmd) => println!("hook: {cmd}"),
        None => println!("hook: (none)"),
    }
    if cfg.hook.long_lived {
        println!("  long_lived: true");
    }

    debug!("dry-run complete (no execution)");
}
