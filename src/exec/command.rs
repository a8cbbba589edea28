// src/exec/command.rs

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

use crate::exec::hook::ReloadHook;

/// Runs a shell command as the reload hook.
///
/// - one-shot (default): each firing runs the command to completion.
/// - long-lived: each firing kills the previous process (if still running)
///   and starts a new one without waiting for it.
///
/// The child inherits stdout/stderr. A long-lived child is killed when the
/// hook is dropped.
#[derive(Debug)]
pub struct CommandHook {
    cmd: String,
    long_lived: bool,
    child: Option<Child>,
    runs: u64,
}

impl CommandHook {
    pub fn new(cmd: impl Into<String>, long_lived: bool) -> Self {
        Self {
            cmd: cmd.into(),
            long_lived,
            child: None,
            runs: 0,
        }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn is_long_lived(&self) -> bool {
        self.long_lived
    }

    /// Number of times the command has been started.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Wait for the current long-lived process, if any, to exit.
    pub async fn wait(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for hook process '{}'", self.cmd))?;
            info!(exit_code = status.code().unwrap_or(-1), "hook process exited");
        }
        Ok(())
    }

    /// Kill the current long-lived process, if any.
    pub async fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(pid = ?child.id(), "stopping hook process");
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill hook process");
            }
        }
    }

    async fn run_once(&mut self) -> Result<()> {
        self.runs += 1;
        info!(run = self.runs, cmd = %self.cmd, "running hook");

        let status = shell_command(&self.cmd)
            .status()
            .await
            .with_context(|| format!("running hook command '{}'", self.cmd))?;

        let code = status.code().unwrap_or(-1);
        if status.success() {
            info!(run = self.runs, "hook finished");
        } else {
            warn!(run = self.runs, exit_code = code, "hook exited with failure");
        }
        Ok(())
    }

    async fn restart(&mut self) -> Result<()> {
        self.shutdown().await;

        self.runs += 1;
        info!(run = self.runs, cmd = %self.cmd, "starting long-lived hook");

        let child = shell_command(&self.cmd)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning hook command '{}'", self.cmd))?;
        self.child = Some(child);
        Ok(())
    }
}

impl ReloadHook for CommandHook {
    fn fire(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let res = if self.long_lived {
                self.restart().await
            } else {
                self.run_once().await
            };
            if let Err(err) = res {
                error!(error = %err, "hook execution error");
            }
        })
    }
}

/// Build a shell invocation appropriate for the platform.
fn shell_command(cmd: &str) -> Command {
    let mut c = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };
    c.stdin(Stdio::null());
    c
}
