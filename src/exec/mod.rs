// src/exec/mod.rs

//! Hook execution layer.
//!
//! - [`hook`] defines the [`ReloadHook`] trait the session calls once per
//!   settled burst; closures implement it directly.
//! - [`command`] provides [`CommandHook`], which runs a shell command using
//!   `tokio::process::Command`, either to completion or as a long-lived
//!   process that is restarted on every firing.

pub mod command;
pub mod hook;

pub use command::CommandHook;
pub use hook::ReloadHook;
