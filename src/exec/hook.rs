// src/exec/hook.rs

//! The callback the session invokes once per settled burst.
//!
//! The session awaits the returned future before it handles the next event,
//! so invocations never overlap. There is no return channel: a hook reports
//! its own failures.

use std::future::Future;
use std::pin::Pin;

/// Action to run when changes settle.
///
/// Production code uses [`crate::exec::CommandHook`]; any `FnMut()` closure
/// is a hook too, which is what most tests use.
pub trait ReloadHook: Send {
    fn fire(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

impl<F> ReloadHook for F
where
    F: FnMut() + Send,
{
    fn fire(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        (self)();
        Box::pin(std::future::ready(()))
    }
}
