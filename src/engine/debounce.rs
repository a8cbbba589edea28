// src/engine/debounce.rs

//! Pending-change flag and timer generations.
//!
//! Timers are never cancelled in place. Every real change bumps the
//! generation; an expiry carrying an older generation is stale and ignored.
//! This keeps "at most one live timer" true even when an aborted timer task
//! has already queued its expiry.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: bool,
    generation: u64,
    armed: bool,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: false,
            generation: 0,
            armed: false,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record a real change and return the generation the new timer must
    /// carry.
    pub fn note_change(&mut self) -> u64 {
        self.pending = true;
        self.armed = true;
        self.generation += 1;
        self.generation
    }

    /// Whether an expiry for `generation` should fire the hook.
    pub fn should_fire(&self, generation: u64) -> bool {
        self.armed && self.pending && generation == self.generation
    }

    /// The current timer expired without firing (stale flag state).
    pub fn disarm(&mut self, generation: u64) {
        if generation == self.generation {
            self.armed = false;
        }
    }

    /// The hook returned: clear the flag and the timer.
    pub fn finish(&mut self) {
        self.pending = false;
        self.armed = false;
    }
}
