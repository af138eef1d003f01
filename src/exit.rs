// SPDX-License-Identifier: MPL-2.0

//! Cooperative exit flag shared by the scheduler, the cache worker and the host.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep of any wait in the pipeline.
pub const WAIT_CHUNK: Duration = Duration::from_millis(250);

/// A payload-less, idempotent exit request.
#[derive(Debug, Clone, Default)]
pub struct ExitSignal(Arc<AtomicBool>);

impl ExitSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the slideshow to end. Raising it again has no effect.
    pub fn raise(&self) {
        if !self.0.swap(true, Ordering::AcqRel) {
            tracing::debug!("exit requested");
        }
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Sleep for `duration` in chunks of at most `chunk`, checking the flag
    /// before every chunk.
    ///
    /// Returns `false` if the wait was cut short by an exit request.
    pub fn sleep(&self, duration: Duration, chunk: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let chunk = chunk.max(Duration::from_millis(1));

        loop {
            if self.is_raised() {
                return false;
            }

            let now = Instant::now();
            if now >= deadline {
                return true;
            }

            std::thread::sleep(chunk.min(deadline - now));
        }
    }

    /// Poll `ready` every `chunk` until it returns `true` or exit is requested.
    ///
    /// Returns `false` if the wait ended because of an exit request.
    pub fn wait_until(&self, chunk: Duration, mut ready: impl FnMut() -> bool) -> bool {
        loop {
            if self.is_raised() {
                return false;
            }
            if ready() {
                return true;
            }
            std::thread::sleep(chunk);
        }
    }
}
