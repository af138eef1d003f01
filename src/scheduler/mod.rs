// SPDX-License-Identifier: MPL-2.0

//! Foreground playback loop: pacing, selection and the pause handshake.
//!
//! ```text
//! Priming ──fast renders──▶ SteadyLoop ◀──────────┐
//!                              │ redraw due       │ burst done
//!                              ▼                  │
//!                         BurstRecycle ───────────┘
//!
//! any phase ──exit signal (at a wait boundary)──▶ Stopped
//! ```
//!
//! Every wait is sliced into chunks so an exit request is noticed within one
//! chunk. A render that already started always completes.

use std::time::{Duration, Instant};

use crate::asset::ReadyAsset;
use crate::cache::PrefetchCache;
use crate::effect::{Effect, EffectContext, RecycleMode};
use crate::exit::{ExitSignal, WAIT_CHUNK};
use crate::surface::RenderSurface;

/// Longest sleep between two looks at the cache fill level.
const FILL_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the cache, then showing the first images without pacing.
    Priming,
    SteadyLoop,
    /// Fast redraw of every slot; `remaining` renders left.
    BurstRecycle { remaining: usize },
    Stopped,
}

/// Drives one effect from a prefetch cache until exit is requested.
pub struct Scheduler<'a> {
    cache: &'a PrefetchCache,
    effect: &'a mut dyn Effect,
    surface: &'a mut dyn RenderSurface,
    context: &'a EffectContext,
    exit: ExitSignal,
    low_water: usize,
    chunk: Duration,
    phase: Phase,
    renders: u64,
    since_redraw: usize,
}

impl<'a> Scheduler<'a> {
    /// `low_water_mark` is clamped to what the cache can actually hold, so a
    /// source with a single viable asset doesn't stall forever. The clamp is
    /// tightened again whenever the cache finds another broken asset.
    pub fn new(
        cache: &'a PrefetchCache,
        effect: &'a mut dyn Effect,
        surface: &'a mut dyn RenderSurface,
        context: &'a EffectContext,
        exit: ExitSignal,
        low_water_mark: usize,
    ) -> Self {
        let low_water = low_water_mark
            .min(cache.target_size())
            .min(cache.viable_assets())
            .max(1);
        if low_water != low_water_mark {
            tracing::debug!(
                configured = low_water_mark,
                effective = low_water,
                "clamped low-water mark"
            );
        }

        Self {
            cache,
            effect,
            surface,
            context,
            exit,
            low_water,
            chunk: WAIT_CHUNK,
            phase: Phase::Priming,
            renders: 0,
            since_redraw: 0,
        }
    }

    /// Use a shorter wait chunk than [`WAIT_CHUNK`].
    #[must_use]
    pub fn with_chunk(mut self, chunk: Duration) -> Self {
        self.chunk = chunk.clamp(Duration::from_millis(1), WAIT_CHUNK);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Entries required before one is consumed.
    pub fn low_water(&self) -> usize {
        self.low_water.min(self.cache.viable_assets()).max(1)
    }

    /// Run until the exit signal is raised, then stop and join the cache
    /// worker. Returns the number of renders.
    pub fn run(&mut self) -> u64 {
        let _span = tracing::info_span!("scheduler", mode = ?self.effect.mode()).entered();
        let started = Instant::now();

        self.phase = Phase::Priming;
        while self.phase != Phase::Stopped {
            match self.phase {
                Phase::Priming => self.prime(),
                Phase::SteadyLoop => self.steady(),
                Phase::BurstRecycle { remaining } => self.burst(remaining),
                Phase::Stopped => {}
            }
        }

        self.cache.join();
        tracing::info!(
            renders = self.renders,
            elapsed = ?started.elapsed(),
            stats = ?self.cache.stats(),
            "slideshow stopped"
        );
        self.renders
    }

    fn enter(&mut self, phase: Phase) {
        if self.phase != phase {
            tracing::debug!(from = ?self.phase, to = ?phase, "phase change");
        }
        self.phase = phase;
    }

    fn prime(&mut self) {
        let count = self.effect.fast_image_count();
        let _recycle = RecycleMode::enter(self.context);

        for _ in 0..count {
            if !self.cycle() {
                self.enter(Phase::Stopped);
                return;
            }
        }

        self.enter(Phase::SteadyLoop);
    }

    fn steady(&mut self) {
        let pacing = self.effect.pacing(self.context);
        if !self.exit.sleep(pacing, self.chunk) || !self.cycle() {
            self.enter(Phase::Stopped);
            return;
        }

        self.since_redraw += 1;
        let Some(redraw) = self.effect.redraw() else {
            return;
        };
        if redraw.is_due(self.since_redraw) {
            self.since_redraw = 0;
            self.enter(Phase::BurstRecycle {
                remaining: redraw.renders,
            });
        }
    }

    fn burst(&mut self, mut remaining: usize) {
        let _recycle = RecycleMode::enter(self.context);
        self.effect.begin_redraw(&mut *self.surface, self.context);

        while remaining > 0 {
            let pacing = self.effect.pacing(self.context);
            if !self.exit.sleep(pacing, self.chunk) || !self.cycle() {
                self.enter(Phase::Stopped);
                return;
            }
            remaining -= 1;
            self.phase = Phase::BurstRecycle { remaining };
        }

        self.enter(Phase::SteadyLoop);
    }

    /// Wait for an entry, render it, then drop it from the cache.
    ///
    /// Returns `false` if exit was requested before rendering.
    fn cycle(&mut self) -> bool {
        let Some(ready) = self.next_ready() else {
            return false;
        };

        let handshake = !self.effect.continuous();
        if handshake {
            self.cache.pause();
            let cache = self.cache;
            let chunk = self.chunk;
            if !self
                .exit
                .wait_until(Duration::ZERO, || cache.wait_until_idle_for(chunk))
            {
                self.cache.resume();
                return false;
            }
        }

        self.effect.render(&mut *self.surface, self.context, &ready);

        if handshake {
            self.cache.resume();
        }

        self.renders += 1;
        tracing::debug!(asset = %ready.asset(), renders = self.renders, "rendered");
        self.cache.remove(ready.asset()).unwrap_or(ready).discard();
        true
    }

    /// Block until the cache holds the low-water mark, then pick its first
    /// fresh entry. Stale entries are rolled back on the way.
    fn next_ready(&mut self) -> Option<ReadyAsset> {
        let cache = self.cache;
        let low_water = self.low_water;
        let poll = self.chunk.min(FILL_POLL);

        loop {
            let filled = || cache.len() >= low_water.min(cache.viable_assets()).max(1);
            if !self.exit.wait_until(poll, filled) {
                return None;
            }

            let Some(ready) = cache.first() else {
                continue;
            };

            if ready.is_stale() {
                tracing::warn!(asset = %ready.asset(), "temporary copy vanished, dropping entry");
                if let Some(stale) = cache.remove(ready.asset()) {
                    stale.discard();
                }
                continue;
            }

            return Some(ready);
        }
    }
}
