// SPDX-License-Identifier: MPL-2.0

//! Transition effects driven by the scheduler, one strategy per mode.

mod depth;
mod drop;
mod grid;
pub mod layout;
mod pan;
mod panel;
mod zoom;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};
use slideshow_saver_config::{Canvas, Config, Mode, RecycleConfig};

pub use depth::DepthStack;
pub use drop::TableDrop;
pub use grid::GridSwitch;
pub use layout::Rect;
pub use pan::StarWars;
pub use panel::{PanelSlide, PanelState};
pub use zoom::RandomZoomIn;

use crate::animation::Animation;
use crate::asset::ReadyAsset;
use crate::surface::{RenderSurface, SlotId};

/// Session-wide values every effect reads while rendering.
#[derive(Debug, Clone)]
pub struct EffectContext {
    canvas: Canvas,
    recycle: RecycleConfig,
    recycling: Arc<AtomicBool>,
}

impl EffectContext {
    pub fn new(canvas: Canvas, recycle: RecycleConfig) -> Self {
        Self {
            canvas,
            recycle,
            recycling: Arc::default(),
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// The whole screen.
    pub fn screen(&self) -> Rect {
        Rect::new(0, 0, self.canvas.width, self.canvas.height)
    }

    /// Whether a [`RecycleMode`] burst is active.
    pub fn is_recycling(&self) -> bool {
        self.recycling.load(Ordering::Acquire)
    }

    /// Pause between renders, overridden during bursts.
    pub fn pacing(&self, wait_ms: u64) -> Duration {
        if self.is_recycling() {
            Duration::from_millis(self.recycle.wait_ms)
        } else {
            Duration::from_millis(wait_ms)
        }
    }

    /// Animation duration, shortened during bursts.
    pub fn effect_ms(&self, duration_ms: u64) -> u64 {
        if self.is_recycling() {
            duration_ms / u64::from(self.recycle.speedup.max(1))
        } else {
            duration_ms
        }
    }

    /// Block for an effect's own duration.
    pub fn hold(&self, duration_ms: u64) {
        if duration_ms > 0 {
            std::thread::sleep(Duration::from_millis(duration_ms));
        }
    }
}

/// Fast pacing override, active while the value lives.
///
/// Dropping it restores whatever was active before, including when a burst
/// is cut short by an exit request.
#[derive(Debug)]
pub struct RecycleMode {
    flag: Arc<AtomicBool>,
    saved: bool,
}

impl RecycleMode {
    pub fn enter(context: &EffectContext) -> Self {
        let flag = Arc::clone(&context.recycling);
        let saved = flag.swap(true, Ordering::AcqRel);
        Self { flag, saved }
    }
}

impl Drop for RecycleMode {
    fn drop(&mut self) {
        self.flag.store(self.saved, Ordering::Release);
    }
}

/// Periodic full redraw of every slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redraw {
    /// Renders in one burst.
    pub renders: usize,
    /// Steady rounds (of `renders` renders each) between bursts.
    pub every: u32,
}

impl Redraw {
    /// Whether a burst is due after `renders_since` steady renders.
    ///
    /// A zero slot count or cadence never triggers.
    pub fn is_due(&self, renders_since: usize) -> bool {
        if self.renders == 0 || self.every == 0 {
            return false;
        }
        renders_since / self.renders >= self.every as usize
    }
}

/// Slots reused round-robin.
#[derive(Debug, Clone, Default)]
pub struct SlotRing {
    slots: Vec<SlotId>,
    next: usize,
}

impl SlotRing {
    pub fn new(slots: Vec<SlotId>) -> Self {
        Self { slots, next: 0 }
    }

    pub fn slots(&self) -> &[SlotId] {
        &self.slots
    }

    /// Next slot to render into, or `None` before setup.
    pub fn advance(&mut self) -> Option<SlotId> {
        let slot = *self.slots.get(self.next % self.slots.len().max(1))?;
        self.next = (self.next + 1) % self.slots.len();
        Some(slot)
    }
}

/// Hide a slot, optionally bring it to the front, then show `content` at
/// `rect` running `animations`.
pub(crate) fn present(
    surface: &mut dyn RenderSurface,
    slot: SlotId,
    content: &str,
    rect: Rect,
    animations: &[Animation],
    restack: bool,
) {
    surface.set_visible(slot, false);
    surface.set_image(slot, "");
    if restack {
        surface.restack_to_front(slot);
    }
    surface.set_image(slot, content);
    surface.set_position(slot, rect.x, rect.y);
    surface.set_size(slot, rect.width, rect.height);
    surface.set_animation(slot, animations);
    surface.set_visible(slot, true);
}

/// One transition strategy.
pub trait Effect: Send {
    fn mode(&self) -> Mode;

    /// Pause between two steady renders.
    fn pacing(&self, context: &EffectContext) -> Duration;

    /// Renders at session start shown without pacing, in [`RecycleMode`].
    fn fast_image_count(&self) -> usize {
        0
    }

    /// Renders never depend on cache contents, so the cache keeps filling
    /// while they run.
    fn continuous(&self) -> bool {
        false
    }

    /// Background image shown behind the slots.
    fn background(&self) -> &'static str {
        "black.jpg"
    }

    /// Create and stack the slots.
    fn setup(&mut self, surface: &mut dyn RenderSurface, context: &EffectContext);

    /// Show one asset. May block for the effect's own duration.
    fn render(
        &mut self,
        surface: &mut dyn RenderSurface,
        context: &EffectContext,
        asset: &ReadyAsset,
    );

    /// Cadence of periodic full redraws, if the mode has them.
    fn redraw(&self) -> Option<Redraw> {
        None
    }

    /// Called in [`RecycleMode`] before the renders of a redraw burst.
    fn begin_redraw(&mut self, _surface: &mut dyn RenderSurface, _context: &EffectContext) {}

    /// Every slot this effect created.
    fn slots(&self) -> Vec<SlotId>;

    /// Remove every slot. Safe to call before setup.
    fn teardown(&mut self, surface: &mut dyn RenderSurface) {
        let slots = self.slots();
        if !slots.is_empty() {
            surface.remove_slots(&slots);
        }
    }
}

/// Resolve [`Mode::Random`] to one concrete mode.
pub fn resolve_mode(mode: Mode, rng: &mut impl Rng) -> Mode {
    match mode {
        Mode::Random => Mode::CONCRETE[rng.random_range(0..Mode::CONCRETE.len())],
        mode => mode,
    }
}

/// Construct the effect for `mode`, picking a concrete one for
/// [`Mode::Random`].
pub fn build(mode: Mode, config: &Config, rng: &mut impl Rng) -> Box<dyn Effect> {
    let effect: Box<dyn Effect> = match mode {
        Mode::Random => return build(resolve_mode(mode, rng), config, rng),
        Mode::TableDrop => Box::new(TableDrop::new(&config.table_drop, seeded(rng))),
        Mode::StarWars => Box::new(StarWars::new(&config.star_wars)),
        Mode::RandomZoomIn => Box::new(RandomZoomIn::new(&config.random_zoom, seeded(rng))),
        Mode::AppleTvLike => Box::new(DepthStack::new(&config.apple_tv, seeded(rng))),
        Mode::GridSwitch => Box::new(GridSwitch::new(&config.grid_switch, seeded(rng))),
        Mode::PanelSlide => Box::new(PanelSlide::new(&config.panel_slide, seeded(rng))),
    };

    tracing::info!(mode = ?effect.mode(), "selected effect");
    effect
}

/// Independent generator for one effect.
fn seeded(rng: &mut impl Rng) -> StdRng {
    StdRng::seed_from_u64(rng.random())
}

#[cfg(test)]
mod tests;
