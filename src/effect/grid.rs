// SPDX-License-Identifier: MPL-2.0

use std::time::Duration;

use rand::{rngs::StdRng, seq::SliceRandom};
use slideshow_saver_config::{GridSwitchConfig, Mode};

use super::{Effect, EffectContext, Redraw, SlotRing, layout};
use crate::animation::Descriptor;
use crate::asset::ReadyAsset;
use crate::surface::{RenderSurface, SlotId};

/// A square grid whose cells cross-fade to new photos one at a time.
pub struct GridSwitch {
    config: GridSwitchConfig,
    rng: StdRng,
    ring: SlotRing,
}

impl GridSwitch {
    pub fn new(config: &GridSwitchConfig, rng: StdRng) -> Self {
        Self {
            config: config.clone(),
            rng,
            ring: SlotRing::default(),
        }
    }

    fn cells(&self) -> usize {
        let side = self.config.rows_columns as usize;
        side * side
    }

    fn fade(&self, surface: &mut dyn RenderSurface, slot: SlotId, start: f64, end: f64, ms: u64) {
        surface.set_animation(slot, &[Descriptor::fade(start, end, ms).now()]);
    }
}

impl Effect for GridSwitch {
    fn mode(&self) -> Mode {
        Mode::GridSwitch
    }

    fn pacing(&self, context: &EffectContext) -> Duration {
        context.pacing(self.config.wait_ms)
    }

    /// Every cell is filled once before pacing starts.
    fn fast_image_count(&self) -> usize {
        self.cells()
    }

    fn setup(&mut self, surface: &mut dyn RenderSurface, context: &EffectContext) {
        let side = self.config.rows_columns;
        let slots = surface.add_slots(self.cells());

        for (slot, cell) in slots.iter().zip(layout::grid(context.screen(), side, side)) {
            surface.set_position(*slot, cell.x, cell.y);
            surface.set_size(*slot, cell.width, cell.height);
            surface.set_visible(*slot, true);
        }

        let mut order = slots;
        order.shuffle(&mut self.rng);
        self.ring = SlotRing::new(order);
    }

    fn render(
        &mut self,
        surface: &mut dyn RenderSurface,
        context: &EffectContext,
        asset: &ReadyAsset,
    ) {
        let Some(slot) = self.ring.advance() else {
            return;
        };
        let effect_ms = context.effect_ms(self.config.effect_ms);

        // While recycling the cell is empty or already faded out.
        if !context.is_recycling() {
            self.fade(surface, slot, 100.0, 0.0, effect_ms);
            context.hold(effect_ms);
        }

        surface.set_image(slot, asset.content());
        self.fade(surface, slot, 0.0, 100.0, effect_ms);
    }

    fn redraw(&self) -> Option<Redraw> {
        Some(Redraw {
            renders: self.cells(),
            every: self.config.redraw_every,
        })
    }

    fn begin_redraw(&mut self, surface: &mut dyn RenderSurface, context: &EffectContext) {
        let effect_ms = context.effect_ms(self.config.effect_ms);
        for &slot in self.ring.slots() {
            self.fade(surface, slot, 100.0, 0.0, effect_ms);
        }
        context.hold(effect_ms);
    }

    fn slots(&self) -> Vec<SlotId> {
        self.ring.slots().to_vec()
    }
}
