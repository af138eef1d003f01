// SPDX-License-Identifier: MPL-2.0

use std::time::Duration;

use rand::{Rng, rngs::StdRng};
use slideshow_saver_config::{Mode, RandomZoomConfig};

use super::{Effect, EffectContext, SlotRing, present};
use crate::animation::{Center, Descriptor, Easing};
use crate::asset::ReadyAsset;
use crate::surface::{RenderSurface, SlotId};

const SLOTS: usize = 7;

/// Full-screen photos growing out of a random point.
pub struct RandomZoomIn {
    config: RandomZoomConfig,
    rng: StdRng,
    ring: SlotRing,
}

impl RandomZoomIn {
    pub fn new(config: &RandomZoomConfig, rng: StdRng) -> Self {
        Self {
            config: config.clone(),
            rng,
            ring: SlotRing::default(),
        }
    }
}

impl Effect for RandomZoomIn {
    fn mode(&self) -> Mode {
        Mode::RandomZoomIn
    }

    fn pacing(&self, context: &EffectContext) -> Duration {
        context.pacing(self.config.wait_ms)
    }

    fn setup(&mut self, surface: &mut dyn RenderSurface, _context: &EffectContext) {
        self.ring = SlotRing::new(surface.add_slots(SLOTS));
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

        let screen = context.screen();
        let center_x = self.rng.random_range(0..=screen.width);
        let center_y = self.rng.random_range(0..=screen.height);

        let zoom = Descriptor::zoom(1.0, 100.0, context.effect_ms(self.config.effect_ms))
            .center(Center::Point(f64::from(center_x), f64::from(center_y)))
            .easing(Easing::Quadratic)
            .now();

        tracing::debug!(%slot, center_x, center_y, "zoom in");
        present(surface, slot, asset.content(), screen, &[zoom], true);
    }

    fn slots(&self) -> Vec<SlotId> {
        self.ring.slots().to_vec()
    }
}
