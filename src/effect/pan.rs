// SPDX-License-Identifier: MPL-2.0

use std::time::Duration;

use slideshow_saver_config::{Mode, StarWarsConfig};

use super::{Effect, EffectContext, Rect, SlotRing, present};
use crate::animation::{Center, Descriptor, Easing};
use crate::asset::ReadyAsset;
use crate::surface::{RenderSurface, SlotId};

const SLOTS: usize = 6;
const TILT_DEGREES: f64 = 50.0;

/// Full-screen photos crawling away on a tilted plane.
///
/// Renders never look at the cache, so the mode runs without the pause
/// handshake.
pub struct StarWars {
    config: StarWarsConfig,
    ring: SlotRing,
}

impl StarWars {
    pub fn new(config: &StarWarsConfig) -> Self {
        Self {
            config: config.clone(),
            ring: SlotRing::default(),
        }
    }
}

impl Effect for StarWars {
    fn mode(&self) -> Mode {
        Mode::StarWars
    }

    fn pacing(&self, context: &EffectContext) -> Duration {
        context.pacing(self.config.wait_ms)
    }

    fn continuous(&self) -> bool {
        true
    }

    fn background(&self) -> &'static str {
        "stars.jpg"
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
        // Start just below the horizon and crawl 1.5 screens up.
        let top = screen.height * 17 / 24;
        let travel = f64::from(screen.height) * 55.0 / 36.0;

        let animations = [
            Descriptor::rotate_x(0.0, TILT_DEGREES, 0)
                .center(Center::Auto)
                .now(),
            Descriptor::slide(
                (0.0, travel),
                (0.0, -travel),
                context.effect_ms(self.config.slide_ms),
            )
            .easing(Easing::Linear)
            .center(Center::Auto)
            .now(),
        ];

        present(
            surface,
            slot,
            asset.content(),
            Rect { y: top, ..screen },
            &animations,
            true,
        );
    }

    fn slots(&self) -> Vec<SlotId> {
        self.ring.slots().to_vec()
    }
}
