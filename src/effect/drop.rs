// SPDX-License-Identifier: MPL-2.0

use std::time::Duration;

use rand::{Rng, rngs::StdRng};
use slideshow_saver_config::{Mode, TableDropConfig};

use super::{Effect, EffectContext, Rect, SlotRing, present};
use crate::animation::{Center, Descriptor, Easing};
use crate::asset::ReadyAsset;
use crate::surface::{RenderSurface, SlotId};

const SLOTS: usize = 20;
const FADE_MS: u64 = 200;
const MAX_ROTATION: f64 = 20.0;

/// Photos dropped onto a table, each landing slightly rotated on top of the
/// previous ones.
pub struct TableDrop {
    config: TableDropConfig,
    rng: StdRng,
    ring: SlotRing,
}

impl TableDrop {
    pub fn new(config: &TableDropConfig, rng: StdRng) -> Self {
        Self {
            config: config.clone(),
            rng,
            ring: SlotRing::default(),
        }
    }
}

impl Effect for TableDrop {
    fn mode(&self) -> Mode {
        Mode::TableDrop
    }

    fn pacing(&self, context: &EffectContext) -> Duration {
        context.pacing(self.config.wait_ms)
    }

    fn background(&self) -> &'static str {
        "table.jpg"
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

        let canvas = context.canvas();
        let width = self
            .rng
            .random_range(self.config.min_width..=self.config.max_width);
        let height = (f64::from(width) / canvas.aspect_ratio()) as i32;
        let x = self.rng.random_range(0..=(canvas.width - width).max(0));
        let y = self.rng.random_range(0..=(canvas.height - height).max(0));

        let drop_height: u32 = self.rng.random_range(400..=800);
        let drop_ms = context.effect_ms(u64::from(drop_height) * 3 / 2);
        let rotation = self.rng.random_range(-MAX_ROTATION..=MAX_ROTATION);

        let animations = [
            Descriptor::fade(0.0, 100.0, context.effect_ms(FADE_MS)).now(),
            Descriptor::rotate(0.0, rotation, drop_ms)
                .center(Center::Auto)
                .easing(Easing::Circle)
                .now(),
            Descriptor::zoom(f64::from(drop_height), 100.0, drop_ms)
                .center(Center::Auto)
                .easing(Easing::Circle)
                .now(),
        ];

        tracing::debug!(%slot, width, x, y, drop_height, rotation, "drop");
        present(
            surface,
            slot,
            asset.content(),
            Rect::new(x, y, width, height),
            &animations,
            true,
        );
    }

    fn slots(&self) -> Vec<SlotId> {
        self.ring.slots().to_vec()
    }
}
