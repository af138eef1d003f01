// SPDX-License-Identifier: MPL-2.0

use std::time::Duration;

use rand::{Rng, rngs::StdRng, seq::SliceRandom};
use slideshow_saver_config::{AppleTvConfig, Mode};

use super::{Effect, EffectContext, Rect, present};
use crate::animation::{Center, Descriptor, Easing};
use crate::asset::ReadyAsset;
use crate::surface::{RenderSurface, SlotId};

const SLOTS: usize = 35;
const FAST_IMAGE_COUNT: usize = 2;
/// Share of the screen height a layer travels relative to its size.
const DISTANCE_RATIO: f64 = 0.7;
/// Layer sizes in percent of the screen width.
const MIN_ZOOM: u32 = 10;
const ZOOM_SPREAD: f64 = 40.0;

/// A slot at a fixed depth; nearer layers are wider and move faster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layer {
    slot: SlotId,
    zoom: u32,
}

/// Photos floating upwards with parallax, the Apple TV screensaver look.
pub struct DepthStack {
    config: AppleTvConfig,
    rng: StdRng,
    layers: Vec<Layer>,
    next: usize,
}

impl DepthStack {
    pub fn new(config: &AppleTvConfig, rng: StdRng) -> Self {
        Self {
            config: config.clone(),
            rng,
            layers: Vec::new(),
            next: 0,
        }
    }

    /// Beta(2, 2) sample: the median of three uniform samples.
    fn beta_2_2(&mut self) -> f64 {
        let mut samples: [f64; 3] = [self.rng.random(), self.rng.random(), self.rng.random()];
        samples.sort_by(f64::total_cmp);
        samples[1]
    }
}

impl Effect for DepthStack {
    fn mode(&self) -> Mode {
        Mode::AppleTvLike
    }

    fn pacing(&self, context: &EffectContext) -> Duration {
        context.pacing(self.config.wait_ms())
    }

    fn fast_image_count(&self) -> usize {
        FAST_IMAGE_COUNT
    }

    fn setup(&mut self, surface: &mut dyn RenderSurface, _context: &EffectContext) {
        let mut zooms: Vec<u32> = (0..SLOTS)
            .map(|_| (self.beta_2_2() * ZOOM_SPREAD) as u32 + MIN_ZOOM)
            .collect();
        zooms.sort_unstable();

        // Slots stack in creation order, so the smallest (farthest) go first.
        let slots = surface.add_slots(SLOTS);
        self.layers = slots
            .into_iter()
            .zip(zooms)
            .map(|(slot, zoom)| Layer { slot, zoom })
            .collect();
        self.layers.shuffle(&mut self.rng);
        self.next = 0;
    }

    fn render(
        &mut self,
        surface: &mut dyn RenderSurface,
        context: &EffectContext,
        asset: &ReadyAsset,
    ) {
        if self.layers.is_empty() {
            return;
        }
        let layer = self.layers[self.next];
        self.next = (self.next + 1) % self.layers.len();

        let canvas = context.canvas();
        let width = canvas.width * layer.zoom as i32 / 100;
        let height = (f64::from(width) / canvas.aspect_ratio()) as i32;
        // layers may overlap the screen edge by half their width
        let center = self.rng.random_range(0..=canvas.width);

        let travel_ms =
            self.config.max_time_ms() / f64::from(layer.zoom) * DISTANCE_RATIO * 100.0;
        let travel = f64::from(canvas.height);
        let slide = Descriptor::slide(
            (0.0, travel),
            (0.0, -travel),
            context.effect_ms(travel_ms as u64),
        )
        .easing(Easing::Linear)
        .center(Center::Auto)
        .now();

        tracing::debug!(slot = %layer.slot, zoom = layer.zoom, travel_ms, "float");
        // Never restacked: the depth order was fixed at setup.
        present(
            surface,
            layer.slot,
            asset.content(),
            Rect::new(center - width / 2, 0, width, height),
            &[slide],
            false,
        );
    }

    fn slots(&self) -> Vec<SlotId> {
        self.layers.iter().map(|layer| layer.slot).collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use slideshow_saver_config::{Canvas, RecycleConfig};

    use super::*;
    use crate::surface::recording::{Command, RecordingSurface};

    #[test]
    fn nearer_layers_are_stacked_in_front() {
        let mut surface = RecordingSurface::default();
        let context = EffectContext::new(Canvas::default(), RecycleConfig::default());
        let mut effect = DepthStack::new(&AppleTvConfig::default(), StdRng::seed_from_u64(3));
        effect.setup(&mut surface, &context);

        let mut by_stack = effect.layers.clone();
        by_stack.sort_by_key(|layer| layer.slot);
        assert!(by_stack.windows(2).all(|w| w[0].zoom <= w[1].zoom));
        assert!(
            effect
                .layers
                .iter()
                .all(|layer| (MIN_ZOOM..MIN_ZOOM + ZOOM_SPREAD as u32).contains(&layer.zoom))
        );
        assert_eq!(effect.slots().len(), SLOTS);
    }

    #[test]
    fn smaller_layers_travel_slower() {
        let mut surface = RecordingSurface::default();
        let context = EffectContext::new(Canvas::default(), RecycleConfig::default());
        let mut effect = DepthStack::new(&AppleTvConfig::default(), StdRng::seed_from_u64(9));
        effect.setup(&mut surface, &context);

        let asset = ReadyAsset::unchanged(crate::asset::AssetRef::new("a.jpg"));
        let mut durations = Vec::new();
        for _ in 0..SLOTS {
            let layer = effect.layers[effect.next];
            effect.render(&mut surface, &context, &asset);
            let slide = surface.animations_of(layer.slot).pop().unwrap();
            durations.push((layer.zoom, slide.effect.duration_ms));
        }

        durations.sort();
        assert!(durations.windows(2).all(|w| w[0].1 >= w[1].1));
        assert!(
            !surface
                .commands()
                .iter()
                .any(|command| matches!(command, Command::Restack(_)))
        );
    }
}
