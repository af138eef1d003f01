// SPDX-License-Identifier: MPL-2.0

//! Panels that slide their photos in and out.
//!
//! The screen is divided into panels, either a fixed grid or a random
//! recursive partition. Each panel owns two image slots that take turns:
//! the current photo slides out while the next one slides in.
//!
//! ```text
//!   Empty ──render──▶ Initiating ──(zoom in)──▶ Occupied ─┐
//!     ▲                                                     │ render
//!     └──────────── redraw burst ◀────────── Occupied ◀─────┘ (slide out / in)
//! ```

use std::time::Duration;

use rand::{Rng, rngs::StdRng, seq::SliceRandom};
use slideshow_saver_config::{Mode, PanelSlideConfig};

use super::{Effect, EffectContext, Rect, RecycleMode, Redraw, layout, present};
use crate::animation::{Center, Descriptor, Easing};
use crate::asset::{AssetRef, ReadyAsset};
use crate::surface::{RenderSurface, SlotId};

const FRAME_IMAGE: &str = "panel_frame.png";
const BORDER_IMAGE: &str = "panel_border.png";
/// Label strip height as a share of the panel height.
const LABEL_SHARE: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    /// Never shown a photo, or cleared by a redraw.
    Empty,
    /// First photo zooming in.
    Initiating,
    Occupied,
}

/// Where the incoming photo moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// One panel length in the direction of motion.
    fn offset(self, rect: &Rect) -> (f64, f64) {
        let (w, h) = (f64::from(rect.width), f64::from(rect.height));
        match self {
            Self::Up => (0.0, -h),
            Self::Down => (0.0, h),
            Self::Left => (-w, 0.0),
            Self::Right => (w, 0.0),
        }
    }
}

/// Which side the outgoing photo leaves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ExitSide {
    /// Pushed along by the incoming photo.
    Ahead,
    /// Pulled back the way the incoming photo came from.
    Behind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SlidePattern {
    direction: Direction,
    exit: ExitSide,
}

impl SlidePattern {
    /// (outgoing end, incoming start) offsets.
    fn offsets(self, rect: &Rect) -> ((f64, f64), (f64, f64)) {
        let (dx, dy) = self.direction.offset(rect);
        let outgoing = match self.exit {
            ExitSide::Ahead => (dx, dy),
            ExitSide::Behind => (-dx, -dy),
        };
        (outgoing, (-dx, -dy))
    }
}

#[derive(Debug)]
struct Panel {
    rect: Rect,
    images: [SlotId; 2],
    /// Index into `images` of the slot showing the current photo.
    front: usize,
    /// Frame above the images; sliding photos pass underneath.
    top: SlotId,
    border: Option<SlotId>,
    label: Option<SlotId>,
    state: PanelState,
}

impl Panel {
    fn decorations(&self) -> impl Iterator<Item = SlotId> + '_ {
        std::iter::once(self.top).chain(self.border).chain(self.label)
    }
}

/// Text shown under a photo: the file name without numbers and separators,
/// followed by the capture date if requested.
pub fn label_text(asset: &AssetRef, show_date: bool) -> String {
    let words: Vec<&str> = asset
        .file_stem()
        .split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|token| !token.is_empty() && !token.chars().all(|c| c.is_ascii_digit()))
        .collect();
    let name = words.join(" ");

    match asset.captured().filter(|_| show_date) {
        Some(date) if name.is_empty() => date.to_owned(),
        Some(date) => format!("{name} ({date})"),
        None => name,
    }
}

pub struct PanelSlide {
    config: PanelSlideConfig,
    rng: StdRng,
    panels: Vec<Panel>,
    order: Vec<usize>,
    next: usize,
}

impl PanelSlide {
    pub fn new(config: &PanelSlideConfig, rng: StdRng) -> Self {
        Self {
            config: config.clone(),
            rng,
            panels: Vec::new(),
            order: Vec::new(),
            next: 0,
        }
    }

    pub fn states(&self) -> Vec<PanelState> {
        self.panels.iter().map(|panel| panel.state).collect()
    }

    fn layout(&mut self, screen: Rect) -> Vec<Rect> {
        if self.config.random_layout {
            layout::partition(screen, self.config.panel_count as usize, &mut self.rng)
        } else {
            layout::grid(screen, self.config.rows, self.config.columns)
        }
    }

    fn slide_pattern(&mut self) -> SlidePattern {
        let direction = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
        let exit = if self.rng.random_bool(0.5) {
            ExitSide::Ahead
        } else {
            ExitSide::Behind
        };
        SlidePattern { direction, exit }
    }

    fn zoom_in(
        panel: &mut Panel,
        surface: &mut dyn RenderSurface,
        context: &EffectContext,
        content: &str,
        effect_ms: u64,
    ) {
        panel.state = PanelState::Initiating;
        let slot = panel.images[panel.front];
        let zoom = Descriptor::zoom(0.0, 100.0, effect_ms)
            .center(Center::Auto)
            .easing(Easing::Cubic)
            .now();
        present(surface, slot, content, panel.rect, &[zoom], false);
        context.hold(effect_ms);
        panel.state = PanelState::Occupied;
    }

    fn slide(
        panel: &mut Panel,
        surface: &mut dyn RenderSurface,
        context: &EffectContext,
        content: &str,
        pattern: SlidePattern,
        effect_ms: u64,
    ) {
        let outgoing = panel.images[panel.front];
        let incoming = panel.images[1 - panel.front];
        let (out_end, in_start) = pattern.offsets(&panel.rect);

        surface.set_animation(
            outgoing,
            &[Descriptor::slide((0.0, 0.0), out_end, effect_ms)
                .easing(Easing::Sine)
                .now()],
        );
        let slide_in = Descriptor::slide(in_start, (0.0, 0.0), effect_ms)
            .easing(Easing::Sine)
            .now();
        present(surface, incoming, content, panel.rect, &[slide_in], true);
        for slot in panel.decorations() {
            surface.restack_to_front(slot);
        }

        context.hold(effect_ms);
        surface.set_visible(outgoing, false);
        surface.set_image(outgoing, "");
        panel.front = 1 - panel.front;
    }
}

impl Effect for PanelSlide {
    fn mode(&self) -> Mode {
        Mode::PanelSlide
    }

    fn pacing(&self, context: &EffectContext) -> Duration {
        context.pacing(self.config.wait_ms)
    }

    /// Every panel is filled once before pacing starts.
    fn fast_image_count(&self) -> usize {
        self.config.panels() as usize
    }

    fn setup(&mut self, surface: &mut dyn RenderSurface, context: &EffectContext) {
        let rects = self.layout(context.screen());
        let count = rects.len();

        // Stacking: all photos, then frames, borders and labels above them.
        let images = surface.add_slots(count * 2);
        let tops = surface.add_slots(count);
        let borders = if self.config.border {
            surface.add_slots(count)
        } else {
            Vec::new()
        };
        let labels = if self.config.labels {
            surface.add_slots(count)
        } else {
            Vec::new()
        };

        self.panels = rects
            .into_iter()
            .enumerate()
            .map(|(i, rect)| Panel {
                rect,
                images: [images[2 * i], images[2 * i + 1]],
                front: 0,
                top: tops[i],
                border: borders.get(i).copied(),
                label: labels.get(i).copied(),
                state: PanelState::Empty,
            })
            .collect();

        for panel in &self.panels {
            let rect = panel.rect;
            surface.set_image(panel.top, FRAME_IMAGE);
            surface.set_position(panel.top, rect.x, rect.y);
            surface.set_size(panel.top, rect.width, rect.height);
            surface.set_visible(panel.top, true);

            if let Some(border) = panel.border {
                surface.set_image(border, BORDER_IMAGE);
                surface.set_position(border, rect.x, rect.y);
                surface.set_size(border, rect.width, rect.height);
                surface.set_visible(border, true);
            }

            if let Some(label) = panel.label {
                let height = (rect.height / LABEL_SHARE).max(1);
                surface.set_position(label, rect.x, rect.bottom() - height);
                surface.set_size(label, rect.width, height);
                surface.set_visible(label, true);
            }
        }

        self.order = (0..count).collect();
        self.order.shuffle(&mut self.rng);
        self.next = 0;
        tracing::debug!(panels = count, random = self.config.random_layout, "panel layout");
    }

    fn render(
        &mut self,
        surface: &mut dyn RenderSurface,
        context: &EffectContext,
        asset: &ReadyAsset,
    ) {
        if self.order.is_empty() {
            return;
        }
        let index = self.order[self.next];
        self.next = (self.next + 1) % self.order.len();

        match self.panels[index].state {
            PanelState::Empty | PanelState::Initiating => {
                // Placeholder fill always runs at burst speed.
                let _recycle = RecycleMode::enter(context);
                let effect_ms = context.effect_ms(self.config.effect_ms);
                Self::zoom_in(
                    &mut self.panels[index],
                    surface,
                    context,
                    asset.content(),
                    effect_ms,
                );
            }
            PanelState::Occupied => {
                let pattern = self.slide_pattern();
                let effect_ms = context.effect_ms(self.config.effect_ms);
                tracing::debug!(panel = index, ?pattern, "slide");
                Self::slide(
                    &mut self.panels[index],
                    surface,
                    context,
                    asset.content(),
                    pattern,
                    effect_ms,
                );
            }
        }

        if let Some(label) = self.panels[index].label {
            surface.set_label(label, &label_text(asset.asset(), self.config.show_date));
        }
    }

    fn redraw(&self) -> Option<Redraw> {
        Some(Redraw {
            renders: self.panels.len(),
            every: self.config.redraw_every,
        })
    }

    fn begin_redraw(&mut self, surface: &mut dyn RenderSurface, context: &EffectContext) {
        let effect_ms = context.effect_ms(self.config.effect_ms);
        for panel in &mut self.panels {
            for slot in panel.images {
                surface.set_animation(slot, &[Descriptor::fade(100.0, 0.0, effect_ms).now()]);
            }
            panel.state = PanelState::Empty;
        }
        context.hold(effect_ms);
    }

    fn slots(&self) -> Vec<SlotId> {
        self.panels
            .iter()
            .flat_map(|panel| panel.images.into_iter().chain(panel.decorations()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use slideshow_saver_config::{Canvas, RecycleConfig};

    use super::*;
    use crate::surface::recording::{Command, RecordingSurface};

    fn fast_config() -> PanelSlideConfig {
        PanelSlideConfig {
            effect_ms: 0,
            ..PanelSlideConfig::default()
        }
    }

    fn context() -> EffectContext {
        EffectContext::new(Canvas::default(), RecycleConfig::default())
    }

    fn asset(id: &str) -> ReadyAsset {
        ReadyAsset::unchanged(AssetRef::new(id))
    }

    #[test]
    fn panels_start_empty_then_zoom_then_slide() {
        let mut surface = RecordingSurface::default();
        let context = context();
        let mut effect = PanelSlide::new(&fast_config(), StdRng::seed_from_u64(1));
        effect.setup(&mut surface, &context);

        let panels = effect.fast_image_count();
        assert_eq!(panels, 6);
        assert!(effect.states().iter().all(|s| *s == PanelState::Empty));

        for i in 0..panels {
            effect.render(&mut surface, &context, &asset(&format!("{i}.jpg")));
        }
        assert!(effect.states().iter().all(|s| *s == PanelState::Occupied));
        assert!(!context.is_recycling(), "initiation must restore pacing");

        surface.clear();
        effect.render(&mut surface, &context, &asset("next.jpg"));
        let slides = surface
            .commands()
            .into_iter()
            .filter(|command| match command {
                Command::Animation(_, animations) => {
                    animations[0].effect.kind == crate::animation::EffectKind::Slide
                }
                _ => false,
            })
            .count();
        assert_eq!(slides, 2, "one slide out, one slide in");
    }

    #[test]
    fn redraw_empties_every_panel() {
        let mut surface = RecordingSurface::default();
        let context = context();
        let mut effect = PanelSlide::new(&fast_config(), StdRng::seed_from_u64(2));
        effect.setup(&mut surface, &context);
        for _ in 0..effect.fast_image_count() {
            effect.render(&mut surface, &context, &asset("a.jpg"));
        }

        effect.begin_redraw(&mut surface, &context);
        assert!(effect.states().iter().all(|s| *s == PanelState::Empty));
        assert_eq!(
            effect.redraw(),
            Some(Redraw {
                renders: 6,
                every: 5
            })
        );
    }

    #[test]
    fn all_eight_slide_patterns_occur() {
        let mut effect = PanelSlide::new(&fast_config(), StdRng::seed_from_u64(5));
        let seen: HashSet<_> = (0..500).map(|_| effect.slide_pattern()).collect();
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn slide_offsets() {
        let rect = Rect::new(0, 0, 200, 100);
        let ahead = SlidePattern {
            direction: Direction::Left,
            exit: ExitSide::Ahead,
        };
        assert_eq!(ahead.offsets(&rect), ((-200.0, 0.0), (200.0, 0.0)));

        let behind = SlidePattern {
            direction: Direction::Down,
            exit: ExitSide::Behind,
        };
        assert_eq!(behind.offsets(&rect), ((0.0, -100.0), (0.0, -100.0)));
    }

    #[test]
    fn random_layout_and_decorations() {
        let config = PanelSlideConfig {
            random_layout: true,
            panel_count: 7,
            border: true,
            labels: true,
            ..fast_config()
        };
        let mut surface = RecordingSurface::default();
        let context = context();
        let mut effect = PanelSlide::new(&config, StdRng::seed_from_u64(11));
        effect.setup(&mut surface, &context);

        // two images, frame, border and label per panel
        assert_eq!(effect.slots().len(), 7 * 5);
        assert_eq!(surface.live_slots().len(), 7 * 5);

        effect.teardown(&mut surface);
        assert!(surface.live_slots().is_empty());
    }

    #[test]
    fn labels_strip_numbers_and_separators() {
        let plain = AssetRef::new("/photos/2019_08_beach-day.jpg");
        assert_eq!(label_text(&plain, true), "beach day");

        let dated = plain.clone().with_captured("2019-08-14");
        assert_eq!(label_text(&dated, false), "beach day");
        assert_eq!(label_text(&dated, true), "beach day (2019-08-14)");

        let numbers = AssetRef::new("/photos/0042.jpg").with_captured("2020-01-01");
        assert_eq!(label_text(&numbers, true), "2020-01-01");
    }

    #[test]
    fn label_follows_rendered_asset() {
        let config = PanelSlideConfig {
            labels: true,
            ..fast_config()
        };
        let mut surface = RecordingSurface::default();
        let context = context();
        let mut effect = PanelSlide::new(&config, StdRng::seed_from_u64(4));
        effect.setup(&mut surface, &context);
        effect.render(&mut surface, &context, &asset("/x/IMG_2231_sunset.jpg"));

        let labels: Vec<_> = surface
            .commands()
            .into_iter()
            .filter_map(|command| match command {
                Command::Label(_, text) => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(labels, ["IMG sunset"]);
    }
}
