// SPDX-License-Identifier: MPL-2.0

//! The render surface seam: slots that show images and run animations.

use std::fmt;

use crate::animation::Animation;

/// Handle of a slot created by [`RenderSurface::add_slots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A sink for render commands.
///
/// Slots are stacked in creation order, later slots in front of earlier ones.
pub trait RenderSurface: Send {
    /// Create `count` hidden slots in front of all existing ones.
    fn add_slots(&mut self, count: usize) -> Vec<SlotId>;

    fn remove_slots(&mut self, slots: &[SlotId]);

    /// Move a slot in front of all others.
    fn restack_to_front(&mut self, slot: SlotId);

    /// Show `content` (a path or URL). An empty string clears the slot.
    fn set_image(&mut self, slot: SlotId, content: &str);

    fn set_position(&mut self, slot: SlotId, x: i32, y: i32);

    fn set_size(&mut self, slot: SlotId, width: i32, height: i32);

    fn set_visible(&mut self, slot: SlotId, visible: bool);

    /// Replace the slot's animations.
    fn set_animation(&mut self, slot: SlotId, animations: &[Animation]);

    /// Show text instead of an image.
    fn set_label(&mut self, slot: SlotId, text: &str);
}

/// Headless surface that logs every command.
#[derive(Debug, Default)]
pub struct TraceSurface {
    next: u32,
    live: usize,
}

impl TraceSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots currently alive.
    pub fn live_slots(&self) -> usize {
        self.live
    }
}

impl RenderSurface for TraceSurface {
    fn add_slots(&mut self, count: usize) -> Vec<SlotId> {
        let slots: Vec<_> = (0..count)
            .map(|_| {
                self.next += 1;
                SlotId(self.next)
            })
            .collect();
        self.live += count;
        tracing::debug!(count, live = self.live, "add slots");
        slots
    }

    fn remove_slots(&mut self, slots: &[SlotId]) {
        self.live = self.live.saturating_sub(slots.len());
        tracing::debug!(count = slots.len(), live = self.live, "remove slots");
    }

    fn restack_to_front(&mut self, slot: SlotId) {
        tracing::trace!(%slot, "restack");
    }

    fn set_image(&mut self, slot: SlotId, content: &str) {
        if content.is_empty() {
            tracing::trace!(%slot, "clear image");
        } else {
            tracing::info!(%slot, content, "show image");
        }
    }

    fn set_position(&mut self, slot: SlotId, x: i32, y: i32) {
        tracing::trace!(%slot, x, y, "position");
    }

    fn set_size(&mut self, slot: SlotId, width: i32, height: i32) {
        tracing::trace!(%slot, width, height, "size");
    }

    fn set_visible(&mut self, slot: SlotId, visible: bool) {
        tracing::trace!(%slot, visible, "visibility");
    }

    fn set_animation(&mut self, slot: SlotId, animations: &[Animation]) {
        for animation in animations {
            tracing::debug!(%slot, "{animation}");
        }
    }

    fn set_label(&mut self, slot: SlotId, text: &str) {
        tracing::debug!(%slot, text, "label");
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_surface_counts_slots() {
        let mut surface = TraceSurface::new();
        let first = surface.add_slots(3);
        let second = surface.add_slots(2);
        assert_eq!(first, [SlotId(1), SlotId(2), SlotId(3)]);
        assert_eq!(second[0], SlotId(4));
        assert_eq!(surface.live_slots(), 5);

        surface.remove_slots(&first);
        assert_eq!(surface.live_slots(), 2);
        assert_eq!(SlotId(4).to_string(), "#4");
    }
}
