// SPDX-License-Identifier: MPL-2.0

//! Screen rectangles: uniform grids and random recursive partitions.

use rand::Rng;

/// Splits never cut closer than this to an edge, as a share of the side.
const MIN_SPLIT: f64 = 0.3;
const MAX_SPLIT: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Cut in two along the longer side, `ratio` of it going to the first half.
    ///
    /// Returns `None` if the longer side is a single pixel.
    fn split(&self, ratio: f64) -> Option<(Rect, Rect)> {
        let horizontal = self.width >= self.height;
        let side = if horizontal { self.width } else { self.height };
        if side < 2 {
            return None;
        }

        let cut = ((f64::from(side) * ratio).round() as i32).clamp(1, side - 1);
        Some(if horizontal {
            (
                Rect::new(self.x, self.y, cut, self.height),
                Rect::new(self.x + cut, self.y, self.width - cut, self.height),
            )
        } else {
            (
                Rect::new(self.x, self.y, self.width, cut),
                Rect::new(self.x, self.y + cut, self.width, self.height - cut),
            )
        })
    }
}

/// `rows` × `columns` cells covering `area`, row by row.
///
/// Remainder pixels are spread so the cells tile the area exactly.
pub fn grid(area: Rect, rows: u32, columns: u32) -> Vec<Rect> {
    let (rows, columns) = (rows.max(1) as i64, columns.max(1) as i64);
    let edge = |origin: i32, length: i32, index: i64, count: i64| {
        origin + (i64::from(length) * index / count) as i32
    };

    let mut cells = Vec::with_capacity((rows * columns) as usize);
    for row in 0..rows {
        let top = edge(area.y, area.height, row, rows);
        let bottom = edge(area.y, area.height, row + 1, rows);
        for column in 0..columns {
            let left = edge(area.x, area.width, column, columns);
            let right = edge(area.x, area.width, column + 1, columns);
            cells.push(Rect::new(left, top, right - left, bottom - top));
        }
    }
    cells
}

/// Split `area` into `count` non-overlapping rectangles covering it.
///
/// The largest rectangle is repeatedly cut along its longer side at a random
/// ratio. Fewer rectangles are returned only if every one is down to a
/// single pixel.
pub fn partition(area: Rect, count: usize, rng: &mut impl Rng) -> Vec<Rect> {
    let mut rects = vec![area];

    while rects.len() < count {
        let Some((index, _)) = rects
            .iter()
            .enumerate()
            .filter(|(_, rect)| rect.width > 1 || rect.height > 1)
            .max_by_key(|(_, rect)| rect.area())
        else {
            tracing::warn!(count, got = rects.len(), "area too small to partition further");
            break;
        };

        let ratio = rng.random_range(MIN_SPLIT..=MAX_SPLIT);
        let Some((first, second)) = rects[index].split(ratio) else {
            break;
        };
        rects[index] = first;
        rects.push(second);
    }

    rects
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn assert_tiles(area: Rect, rects: &[Rect]) {
        let total: i64 = rects.iter().map(Rect::area).sum();
        assert_eq!(total, area.area(), "areas must add up");

        for (i, rect) in rects.iter().enumerate() {
            assert!(rect.width > 0 && rect.height > 0, "{rect:?} is empty");
            assert!(area.contains(rect), "{rect:?} escapes {area:?}");
            for other in &rects[i + 1..] {
                assert!(!rect.intersects(other), "{rect:?} overlaps {other:?}");
            }
        }
    }

    #[test]
    fn grid_tiles_exactly() {
        let area = Rect::new(0, 0, 1280, 720);
        let cells = grid(area, 3, 7);
        assert_eq!(cells.len(), 21);
        assert_tiles(area, &cells);
        assert_eq!(cells[0], Rect::new(0, 0, 182, 240));
        assert_eq!(cells[20].right(), 1280);
    }

    #[test]
    fn partition_covers_area() {
        let area = Rect::new(0, 0, 1280, 720);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let count = (seed % 12 + 1) as usize;
            let rects = partition(area, count, &mut rng);
            assert_eq!(rects.len(), count);
            assert_tiles(area, &rects);
        }
    }

    #[test]
    fn partition_with_offset_origin() {
        let area = Rect::new(40, 25, 333, 101);
        let rects = partition(area, 9, &mut StdRng::seed_from_u64(7));
        assert_eq!(rects.len(), 9);
        assert_tiles(area, &rects);
    }

    #[test]
    fn tiny_area_stops_early() {
        let area = Rect::new(0, 0, 2, 1);
        let rects = partition(area, 5, &mut StdRng::seed_from_u64(1));
        assert_eq!(rects.len(), 2);
        assert_tiles(area, &rects);
    }
}
