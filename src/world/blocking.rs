//! Terrain-blocked cells for the sandbox map
//!
//! Uses a HashSet-based approach for O(1) lookup of blocked cells.

use ahash::AHashSet;

use crate::core::types::Vec2i;

/// Set of impassable map cells (cliffs, water, trees)
#[derive(Debug, Clone, Default)]
pub struct BlockedCells {
    cells: AHashSet<Vec2i>,
}

impl BlockedCells {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&mut self, pos: Vec2i) {
        self.cells.insert(pos);
    }

    pub fn unblock(&mut self, pos: Vec2i) {
        self.cells.remove(&pos);
    }

    pub fn is_blocked(&self, pos: Vec2i) -> bool {
        self.cells.contains(&pos)
    }

    /// Block every cell of a `width` x `height` rectangle anchored at `origin`
    pub fn block_rect(&mut self, origin: Vec2i, width: i32, height: i32) {
        for dy in 0..height {
            for dx in 0..width {
                self.block(origin + Vec2i::new(dx, dy));
            }
        }
    }

    /// Block the eight cells around a position, leaving the center open
    pub fn block_ring(&mut self, center: Vec2i) {
        let ring: Vec<Vec2i> = center.neighbors().collect();
        for pos in ring {
            self.block(pos);
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
