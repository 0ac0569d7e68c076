//! Bounded ring of expansion sites, most recent first

use std::collections::VecDeque;

use crate::core::types::Vec2i;

#[derive(Debug, Clone)]
pub struct ExpansionRing {
    positions: VecDeque<Vec2i>,
    capacity: usize,
    min_spacing: f32,
}

impl ExpansionRing {
    /// `min_spacing` is the village radius; sites closer than it are merged
    pub fn new(capacity: usize, min_spacing: i32) -> Self {
        Self {
            positions: VecDeque::with_capacity(capacity + 1),
            capacity,
            min_spacing: min_spacing as f32,
        }
    }

    /// Record a site; returns false when an existing site is too close
    pub fn add(&mut self, pos: Vec2i) -> bool {
        if self.positions.iter().any(|p| p.distance(&pos) < self.min_spacing) {
            return false;
        }
        self.positions.push_front(pos);
        if self.positions.len() > self.capacity {
            self.positions.pop_back();
        }
        true
    }

    pub fn get(&self, index: usize) -> Option<Vec2i> {
        self.positions.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec2i> + '_ {
        self.positions.iter()
    }
}
