//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for units, assigned by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a unit type in the tech tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitTypeId(pub u32);

/// Index of a resource type in the tech tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceTypeId(pub u32);

/// Index of an upgrade type in the tech tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UpgradeTypeId(pub u32);

/// Tag linking several issued commands into one coordinated maneuver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandGroupId(pub u32);

/// Faction slot index within a match
pub type FactionIndex = usize;

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// Integer map cell position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vec2i {
    pub x: i32,
    pub y: i32,
}

impl Vec2i {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Same offset on both axes
    pub const fn splat(v: i32) -> Self {
        Self { x: v, y: v }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// The eight surrounding cells, row by row
    pub fn neighbors(&self) -> impl Iterator<Item = Vec2i> + '_ {
        (-1..=1)
            .flat_map(|i| (-1..=1).map(move |j| (i, j)))
            .filter(|&(i, j)| i != 0 || j != 0)
            .map(move |(i, j)| *self + Vec2i::new(i, j))
    }
}

impl fmt::Display for Vec2i {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl std::ops::Add for Vec2i {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2i {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

/// Movement domain a unit or attack occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Land,
    Air,
}

/// Command kinds a unit type can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandClass {
    Stop,
    Move,
    Attack,
    AttackStopped,
    Build,
    Harvest,
    Repair,
    Produce,
    Upgrade,
    Morph,
}

/// Skill kinds; the current skill tells what a unit is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillClass {
    Stop,
    Move,
    Attack,
    Build,
    Harvest,
    Repair,
    BeBuilt,
    Produce,
    Upgrade,
    Morph,
    Die,
}

/// Coarse unit classification used by the production heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitClass {
    Warrior,
    Worker,
    Building,
}

/// Resource behaviour classes from the tech tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceClass {
    /// Harvested from the map (gold, wood, stone)
    Tech,
    /// Provided by buildings while they stand (housing)
    Static,
    /// Produced and consumed over time (food)
    Consumable,
    Effect,
}

/// Computer player difficulty tier
///
/// Higher numeric value = harder tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Difficulty {
    Easy = 1,
    Normal = 2,
    Ultra = 3,
    Mega = 4,
}

impl Difficulty {
    /// Returns true if this tier is at least as hard as the other
    pub fn is_at_least(&self, other: Difficulty) -> bool {
        (*self as u8) >= (other as u8)
    }

    /// Highest tier; enables the hoarding and expansion heuristics
    pub fn is_mega(&self) -> bool {
        matches!(self, Difficulty::Mega)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2i_distance() {
        let a = Vec2i::new(0, 0);
        let b = Vec2i::new(3, 4);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
    }

    #[test]
    fn test_vec2i_neighbors_excludes_center() {
        let center = Vec2i::new(5, 5);
        let cells: Vec<Vec2i> = center.neighbors().collect();
        assert_eq!(cells.len(), 8);
        assert!(!cells.contains(&center));
        assert!(cells.contains(&Vec2i::new(4, 4)));
        assert!(cells.contains(&Vec2i::new(6, 6)));
    }

    #[test]
    fn test_vec2i_ops() {
        assert_eq!(Vec2i::new(1, 2) + Vec2i::new(3, 4), Vec2i::new(4, 6));
        assert_eq!(Vec2i::new(1, 2) - Vec2i::splat(1), Vec2i::new(0, 1));
    }

    #[test]
    fn test_difficulty_ordering() {
        assert!(Difficulty::Mega.is_at_least(Difficulty::Ultra));
        assert!(Difficulty::Ultra.is_at_least(Difficulty::Ultra));
        assert!(!Difficulty::Normal.is_at_least(Difficulty::Ultra));
        assert!(Difficulty::Mega.is_mega());
        assert!(!Difficulty::Easy.is_mega());
    }

    #[test]
    fn test_unit_id_hash() {
        use std::collections::HashMap;
        let mut map: HashMap<UnitId, &str> = HashMap::new();
        map.insert(UnitId(1), "worker");
        assert_eq!(map.get(&UnitId(1)), Some(&"worker"));
    }
}
