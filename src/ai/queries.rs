//! Read-mostly questions the rules ask about the faction
//!
//! Everything here only reads the world. Methods taking `&mut self` do so
//! for the controller's random source, never to change plans.

use crate::ai::state::AiState;
use crate::core::types::{
    CommandClass, Field, ResourceClass, ResourceTypeId, UnitClass, UnitId, UnitTypeId, Vec2i,
};
use crate::world::{Unit, UnitType, WorldQuery};

/// Extra condition on a unit's current activity when looking for one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Any,
    /// No command queued, or only a stop
    Idle,
    /// Currently executing a command of this class
    Running(CommandClass),
}

impl Availability {
    fn admits(&self, unit: &Unit) -> bool {
        match self {
            Availability::Any => true,
            Availability::Idle => unit.is_idle(),
            Availability::Running(class) => unit.current_command == Some(*class),
        }
    }
}

/// Units able to run `ability` that satisfy `availability`, in faction order
pub fn able_units(world: &dyn WorldQuery, ability: CommandClass, availability: Availability) -> Vec<UnitId> {
    world
        .my_units()
        .iter()
        .filter(|u| u.alive && u.unit_type.has_command_class(ability) && availability.admits(u))
        .map(|u| u.id)
        .collect()
}

impl AiState {
    pub fn count_of_type(&self, world: &dyn WorldQuery, unit_type: UnitTypeId) -> usize {
        world
            .my_units()
            .iter()
            .filter(|u| u.alive && u.unit_type.id == unit_type)
            .count()
    }

    /// Units of `class`, optionally skipping those that also belong to `exclude`
    pub fn count_of_class(
        &self,
        world: &dyn WorldQuery,
        class: UnitClass,
        exclude: Option<UnitClass>,
    ) -> usize {
        world
            .my_units()
            .iter()
            .filter(|u| u.alive && u.unit_type.is_of_class(class))
            .filter(|u| exclude.map_or(true, |ex| !u.unit_type.is_of_class(ex)))
            .count()
    }

    /// Share of the faction's units that belong to `class`
    pub fn ratio_of_class(&self, world: &dyn WorldQuery, class: UnitClass) -> f32 {
        let total = world.my_units().iter().filter(|u| u.alive).count();
        if total == 0 {
            return 0.0;
        }
        self.count_of_class(world, class, None) as f32 / total as f32
    }

    /// Scarcest harvestable resource the unit can gather from a known deposit
    ///
    /// Static and consumable resources are never harvested. Ties go to the
    /// first resource type in tech-tree order.
    pub fn needed_resource(&self, world: &dyn WorldQuery, unit: &Unit) -> Option<ResourceTypeId> {
        let home = world.home_location();
        let mut lowest = i32::MAX;
        let mut needed = None;
        for rt in world.resource_types() {
            if matches!(rt.class, ResourceClass::Static | ResourceClass::Consumable) {
                continue;
            }
            let amount = world.resource_amount(rt.id);
            if amount >= lowest {
                continue;
            }
            if unit.unit_type.first_harvest_command(rt.id).is_some()
                && world.nearest_sighted_resource(rt.id, home).is_some()
            {
                lowest = amount;
                needed = Some(rt.id);
            }
        }
        needed
    }

    /// Position and field of an enemy within `radius` of home
    pub fn being_attacked(&self, world: &dyn WorldQuery, radius: i32) -> Option<(Vec2i, Field)> {
        world
            .first_sighted_enemy(world.home_location(), Some(radius))
            .map(|enemy| (enemy.pos, enemy.field))
    }

    /// More real warriors than the current readiness threshold
    pub fn is_stable_base(&self, world: &dyn WorldQuery) -> bool {
        let warriors = self.count_of_class(world, UnitClass::Warrior, Some(UnitClass::Worker));
        let stable = warriors as i32 > self.min_warriors;
        if stable {
            self.log(4, &format!("Base is stable [minWarriors = {}]", self.min_warriors));
        } else {
            self.log(4, &format!("Base is not stable [minWarriors = {}]", self.min_warriors));
        }
        stable
    }

    /// Random unit able to run `ability`; `idle_only` restricts to idle units
    pub fn find_able_unit(
        &mut self,
        world: &dyn WorldQuery,
        ability: CommandClass,
        idle_only: bool,
    ) -> Option<UnitId> {
        let availability = if idle_only {
            Availability::Idle
        } else {
            Availability::Any
        };
        let candidates = able_units(world, ability, availability);
        self.choose(&candidates)
    }

    /// Random unit able to run `ability` that is busy with `current`
    pub fn find_able_unit_running(
        &mut self,
        world: &dyn WorldQuery,
        ability: CommandClass,
        current: CommandClass,
    ) -> Option<UnitId> {
        let candidates = able_units(world, ability, Availability::Running(current));
        self.choose(&candidates)
    }

    /// First free site for a building near `search_pos`
    ///
    /// Scans squares of growing radius; a site qualifies when the footprint
    /// plus a one-cell margin is empty.
    pub fn find_pos_for_building(
        &self,
        world: &dyn WorldQuery,
        building: &UnitType,
        search_pos: Vec2i,
    ) -> Option<Vec2i> {
        let size = building.size;
        for r in 0..self.config.max_build_radius {
            for i in (search_pos.x - r)..(search_pos.x + r) {
                for j in (search_pos.y - r)..(search_pos.y + r) {
                    let pos = Vec2i::new(i, j);
                    if world.is_free_cells(pos - Vec2i::splat(1), size + 2, Field::Land) {
                        return Some(pos);
                    }
                }
            }
        }
        None
    }

    /// Home, or half of the time one of the recorded expansion sites
    pub fn random_home_position(&mut self, world: &dyn WorldQuery) -> Vec2i {
        if self.expansions.is_empty() || self.rand_range(0, 1) == 0 {
            return world.home_location();
        }
        let idx = self.rand_range(0, self.expansions.len() as i32 - 1) as usize;
        self.expansions.get(idx).unwrap_or_else(|| world.home_location())
    }
}
