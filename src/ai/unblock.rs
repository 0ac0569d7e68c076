//! Movement deadlock detection and recovery
//!
//! A unit whose path is flagged blocked is often hemmed in by its own
//! side rather than by terrain. Recovery finds every friendly mobile unit
//! packed around it and nudges them away, outermost first, so space opens
//! from the edge of the crowd inwards.

use std::collections::BTreeMap;

use ahash::AHashSet;
use ordered_float::OrderedFloat;

use crate::ai::state::AiState;
use crate::ai::AiContext;
use crate::core::types::{CommandClass, CommandGroupId, UnitId, Vec2i};
use crate::world::{CommandRequest, CommandTarget, Unit, WorldQuery};

/// Units implicated in a jam, keyed by distance from the blocked unit
/// that discovered them and then by identity
///
/// Scratch state for a single recovery pass. A unit appears at most once
/// across all distances.
#[derive(Debug, Default)]
pub struct AdjacencyMap<'w> {
    by_distance: BTreeMap<OrderedFloat<f32>, BTreeMap<UnitId, &'w Unit>>,
    recorded: AHashSet<UnitId>,
}

impl<'w> AdjacencyMap<'w> {
    pub fn new() -> Self {
        Self {
            by_distance: BTreeMap::new(),
            recorded: AHashSet::new(),
        }
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.recorded.contains(&id)
    }

    fn insert(&mut self, distance: f32, unit: &'w Unit) -> bool {
        if !self.recorded.insert(unit.id) {
            return false;
        }
        self.by_distance
            .entry(OrderedFloat(distance))
            .or_default()
            .insert(unit.id, unit);
        true
    }

    pub fn len(&self) -> usize {
        self.recorded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }

    /// Distance buckets from the farthest inwards; identities ascend inside
    /// a bucket
    pub fn farthest_first(&self) -> impl Iterator<Item = (f32, &'w Unit)> + '_ {
        self.by_distance
            .iter()
            .rev()
            .flat_map(|(dist, units)| units.values().map(move |u| (dist.0, *u)))
    }

    pub fn distance_of(&self, id: UnitId) -> Option<f32> {
        self.by_distance
            .iter()
            .find(|(_, units)| units.contains_key(&id))
            .map(|(dist, _)| dist.0)
    }
}

/// Outcome of one recovery pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnblockReport {
    /// Units found packed around blocked units
    pub implicated: usize,
    /// Units that were given a move order
    pub moved: Vec<UnitId>,
    pub group: Option<CommandGroupId>,
}

/// Valid cells around `pos`, excluding `pos` itself
fn surrounding_cells<'a>(world: &'a dyn WorldQuery, pos: Vec2i) -> impl Iterator<Item = Vec2i> + 'a {
    (-1..=1)
        .flat_map(|i| (-1..=1).map(move |j| Vec2i::new(i, j)))
        .filter(|d| *d != Vec2i::default())
        .map(move |d| pos + d)
        .filter(move |p| world.is_valid_cell(*p))
}

/// Living mobile unit whose pathfinder reports a blockage
fn has_blocked_path(unit: &Unit) -> bool {
    unit.alive && unit.unit_type.is_mobile() && unit.is_path_blocked()
}

/// Neighbour cells the unit cannot step into, and how many were tried
fn neighbour_failures(world: &dyn WorldQuery, unit: &Unit) -> (usize, usize) {
    let mut failures = 0;
    let mut cells = 0;
    for pos in surrounding_cells(world, unit.pos) {
        if !world.can_move(unit, unit.pos, pos) {
            failures += 1;
        }
        cells += 1;
    }
    (failures, cells)
}

/// Every surrounding cell rejects the unit
pub fn is_immediately_blocked(world: &dyn WorldQuery, unit: &Unit) -> bool {
    let (failures, cells) = neighbour_failures(world, unit);
    failures == cells
}

/// At least one friendly unit is blocked and cannot step anywhere
pub fn have_blocked_units(world: &dyn WorldQuery) -> bool {
    world
        .my_units()
        .iter()
        .filter(|u| has_blocked_path(u))
        .any(|u| is_immediately_blocked(world, u))
}

/// Flood-fill the friendly mobile units touching `origin`, transitively
///
/// Only units of the origin's faction and field are followed. Distances
/// are measured from the origin, which is never recorded itself. Returns
/// true when anything new was recorded.
pub fn adjacent_units<'w>(
    world: &'w dyn WorldQuery,
    origin: &'w Unit,
    into: &mut AdjacencyMap<'w>,
) -> bool {
    let mut visited: AHashSet<UnitId> = AHashSet::new();
    visited.insert(origin.id);
    let mut worklist: Vec<&'w Unit> = vec![origin];
    let mut found = false;

    while let Some(current) = worklist.pop() {
        for pos in surrounding_cells(world, current.pos) {
            let Some(neighbour) = world.unit_at(pos, origin.field) else {
                continue;
            };
            if neighbour.faction != origin.faction
                || !neighbour.unit_type.is_mobile()
                || !visited.insert(neighbour.id)
                || into.contains(neighbour.id)
            {
                continue;
            }
            let distance = origin.pos.distance(&neighbour.pos);
            if into.insert(distance, neighbour) {
                found = true;
                worklist.push(neighbour);
            }
        }
    }
    found
}

impl AiState {
    /// Move the units crowding blocked units out of the way
    ///
    /// Each implicated unit gets up to `village_radius` random tries within
    /// twice that radius; the first feasible spot is ordered. Units with no
    /// feasible spot stay put until the next pass. All orders share one
    /// command group.
    pub fn unblock_units(&mut self, ctx: &mut AiContext<'_>) -> UnblockReport {
        let world = ctx.world;
        let mut jam = AdjacencyMap::new();

        for unit in world.my_units().iter().filter(|u| has_blocked_path(u)) {
            let (failures, _) = neighbour_failures(world, unit);
            if failures > 0 {
                adjacent_units(world, unit, &mut jam);
            }
        }

        let mut report = UnblockReport {
            implicated: jam.len(),
            ..UnblockReport::default()
        };
        if jam.is_empty() {
            return report;
        }

        let radius = self.config.village_radius;
        for (_, unit) in jam.farthest_first() {
            let Some(command) = unit.unit_type.first_command_of_class(CommandClass::Move) else {
                continue;
            };
            for _ in 0..radius {
                let target = unit.pos + self.jitter(radius * 2);
                if !world.can_move(unit, unit.pos, target) {
                    continue;
                }
                let group = *report
                    .group
                    .get_or_insert_with(|| ctx.commands.next_command_group_id());
                ctx.commands.issue(
                    CommandRequest::new(unit.id, command, CommandTarget::Position(target))
                        .in_group(Some(group)),
                );
                report.moved.push(unit.id);
                break;
            }
        }

        self.log(
            3,
            &format!(
                "Unblocking: {} units implicated, {} moved",
                report.implicated,
                report.moved.len()
            ),
        );
        report
    }
}
