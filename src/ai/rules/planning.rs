//! Deciding what to produce next
//!
//! Compares unit counts and class ratios against per-tier thresholds and
//! queues at most one task of each kind.

use crate::ai::rules::production::buildable_types;
use crate::ai::rules::Rule;
use crate::ai::state::AiState;
use crate::ai::task::Task;
use crate::ai::AiContext;
use crate::core::types::{Difficulty, UnitClass, UnitTypeId, UpgradeTypeId};
use crate::world::WorldQuery;

/// Faction composition sampled once per execution
#[derive(Debug, Clone, Copy)]
struct Census {
    workers: usize,
    warriors: usize,
    buildings: usize,
    upgrades: usize,
    worker_ratio: f32,
    warrior_ratio: f32,
    building_ratio: f32,
    stable: bool,
}

impl Census {
    fn take(ai: &AiState, world: &dyn WorldQuery) -> Self {
        Self {
            workers: ai.count_of_class(world, UnitClass::Worker, None),
            warriors: ai.count_of_class(world, UnitClass::Warrior, None),
            buildings: ai.count_of_class(world, UnitClass::Building, None),
            upgrades: world
                .upgrade_types()
                .iter()
                .filter(|u| world.is_upgraded(u.id))
                .count(),
            worker_ratio: ai.ratio_of_class(world, UnitClass::Worker),
            warrior_ratio: ai.ratio_of_class(world, UnitClass::Warrior),
            building_ratio: ai.ratio_of_class(world, UnitClass::Building),
            stable: ai.is_stable_base(world),
        }
    }
}

/// Which kinds of task the current composition calls for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Wants {
    worker: bool,
    warrior: bool,
    building: bool,
    upgrade: bool,
}

fn wants(difficulty: Difficulty, census: &Census, min_warriors: i32) -> Wants {
    let c = census;
    if difficulty == Difficulty::Easy {
        return Wants {
            worker: c.workers < 5,
            warrior: c.warriors < 10 || c.workers >= 10,
            building: c.buildings < 6 || c.building_ratio < 0.2 || (c.buildings < 10 && c.stable),
            upgrade: (c.upgrades == 0 && c.workers > 6)
                || (c.upgrades == 1 && c.workers > 7)
                || (c.upgrades == 2 && c.workers > 9),
        };
    }

    let mut wants = Wants {
        worker: c.workers < 10 || c.worker_ratio < 0.3,
        warrior: c.warriors < 10 || c.warrior_ratio < 0.3 || c.workers >= 10,
        building: c.buildings < 6 || c.building_ratio < 0.2 || (c.buildings < 10 && c.workers > 12),
        upgrade: (c.upgrades == 0 && c.workers > 5)
            || (c.upgrades == 1 && c.workers > 10)
            || (c.upgrades == 2 && c.workers > 15)
            || c.stable,
    };
    if difficulty.is_mega() && (c.warriors as i32) < min_warriors + 2 {
        wants.warrior = true;
    }
    wants
}

/// Buildable building type with the fewest standing instances
fn least_built(ai: &AiState, world: &dyn WorldQuery) -> Option<UnitTypeId> {
    buildable_types(world)
        .into_iter()
        .filter(|ut| ut.is_of_class(UnitClass::Building))
        .min_by_key(|ut| ai.count_of_type(world, ut.id))
        .map(|ut| ut.id)
}

/// First upgrade not yet researched that one of our units can research
fn next_upgrade(world: &dyn WorldQuery) -> Option<UpgradeTypeId> {
    world
        .upgrade_types()
        .iter()
        .filter(|u| !world.is_upgraded(u.id))
        .find(|u| {
            world
                .my_units()
                .iter()
                .any(|unit| unit.alive && unit.unit_type.upgrade_command_for(u.id).is_some())
        })
        .map(|u| u.id)
}

/// Keep the task queue stocked
pub struct AddTasksRule;

impl Rule for AddTasksRule {
    fn name(&self) -> &'static str {
        "add-tasks"
    }

    fn test_interval(&self) -> u64 {
        5000
    }

    fn test(&mut self, ai: &AiState, world: &dyn WorldQuery) -> bool {
        ai.tasks.len() < ai.config.max_tasks
            || ai.count_of_class(world, UnitClass::Worker, None) < 4
    }

    fn execute(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>) {
        let world = ctx.world;
        let census = Census::take(ai, world);

        if census.workers < 4 {
            let task = Task::produce_class(UnitClass::Worker);
            if !ai.tasks.contains(&task) {
                ai.add_priority_task(task);
            }
            return;
        }

        let wants = wants(world.difficulty(), &census, ai.min_warriors);
        let mut planned = Vec::new();
        if wants.worker {
            planned.push(Task::produce_class(UnitClass::Worker));
        }
        if wants.warrior {
            planned.push(Task::produce_class(UnitClass::Warrior));
        }
        if wants.building {
            if let Some(building) = least_built(ai, world) {
                planned.push(Task::build_unit(building));
            }
        }
        if wants.upgrade {
            if let Some(upgrade) = next_upgrade(world) {
                planned.push(Task::upgrade(upgrade));
            }
        }
        for task in planned {
            if !ai.tasks.contains(&task) {
                ai.add_task(task);
            }
        }
    }
}
