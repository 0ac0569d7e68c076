//! Building, expanding and repairing

use std::sync::Arc;

use crate::ai::queries::{able_units, Availability};
use crate::ai::rules::production::buildable_types;
use crate::ai::rules::{choose_performer, Attempt, Rule};
use crate::ai::state::AiState;
use crate::ai::task::{BuildTarget, Task};
use crate::ai::AiContext;
use crate::core::types::{CommandClass, ResourceClass, UnitClass, UnitId, UnitTypeId, Vec2i};
use crate::world::{CommandRequest, CommandTarget, CommandType, Unit, UnitType, WorldQuery};

/// Work on the front task when it asks for a building
pub struct BuildRule;

impl BuildRule {
    /// Building types that satisfy the target and someone can build
    fn candidate_types<'w>(world: &'w dyn WorldQuery, target: BuildTarget) -> Vec<&'w Arc<UnitType>> {
        buildable_types(world)
            .into_iter()
            .filter(|ut| match target {
                BuildTarget::Unit(id) => ut.id == id,
                BuildTarget::Resource(rt) => ut.generates(rt) || ut.store(rt) > 0,
            })
            .collect()
    }

    fn build(
        ai: &mut AiState,
        ctx: &mut AiContext<'_>,
        target: BuildTarget,
        forced_pos: Option<Vec2i>,
    ) -> Attempt {
        let world = ctx.world;
        let types = Self::candidate_types(world, target);
        let Some(building) = ai.choose(&types) else {
            return Attempt::Impossible;
        };
        let builders: Vec<(&Unit, &CommandType)> = world
            .my_units()
            .iter()
            .filter(|u| u.alive)
            .filter_map(|u| u.unit_type.build_command_for(building.id).map(|c| (u, c)))
            .collect();
        let Some((builder, command)) = choose_performer(ai, &builders) else {
            return Attempt::Impossible;
        };

        let search_pos = match forced_pos {
            Some(pos) => pos,
            None => ai.random_home_position(world),
        };
        let Some(site) = ai.find_pos_for_building(world, building, search_pos) else {
            ai.log(3, &format!("No site for {} near {}", building.name, search_pos));
            return Attempt::Retry;
        };

        let result = ctx.commands.issue(CommandRequest::new(
            builder.id,
            command,
            CommandTarget::Build {
                unit_type: building.id,
                pos: site,
            },
        ));
        if result.is_ok() {
            ai.log(2, &format!("Building {} at {}", building.name, site));
            Attempt::Done
        } else {
            Attempt::Retry
        }
    }
}

impl Rule for BuildRule {
    fn name(&self) -> &'static str {
        "build"
    }

    fn test_interval(&self) -> u64 {
        2000
    }

    fn test(&mut self, ai: &AiState, _world: &dyn WorldQuery) -> bool {
        matches!(ai.tasks.get_task(), Some((_, Task::Build { .. })))
    }

    fn execute(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>) {
        let Some((id, Task::Build { target, forced_pos })) = ai.tasks.get_task() else {
            return;
        };
        match Self::build(ai, ctx, target, forced_pos) {
            Attempt::Done | Attempt::Impossible => ai.remove_task(id),
            Attempt::Retry => ai.retry_task(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpandPlan {
    /// Put a store of this type next to the deposit
    Store { store: UnitTypeId, pos: Vec2i },
    /// A used resource has never been seen; go look for it
    Scout,
}

/// Build a store next to far away resources
#[derive(Debug, Default)]
pub struct ExpandRule {
    plan: Option<ExpandPlan>,
}

impl ExpandRule {
    fn plan(ai: &AiState, world: &dyn WorldQuery) -> Option<ExpandPlan> {
        let home = world.home_location();
        let stores: Vec<&Unit> = world
            .my_units()
            .iter()
            .filter(|u| u.alive && u.unit_type.is_of_class(UnitClass::Building))
            .collect();
        let buildable = buildable_types(world);

        for rt in world.resource_types().iter().filter(|rt| rt.class == ResourceClass::Tech) {
            let used = world
                .my_units()
                .iter()
                .any(|u| u.unit_type.first_harvest_command(rt.id).is_some());
            if !used {
                continue;
            }
            let Some(deposit) = world.nearest_sighted_resource(rt.id, home) else {
                return Some(ExpandPlan::Scout);
            };
            let nearest_store = stores
                .iter()
                .filter(|u| u.unit_type.store(rt.id) > 0)
                .map(|u| u.centered_pos().distance(&deposit))
                .fold(f32::INFINITY, f32::min);
            if nearest_store <= ai.config.expand_distance as f32 {
                continue;
            }
            if let Some(store) = buildable.iter().find(|ut| ut.store(rt.id) > 0) {
                return Some(ExpandPlan::Store {
                    store: store.id,
                    pos: deposit,
                });
            }
        }
        None
    }
}

impl Rule for ExpandRule {
    fn name(&self) -> &'static str {
        "expand"
    }

    fn test_interval(&self) -> u64 {
        30000
    }

    fn test(&mut self, ai: &AiState, world: &dyn WorldQuery) -> bool {
        self.plan = Self::plan(ai, world);
        match self.plan {
            Some(ExpandPlan::Store { store, .. }) => !ai.tasks.tasks().any(|task| {
                matches!(task, Task::Build { target: BuildTarget::Unit(id), .. } if *id == store)
            }),
            Some(ExpandPlan::Scout) => true,
            None => false,
        }
    }

    fn execute(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>) {
        match self.plan.take() {
            Some(ExpandPlan::Store { store, pos }) => {
                ai.add_expansion(pos);
                ai.add_priority_task(Task::build_unit_at(store, pos));
            }
            Some(ExpandPlan::Scout) => ai.send_scout_patrol(ctx),
            None => {}
        }
    }
}

/// Send a repairer to a damaged building
#[derive(Debug, Default)]
pub struct RepairRule {
    damaged: Option<UnitId>,
}

impl Rule for RepairRule {
    fn name(&self) -> &'static str {
        "repair"
    }

    fn test_interval(&self) -> u64 {
        10000
    }

    fn test(&mut self, _ai: &AiState, world: &dyn WorldQuery) -> bool {
        self.damaged = world
            .my_units()
            .iter()
            .find(|u| {
                u.alive && u.built && u.unit_type.is_of_class(UnitClass::Building) && u.is_damaged()
            })
            .map(|u| u.id);
        self.damaged.is_some()
            && !able_units(world, CommandClass::Repair, Availability::Idle).is_empty()
    }

    fn execute(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>) {
        let Some(damaged) = self.damaged.take() else {
            return;
        };
        let world = ctx.world;
        let Some(id) = ai.find_able_unit(world, CommandClass::Repair, true) else {
            return;
        };
        let Some(command) = world
            .unit(id)
            .and_then(|u| u.unit_type.first_command_of_class(CommandClass::Repair))
        else {
            return;
        };
        ctx.commands
            .issue(CommandRequest::new(id, command, CommandTarget::Unit(damaged)));
        ai.log(3, &format!("Repairing order issued for unit {}", damaged.0));
    }
}
