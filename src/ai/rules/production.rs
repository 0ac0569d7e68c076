//! Rules that turn queued tasks and resource shortages into production

use std::sync::Arc;

use crate::ai::rules::{choose_performer, Attempt, Rule};
use crate::ai::state::AiState;
use crate::ai::task::{ProduceTarget, Task};
use crate::ai::AiContext;
use crate::core::types::{CommandClass, ResourceClass, ResourceTypeId, UnitTypeId, UpgradeTypeId};
use crate::world::{CommandRequest, CommandTarget, CommandType, Unit, UnitType, WorldQuery};

const SHORT_INTERVAL_MS: u64 = 5000;
const LONG_INTERVAL_MS: u64 = 60000;

/// Queue emergency production when a resource runs short
///
/// Consumables with a negative balance come first, then static resources
/// below the configured floor. After firing the rule backs off to a long
/// interval.
#[derive(Debug)]
pub struct ProduceResourceProducerRule {
    resource: Option<ResourceTypeId>,
    interval: u64,
}

impl Default for ProduceResourceProducerRule {
    fn default() -> Self {
        Self {
            resource: None,
            interval: SHORT_INTERVAL_MS,
        }
    }
}

impl ProduceResourceProducerRule {
    fn short_resource(ai: &AiState, world: &dyn WorldQuery) -> Option<ResourceTypeId> {
        let types = world.resource_types();
        types
            .iter()
            .find(|rt| rt.class == ResourceClass::Consumable && world.resource_balance(rt.id) < 0)
            .or_else(|| {
                types.iter().find(|rt| {
                    rt.class == ResourceClass::Static
                        && world.resource_amount(rt.id) < ai.config.min_static_resources
                })
            })
            .map(|rt| rt.id)
    }
}

impl Rule for ProduceResourceProducerRule {
    fn name(&self) -> &'static str {
        "produce-resource-producer"
    }

    fn test_interval(&self) -> u64 {
        self.interval
    }

    fn test(&mut self, ai: &AiState, world: &dyn WorldQuery) -> bool {
        self.resource = Self::short_resource(ai, world);
        self.interval = if self.resource.is_some() {
            LONG_INTERVAL_MS
        } else {
            SHORT_INTERVAL_MS
        };
        self.resource.is_some()
    }

    fn execute(&mut self, ai: &mut AiState, _ctx: &mut AiContext<'_>) {
        if let Some(resource) = self.resource.take() {
            ai.add_priority_task(Task::produce_resource(resource));
            ai.add_task(Task::build_resource(resource));
        }
    }
}

/// Make sure at least one building generating a consumable exists
#[derive(Debug, Default)]
pub struct BuildOneFarmRule {
    farm: Option<UnitTypeId>,
}

impl Rule for BuildOneFarmRule {
    fn name(&self) -> &'static str {
        "build-one-farm"
    }

    fn test_interval(&self) -> u64 {
        10000
    }

    fn test(&mut self, ai: &AiState, world: &dyn WorldQuery) -> bool {
        let consumables: Vec<ResourceTypeId> = world
            .resource_types()
            .iter()
            .filter(|rt| rt.class == ResourceClass::Consumable)
            .map(|rt| rt.id)
            .collect();
        self.farm = buildable_types(world)
            .into_iter()
            .filter(|ut| consumables.iter().any(|rt| ut.generates(*rt)))
            .find(|ut| ai.count_of_type(world, ut.id) == 0)
            .map(|ut| ut.id);
        match self.farm {
            Some(farm) => !ai.tasks.contains(&Task::build_unit(farm)),
            None => false,
        }
    }

    fn execute(&mut self, ai: &mut AiState, _ctx: &mut AiContext<'_>) {
        if let Some(farm) = self.farm.take() {
            ai.add_priority_task(Task::build_unit(farm));
        }
    }
}

/// Unit types some unit of the faction can construct, in tech-tree order
pub(crate) fn buildable_types(world: &dyn WorldQuery) -> Vec<&Arc<UnitType>> {
    world
        .unit_types()
        .iter()
        .filter(|ut| {
            world
                .my_units()
                .iter()
                .any(|u| u.alive && u.unit_type.build_command_for(ut.id).is_some())
        })
        .collect()
}

/// Units that can make a unit type accepted by `accept`, with the command
fn producers<'w>(
    world: &'w dyn WorldQuery,
    accept: impl Fn(&UnitType) -> bool,
) -> Vec<(&'w Unit, &'w CommandType)> {
    let mut found = Vec::new();
    for unit in world.my_units().iter().filter(|u| u.alive && u.built) {
        for command in &unit.unit_type.commands {
            if !matches!(command.class, CommandClass::Produce | CommandClass::Morph) {
                continue;
            }
            let produced = command.produces.and_then(|id| world.unit_type(id));
            if produced.is_some_and(|ut| accept(ut.as_ref())) {
                found.push((unit, command));
            }
        }
    }
    found
}

/// Work on the front task when it asks for a unit
pub struct ProduceRule;

impl ProduceRule {
    fn produce(ai: &mut AiState, ctx: &mut AiContext<'_>, target: ProduceTarget) -> Attempt {
        let world = ctx.world;
        let candidates = match target {
            ProduceTarget::Class(class) => producers(world, |ut| ut.is_of_class(class)),
            ProduceTarget::Unit(id) => producers(world, |ut| ut.id == id),
            ProduceTarget::Resource(rt) => producers(world, |ut| {
                ut.first_harvest_command(rt).is_some() || ut.generates(rt)
            }),
        };
        let Some((unit, command)) = choose_performer(ai, &candidates) else {
            return Attempt::Impossible;
        };
        let result = ctx
            .commands
            .issue(CommandRequest::new(unit.id, command, CommandTarget::None));
        if result.is_ok() {
            Attempt::Done
        } else {
            Attempt::Retry
        }
    }
}

impl Rule for ProduceRule {
    fn name(&self) -> &'static str {
        "produce"
    }

    fn test_interval(&self) -> u64 {
        2000
    }

    fn test(&mut self, ai: &AiState, _world: &dyn WorldQuery) -> bool {
        matches!(ai.tasks.get_task(), Some((_, Task::Produce(_))))
    }

    fn execute(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>) {
        let Some((id, Task::Produce(target))) = ai.tasks.get_task() else {
            return;
        };
        match Self::produce(ai, ctx, target) {
            Attempt::Done | Attempt::Impossible => ai.remove_task(id),
            Attempt::Retry => ai.retry_task(id),
        }
    }
}

/// Work on the front task when it asks for research
pub struct UpgradeRule;

impl UpgradeRule {
    fn upgrade(ai: &mut AiState, ctx: &mut AiContext<'_>, upgrade: UpgradeTypeId) -> Attempt {
        let world = ctx.world;
        if world.is_upgraded(upgrade) {
            return Attempt::Done;
        }
        let candidates: Vec<(&Unit, &CommandType)> = world
            .my_units()
            .iter()
            .filter(|u| u.alive && u.built)
            .filter_map(|u| u.unit_type.upgrade_command_for(upgrade).map(|c| (u, c)))
            .collect();
        let Some((unit, command)) = choose_performer(ai, &candidates) else {
            return Attempt::Retry;
        };
        let result = ctx
            .commands
            .issue(CommandRequest::new(unit.id, command, CommandTarget::None));
        if result.is_ok() {
            Attempt::Done
        } else {
            Attempt::Retry
        }
    }
}

impl Rule for UpgradeRule {
    fn name(&self) -> &'static str {
        "upgrade"
    }

    fn test_interval(&self) -> u64 {
        30000
    }

    fn test(&mut self, ai: &AiState, _world: &dyn WorldQuery) -> bool {
        matches!(ai.tasks.get_task(), Some((_, Task::Upgrade(_))))
    }

    fn execute(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>) {
        let Some((id, Task::Upgrade(upgrade))) = ai.tasks.get_task() else {
            return;
        };
        match Self::upgrade(ai, ctx, upgrade) {
            Attempt::Done | Attempt::Impossible => ai.remove_task(id),
            Attempt::Retry => ai.retry_task(id),
        }
    }
}
