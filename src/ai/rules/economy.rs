//! Harvesting rules

use crate::ai::queries::{able_units, Availability};
use crate::ai::rules::Rule;
use crate::ai::state::AiState;
use crate::ai::AiContext;
use crate::core::types::CommandClass;
use crate::world::WorldQuery;

/// Put an idle harvester to work
pub struct WorkerHarvestRule;

impl Rule for WorkerHarvestRule {
    fn name(&self) -> &'static str {
        "worker-harvest"
    }

    fn test_interval(&self) -> u64 {
        2000
    }

    fn test(&mut self, _ai: &AiState, world: &dyn WorldQuery) -> bool {
        !able_units(world, CommandClass::Harvest, Availability::Idle).is_empty()
    }

    fn execute(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>) {
        if let Some(worker) = ai.find_able_unit(ctx.world, CommandClass::Harvest, true) {
            ai.harvest(ctx, worker);
        }
    }
}

/// Re-target a few busy harvesters so the scarcest resource gets workers
pub struct RefreshHarvesterRule;

impl Rule for RefreshHarvesterRule {
    fn name(&self) -> &'static str {
        "refresh-harvester"
    }

    fn test_interval(&self) -> u64 {
        20000
    }

    fn test(&mut self, _ai: &AiState, _world: &dyn WorldQuery) -> bool {
        true
    }

    fn execute(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>) {
        for _ in 0..ai.config.refresh_harvesters {
            let Some(worker) =
                ai.find_able_unit_running(ctx.world, CommandClass::Harvest, CommandClass::Harvest)
            else {
                break;
            };
            ai.harvest(ctx, worker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AiConfig;
    use crate::core::types::Difficulty;
    use crate::world::sandbox::{CommandLog, SandboxWorld};

    #[test]
    fn test_idle_worker_gets_harvest_order() {
        let world = SandboxWorld::skirmish(Difficulty::Normal);
        let mut ai = AiState::new(AiConfig::default(), 0, 2);
        let mut rule = WorkerHarvestRule;
        assert!(rule.test(&ai, &world));

        let mut log = CommandLog::new();
        let mut ctx = AiContext::new(&world, &mut log);
        rule.execute(&mut ai, &mut ctx);
        assert_eq!(log.count_of_class(CommandClass::Harvest), 1);
    }

    #[test]
    fn test_busy_workers_not_idle() {
        let mut world = SandboxWorld::skirmish(Difficulty::Normal);
        let ids: Vec<_> = world.my_units().iter().map(|u| u.id).collect();
        for id in ids {
            if let Some(u) = world.unit_mut(id) {
                u.current_command = Some(CommandClass::Harvest);
            }
        }
        let ai = AiState::new(AiConfig::default(), 0, 2);
        assert!(!WorkerHarvestRule.test(&ai, &world));
    }

    #[test]
    fn test_refresh_reassigns_up_to_limit() {
        let mut world = SandboxWorld::skirmish(Difficulty::Normal);
        let ids: Vec<_> = world.my_units().iter().map(|u| u.id).collect();
        for id in ids {
            if let Some(u) = world.unit_mut(id) {
                u.current_command = Some(CommandClass::Harvest);
            }
        }
        let mut ai = AiState::new(AiConfig::default(), 0, 2);
        let mut log = CommandLog::new();
        let mut ctx = AiContext::new(&world, &mut log);
        RefreshHarvesterRule.execute(&mut ai, &mut ctx);
        assert_eq!(log.count_of_class(CommandClass::Harvest), 2);
    }
}
