//! Interval-gated behaviour rules and the engine that drives them
//!
//! Architecture: trait objects in a fixed, ordered list
//! - [`Rule`] is the interface every behaviour implements
//! - [`RuleEngine`] tests each due rule once per tick, in registration order
//! - Rules share nothing but [`AiState`] and the world

mod construction;
mod economy;
mod military;
mod planning;
mod production;

pub use construction::{BuildRule, ExpandRule, RepairRule};
pub use economy::{RefreshHarvesterRule, WorkerHarvestRule};
pub use military::{MassiveAttackRule, ReturnBaseRule, ScoutPatrolRule, UnblockRule};
pub use planning::AddTasksRule;
pub use production::{BuildOneFarmRule, ProduceResourceProducerRule, ProduceRule, UpgradeRule};

use crate::ai::state::AiState;
use crate::ai::AiContext;
use crate::core::config::AiConfig;
use crate::core::error::{AiError, Result};
use crate::core::types::Tick;
use crate::world::{CommandType, Unit, WorldQuery};

/// One self-contained behaviour
pub trait Rule {
    fn name(&self) -> &'static str;

    /// Milliseconds between tests; asked again every tick
    fn test_interval(&self) -> u64;

    /// Whether the rule should fire now
    ///
    /// Must not change controller state or issue commands. Rules may cache
    /// what they found for the following `execute`.
    fn test(&mut self, ai: &AiState, world: &dyn WorldQuery) -> bool;

    /// Act on the world; always completes within the tick
    fn execute(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>);
}

/// Construct a rule from its configuration name
pub fn rule_by_name(name: &str) -> Result<Box<dyn Rule>> {
    let rule: Box<dyn Rule> = match name {
        "worker-harvest" => Box::new(WorkerHarvestRule),
        "refresh-harvester" => Box::new(RefreshHarvesterRule),
        "scout-patrol" => Box::new(ScoutPatrolRule),
        "unblock" => Box::new(UnblockRule),
        "return-base" => Box::new(ReturnBaseRule),
        "massive-attack" => Box::new(MassiveAttackRule::default()),
        "add-tasks" => Box::new(AddTasksRule),
        "produce-resource-producer" => Box::new(ProduceResourceProducerRule::default()),
        "build-one-farm" => Box::new(BuildOneFarmRule::default()),
        "produce" => Box::new(ProduceRule),
        "build" => Box::new(BuildRule),
        "upgrade" => Box::new(UpgradeRule),
        "expand" => Box::new(ExpandRule::default()),
        "repair" => Box::new(RepairRule::default()),
        other => return Err(AiError::UnknownRule(other.to_string())),
    };
    Ok(rule)
}

/// A rule is tested on ticks that are multiples of its interval in ticks
pub fn is_due(config: &AiConfig, tick: Tick, interval_ms: u64) -> bool {
    tick % config.ticks_per_test(interval_ms) == 0
}

/// Ordered rule list; the order is the priority
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Result<Self> {
        if rules.is_empty() {
            return Err(AiError::EmptyRuleList);
        }
        Ok(Self { rules })
    }

    /// Build the configured rule list; unknown names are fatal
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let rules = names
            .iter()
            .map(|name| rule_by_name(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(rules)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Test every due rule and execute those that pass
    ///
    /// Returns the names of executed rules in order.
    pub fn update(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>) -> Vec<&'static str> {
        let tick = ctx.world.tick();
        let mut executed = Vec::new();
        for rule in self.rules.iter_mut() {
            if !is_due(&ai.config, tick, rule.test_interval()) {
                continue;
            }
            if !rule.test(ai, ctx.world) {
                continue;
            }
            let ms = 1000 * tick / ai.config.update_fps as u64;
            ai.log(3, &format!("{}: Executing rule: {}", ms, rule.name()));
            rule.execute(ai, ctx);
            executed.push(rule.name());
        }
        executed
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Pick one candidate, preferring units with nothing to do
pub(crate) fn choose_performer<'w>(
    ai: &mut AiState,
    candidates: &[(&'w Unit, &'w CommandType)],
) -> Option<(&'w Unit, &'w CommandType)> {
    let idle: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, (unit, _))| unit.is_idle())
        .map(|(i, _)| i)
        .collect();
    let pool: Vec<usize> = if idle.is_empty() {
        (0..candidates.len()).collect()
    } else {
        idle
    };
    let idx = ai.choose(&pool)?;
    candidates.get(idx).copied()
}

/// Result of working on the front task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Attempt {
    Done,
    /// Nothing can ever satisfy the task
    Impossible,
    /// Preconditions unmet for now
    Retry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_RULES;
    use crate::core::types::Difficulty;
    use crate::world::sandbox::{CommandLog, SandboxWorld};
    use proptest::prelude::*;

    struct Probe {
        interval: u64,
        fire: bool,
    }

    impl Rule for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }

        fn test_interval(&self) -> u64 {
            self.interval
        }

        fn test(&mut self, _ai: &AiState, _world: &dyn WorldQuery) -> bool {
            self.fire
        }

        fn execute(&mut self, ai: &mut AiState, _ctx: &mut AiContext<'_>) {
            ai.min_warriors += 1;
        }
    }

    /// Appends a marker task so later rules can see it
    struct Marker;

    impl Rule for Marker {
        fn name(&self) -> &'static str {
            "marker"
        }

        fn test_interval(&self) -> u64 {
            25
        }

        fn test(&mut self, _ai: &AiState, _world: &dyn WorldQuery) -> bool {
            true
        }

        fn execute(&mut self, ai: &mut AiState, _ctx: &mut AiContext<'_>) {
            ai.add_task(crate::ai::task::Task::upgrade(crate::core::types::UpgradeTypeId(9)));
        }
    }

    /// Fires only when a task is already queued
    struct Follower;

    impl Rule for Follower {
        fn name(&self) -> &'static str {
            "follower"
        }

        fn test_interval(&self) -> u64 {
            25
        }

        fn test(&mut self, ai: &AiState, _world: &dyn WorldQuery) -> bool {
            ai.tasks.any_task()
        }

        fn execute(&mut self, _ai: &mut AiState, _ctx: &mut AiContext<'_>) {}
    }

    #[test]
    fn test_default_rules_resolve() {
        let engine = RuleEngine::from_names(DEFAULT_RULES).unwrap();
        assert_eq!(engine.len(), 15);
        assert_eq!(engine.names()[5], "massive-attack");
        assert_eq!(engine.names()[14], "repair");
    }

    #[test]
    fn test_unknown_rule_is_fatal() {
        let result = RuleEngine::from_names(&["worker-harvest", "dance"]);
        assert!(matches!(result, Err(AiError::UnknownRule(name)) if name == "dance"));
    }

    #[test]
    fn test_empty_rule_list_is_fatal() {
        let names: [&str; 0] = [];
        assert!(matches!(RuleEngine::from_names(&names), Err(AiError::EmptyRuleList)));
    }

    #[test]
    fn test_earlier_rules_visible_to_later_rules() {
        let mut world = SandboxWorld::skirmish(Difficulty::Normal);
        world.tick = 0;
        let mut ai = AiState::new(AiConfig::default(), 0, 2);
        let mut log = CommandLog::new();

        let mut engine = RuleEngine::new(vec![Box::new(Marker), Box::new(Follower)]).unwrap();
        let executed = {
            let mut ctx = AiContext::new(&world, &mut log);
            engine.update(&mut ai, &mut ctx)
        };
        assert_eq!(executed, vec!["marker", "follower"]);

        let mut reversed = RuleEngine::new(vec![Box::new(Follower), Box::new(Marker)]).unwrap();
        let mut fresh = AiState::new(AiConfig::default(), 0, 2);
        let executed = {
            let mut ctx = AiContext::new(&world, &mut log);
            reversed.update(&mut fresh, &mut ctx)
        };
        assert_eq!(executed, vec!["marker"]);
    }

    #[test]
    fn test_failing_test_skips_execute() {
        let world = SandboxWorld::skirmish(Difficulty::Normal);
        let mut ai = AiState::new(AiConfig::default(), 0, 2);
        let mut log = CommandLog::new();
        let mut engine = RuleEngine::new(vec![Box::new(Probe {
            interval: 1000,
            fire: false,
        })])
        .unwrap();
        let mut ctx = AiContext::new(&world, &mut log);
        assert!(engine.update(&mut ai, &mut ctx).is_empty());
        assert_eq!(ai.min_warriors, 7);
    }

    proptest! {
        #[test]
        fn prop_rule_runs_exactly_on_due_ticks(
            interval in 1u64..70_000,
            fps in 1u32..120,
            start in 0u64..10_000,
        ) {
            let config = AiConfig { update_fps: fps, ..AiConfig::default() };
            let period = ((interval * fps as u64 + 500) / 1000).max(1);
            let mut world = SandboxWorld::new(8, 8);
            let mut ai = AiState::new(config, 0, 2);
            let mut engine = RuleEngine::new(vec![Box::new(Probe { interval, fire: true })]).unwrap();
            let mut log = CommandLog::new();

            for tick in start..start + 200 {
                world.tick = tick;
                let before = ai.min_warriors;
                let mut ctx = AiContext::new(&world, &mut log);
                engine.update(&mut ai, &mut ctx);
                let ran = ai.min_warriors > before;
                prop_assert_eq!(ran, tick % period == 0);
            }
        }
    }
}
