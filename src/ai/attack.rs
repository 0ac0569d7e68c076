//! Mass attack planning
//!
//! Decides, unit by unit, who joins an attack on a target position. Units
//! already under fire answer their attacker first, harvesters are partly
//! held back to keep the economy running, and the hardest tier also sends
//! spare workers once enough of the base is busy producing.

use crate::ai::state::AiState;
use crate::ai::AiContext;
use crate::core::types::{
    CommandClass, CommandGroupId, Difficulty, Field, SkillClass, UnitId, Vec2i,
};
use crate::world::{CommandRequest, CommandTarget, CommandType, Unit};

/// What one mass attack invocation ordered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackReport {
    /// Units redirected against their own attacker
    pub counter_attacks: Vec<UnitId>,
    /// Units sent to the requested target
    pub committed: Vec<UnitId>,
    /// Harvesters kept out of combat by the throttle
    pub protected_harvesters: Vec<UnitId>,
    pub group: Option<CommandGroupId>,
}

/// Per-invocation bookkeeping
struct AttackPass {
    report: AttackReport,
    producer_cap: i32,
    producers_seen: i32,
    protected: u32,
    min_protected: u32,
}

impl AttackPass {
    /// Harvesters only fight once enough of them have been kept back
    fn harvester_may_fight(&mut self, unit: &Unit) -> bool {
        if !unit.unit_type.has_skill_class(SkillClass::Harvest) {
            return true;
        }
        if self.protected >= self.min_protected {
            return true;
        }
        self.protected += 1;
        if !self.report.protected_harvesters.contains(&unit.id) {
            self.report.protected_harvesters.push(unit.id);
        }
        false
    }

    fn issue(
        &mut self,
        ctx: &mut AiContext<'_>,
        unit: UnitId,
        command: &CommandType,
        pos: Vec2i,
    ) {
        let group = *self
            .report
            .group
            .get_or_insert_with(|| ctx.commands.next_command_group_id());
        ctx.commands.issue(
            CommandRequest::new(unit, command, CommandTarget::Position(pos))
                .in_group(Some(group)),
        );
    }
}

/// How a unit is classified for this attack
#[derive(Debug, Clone, Copy, Default)]
struct Role {
    is_warrior: bool,
    production_in_progress: bool,
}

impl AiState {
    /// Order an attack on `pos` in `field`
    ///
    /// `ultra_attack` lets non-warriors join too. Afterwards the warrior
    /// threshold for a stable base is raised according to the tier.
    pub fn massive_attack(
        &mut self,
        ctx: &mut AiContext<'_>,
        pos: Vec2i,
        field: Field,
        ultra_attack: bool,
    ) -> AttackReport {
        let world = ctx.world;
        let difficulty = world.difficulty();
        let mut pass = AttackPass {
            report: AttackReport::default(),
            producer_cap: self.rand_range(1, self.config.max_producer_warriors),
            producers_seen: 0,
            protected: 0,
            min_protected: self.config.min_worker_attackers_harvesting,
        };

        for unit in world.my_units().iter().filter(|u| u.alive) {
            let role = classify(unit, difficulty, &mut pass);
            let already_attacking = unit.current_skill == SkillClass::Attack;
            let mut signalled = false;

            if !already_attacking
                && unit.unit_type.has_skill_class(SkillClass::Attack)
                && difficulty.is_at_least(Difficulty::Ultra)
            {
                if let Some(enemy) = world.attacker_of(unit) {
                    let response = unit
                        .unit_type
                        .first_attack_command(enemy.field)
                        .map(|c| (c, enemy.pos))
                        .or_else(|| {
                            unit.unit_type
                                .first_attack_stopped_command(enemy.field)
                                .map(|c| (c, enemy.centered_pos()))
                        });
                    if let Some((command, target)) = response {
                        // A harvester held back here stays out of the main attack too
                        if !pass.harvester_may_fight(unit) {
                            continue;
                        }
                        pass.issue(ctx, unit.id, command, target);
                        pass.report.counter_attacks.push(unit.id);
                        signalled = true;
                    }
                }
            }

            let Some(command) = unit.unit_type.first_attack_command(field) else {
                continue;
            };
            if already_attacking || signalled || !(ultra_attack || role.is_warrior) {
                continue;
            }
            let mut should_attack = pass.harvester_may_fight(unit);
            // The hardest tier keeps non-warriors home unless they stand in
            // for busy producers
            if difficulty.is_mega() && !role.is_warrior && !role.production_in_progress {
                should_attack = false;
            }
            if should_attack {
                pass.issue(ctx, unit.id, command, pos);
                pass.report.committed.push(unit.id);
            }
        }

        self.raise_min_warriors(difficulty);
        self.log(2, &format!("Massive attack to pos: {}", pos));
        pass.report
    }

    /// Tier-specific drift of the stable-base threshold
    pub fn raise_min_warriors(&mut self, difficulty: Difficulty) {
        let max = self.config.max_min_warriors;
        match difficulty {
            Difficulty::Easy => self.min_warriors += 1,
            Difficulty::Mega => {
                self.min_warriors += 3;
                if self.min_warriors > max - 1 || self.random_min_warriors_reached {
                    self.random_min_warriors_reached = true;
                    let band = self.config.min_warriors_random_band;
                    self.min_warriors = self.rand_range(max - band, max * 2);
                }
            }
            Difficulty::Normal | Difficulty::Ultra => {
                if self.min_warriors < max {
                    self.min_warriors += 3;
                }
            }
        }
    }
}

fn classify(unit: &Unit, difficulty: Difficulty, pass: &mut AttackPass) -> Role {
    let ut = &unit.unit_type;
    let default_warrior =
        !ut.has_command_class(CommandClass::Harvest) && !ut.has_command_class(CommandClass::Produce);
    if !difficulty.is_mega() {
        return Role {
            is_warrior: default_warrior,
            production_in_progress: false,
        };
    }

    if unit.is_producing() {
        pass.producers_seen += 1;
    }
    if pass.producers_seen <= pass.producer_cap {
        return Role {
            is_warrior: default_warrior,
            production_in_progress: false,
        };
    }
    if unit.is_producing() {
        Role {
            is_warrior: false,
            production_in_progress: true,
        }
    } else {
        Role {
            is_warrior: !ut.has_command_class(CommandClass::Harvest),
            production_in_progress: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AiConfig;
    use crate::world::sandbox::{tech, CommandLog, SandboxWorld};
    use crate::world::WorldQuery;

    fn state(seed: u64) -> AiState {
        let config = AiConfig {
            seed: Some(seed),
            ..AiConfig::default()
        };
        AiState::new(config, 0, 2)
    }

    fn attack(world: &SandboxWorld, ai: &mut AiState, ultra: bool) -> (AttackReport, CommandLog) {
        let mut log = CommandLog::new();
        let report = {
            let mut ctx = AiContext::new(world, &mut log);
            ai.massive_attack(&mut ctx, Vec2i::new(50, 50), Field::Land, ultra)
        };
        (report, log)
    }

    #[test]
    fn test_normal_attack_sends_only_warriors() {
        let world = SandboxWorld::skirmish(Difficulty::Normal);
        let mut ai = state(1);
        let (report, log) = attack(&world, &mut ai, false);

        assert_eq!(report.committed.len(), 3);
        for id in &report.committed {
            assert_eq!(world.unit(*id).unwrap().unit_type.id, tech::SWORDMAN);
        }
        let group = report.group.unwrap();
        assert!(log.issued.iter().all(|r| r.group == Some(group)));
        assert_eq!(ai.min_warriors, 10);
    }

    #[test]
    fn test_ultra_attack_throttles_workers() {
        let world = SandboxWorld::skirmish(Difficulty::Normal);
        let mut ai = state(1);
        let (report, _) = attack(&world, &mut ai, true);

        // 5 workers: 3 held back, 2 join the 3 swordmen
        assert_eq!(report.protected_harvesters.len(), 3);
        assert_eq!(report.committed.len(), 5);
    }

    #[test]
    fn test_units_already_fighting_are_left_alone() {
        let mut world = SandboxWorld::skirmish(Difficulty::Normal);
        let busy = world
            .my_units()
            .iter()
            .find(|u| u.unit_type.id == tech::SWORDMAN)
            .map(|u| u.id)
            .unwrap();
        if let Some(u) = world.unit_mut(busy) {
            u.current_skill = SkillClass::Attack;
        }
        let mut ai = state(1);
        let (report, log) = attack(&world, &mut ai, false);
        assert_eq!(report.committed.len(), 2);
        assert!(log.commands_for(busy).is_empty());
    }

    #[test]
    fn test_no_attackers_no_group() {
        let mut world = SandboxWorld::new(16, 16);
        crate::world::sandbox::install_standard_tech_tree(&mut world);
        world.spawn(0, tech::CASTLE, Vec2i::new(2, 2));
        let mut ai = state(1);
        let (report, log) = attack(&world, &mut ai, true);
        assert!(report.group.is_none());
        assert!(log.issued.is_empty());
    }

    #[test]
    fn test_self_defense_only_on_hard_tiers() {
        for (difficulty, expect_counter) in [(Difficulty::Normal, false), (Difficulty::Ultra, true)] {
            let mut world = SandboxWorld::skirmish(difficulty);
            let enemy = world.spawn(1, tech::SWORDMAN, Vec2i::new(20, 17));
            let victim = world
                .my_units()
                .iter()
                .find(|u| u.unit_type.id == tech::SWORDMAN)
                .map(|u| u.id)
                .unwrap();
            world.set_attacker(victim, enemy);
            let mut ai = state(2);
            let (report, log) = attack(&world, &mut ai, false);

            assert_eq!(report.counter_attacks.contains(&victim), expect_counter);
            let orders = log.commands_for(victim);
            assert_eq!(orders.len(), 1);
            let expected = if expect_counter { Vec2i::new(20, 17) } else { Vec2i::new(50, 50) };
            assert_eq!(orders[0].target, CommandTarget::Position(expected));
        }
    }

    #[test]
    fn test_min_warriors_drift_by_tier() {
        let mut easy = state(1);
        easy.raise_min_warriors(Difficulty::Easy);
        assert_eq!(easy.min_warriors, 8);

        let mut normal = state(1);
        for _ in 0..10 {
            normal.raise_min_warriors(Difficulty::Normal);
        }
        // 7 -> 10 -> 13 -> 16 -> 19 -> 22, then holds
        assert_eq!(normal.min_warriors, 22);
        assert!(!normal.random_min_warriors_reached);
    }

    #[test]
    fn test_mega_threshold_randomizes_and_sticks() {
        let mut mega = state(5);
        mega.raise_min_warriors(Difficulty::Mega);
        assert_eq!(mega.min_warriors, 10);
        mega.raise_min_warriors(Difficulty::Mega);
        mega.raise_min_warriors(Difficulty::Mega);
        assert_eq!(mega.min_warriors, 16);
        // 19 is not above the ceiling minus one yet
        mega.raise_min_warriors(Difficulty::Mega);
        assert_eq!(mega.min_warriors, 19);
        assert!(!mega.random_min_warriors_reached);
        mega.raise_min_warriors(Difficulty::Mega);
        assert!(mega.random_min_warriors_reached);
        assert!((10..=40).contains(&mega.min_warriors));
        for _ in 0..20 {
            mega.raise_min_warriors(Difficulty::Mega);
            assert!((10..=40).contains(&mega.min_warriors));
            assert!(mega.random_min_warriors_reached);
        }
    }
}
