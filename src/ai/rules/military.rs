//! Scouting, attacking, regrouping and unjamming

use crate::ai::queries::{able_units, Availability};
use crate::ai::rules::Rule;
use crate::ai::state::AiState;
use crate::ai::unblock::have_blocked_units;
use crate::ai::AiContext;
use crate::core::types::{CommandClass, Field, Vec2i};
use crate::world::WorldQuery;

/// With a stable base, send a unit to look around
pub struct ScoutPatrolRule;

impl Rule for ScoutPatrolRule {
    fn name(&self) -> &'static str {
        "scout-patrol"
    }

    fn test_interval(&self) -> u64 {
        10000
    }

    fn test(&mut self, ai: &AiState, world: &dyn WorldQuery) -> bool {
        ai.is_stable_base(world)
    }

    fn execute(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>) {
        ai.send_scout_patrol(ctx);
    }
}

/// Clear jams around units that cannot move anywhere
pub struct UnblockRule;

impl Rule for UnblockRule {
    fn name(&self) -> &'static str {
        "unblock"
    }

    fn test_interval(&self) -> u64 {
        3000
    }

    fn test(&mut self, _ai: &AiState, world: &dyn WorldQuery) -> bool {
        have_blocked_units(world)
    }

    fn execute(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>) {
        ai.unblock_units(ctx);
    }
}

/// Bring an idle unit back near home
pub struct ReturnBaseRule;

impl Rule for ReturnBaseRule {
    fn name(&self) -> &'static str {
        "return-base"
    }

    fn test_interval(&self) -> u64 {
        5000
    }

    fn test(&mut self, _ai: &AiState, world: &dyn WorldQuery) -> bool {
        !able_units(world, CommandClass::Move, Availability::Idle).is_empty()
    }

    fn execute(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>) {
        if let Some(unit) = ai.find_able_unit(ctx.world, CommandClass::Move, true) {
            ai.return_base(ctx, unit);
        }
    }
}

/// Where the last successful test found an enemy
#[derive(Debug, Clone, Copy)]
struct AttackTarget {
    pos: Vec2i,
    field: Field,
    ultra: bool,
}

/// Attack any sighted enemy when strong, or defend the base when weak
#[derive(Debug, Default)]
pub struct MassiveAttackRule {
    target: Option<AttackTarget>,
}

impl Rule for MassiveAttackRule {
    fn name(&self) -> &'static str {
        "massive-attack"
    }

    fn test_interval(&self) -> u64 {
        1000
    }

    fn test(&mut self, ai: &AiState, world: &dyn WorldQuery) -> bool {
        self.target = if ai.is_stable_base(world) {
            world
                .first_sighted_enemy(world.home_location(), None)
                .map(|enemy| AttackTarget {
                    pos: enemy.pos,
                    field: enemy.field,
                    ultra: false,
                })
        } else {
            ai.being_attacked(world, ai.config.base_radius)
                .map(|(pos, field)| AttackTarget {
                    pos,
                    field,
                    ultra: true,
                })
        };
        self.target.is_some()
    }

    fn execute(&mut self, ai: &mut AiState, ctx: &mut AiContext<'_>) {
        if let Some(target) = self.target.take() {
            ai.massive_attack(ctx, target.pos, target.field, target.ultra);
        }
    }
}
