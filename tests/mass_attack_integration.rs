//! Mass attack integration tests
//!
//! Exercise the attack planner against skirmish layouts where workers are
//! under fire, checking who answers, who stays home and who is sent.

use faction_ai::ai::{AiContext, AiState};
use faction_ai::core::config::AiConfig;
use faction_ai::core::types::{
    CommandClass, Difficulty, Field, SkillClass, UnitId, UnitTypeId, Vec2i,
};
use faction_ai::world::sandbox::tech;
use faction_ai::world::{CommandLog, CommandTarget, SandboxWorld, WorldQuery};

fn state(seed: u64) -> AiState {
    let config = AiConfig {
        seed: Some(seed),
        ..AiConfig::default()
    };
    AiState::new(config, 0, 2)
}

fn ids_of(world: &SandboxWorld, unit_type: UnitTypeId) -> Vec<UnitId> {
    world
        .my_units()
        .iter()
        .filter(|u| u.unit_type.id == unit_type)
        .map(|u| u.id)
        .collect()
}

/// Every worker is being hit by its own enemy swordman
fn raided(difficulty: Difficulty) -> SandboxWorld {
    let mut world = SandboxWorld::skirmish(difficulty);
    for (i, worker) in ids_of(&world, tech::WORKER).into_iter().enumerate() {
        let raider = world.spawn(1, tech::SWORDMAN, Vec2i::new(14 + i as i32, 13));
        world.set_attacker(worker, raider);
    }
    world
}

#[test]
fn test_ultra_keeps_three_harvesters_home() {
    let world = raided(Difficulty::Ultra);
    let workers = ids_of(&world, tech::WORKER);
    let swordmen = ids_of(&world, tech::SWORDMAN);
    let mut ai = state(1);
    let mut log = CommandLog::new();
    let report = {
        let mut ctx = AiContext::new(&world, &mut log);
        ai.massive_attack(&mut ctx, Vec2i::new(50, 50), Field::Land, false)
    };

    assert_eq!(report.protected_harvesters, workers[..3].to_vec());
    assert_eq!(report.counter_attacks, workers[3..].to_vec());
    assert_eq!(report.committed, swordmen);

    // raiders are answered where they stand
    for (i, id) in workers[3..].iter().enumerate() {
        let orders = log.commands_for(*id);
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].target, CommandTarget::Position(Vec2i::new(17 + i as i32, 13)));
    }
    let group = report.group.unwrap();
    assert!(log.issued.iter().all(|r| r.group == Some(group)));
    assert_eq!(log.count_of_class(CommandClass::Attack), 5);
}

#[test]
fn test_held_back_harvesters_skip_ultra_attack() {
    let world = raided(Difficulty::Ultra);
    let workers = ids_of(&world, tech::WORKER);
    let swordmen = ids_of(&world, tech::SWORDMAN);
    let mut ai = state(1);
    let mut log = CommandLog::new();
    let report = {
        let mut ctx = AiContext::new(&world, &mut log);
        ai.massive_attack(&mut ctx, Vec2i::new(50, 50), Field::Land, true)
    };

    assert_eq!(report.protected_harvesters, workers[..3].to_vec());
    assert_eq!(report.counter_attacks, workers[3..].to_vec());
    assert_eq!(report.committed, swordmen);
    for id in &workers[..3] {
        assert!(log.commands_for(*id).is_empty());
    }
}

#[test]
fn test_normal_tier_ignores_raiders() {
    let world = raided(Difficulty::Normal);
    let mut ai = state(1);
    let mut log = CommandLog::new();
    let report = {
        let mut ctx = AiContext::new(&world, &mut log);
        ai.massive_attack(&mut ctx, Vec2i::new(50, 50), Field::Land, false)
    };
    assert!(report.counter_attacks.is_empty());
    assert!(report.protected_harvesters.is_empty());
    assert_eq!(report.committed, ids_of(&world, tech::SWORDMAN));
}

#[test]
fn test_mega_withholds_idle_workers_from_ultra_attack() {
    let world = SandboxWorld::skirmish(Difficulty::Mega);
    let mut ai = state(4);
    let mut log = CommandLog::new();
    let report = {
        let mut ctx = AiContext::new(&world, &mut log);
        ai.massive_attack(&mut ctx, Vec2i::new(20, 20), Field::Land, true)
    };
    assert_eq!(report.committed, ids_of(&world, tech::SWORDMAN));
    assert_eq!(report.protected_harvesters.len(), 3);
    assert_eq!(ai.min_warriors, 10);
}

#[test]
fn test_mega_busy_producers_stand_in_for_warriors() {
    let mut world = SandboxWorld::skirmish(Difficulty::Mega);
    let workers = ids_of(&world, tech::WORKER);
    let swordmen = ids_of(&world, tech::SWORDMAN);
    // four builders against a cap of one; the last worker idles
    for id in &workers[..4] {
        if let Some(u) = world.unit_mut(*id) {
            u.current_command = Some(CommandClass::Build);
        }
    }
    let config = AiConfig {
        seed: Some(8),
        max_producer_warriors: 1,
        ..AiConfig::default()
    };
    let mut ai = AiState::new(config, 0, 2);
    let mut log = CommandLog::new();
    let report = {
        let mut ctx = AiContext::new(&world, &mut log);
        ai.massive_attack(&mut ctx, Vec2i::new(20, 20), Field::Land, true)
    };

    // three builders fill the throttle; the fourth stands in for a warrior
    assert_eq!(report.protected_harvesters, workers[..3].to_vec());
    let mut expected = vec![workers[3]];
    expected.extend(swordmen);
    assert_eq!(report.committed, expected);
    assert!(log.commands_for(workers[4]).is_empty());
}

#[test]
fn test_units_already_fighting_are_left_alone() {
    let mut world = SandboxWorld::skirmish(Difficulty::Ultra);
    let swordmen = ids_of(&world, tech::SWORDMAN);
    if let Some(u) = world.unit_mut(swordmen[0]) {
        u.current_skill = SkillClass::Attack;
    }
    let mut ai = state(2);
    let mut log = CommandLog::new();
    let report = {
        let mut ctx = AiContext::new(&world, &mut log);
        ai.massive_attack(&mut ctx, Vec2i::new(50, 50), Field::Land, false)
    };
    assert_eq!(report.committed, swordmen[1..].to_vec());
}

#[test]
fn test_air_target_needs_air_capable_units() {
    let world = SandboxWorld::skirmish(Difficulty::Normal);
    let mut ai = state(6);
    let mut log = CommandLog::new();
    let report = {
        let mut ctx = AiContext::new(&world, &mut log);
        ai.massive_attack(&mut ctx, Vec2i::new(50, 50), Field::Air, true)
    };
    assert!(report.committed.is_empty());
    assert!(report.group.is_none());
    assert!(log.issued.is_empty());
}
