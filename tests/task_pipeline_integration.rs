//! Task pipeline integration tests
//!
//! Tasks written by one rule and consumed by another, across a controller
//! tick: priority insertion, retry rotation and expansion sites.

use faction_ai::ai::{AiController, FixedRoll, Task};
use faction_ai::core::config::AiConfig;
use faction_ai::core::types::{CommandClass, Difficulty, UnitClass, Vec2i};
use faction_ai::world::sandbox::{install_standard_tech_tree, tech};
use faction_ai::world::{CommandLog, CommandTarget, SandboxWorld, VoteBoard};

fn controller(world: &SandboxWorld, rules: &[&str]) -> AiController {
    let config = AiConfig {
        seed: Some(31),
        rules: rules.iter().map(|r| r.to_string()).collect(),
        ..AiConfig::default()
    };
    AiController::new(config, world).unwrap()
}

#[test]
fn test_unready_upgrade_rotates_behind_production() {
    let world = SandboxWorld::skirmish(Difficulty::Normal);
    let mut ai = controller(&world, &["upgrade", "produce"]);
    ai.state_mut().add_task(Task::upgrade(tech::SHARP_SWORDS));
    ai.state_mut().add_task(Task::produce_class(UnitClass::Worker));

    let mut log = CommandLog::new();
    let report = ai.update(&world, &mut log, &mut VoteBoard::new(), &mut FixedRoll(0));

    assert_eq!(report.executed, vec!["upgrade", "produce"]);
    assert_eq!(log.count_of_class(CommandClass::Produce), 1);
    let left: Vec<Task> = ai.state().tasks.tasks().copied().collect();
    assert_eq!(left, vec![Task::upgrade(tech::SHARP_SWORDS)]);
}

#[test]
fn test_farm_jumps_the_queue() {
    let world = SandboxWorld::skirmish(Difficulty::Normal);
    let mut ai = controller(&world, &["add-tasks", "build-one-farm", "build"]);
    let mut log = CommandLog::new();
    ai.update(&world, &mut log, &mut VoteBoard::new(), &mut FixedRoll(0));

    let built: Vec<_> = log
        .issued
        .iter()
        .filter_map(|r| match r.target {
            CommandTarget::Build { unit_type, .. } => Some(unit_type),
            _ => None,
        })
        .collect();
    assert_eq!(built, vec![tech::FARM]);
    assert!(!ai.state().tasks.contains(&Task::build_unit(tech::FARM)));
    assert_eq!(
        ai.state().tasks.get_task().map(|(_, t)| t),
        Some(Task::produce_class(UnitClass::Worker))
    );
}

#[test]
fn test_expansion_store_built_at_far_deposit() {
    let mut world = SandboxWorld::new(64, 64);
    world.home = Vec2i::new(12, 12);
    install_standard_tech_tree(&mut world);
    world.spawn(0, tech::CASTLE, Vec2i::new(10, 10));
    world.spawn(0, tech::WORKER, Vec2i::new(14, 14));
    world.add_deposit(tech::GOLD, Vec2i::new(52, 12));
    world.add_deposit(tech::WOOD, Vec2i::new(8, 22));

    let mut ai = controller(&world, &["expand", "build"]);
    let mut log = CommandLog::new();
    let report = ai.update(&world, &mut log, &mut VoteBoard::new(), &mut FixedRoll(0));
    assert_eq!(report.executed, vec!["expand", "build"]);
    assert_eq!(ai.state().expansions.get(0), Some(Vec2i::new(52, 12)));

    let site = log.issued.iter().find_map(|r| match r.target {
        CommandTarget::Build { unit_type, pos } if unit_type == tech::CASTLE => Some(pos),
        _ => None,
    });
    let site = site.unwrap();
    assert!(site.distance(&Vec2i::new(52, 12)) < 3.0);
    assert!(ai.state().tasks.is_empty());
}

#[test]
fn test_expansion_ring_rejects_close_sites() {
    let world = SandboxWorld::skirmish(Difficulty::Normal);
    let mut ai = controller(&world, &["return-base"]);
    let state = ai.state_mut();
    assert!(state.add_expansion(Vec2i::new(40, 40)));
    assert!(!state.add_expansion(Vec2i::new(45, 40)));
    assert!(state.add_expansion(Vec2i::new(10, 50)));
    assert!(state.add_expansion(Vec2i::new(60, 5)));
    let sites: Vec<Vec2i> = state.expansions.iter().copied().collect();
    assert_eq!(sites, vec![Vec2i::new(60, 5), Vec2i::new(10, 50)]);
}
