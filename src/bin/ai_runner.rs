//! Headless AI Runner
//!
//! Drives one computer player through a sandbox skirmish and prints a
//! summary of the orders it gave.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use faction_ai::ai::{AiController, WallClockRandom};
use faction_ai::core::config::AiConfig;
use faction_ai::core::types::Difficulty;
use faction_ai::world::{CommandLog, SandboxWorld, VoteBoard, WorldQuery};
use serde::Serialize;

/// Headless AI Runner - watch the computer player run a skirmish
#[derive(Parser, Debug)]
#[command(name = "ai_runner")]
#[command(about = "Run the computer player in a sandbox skirmish and summarize its orders")]
struct Args {
    /// Simulation ticks to run
    #[arg(long, default_value_t = 4000)]
    ticks: u64,

    /// Random seed for deterministic runs (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Difficulty tier: easy, normal, ultra or mega
    #[arg(long, default_value = "normal", value_parser = parse_difficulty)]
    difficulty: Difficulty,

    /// TOML configuration overriding the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tick at which faction 1 asks to join our team
    #[arg(long)]
    switch_request: Option<u64>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

fn parse_difficulty(value: &str) -> Result<Difficulty, String> {
    match value.to_ascii_lowercase().as_str() {
        "easy" => Ok(Difficulty::Easy),
        "normal" => Ok(Difficulty::Normal),
        "ultra" => Ok(Difficulty::Ultra),
        "mega" => Ok(Difficulty::Mega),
        other => Err(format!("unknown difficulty '{}'", other)),
    }
}

/// JSON output structure
#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    difficulty: Difficulty,
    commands_by_class: BTreeMap<String, usize>,
    rules_executed: BTreeMap<&'static str, usize>,
    refused_commands: usize,
    units_alive: usize,
    min_warriors: i32,
    pending_tasks: usize,
    expansions: usize,
    switch_votes: Vec<bool>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match AiConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config '{}': {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => AiConfig::default(),
    };
    let seed = args.seed.or(config.seed).unwrap_or_else(rand::random);
    config.seed = Some(seed);

    let mut world = SandboxWorld::skirmish(args.difficulty);
    let mut controller = match AiController::new(config, &world) {
        Ok(controller) => controller,
        Err(e) => {
            eprintln!("Failed to start AI: {}", e);
            std::process::exit(2);
        }
    };
    tracing::info!(seed, ticks = args.ticks, rules = ?controller.rule_names(), "Starting run");

    let mut log = CommandLog::new();
    let mut votes = VoteBoard::new();
    let mut vote_random = WallClockRandom;
    let mut commands_by_class: BTreeMap<String, usize> = BTreeMap::new();
    let mut rules_executed: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut refused_commands = 0;

    for tick in 0..args.ticks {
        if args.switch_request == Some(tick) {
            votes.request(1);
        }
        let report = controller.update(&world, &mut log, &mut votes, &mut vote_random);
        for name in report.executed {
            *rules_executed.entry(name).or_insert(0) += 1;
        }
        for request in &log.issued {
            *commands_by_class
                .entry(format!("{:?}", request.command.class))
                .or_insert(0) += 1;
        }
        refused_commands += log.refused.len();
        log.refused.clear();
        world.apply(&mut log);
    }

    let state = controller.state();
    let summary = RunSummary {
        seed,
        ticks: args.ticks,
        difficulty: args.difficulty,
        commands_by_class,
        rules_executed,
        refused_commands,
        units_alive: world.my_units().iter().filter(|u| u.alive).count(),
        min_warriors: state.min_warriors,
        pending_tasks: state.tasks.len(),
        expansions: state.expansions.len(),
        switch_votes: votes.answers.iter().map(|v| v.allow_switch_team).collect(),
    };

    if args.format == "text" {
        println!("=== AI Run ({:?}, seed {}) ===", summary.difficulty, summary.seed);
        println!("Ticks: {}", summary.ticks);
        println!("Units alive: {}", summary.units_alive);
        println!("Min warriors: {}", summary.min_warriors);
        println!("Pending tasks: {}", summary.pending_tasks);
        println!("Expansions: {}", summary.expansions);
        println!("Orders:");
        for (class, count) in &summary.commands_by_class {
            println!("  {:<14} {}", class, count);
        }
        println!("Rules:");
        for (name, count) in &summary.rules_executed {
            println!("  {:<26} {}", name, count);
        }
    } else {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize summary: {}", e);
                std::process::exit(1);
            }
        }
    }
}
