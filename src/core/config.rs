//! Computer player configuration with documented constants
//!
//! All magic numbers of the decision core are collected here. The defaults
//! reproduce the classic tuning; a TOML file can override any subset.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{AiError, Result};

/// Rule registration order used when no list is configured
///
/// Earlier rules run first within a tick, so this list is itself a
/// priority policy.
pub const DEFAULT_RULES: &[&str] = &[
    "worker-harvest",
    "refresh-harvester",
    "scout-patrol",
    "unblock",
    "return-base",
    "massive-attack",
    "add-tasks",
    "produce-resource-producer",
    "build-one-farm",
    "produce",
    "build",
    "upgrade",
    "expand",
    "repair",
    "repair",
];

/// Configuration for one computer-controlled faction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    // === TIMING ===
    /// Simulation ticks per second; converts rule intervals to ticks
    pub update_fps: u32,

    // === TERRITORY ===
    /// Minimum spacing between expansion sites, and the bound on random
    /// repositioning during unblocking (attempts = radius, offsets = 2x)
    pub village_radius: i32,

    /// Capacity of the expansion-site ring
    pub max_expansions: usize,

    /// Square search limit when placing buildings
    pub max_build_radius: i32,

    /// Distance from the nearest store beyond which a resource site
    /// warrants a new store
    pub expand_distance: i32,

    /// Radius around home treated as "the base" when under attack
    pub base_radius: i32,

    // === ATTACK READINESS ===
    /// Initial warrior threshold for a stable base
    pub min_min_warriors: i32,

    /// Ceiling of the warrior threshold
    pub max_min_warriors: i32,

    /// Width below the ceiling where the hardest tier re-randomizes the
    /// threshold; the band is `[max - band, max * 2]`
    pub min_warriors_random_band: i32,

    /// Harvesters protected from combat per mass-attack invocation
    pub min_worker_attackers_harvesting: u32,

    /// Upper bound of the random mid-production cap (drawn from `1..=n`)
    pub max_producer_warriors: i32,

    // === ECONOMY ===
    /// Static resource level below which a producer is requested
    pub min_static_resources: i32,

    /// Consumable level considered low
    pub min_consumable_resources: i32,

    /// Random spread around a resource when sending harvesters
    pub harvest_jitter: i32,

    /// Harvesters re-targeted per refresh
    pub refresh_harvesters: usize,

    /// Task queue length above which no routine tasks are added
    pub max_tasks: usize,

    // === SCOUTING ===
    /// Search range around a random scouting point for tech resources
    pub scout_region_range: i32,

    /// Random scouting points tried before falling back to start locations
    pub scout_attempts: u32,

    /// Fixed start location to scout from; random when unset
    pub start_location: Option<usize>,

    // === TEAM SWITCH VOTES ===
    /// Chance (0..=100) of accepting a team-switch request
    pub accept_switch_team_percent: i32,

    /// Requests per voter that may be answered favourably
    pub max_switch_team_answers: u32,

    // === MISC ===
    /// Seed for gameplay randomness; derived from the faction when unset
    pub seed: Option<u64>,

    /// Verbosity of the AI log sink (1 = terse, 4 = everything)
    pub log_level: u8,

    /// Rule names in registration order
    pub rules: Vec<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            update_fps: 40,

            village_radius: 15,
            max_expansions: 2,
            max_build_radius: 40,
            expand_distance: 30,
            base_radius: 25,

            min_min_warriors: 7,
            max_min_warriors: 20,
            min_warriors_random_band: 10,
            min_worker_attackers_harvesting: 3,
            max_producer_warriors: 11,

            min_static_resources: 10,
            min_consumable_resources: 20,
            harvest_jitter: 2,
            refresh_harvesters: 2,
            max_tasks: 4,

            scout_region_range: 20,
            scout_attempts: 3,
            start_location: None,

            accept_switch_team_percent: 30,
            max_switch_team_answers: 2,

            seed: None,
            log_level: 2,
            rules: DEFAULT_RULES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AiConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.update_fps == 0 {
            return Err(AiError::InvalidConfig("update_fps must be positive".into()));
        }
        if self.village_radius <= 0 {
            return Err(AiError::InvalidConfig(format!(
                "village_radius ({}) must be positive",
                self.village_radius
            )));
        }
        if self.max_expansions == 0 {
            return Err(AiError::InvalidConfig("max_expansions must be positive".into()));
        }
        if self.max_producer_warriors < 1 {
            return Err(AiError::InvalidConfig(
                "max_producer_warriors must be at least 1".into(),
            ));
        }
        if self.min_min_warriors > self.max_min_warriors {
            return Err(AiError::InvalidConfig(format!(
                "min_min_warriors ({}) should be <= max_min_warriors ({})",
                self.min_min_warriors, self.max_min_warriors
            )));
        }
        if self.min_warriors_random_band < 0 {
            return Err(AiError::InvalidConfig(
                "min_warriors_random_band must not be negative".into(),
            ));
        }
        if !(0..=100).contains(&self.accept_switch_team_percent) {
            return Err(AiError::InvalidConfig(format!(
                "accept_switch_team_percent ({}) must be within 0..=100",
                self.accept_switch_team_percent
            )));
        }
        if self.rules.is_empty() {
            return Err(AiError::EmptyRuleList);
        }
        Ok(())
    }

    /// Simulation ticks between two tests of a rule with the given interval
    ///
    /// Rounded to the nearest tick and never below one.
    pub fn ticks_per_test(&self, interval_ms: u64) -> u64 {
        let ticks = (interval_ms * self.update_fps as u64 + 500) / 1000;
        ticks.max(1)
    }
}
