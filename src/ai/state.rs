//! Controller state shared by every rule
//!
//! Rules never call each other. They coordinate through the fields below
//! and through the order they are registered in, so each field documents
//! which rules write it and which read it.

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ai::expansion::ExpansionRing;
use crate::ai::log::print_log;
use crate::ai::task::{Task, TaskId, TaskQueue};
use crate::core::config::AiConfig;
use crate::core::types::{FactionIndex, Vec2i};

/// Mutable state of one computer player
#[derive(Debug, Clone)]
pub struct AiState {
    pub config: AiConfig,
    pub faction: FactionIndex,

    /// Written by add-tasks, produce-resource-producer, build-one-farm and
    /// expand; consumed by produce, build and upgrade.
    pub tasks: TaskQueue,

    /// Written by expand; read through [`AiState::random_home_position`]
    /// by return-base and build.
    pub expansions: ExpansionRing,

    /// Start location scouted next; rotated by scout-patrol
    pub start_loc: usize,

    /// Warriors needed before the base counts as stable. Raised by every
    /// massive attack; read by scout-patrol and massive-attack.
    pub min_warriors: i32,

    /// Sticky flag of the hardest tier: the threshold is re-randomized on
    /// every attack once set
    pub random_min_warriors_reached: bool,

    /// Favourable-answer budget used per voting faction
    pub switch_team_answers: AHashMap<FactionIndex, u32>,

    rng: ChaCha8Rng,
}

impl AiState {
    /// Fresh state; the start location is drawn from `0..max_players`
    /// unless configured
    pub fn new(config: AiConfig, faction: FactionIndex, max_players: usize) -> Self {
        let seed = config.seed.unwrap_or(faction as u64);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let start_loc = match config.start_location {
            Some(loc) => loc,
            None => rng.gen_range(0..max_players.max(1)),
        };
        Self {
            tasks: TaskQueue::new(),
            expansions: ExpansionRing::new(config.max_expansions, config.village_radius),
            start_loc,
            min_warriors: config.min_min_warriors,
            random_min_warriors_reached: false,
            switch_team_answers: AHashMap::new(),
            faction,
            config,
            rng,
        }
    }

    /// Uniform integer in `lo..=hi`; returns `lo` for an empty range
    pub fn rand_range(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }

    /// Random offset with both axes in `-spread..=spread`
    pub fn jitter(&mut self, spread: i32) -> Vec2i {
        Vec2i::new(
            self.rand_range(-spread, spread),
            self.rand_range(-spread, spread),
        )
    }

    /// Pick one element uniformly
    pub fn choose<T: Copy>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.rng.gen_range(0..items.len());
        Some(items[idx])
    }

    pub fn log(&self, level: u8, message: &str) {
        print_log(self.faction, self.config.log_level, level, message);
    }

    pub fn add_task(&mut self, task: Task) -> TaskId {
        self.log(2, &format!("Task added: {}", task));
        self.tasks.add_task(task)
    }

    pub fn add_priority_task(&mut self, task: Task) -> TaskId {
        self.log(2, &format!("Priority Task added: {}", task));
        self.tasks.add_priority_task(task)
    }

    pub fn remove_task(&mut self, id: TaskId) {
        if let Some(task) = self.tasks.remove_task(id) {
            self.log(2, &format!("Task removed: {}", task));
        }
    }

    pub fn retry_task(&mut self, id: TaskId) {
        self.tasks.retry_task(id);
    }

    /// Remember an expansion site unless one already lies within the
    /// village radius
    pub fn add_expansion(&mut self, pos: Vec2i) -> bool {
        self.expansions.add(pos)
    }
}
