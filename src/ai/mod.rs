//! Rule-driven computer player
//!
//! [`AiController`] owns one faction's [`AiState`] and [`RuleEngine`]. Each
//! simulation tick it answers a pending team-switch vote, then lets every due
//! rule inspect the world and issue orders through an [`AiContext`].

pub mod actions;
pub mod attack;
pub mod controller;
pub mod expansion;
pub mod log;
pub mod queries;
pub mod rules;
pub mod state;
pub mod task;
pub mod unblock;
pub mod vote;

pub use attack::AttackReport;
pub use controller::{AiController, TickReport};
pub use expansion::ExpansionRing;
pub use queries::{able_units, Availability};
pub use rules::{Rule, RuleEngine};
pub use state::AiState;
pub use task::{BuildTarget, ProduceTarget, Task, TaskId, TaskQueue};
pub use unblock::{AdjacencyMap, UnblockReport};
pub use vote::{FixedRoll, VoteRandom, WallClockRandom};

use crate::world::{CommandIssuer, WorldQuery};

/// What a rule may touch while executing
pub struct AiContext<'a> {
    pub world: &'a dyn WorldQuery,
    pub commands: &'a mut dyn CommandIssuer,
}

impl<'a> AiContext<'a> {
    pub fn new(world: &'a dyn WorldQuery, commands: &'a mut dyn CommandIssuer) -> Self {
        Self { world, commands }
    }
}
