//! Per-faction entry point driven once per simulation tick

use tracing::{debug, info};

use crate::ai::rules::RuleEngine;
use crate::ai::state::AiState;
use crate::ai::vote::VoteRandom;
use crate::ai::AiContext;
use crate::core::config::AiConfig;
use crate::core::error::Result;
use crate::core::types::Tick;
use crate::world::{CommandIssuer, SwitchTeamVote, SwitchTeamVotes, WorldQuery};

/// What one controller update did
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: Tick,
    pub vote: Option<SwitchTeamVote>,
    /// Rules that passed their test and executed, in order
    pub executed: Vec<&'static str>,
}

/// Computer player for one faction
#[derive(Debug)]
pub struct AiController {
    state: AiState,
    engine: RuleEngine,
}

impl AiController {
    /// Validate the configuration and register its rules
    pub fn new(config: AiConfig, world: &dyn WorldQuery) -> Result<Self> {
        config.validate()?;
        let engine = RuleEngine::from_names(config.rules.as_slice())?;
        let state = AiState::new(config, world.faction_index(), world.max_players());
        info!(
            faction = state.faction,
            difficulty = ?world.difficulty(),
            start_loc = state.start_loc,
            rules = engine.len(),
            "AI controller ready"
        );
        state.log(2, &format!("Initial min warriors: {}", state.min_warriors));
        Ok(Self { state, engine })
    }

    pub fn state(&self) -> &AiState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AiState {
        &mut self.state
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.engine.names()
    }

    /// Run one tick: answer a pending vote, then run every due rule
    pub fn update(
        &mut self,
        world: &dyn WorldQuery,
        commands: &mut dyn CommandIssuer,
        votes: &mut dyn SwitchTeamVotes,
        vote_random: &mut dyn VoteRandom,
    ) -> TickReport {
        let vote = self.state.answer_switch_team_vote(votes, vote_random);
        let mut ctx = AiContext::new(world, commands);
        let executed = self.engine.update(&mut self.state, &mut ctx);
        if !executed.is_empty() {
            debug!(tick = world.tick(), ?executed, "rules executed");
        }
        TickReport {
            tick: world.tick(),
            vote,
            executed,
        }
    }
}
