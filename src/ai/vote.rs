//! Answers to team-switch requests
//!
//! Gameplay randomness is deterministic per controller. Vote rolls are the
//! one exception: they come from a wall-clock seeded source kept behind
//! [`VoteRandom`] so tests can pin the outcome.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ai::state::AiState;
use crate::core::types::FactionIndex;
use crate::world::{SwitchTeamVote, SwitchTeamVotes};

/// Source of the percentile roll used for team-switch votes
pub trait VoteRandom {
    /// Roll in `0..100`
    fn roll_percent(&mut self, faction: FactionIndex) -> i32;
}

/// Reseeds from the current time on every roll
#[derive(Debug, Default, Clone, Copy)]
pub struct WallClockRandom;

impl VoteRandom for WallClockRandom {
    fn roll_percent(&mut self, faction: FactionIndex) -> i32 {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut rng = StdRng::seed_from_u64(secs.wrapping_add(faction as u64));
        rng.gen_range(0..100)
    }
}

/// Always returns the same roll
#[derive(Debug, Clone, Copy)]
pub struct FixedRoll(pub i32);

impl VoteRandom for FixedRoll {
    fn roll_percent(&mut self, _faction: FactionIndex) -> i32 {
        self.0
    }
}

/// Whether a roll clears the acceptance threshold
pub fn accepts(percent: i32, roll: i32) -> bool {
    if percent >= 100 {
        true
    } else if percent <= 0 {
        false
    } else {
        roll >= 100 - percent
    }
}

impl AiState {
    /// Answer the oldest pending team-switch vote, if any
    ///
    /// Every request is answered. Only the first
    /// `max_switch_team_answers` requests from a voter can be accepted.
    pub fn answer_switch_team_vote(
        &mut self,
        votes: &mut dyn SwitchTeamVotes,
        random: &mut dyn VoteRandom,
    ) -> Option<SwitchTeamVote> {
        let voter = votes.first_pending_vote()?;
        let asked = self.switch_team_answers.entry(voter).or_insert(0);
        *asked += 1;
        let asked = *asked;

        let roll = random.roll_percent(self.faction);
        let allow = asked <= self.config.max_switch_team_answers
            && accepts(self.config.accept_switch_team_percent, roll);

        let vote = SwitchTeamVote {
            faction_index: voter,
            voted: true,
            allow_switch_team: allow,
        };
        votes.submit_vote(vote);
        self.log(
            2,
            &format!(
                "Switch team vote from faction {}: {}",
                voter,
                if allow { "yes" } else { "no" }
            ),
        );
        Some(vote)
    }
}
