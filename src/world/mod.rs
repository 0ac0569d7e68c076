//! Contract between the decision core and the game simulation
//!
//! The AI never owns world state. Each tick it reads a [`WorldQuery`]
//! snapshot and hands orders to a [`CommandIssuer`]; whether an order
//! succeeds is decided by the simulation and becomes visible on a later
//! tick. Team-switch requests arrive through [`SwitchTeamVotes`].

pub mod blocking;
pub mod sandbox;
pub mod units;

use std::sync::Arc;

use crate::core::types::{
    CommandGroupId, Difficulty, FactionIndex, Field, ResourceTypeId, Tick, UnitId, UnitTypeId,
    UpgradeTypeId, Vec2i,
};

pub use blocking::BlockedCells;
pub use sandbox::{CommandLog, SandboxWorld, VoteBoard};
pub use units::{
    CommandFailure, CommandRef, CommandRequest, CommandResult, CommandTarget, CommandType,
    PathState, ResourceType, Unit, UnitType, UpgradeType,
};

/// Read-only view of the world from one faction's perspective
pub trait WorldQuery {
    fn faction_index(&self) -> FactionIndex;

    fn difficulty(&self) -> Difficulty;

    /// Simulation ticks elapsed since the match started
    fn tick(&self) -> Tick;

    /// Map width and height in cells
    fn map_size(&self) -> (i32, i32);

    fn is_inside(&self, pos: Vec2i) -> bool;

    fn is_inside_surface(&self, pos: Vec2i) -> bool;

    /// Unit occupying the cell in the given field
    fn unit_at(&self, pos: Vec2i, field: Field) -> Option<&Unit>;

    /// Approximate move-feasibility check between two cells for a unit
    fn can_move(&self, unit: &Unit, from: Vec2i, to: Vec2i) -> bool;

    /// True when a `size` x `size` square starting at `pos` is empty
    fn is_free_cells(&self, pos: Vec2i, size: i32, field: Field) -> bool;

    /// Units of this faction in stable index order
    fn my_units(&self) -> &[Unit];

    /// Any unit, of any faction, by identity
    fn unit(&self, id: UnitId) -> Option<&Unit>;

    fn home_location(&self) -> Vec2i;

    fn start_location(&self, index: usize) -> Vec2i;

    fn max_players(&self) -> usize;

    fn resource_types(&self) -> &[ResourceType];

    /// Stockpiled amount of a resource
    fn resource_amount(&self, resource: ResourceTypeId) -> i32;

    /// Net per-interval change of a resource (negative = draining)
    fn resource_balance(&self, resource: ResourceTypeId) -> i32;

    /// Closest known deposit of a resource
    fn nearest_sighted_resource(&self, resource: ResourceTypeId, from: Vec2i) -> Option<Vec2i>;

    /// A deposit of the resource within `range` of `pos`
    fn resource_in_region(&self, pos: Vec2i, resource: ResourceTypeId, range: i32)
        -> Option<Vec2i>;

    /// First visible enemy within `radius` of `pos`; `None` means unbounded
    fn first_sighted_enemy(&self, pos: Vec2i, radius: Option<i32>) -> Option<&Unit>;

    /// Visible enemy currently attacking the unit
    fn attacker_of(&self, unit: &Unit) -> Option<&Unit>;

    /// Unit types available to this faction
    fn unit_types(&self) -> &[Arc<UnitType>];

    fn upgrade_types(&self) -> &[UpgradeType];

    fn is_upgraded(&self, upgrade: UpgradeTypeId) -> bool;

    /// Inside the map and on a valid surface cell
    fn is_valid_cell(&self, pos: Vec2i) -> bool {
        self.is_inside(pos) && self.is_inside_surface(pos)
    }

    fn unit_type(&self, id: UnitTypeId) -> Option<&Arc<UnitType>> {
        self.unit_types().iter().find(|ut| ut.id == id)
    }
}

/// Accepts orders; results never abort the AI
pub trait CommandIssuer {
    fn issue(&mut self, request: CommandRequest) -> CommandResult;

    /// Fresh identifier for a coordinated multi-unit order
    fn next_command_group_id(&mut self) -> CommandGroupId;
}

/// A team-switch vote answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchTeamVote {
    /// Faction asking to join this faction's team
    pub faction_index: FactionIndex,
    pub voted: bool,
    pub allow_switch_team: bool,
}

/// Pending team-switch requests addressed to this faction
pub trait SwitchTeamVotes {
    /// Requesting faction of the oldest unanswered vote
    fn first_pending_vote(&self) -> Option<FactionIndex>;

    /// Record an answer; the vote is no longer pending afterwards
    fn submit_vote(&mut self, vote: SwitchTeamVote);
}
