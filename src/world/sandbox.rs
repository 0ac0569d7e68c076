//! In-memory world used by tests, benchmarks and the headless runner
//!
//! Implements the full world contract over plain vectors. Commands are
//! recorded by [`CommandLog`] and only take effect when [`SandboxWorld::apply`]
//! runs, mirroring how a real simulation resolves orders on a later tick.

use std::collections::VecDeque;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};

use crate::core::types::{
    CommandClass, CommandGroupId, Difficulty, FactionIndex, Field, ResourceClass, ResourceTypeId,
    SkillClass, Tick, UnitId, UnitTypeId, UpgradeTypeId, Vec2i,
};
use crate::world::blocking::BlockedCells;
use crate::world::units::{
    CommandFailure, CommandRequest, CommandResult, CommandTarget, CommandType, PathState,
    ResourceType, Unit, UnitType, UpgradeType,
};
use crate::world::{CommandIssuer, SwitchTeamVote, SwitchTeamVotes, WorldQuery};

#[derive(Debug, Clone, Copy, Default)]
struct Stock {
    amount: i32,
    balance: i32,
}

/// Grid world holding every faction's units
#[derive(Debug, Clone)]
pub struct SandboxWorld {
    pub faction: FactionIndex,
    pub difficulty: Difficulty,
    pub tick: Tick,
    pub width: i32,
    pub height: i32,
    pub terrain: BlockedCells,
    pub home: Vec2i,
    pub start_locations: Vec<Vec2i>,
    factions: Vec<Vec<Unit>>,
    unit_types: Vec<Arc<UnitType>>,
    resource_types: Vec<ResourceType>,
    stocks: AHashMap<ResourceTypeId, Stock>,
    deposits: Vec<(ResourceTypeId, Vec2i)>,
    attackers: AHashMap<UnitId, UnitId>,
    upgrade_types: Vec<UpgradeType>,
    upgraded: AHashSet<UpgradeTypeId>,
    next_unit_id: u32,
}

impl SandboxWorld {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            faction: 0,
            difficulty: Difficulty::Normal,
            tick: 0,
            width,
            height,
            terrain: BlockedCells::new(),
            home: Vec2i::new(width / 4, height / 4),
            start_locations: vec![
                Vec2i::new(width / 4, height / 4),
                Vec2i::new(width * 3 / 4, height * 3 / 4),
            ],
            factions: vec![Vec::new(), Vec::new()],
            unit_types: Vec::new(),
            resource_types: Vec::new(),
            stocks: AHashMap::new(),
            deposits: Vec::new(),
            attackers: AHashMap::new(),
            upgrade_types: Vec::new(),
            upgraded: AHashSet::new(),
            next_unit_id: 1,
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn add_unit_type(&mut self, unit_type: UnitType) -> Arc<UnitType> {
        let unit_type = Arc::new(unit_type);
        self.unit_types.push(Arc::clone(&unit_type));
        unit_type
    }

    pub fn add_resource_type(&mut self, resource: ResourceType, amount: i32) {
        self.stocks.insert(resource.id, Stock { amount, balance: 0 });
        self.resource_types.push(resource);
    }

    pub fn set_resource(&mut self, resource: ResourceTypeId, amount: i32, balance: i32) {
        self.stocks.insert(resource, Stock { amount, balance });
    }

    /// Register a visible deposit of a map resource
    pub fn add_deposit(&mut self, resource: ResourceTypeId, pos: Vec2i) {
        self.deposits.push((resource, pos));
    }

    pub fn add_upgrade_type(&mut self, upgrade: UpgradeType) {
        self.upgrade_types.push(upgrade);
    }

    pub fn mark_upgraded(&mut self, upgrade: UpgradeTypeId) {
        self.upgraded.insert(upgrade);
    }

    /// Place a unit of a registered type; panics on an unknown type id
    pub fn spawn(&mut self, faction: FactionIndex, unit_type: UnitTypeId, pos: Vec2i) -> UnitId {
        let unit_type = self
            .unit_types
            .iter()
            .find(|ut| ut.id == unit_type)
            .cloned()
            .unwrap_or_else(|| panic!("unknown unit type {:?}", unit_type));
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        if self.factions.len() <= faction {
            self.factions.resize_with(faction + 1, Vec::new);
        }
        self.factions[faction].push(Unit::new(id, faction, unit_type, pos));
        id
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.factions
            .iter_mut()
            .flat_map(|units| units.iter_mut())
            .find(|u| u.id == id)
    }

    /// Mark `attacker` as currently hitting `victim`
    pub fn set_attacker(&mut self, victim: UnitId, attacker: UnitId) {
        self.attackers.insert(victim, attacker);
    }

    pub fn units_of(&self, faction: FactionIndex) -> &[Unit] {
        self.factions.get(faction).map(Vec::as_slice).unwrap_or(&[])
    }

    fn all_units(&self) -> impl Iterator<Item = &Unit> {
        self.factions.iter().flat_map(|units| units.iter())
    }

    fn occupies(unit: &Unit, pos: Vec2i) -> bool {
        let size = unit.unit_type.size.max(1);
        pos.x >= unit.pos.x
            && pos.x < unit.pos.x + size
            && pos.y >= unit.pos.y
            && pos.y < unit.pos.y + size
    }

    fn first_free_neighbor(&self, around: Vec2i, field: Field) -> Option<Vec2i> {
        around.neighbors().find(|&pos| {
            self.is_valid_cell(pos) && !self.terrain.is_blocked(pos) && self.unit_at(pos, field).is_none()
        })
    }

    /// Resolve every recorded command against the world and advance one tick
    ///
    /// Buildings placed on the previous tick finish before new orders run.
    pub fn apply(&mut self, log: &mut CommandLog) {
        for unit in self.factions.iter_mut().flat_map(|units| units.iter_mut()) {
            unit.built = true;
        }
        for request in log.drain() {
            self.apply_request(&request);
        }
        self.tick += 1;
    }

    fn apply_request(&mut self, request: &CommandRequest) {
        let Some(unit) = self.unit(request.unit).cloned() else {
            return;
        };
        match (request.command.class, &request.target) {
            (CommandClass::Move, CommandTarget::Position(pos)) => {
                let movable = self.can_move(&unit, unit.pos, *pos);
                if let Some(u) = self.unit_mut(unit.id) {
                    u.current_command = Some(CommandClass::Move);
                    if movable {
                        u.pos = *pos;
                        u.path = Some(PathState::default());
                        u.current_skill = SkillClass::Move;
                    } else {
                        u.path = Some(PathState { blocked: true, block_count: 1 });
                    }
                }
            }
            (CommandClass::Attack | CommandClass::AttackStopped, _) => {
                if let Some(u) = self.unit_mut(unit.id) {
                    u.current_command = Some(CommandClass::Attack);
                    u.current_skill = SkillClass::Attack;
                }
            }
            (CommandClass::Harvest, _) => {
                if let Some(u) = self.unit_mut(unit.id) {
                    u.current_command = Some(CommandClass::Harvest);
                    u.current_skill = SkillClass::Harvest;
                }
            }
            (CommandClass::Build, CommandTarget::Build { unit_type, pos }) => {
                let size = self.unit_type(*unit_type).map(|ut| ut.size).unwrap_or(1);
                if self.is_free_cells(*pos, size, Field::Land) {
                    let id = self.spawn(unit.faction, *unit_type, *pos);
                    if let Some(building) = self.unit_mut(id) {
                        building.built = false;
                    }
                }
                if let Some(u) = self.unit_mut(unit.id) {
                    u.current_command = Some(CommandClass::Build);
                    u.current_skill = SkillClass::Build;
                }
            }
            (CommandClass::Produce | CommandClass::Morph, _) => {
                let produced = unit
                    .unit_type
                    .commands
                    .iter()
                    .find(|c| c.name == request.command.name)
                    .and_then(|c| c.produces);
                if let (Some(produced), Some(pos)) =
                    (produced, self.first_free_neighbor(unit.pos, Field::Land))
                {
                    self.spawn(unit.faction, produced, pos);
                }
                if let Some(u) = self.unit_mut(unit.id) {
                    u.current_command = Some(CommandClass::Produce);
                    u.current_skill = SkillClass::Produce;
                }
            }
            (CommandClass::Upgrade, _) => {
                let upgrade = unit
                    .unit_type
                    .commands
                    .iter()
                    .find(|c| c.name == request.command.name)
                    .and_then(|c| c.upgrade);
                if let Some(upgrade) = upgrade {
                    self.mark_upgraded(upgrade);
                }
                if let Some(u) = self.unit_mut(unit.id) {
                    u.current_command = Some(CommandClass::Upgrade);
                }
            }
            (CommandClass::Repair, CommandTarget::Unit(target)) => {
                if let Some(t) = self.unit_mut(*target) {
                    t.hp = t.unit_type.max_hp;
                }
                if let Some(u) = self.unit_mut(unit.id) {
                    u.current_command = Some(CommandClass::Repair);
                    u.current_skill = SkillClass::Repair;
                }
            }
            _ => {
                if let Some(u) = self.unit_mut(unit.id) {
                    u.current_command = None;
                    u.current_skill = SkillClass::Stop;
                }
            }
        }
    }

    /// Two-faction skirmish on a 64x64 map with a small standard tech tree
    ///
    /// Faction 0 owns a castle, workers and a few swordmen; faction 1 owns a
    /// castle on the opposite corner.
    pub fn skirmish(difficulty: Difficulty) -> Self {
        let mut world = SandboxWorld::new(64, 64).with_difficulty(difficulty);
        world.home = Vec2i::new(12, 12);
        world.start_locations = vec![Vec2i::new(12, 12), Vec2i::new(50, 50)];
        install_standard_tech_tree(&mut world);

        world.spawn(0, tech::CASTLE, Vec2i::new(10, 10));
        for i in 0..5 {
            world.spawn(0, tech::WORKER, Vec2i::new(14 + i, 14));
        }
        for i in 0..3 {
            world.spawn(0, tech::SWORDMAN, Vec2i::new(14 + i, 17));
        }
        world.spawn(1, tech::CASTLE, Vec2i::new(50, 50));
        for i in 0..3 {
            world.spawn(1, tech::SWORDMAN, Vec2i::new(46 + i, 46));
        }

        world.add_deposit(tech::GOLD, Vec2i::new(20, 8));
        world.add_deposit(tech::WOOD, Vec2i::new(8, 22));
        world.add_deposit(tech::GOLD, Vec2i::new(45, 20));
        world
    }
}

/// Identifiers of the standard sandbox tech tree
pub mod tech {
    use crate::core::types::{ResourceTypeId, UnitTypeId, UpgradeTypeId};

    pub const GOLD: ResourceTypeId = ResourceTypeId(0);
    pub const WOOD: ResourceTypeId = ResourceTypeId(1);
    pub const FOOD: ResourceTypeId = ResourceTypeId(2);
    pub const HOUSING: ResourceTypeId = ResourceTypeId(3);

    pub const WORKER: UnitTypeId = UnitTypeId(0);
    pub const SWORDMAN: UnitTypeId = UnitTypeId(1);
    pub const ARCHER: UnitTypeId = UnitTypeId(2);
    pub const CASTLE: UnitTypeId = UnitTypeId(3);
    pub const BARRACKS: UnitTypeId = UnitTypeId(4);
    pub const FARM: UnitTypeId = UnitTypeId(5);
    pub const HOUSE: UnitTypeId = UnitTypeId(6);

    pub const SHARP_SWORDS: UpgradeTypeId = UpgradeTypeId(0);
}

/// Register resources, unit types and upgrades of the standard tech tree
pub fn install_standard_tech_tree(world: &mut SandboxWorld) {
    use tech::*;

    world.add_resource_type(ResourceType::new(GOLD, "gold", ResourceClass::Tech), 500);
    world.add_resource_type(ResourceType::new(WOOD, "wood", ResourceClass::Tech), 500);
    world.add_resource_type(ResourceType::new(FOOD, "food", ResourceClass::Consumable), 100);
    world.add_resource_type(ResourceType::new(HOUSING, "housing", ResourceClass::Static), 20);
    world.add_upgrade_type(UpgradeType {
        id: SHARP_SWORDS,
        name: "sharp_swords".into(),
    });

    let mobile = [SkillClass::Move, SkillClass::Attack];
    world.add_unit_type(
        UnitType::new(WORKER, "worker")
            .with_skills(&[
                SkillClass::Move,
                SkillClass::Attack,
                SkillClass::Harvest,
                SkillClass::Build,
                SkillClass::Repair,
            ])
            .with_command(CommandType::new("stop", CommandClass::Stop))
            .with_command(CommandType::new("move", CommandClass::Move))
            .with_command(CommandType::new("attack", CommandClass::Attack).attacking(&[Field::Land]))
            .with_command(CommandType::new("harvest", CommandClass::Harvest).harvesting(&[GOLD, WOOD]))
            .with_command(
                CommandType::new("build", CommandClass::Build).building(&[CASTLE, BARRACKS, FARM, HOUSE]),
            )
            .with_command(CommandType::new("repair", CommandClass::Repair))
            .with_cost(FOOD, 1),
    );
    world.add_unit_type(
        UnitType::new(SWORDMAN, "swordman")
            .with_skills(&mobile)
            .with_command(CommandType::new("stop", CommandClass::Stop))
            .with_command(CommandType::new("move", CommandClass::Move))
            .with_command(CommandType::new("attack", CommandClass::Attack).attacking(&[Field::Land]))
            .with_cost(FOOD, 1),
    );
    world.add_unit_type(
        UnitType::new(ARCHER, "archer")
            .with_skills(&mobile)
            .with_command(CommandType::new("move", CommandClass::Move))
            .with_command(
                CommandType::new("attack", CommandClass::Attack).attacking(&[Field::Land, Field::Air]),
            )
            .with_command(
                CommandType::new("hold_attack", CommandClass::AttackStopped)
                    .attacking(&[Field::Land, Field::Air]),
            )
            .with_cost(FOOD, 1),
    );
    world.add_unit_type(
        UnitType::new(CASTLE, "castle")
            .with_size(3)
            .with_skills(&[SkillClass::BeBuilt, SkillClass::Produce])
            .with_command(CommandType::new("produce_worker", CommandClass::Produce).producing(WORKER))
            .with_store(GOLD, 1000)
            .with_store(WOOD, 1000)
            .with_cost(HOUSING, -10),
    );
    world.add_unit_type(
        UnitType::new(BARRACKS, "barracks")
            .with_size(2)
            .with_skills(&[SkillClass::BeBuilt, SkillClass::Produce, SkillClass::Upgrade])
            .with_command(CommandType::new("produce_swordman", CommandClass::Produce).producing(SWORDMAN))
            .with_command(CommandType::new("produce_archer", CommandClass::Produce).producing(ARCHER))
            .with_command(CommandType::new("sharpen", CommandClass::Upgrade).upgrading(SHARP_SWORDS))
            .with_cost(GOLD, 100),
    );
    world.add_unit_type(
        UnitType::new(FARM, "farm")
            .with_size(2)
            .with_skills(&[SkillClass::BeBuilt])
            .with_cost(WOOD, 50)
            .with_cost(FOOD, -5),
    );
    world.add_unit_type(
        UnitType::new(HOUSE, "house")
            .with_skills(&[SkillClass::BeBuilt])
            .with_cost(WOOD, 30)
            .with_cost(HOUSING, -5),
    );
}

impl WorldQuery for SandboxWorld {
    fn faction_index(&self) -> FactionIndex {
        self.faction
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn tick(&self) -> Tick {
        self.tick
    }

    fn map_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn is_inside(&self, pos: Vec2i) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    fn is_inside_surface(&self, pos: Vec2i) -> bool {
        self.is_inside(pos)
    }

    fn unit_at(&self, pos: Vec2i, field: Field) -> Option<&Unit> {
        self.all_units()
            .find(|u| u.alive && u.field == field && Self::occupies(u, pos))
    }

    fn can_move(&self, unit: &Unit, _from: Vec2i, to: Vec2i) -> bool {
        if !self.is_valid_cell(to) || self.terrain.is_blocked(to) {
            return false;
        }
        match self.unit_at(to, unit.field) {
            Some(other) => other.id == unit.id,
            None => true,
        }
    }

    fn is_free_cells(&self, pos: Vec2i, size: i32, field: Field) -> bool {
        for dy in 0..size {
            for dx in 0..size {
                let cell = pos + Vec2i::new(dx, dy);
                if !self.is_valid_cell(cell)
                    || self.terrain.is_blocked(cell)
                    || self.unit_at(cell, field).is_some()
                {
                    return false;
                }
            }
        }
        true
    }

    fn my_units(&self) -> &[Unit] {
        self.units_of(self.faction)
    }

    fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.all_units().find(|u| u.id == id)
    }

    fn home_location(&self) -> Vec2i {
        self.home
    }

    fn start_location(&self, index: usize) -> Vec2i {
        self.start_locations.get(index).copied().unwrap_or(self.home)
    }

    fn max_players(&self) -> usize {
        self.start_locations.len().max(1)
    }

    fn resource_types(&self) -> &[ResourceType] {
        &self.resource_types
    }

    fn resource_amount(&self, resource: ResourceTypeId) -> i32 {
        self.stocks.get(&resource).map(|s| s.amount).unwrap_or(0)
    }

    fn resource_balance(&self, resource: ResourceTypeId) -> i32 {
        self.stocks.get(&resource).map(|s| s.balance).unwrap_or(0)
    }

    fn nearest_sighted_resource(&self, resource: ResourceTypeId, from: Vec2i) -> Option<Vec2i> {
        self.deposits
            .iter()
            .filter(|(rt, _)| *rt == resource)
            .map(|(_, pos)| *pos)
            .min_by(|a, b| a.distance(&from).total_cmp(&b.distance(&from)))
    }

    fn resource_in_region(
        &self,
        pos: Vec2i,
        resource: ResourceTypeId,
        range: i32,
    ) -> Option<Vec2i> {
        self.deposits
            .iter()
            .find(|(rt, deposit)| *rt == resource && deposit.distance(&pos) <= range as f32)
            .map(|(_, deposit)| *deposit)
    }

    fn first_sighted_enemy(&self, pos: Vec2i, radius: Option<i32>) -> Option<&Unit> {
        self.all_units().find(|u| {
            u.alive
                && u.faction != self.faction
                && radius.map_or(true, |r| u.pos.distance(&pos) < r as f32)
        })
    }

    fn attacker_of(&self, unit: &Unit) -> Option<&Unit> {
        let attacker = self.attackers.get(&unit.id)?;
        self.unit(*attacker).filter(|u| u.alive)
    }

    fn unit_types(&self) -> &[Arc<UnitType>] {
        &self.unit_types
    }

    fn upgrade_types(&self) -> &[UpgradeType] {
        &self.upgrade_types
    }

    fn is_upgraded(&self, upgrade: UpgradeTypeId) -> bool {
        self.upgraded.contains(&upgrade)
    }
}

/// Command issuer that records every accepted order
#[derive(Debug, Default)]
pub struct CommandLog {
    pub issued: Vec<CommandRequest>,
    /// Orders refused by the rejection policy
    pub refused: Vec<CommandRequest>,
    next_group: u32,
    rejected_units: AHashSet<UnitId>,
    reject_all: bool,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every order addressed to this unit
    pub fn reject_unit(&mut self, unit: UnitId) {
        self.rejected_units.insert(unit);
    }

    pub fn reject_everything(&mut self) {
        self.reject_all = true;
    }

    pub fn commands_for(&self, unit: UnitId) -> Vec<&CommandRequest> {
        self.issued.iter().filter(|r| r.unit == unit).collect()
    }

    pub fn count_of_class(&self, class: CommandClass) -> usize {
        self.issued.iter().filter(|r| r.command.class == class).count()
    }

    pub fn drain(&mut self) -> Vec<CommandRequest> {
        std::mem::take(&mut self.issued)
    }
}

impl CommandIssuer for CommandLog {
    fn issue(&mut self, request: CommandRequest) -> CommandResult {
        if self.reject_all || self.rejected_units.contains(&request.unit) {
            self.refused.push(request);
            return CommandResult::Failed(CommandFailure::Rejected);
        }
        self.issued.push(request);
        CommandResult::Succeeded
    }

    fn next_command_group_id(&mut self) -> CommandGroupId {
        self.next_group += 1;
        CommandGroupId(self.next_group)
    }
}

/// Queue of team-switch requests and the answers given to them
#[derive(Debug, Default)]
pub struct VoteBoard {
    pending: VecDeque<FactionIndex>,
    pub answers: Vec<SwitchTeamVote>,
}

impl VoteBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A faction asks to join this faction's team
    pub fn request(&mut self, faction: FactionIndex) {
        self.pending.push_back(faction);
    }
}

impl SwitchTeamVotes for VoteBoard {
    fn first_pending_vote(&self) -> Option<FactionIndex> {
        self.pending.front().copied()
    }

    fn submit_vote(&mut self, vote: SwitchTeamVote) {
        if let Some(idx) = self.pending.iter().position(|f| *f == vote.faction_index) {
            self.pending.remove(idx);
        }
        self.answers.push(vote);
    }
}
