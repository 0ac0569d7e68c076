//! Tech-tree and unit snapshot types shared with the simulation

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::types::{
    CommandClass, CommandGroupId, FactionIndex, Field, ResourceClass, ResourceTypeId, SkillClass,
    UnitClass, UnitId, UnitTypeId, UpgradeTypeId, Vec2i,
};

/// One command a unit type can execute, with its class-specific payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandType {
    pub name: String,
    pub class: CommandClass,
    /// Unit type made by a produce or morph command
    pub produces: Option<UnitTypeId>,
    /// Unit types a build command can place
    pub builds: Vec<UnitTypeId>,
    /// Resources a harvest command can gather
    pub harvests: Vec<ResourceTypeId>,
    /// Fields an attack command can hit
    pub fields: Vec<Field>,
    pub upgrade: Option<UpgradeTypeId>,
}

impl CommandType {
    pub fn new(name: impl Into<String>, class: CommandClass) -> Self {
        Self {
            name: name.into(),
            class,
            produces: None,
            builds: Vec::new(),
            harvests: Vec::new(),
            fields: Vec::new(),
            upgrade: None,
        }
    }

    pub fn producing(mut self, unit_type: UnitTypeId) -> Self {
        self.produces = Some(unit_type);
        self
    }

    pub fn building(mut self, unit_types: &[UnitTypeId]) -> Self {
        self.builds = unit_types.to_vec();
        self
    }

    pub fn harvesting(mut self, resources: &[ResourceTypeId]) -> Self {
        self.harvests = resources.to_vec();
        self
    }

    pub fn attacking(mut self, fields: &[Field]) -> Self {
        self.fields = fields.to_vec();
        self
    }

    pub fn upgrading(mut self, upgrade: UpgradeTypeId) -> Self {
        self.upgrade = Some(upgrade);
        self
    }

    /// Handle used when issuing this command
    pub fn reference(&self) -> CommandRef {
        CommandRef {
            class: self.class,
            name: self.name.clone(),
        }
    }
}

/// Static description of a unit kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitType {
    pub id: UnitTypeId,
    pub name: String,
    /// Footprint edge length in cells
    pub size: i32,
    pub max_hp: i32,
    pub skills: Vec<SkillClass>,
    pub commands: Vec<CommandType>,
    /// Storage capacity per resource
    pub stores: Vec<(ResourceTypeId, i32)>,
    /// Construction costs; a negative amount means the unit generates it
    pub costs: Vec<(ResourceTypeId, i32)>,
}

impl UnitType {
    pub fn new(id: UnitTypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            size: 1,
            max_hp: 100,
            skills: vec![SkillClass::Stop],
            commands: Vec::new(),
            stores: Vec::new(),
            costs: Vec::new(),
        }
    }

    pub fn with_size(mut self, size: i32) -> Self {
        self.size = size;
        self
    }

    pub fn with_skills(mut self, skills: &[SkillClass]) -> Self {
        for skill in skills {
            if !self.skills.contains(skill) {
                self.skills.push(*skill);
            }
        }
        self
    }

    pub fn with_command(mut self, command: CommandType) -> Self {
        self.commands.push(command);
        self
    }

    pub fn with_store(mut self, resource: ResourceTypeId, amount: i32) -> Self {
        self.stores.push((resource, amount));
        self
    }

    pub fn with_cost(mut self, resource: ResourceTypeId, amount: i32) -> Self {
        self.costs.push((resource, amount));
        self
    }

    pub fn has_skill_class(&self, class: SkillClass) -> bool {
        self.skills.contains(&class)
    }

    pub fn has_command_class(&self, class: CommandClass) -> bool {
        self.commands.iter().any(|c| c.class == class)
    }

    pub fn first_command_of_class(&self, class: CommandClass) -> Option<&CommandType> {
        self.commands.iter().find(|c| c.class == class)
    }

    pub fn first_attack_command(&self, field: Field) -> Option<&CommandType> {
        self.commands
            .iter()
            .find(|c| c.class == CommandClass::Attack && c.fields.contains(&field))
    }

    pub fn first_attack_stopped_command(&self, field: Field) -> Option<&CommandType> {
        self.commands
            .iter()
            .find(|c| c.class == CommandClass::AttackStopped && c.fields.contains(&field))
    }

    pub fn first_harvest_command(&self, resource: ResourceTypeId) -> Option<&CommandType> {
        self.commands
            .iter()
            .find(|c| c.class == CommandClass::Harvest && c.harvests.contains(&resource))
    }

    /// Produce or morph command yielding the given type
    pub fn produce_command_for(&self, unit_type: UnitTypeId) -> Option<&CommandType> {
        self.commands.iter().find(|c| {
            matches!(c.class, CommandClass::Produce | CommandClass::Morph)
                && c.produces == Some(unit_type)
        })
    }

    pub fn build_command_for(&self, unit_type: UnitTypeId) -> Option<&CommandType> {
        self.commands
            .iter()
            .find(|c| c.class == CommandClass::Build && c.builds.contains(&unit_type))
    }

    pub fn upgrade_command_for(&self, upgrade: UpgradeTypeId) -> Option<&CommandType> {
        self.commands
            .iter()
            .find(|c| c.class == CommandClass::Upgrade && c.upgrade == Some(upgrade))
    }

    pub fn is_mobile(&self) -> bool {
        self.has_skill_class(SkillClass::Move)
    }

    pub fn is_of_class(&self, class: UnitClass) -> bool {
        match class {
            UnitClass::Warrior => {
                self.has_skill_class(SkillClass::Attack) && !self.has_skill_class(SkillClass::Harvest)
            }
            UnitClass::Worker => {
                self.has_skill_class(SkillClass::Build)
                    || self.has_skill_class(SkillClass::Repair)
                    || self.has_skill_class(SkillClass::Harvest)
            }
            UnitClass::Building => self.has_skill_class(SkillClass::BeBuilt),
        }
    }

    /// Storage capacity for a resource, zero when not a store
    pub fn store(&self, resource: ResourceTypeId) -> i32 {
        self.stores
            .iter()
            .filter(|(rt, _)| *rt == resource)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// True when standing instances of this type add to the resource
    pub fn generates(&self, resource: ResourceTypeId) -> bool {
        self.costs.iter().any(|(rt, amount)| *rt == resource && *amount < 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    pub id: ResourceTypeId,
    pub name: String,
    pub class: ResourceClass,
}

impl ResourceType {
    pub fn new(id: ResourceTypeId, name: impl Into<String>, class: ResourceClass) -> Self {
        Self {
            id,
            name: name.into(),
            class,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeType {
    pub id: UpgradeTypeId,
    pub name: String,
}

/// Pathfinder bookkeeping visible to the AI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathState {
    pub blocked: bool,
    pub block_count: u32,
}

/// Per-tick snapshot of a unit as seen by the AI
#[derive(Debug, Clone)]
pub struct Unit {
    pub id: UnitId,
    pub faction: FactionIndex,
    pub unit_type: Arc<UnitType>,
    pub pos: Vec2i,
    pub field: Field,
    pub hp: i32,
    pub alive: bool,
    /// False while under construction
    pub built: bool,
    /// Present once the unit has been given a movement order
    pub path: Option<PathState>,
    /// Class of the command at the head of the unit's queue
    pub current_command: Option<CommandClass>,
    pub current_skill: SkillClass,
}

impl Unit {
    pub fn new(id: UnitId, faction: FactionIndex, unit_type: Arc<UnitType>, pos: Vec2i) -> Self {
        let hp = unit_type.max_hp;
        Self {
            id,
            faction,
            unit_type,
            pos,
            field: Field::Land,
            hp,
            alive: true,
            built: true,
            path: None,
            current_command: None,
            current_skill: SkillClass::Stop,
        }
    }

    /// No queued command, or only a stop
    pub fn is_idle(&self) -> bool {
        matches!(self.current_command, None | Some(CommandClass::Stop))
    }

    pub fn is_path_blocked(&self) -> bool {
        self.path
            .map(|p| p.blocked || p.block_count > 0)
            .unwrap_or(false)
    }

    /// Busy building, morphing or producing
    pub fn is_producing(&self) -> bool {
        matches!(
            self.current_command,
            Some(CommandClass::Build | CommandClass::Morph | CommandClass::Produce)
        )
    }

    pub fn is_damaged(&self) -> bool {
        self.hp < self.unit_type.max_hp
    }

    pub fn centered_pos(&self) -> Vec2i {
        self.pos + Vec2i::splat(self.unit_type.size / 2)
    }
}

/// Names the command type to run on the receiving unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRef {
    pub class: CommandClass,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandTarget {
    None,
    Position(Vec2i),
    Unit(UnitId),
    Build { unit_type: UnitTypeId, pos: Vec2i },
}

/// A single order handed to the command system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub unit: UnitId,
    pub command: CommandRef,
    pub target: CommandTarget,
    pub group: Option<CommandGroupId>,
}

impl CommandRequest {
    pub fn new(unit: UnitId, command: &CommandType, target: CommandTarget) -> Self {
        Self {
            unit,
            command: command.reference(),
            target,
            group: None,
        }
    }

    pub fn in_group(mut self, group: Option<CommandGroupId>) -> Self {
        self.group = group;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandFailure {
    InsufficientResources,
    Unreachable,
    Blocked,
    Rejected,
}

/// Outcome of an issued command; failures are never fatal to the AI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandResult {
    Succeeded,
    Failed(CommandFailure),
}

impl CommandResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, CommandResult::Succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker_type() -> UnitType {
        UnitType::new(UnitTypeId(0), "worker")
            .with_skills(&[SkillClass::Move, SkillClass::Harvest, SkillClass::Build, SkillClass::Attack])
            .with_command(CommandType::new("move", CommandClass::Move))
            .with_command(CommandType::new("harvest", CommandClass::Harvest).harvesting(&[ResourceTypeId(0)]))
            .with_command(CommandType::new("attack", CommandClass::Attack).attacking(&[Field::Land]))
    }

    #[test]
    fn test_worker_classification() {
        let worker = worker_type();
        assert!(worker.is_of_class(UnitClass::Worker));
        assert!(!worker.is_of_class(UnitClass::Warrior));
        assert!(!worker.is_of_class(UnitClass::Building));
        assert!(worker.is_mobile());
    }

    #[test]
    fn test_warrior_classification() {
        let swordman = UnitType::new(UnitTypeId(1), "swordman")
            .with_skills(&[SkillClass::Move, SkillClass::Attack]);
        assert!(swordman.is_of_class(UnitClass::Warrior));
        assert!(!swordman.is_of_class(UnitClass::Worker));
    }

    #[test]
    fn test_command_lookup_by_field() {
        let worker = worker_type();
        assert!(worker.first_attack_command(Field::Land).is_some());
        assert!(worker.first_attack_command(Field::Air).is_none());
        assert!(worker.first_attack_stopped_command(Field::Land).is_none());
        assert!(worker.first_harvest_command(ResourceTypeId(0)).is_some());
        assert!(worker.first_harvest_command(ResourceTypeId(1)).is_none());
    }

    #[test]
    fn test_generates_negative_cost() {
        let farm = UnitType::new(UnitTypeId(2), "farm")
            .with_cost(ResourceTypeId(0), 50)
            .with_cost(ResourceTypeId(3), -10);
        assert!(farm.generates(ResourceTypeId(3)));
        assert!(!farm.generates(ResourceTypeId(0)));
    }

    #[test]
    fn test_unit_path_blocked() {
        let mut unit = Unit::new(UnitId(1), 0, Arc::new(worker_type()), Vec2i::new(1, 1));
        assert!(!unit.is_path_blocked());
        unit.path = Some(PathState { blocked: false, block_count: 2 });
        assert!(unit.is_path_blocked());
        unit.path = Some(PathState { blocked: true, block_count: 0 });
        assert!(unit.is_path_blocked());
    }
}
