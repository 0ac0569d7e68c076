//! Unit orders shared by several rules

use crate::ai::state::AiState;
use crate::ai::AiContext;
use crate::core::types::{CommandClass, ResourceClass, UnitId, Vec2i};
use crate::world::{CommandRequest, CommandResult, CommandTarget, WorldQuery};

impl AiState {
    /// Send one attack-capable unit towards a likely enemy or resource spot
    ///
    /// The hardest tier sometimes probes random map points for a tech
    /// resource; otherwise the next start location in rotation is used.
    pub fn send_scout_patrol(&mut self, ctx: &mut AiContext<'_>) {
        let world = ctx.world;
        let mut target = None;

        if world.difficulty().is_mega() && self.rand_range(0, 1) == 1 {
            target = self.probe_for_tech_resource(world);
        }
        let pos = match target {
            Some(pos) => pos,
            None => {
                self.start_loc = (self.start_loc + 1) % world.max_players().max(1);
                world.start_location(self.start_loc)
            }
        };

        if world.home_location() == pos {
            return;
        }
        let Some(id) = self.find_able_unit(world, CommandClass::Attack, false) else {
            return;
        };
        let Some(unit) = world.unit(id) else {
            return;
        };
        let Some(command) = unit.unit_type.first_command_of_class(CommandClass::Attack) else {
            return;
        };
        ctx.commands
            .issue(CommandRequest::new(id, command, CommandTarget::Position(pos)));
        self.log(2, &format!("Scout patrol sent to: {}", pos));
    }

    fn probe_for_tech_resource(&mut self, world: &dyn WorldQuery) -> Option<Vec2i> {
        let resource = world
            .resource_types()
            .iter()
            .find(|rt| rt.class == ResourceClass::Tech)?
            .id;
        let (width, height) = world.map_size();
        for _ in 0..self.config.scout_attempts {
            let probe = Vec2i::new(
                self.rand_range(2, width - 2),
                self.rand_range(2, height - 2),
            );
            if !world.is_valid_cell(probe) {
                continue;
            }
            if let Some(found) =
                world.resource_in_region(probe, resource, self.config.scout_region_range)
            {
                return Some(found);
            }
        }
        None
    }

    /// Move a unit back to a random spot around home or an expansion
    pub fn return_base(&mut self, ctx: &mut AiContext<'_>, unit: UnitId) -> Option<CommandResult> {
        let world = ctx.world;
        let radius = self.config.village_radius;
        let offset = self.jitter(radius);
        let pos = offset + self.random_home_position(world);
        let command = world
            .unit(unit)?
            .unit_type
            .first_command_of_class(CommandClass::Move)?;
        Some(
            ctx.commands
                .issue(CommandRequest::new(unit, command, CommandTarget::Position(pos))),
        )
    }

    /// Send a unit to gather whatever it can collect that is scarcest
    pub fn harvest(&mut self, ctx: &mut AiContext<'_>, unit: UnitId) -> Option<CommandResult> {
        let world = ctx.world;
        let snapshot = world.unit(unit)?;
        let resource = self.needed_resource(world, snapshot)?;
        let command = snapshot.unit_type.first_harvest_command(resource)?;
        let deposit = world.nearest_sighted_resource(resource, world.home_location())?;
        let pos = deposit + self.jitter(self.config.harvest_jitter);
        let result = ctx
            .commands
            .issue(CommandRequest::new(unit, command, CommandTarget::Position(pos)));
        self.log(4, &format!("Order harvest pos: {}", pos));
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AiConfig;
    use crate::core::types::Difficulty;
    use crate::world::sandbox::{tech, CommandLog, SandboxWorld};
    use crate::world::ResourceType;

    fn state(seed: u64) -> AiState {
        let config = AiConfig {
            seed: Some(seed),
            start_location: Some(0),
            ..AiConfig::default()
        };
        AiState::new(config, 0, 2)
    }

    #[test]
    fn test_scout_patrol_targets_next_start_location() {
        let world = SandboxWorld::skirmish(Difficulty::Normal);
        let mut log = CommandLog::new();
        let mut ai = state(1);
        let mut ctx = AiContext::new(&world, &mut log);

        ai.send_scout_patrol(&mut ctx);

        assert_eq!(ai.start_loc, 1);
        assert_eq!(log.issued.len(), 1);
        assert_eq!(log.issued[0].command.class, CommandClass::Attack);
        assert_eq!(log.issued[0].target, CommandTarget::Position(Vec2i::new(50, 50)));
    }

    #[test]
    fn test_scout_patrol_skips_home() {
        let world = SandboxWorld::skirmish(Difficulty::Normal);
        let mut log = CommandLog::new();
        let mut ai = state(1);
        // rotation lands back on start location 0, which is home
        ai.start_loc = 1;
        let mut ctx = AiContext::new(&world, &mut log);

        ai.send_scout_patrol(&mut ctx);

        assert_eq!(ai.start_loc, 0);
        assert!(log.issued.is_empty());
    }

    #[test]
    fn test_harvest_targets_needed_deposit() {
        let world = SandboxWorld::skirmish(Difficulty::Normal);
        let mut log = CommandLog::new();
        let mut ai = state(2);
        let worker = world.my_units()[1].id;
        let mut ctx = AiContext::new(&world, &mut log);

        let result = ai.harvest(&mut ctx, worker);

        assert_eq!(result, Some(CommandResult::Succeeded));
        let CommandTarget::Position(pos) = log.issued[0].target else {
            panic!("harvest should target a position");
        };
        // nearest gold to home is (20,8)
        assert!((pos.x - 20).abs() <= 2 && (pos.y - 8).abs() <= 2);
    }

    #[test]
    fn test_harvest_unit_without_ability() {
        let world = SandboxWorld::skirmish(Difficulty::Normal);
        let mut log = CommandLog::new();
        let mut ai = state(2);
        let swordman = world
            .my_units()
            .iter()
            .find(|u| u.unit_type.id == tech::SWORDMAN)
            .map(|u| u.id)
            .unwrap();
        let mut ctx = AiContext::new(&world, &mut log);

        assert_eq!(ai.harvest(&mut ctx, swordman), None);
        assert!(log.issued.is_empty());
    }

    #[test]
    fn test_return_base_within_village_radius() {
        let world = SandboxWorld::skirmish(Difficulty::Normal);
        let mut log = CommandLog::new();
        let mut ai = state(3);
        let swordman = world
            .my_units()
            .iter()
            .find(|u| u.unit_type.id == tech::SWORDMAN)
            .map(|u| u.id)
            .unwrap();
        let mut ctx = AiContext::new(&world, &mut log);

        ai.return_base(&mut ctx, swordman);

        let CommandTarget::Position(pos) = log.issued[0].target else {
            panic!("return base should target a position");
        };
        assert!((pos.x - 12).abs() <= 15 && (pos.y - 12).abs() <= 15);
        assert_eq!(log.issued[0].command.class, CommandClass::Move);
    }

    /// Deposits of one resource every 8 cells across a 64x64 map
    fn seeded_map(resource: ResourceType) -> SandboxWorld {
        let mut world = SandboxWorld::new(64, 64).with_difficulty(Difficulty::Mega);
        let id = resource.id;
        world.add_resource_type(resource, 100);
        for x in (4..64).step_by(8) {
            for y in (4..64).step_by(8) {
                world.add_deposit(id, Vec2i::new(x, y));
            }
        }
        world
    }

    #[test]
    fn test_probe_only_looks_for_tech_resources() {
        let world = seeded_map(ResourceType::new(tech::FOOD, "food", ResourceClass::Consumable));
        let mut ai = state(5);
        assert_eq!(ai.probe_for_tech_resource(&world), None);

        let world = seeded_map(ResourceType::new(tech::GOLD, "gold", ResourceClass::Tech));
        let mut ai = state(5);
        assert!(ai.probe_for_tech_resource(&world).is_some());
    }
}
