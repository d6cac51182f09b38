//! One running game: the current floor, the ECS world and the mode machine.
//!
//! A [`Command`] either changes only the mode (menus, shop, cancelling) or is
//! a costing action: the player's part is applied directly and then the turn
//! pipeline runs exactly once. Rejected commands log a message and cost nothing.

mod actions;
mod effects;
mod floor;

use std::collections::HashSet;

use bracket_geometry::prelude::Point;
use serde::{Deserialize, Serialize};
use specs::prelude::{Join, WorldExt};
use specs::shred::{Fetch, FetchMut};
use tracing::{debug, info};

use crate::{
    config::GameConfig,
    data::{PLAYER_COLOR, monsters::MONSTER_TEMPLATES, spells::SpellKind},
    ecs::{
        EcsWorld,
        components::{GroundItem, Merchant, Monster, MonsterStatus, Position, Projectile, Renderable, Trap},
        resources::{ItemIdAllocator, LogEntry, MessageLog, TurnClock},
    },
    error::{ActionError, ConfigError},
    hooks::{FrameView, GameHooks, GlyphView, PlayerView, TileView},
    map::{FloorMap, Room},
    player::{EquipSlot, PlayerState},
    rng::GameRng,
    status::StatusKind,
    text::{MessageCategory, MessageKey, params},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Playing,
    /// A targeted spell is paid for and waits for a direction.
    Targeting { spell: SpellKind, refund: i32 },
    Inventory,
    ItemSelection,
    MagicSelection,
    /// Browsing the stock of the n-th merchant on the floor.
    Shop { merchant: usize },
    Dead,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    pub fn delta(self) -> Point {
        match self {
            Direction::North => Point::new(0, -1),
            Direction::South => Point::new(0, 1),
            Direction::East => Point::new(1, 0),
            Direction::West => Point::new(-1, 0),
            Direction::NorthEast => Point::new(1, -1),
            Direction::NorthWest => Point::new(-1, -1),
            Direction::SouthEast => Point::new(1, 1),
            Direction::SouthWest => Point::new(-1, 1),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Move(Direction),
    Wait,
    PickUp,
    UseItem(usize),
    Equip(usize),
    Unequip(EquipSlot),
    Drop(usize),
    CastSpell(usize),
    Aim(Direction),
    Cancel,
    OpenInventory,
    OpenItemSelection,
    OpenMagic,
    Buy(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnReport {
    pub turn_advanced: bool,
    pub turn: u64,
    pub floor: u32,
    pub mode: GameMode,
}

pub struct Session<H: GameHooks> {
    pub(crate) config: GameConfig,
    pub(crate) map: FloorMap,
    pub(crate) rooms: Vec<Room>,
    pub(crate) shop_room: Option<usize>,
    pub(crate) ecs: EcsWorld,
    pub(crate) mode: GameMode,
    pub(crate) visible: HashSet<Point>,
    hooks: H,
}

impl<H: GameHooks> Session<H> {
    /// Starts a new game on a freshly generated first floor.
    pub fn new(config: GameConfig, hooks: H) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut session = Self::bare(config, hooks, FloorMap::new(1, 1));
        session.enter_floor(1);
        {
            let mut ctx = session.ecs.context();
            ctx.log.push_with(
                MessageKey::Welcome,
                MessageCategory::System,
                params([("floor", "1".to_string())]),
            );
            ctx.log.push(MessageKey::FindStairs, MessageCategory::System);
        }
        info!(seed = session.config.seed, "new session");
        session.refresh();
        Ok(session)
    }

    /// Starts a game on a hand-built map with nothing on it. Later floors are
    /// generated as usual.
    pub fn on_map(
        config: GameConfig,
        hooks: H,
        map: FloorMap,
        start: Point,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut session = Self::bare(config, hooks, map);
        session.ecs.player_mut().position = start;
        session.refresh();
        Ok(session)
    }

    fn bare(config: GameConfig, hooks: H, map: FloorMap) -> Self {
        let ecs = EcsWorld::new(
            PlayerState::new(Point::new(0, 0)),
            GameRng::seeded(config.seed),
            ItemIdAllocator::default(),
            MessageLog::new(config.message_capacity),
            TurnClock::default(),
            config.view_radius,
        );
        Self::from_parts(config, hooks, map, Vec::new(), None, ecs, GameMode::Playing)
    }

    pub(crate) fn from_parts(
        config: GameConfig,
        hooks: H,
        map: FloorMap,
        rooms: Vec<Room>,
        shop_room: Option<usize>,
        ecs: EcsWorld,
        mode: GameMode,
    ) -> Self {
        Self {
            config,
            map,
            rooms,
            shop_room,
            ecs,
            mode,
            visible: HashSet::new(),
            hooks,
        }
    }

    pub fn handle(&mut self, command: Command) -> Result<TurnReport, ActionError> {
        let result = self.dispatch(command);
        if let Err(err) = &result {
            debug!(?command, %err, "command refused");
            self.ecs.context().log.push_with(
                err.message_key(),
                MessageCategory::System,
                err.message_params(),
            );
            self.flush();
        }
        result
    }

    fn dispatch(&mut self, command: Command) -> Result<TurnReport, ActionError> {
        match (self.mode, command) {
            (GameMode::Dead, _) => Err(ActionError::GameOver),
            (_, Command::Cancel) => Ok(self.cancel()),
            (GameMode::Targeting { spell, .. }, Command::Aim(direction)) => {
                Ok(self.release_spell(spell, direction))
            }
            (GameMode::Targeting { .. }, _) => Err(ActionError::WrongMode),
            (GameMode::Shop { merchant }, Command::Buy(offer)) => self.buy(merchant, offer),
            (GameMode::Shop { .. }, _) => Err(ActionError::WrongMode),
            (
                GameMode::Inventory | GameMode::ItemSelection,
                Command::UseItem(_) | Command::Equip(_) | Command::Drop(_),
            )
            | (GameMode::MagicSelection, Command::CastSpell(_)) => {
                self.mode = GameMode::Playing;
                self.act(command)
            }
            (
                GameMode::Inventory | GameMode::ItemSelection | GameMode::MagicSelection,
                Command::OpenInventory | Command::OpenItemSelection | Command::OpenMagic,
            ) => self.act(command),
            (GameMode::Inventory | GameMode::ItemSelection | GameMode::MagicSelection, _) => {
                Err(ActionError::WrongMode)
            }
            (GameMode::Playing, _) => self.act(command),
        }
    }

    fn act(&mut self, command: Command) -> Result<TurnReport, ActionError> {
        match command {
            Command::Move(direction) => self.player_move(direction),
            Command::Wait => Ok(self.rest()),
            Command::PickUp => self.pick_up(),
            Command::UseItem(index) => self.use_item(index),
            Command::Equip(index) => self.equip(index),
            Command::Unequip(slot) => self.unequip(slot),
            Command::Drop(index) => self.drop_item(index),
            Command::CastSpell(index) => self.cast_spell(index),
            Command::OpenInventory => Ok(self.open_item_menu(GameMode::Inventory)),
            Command::OpenItemSelection => Ok(self.open_item_menu(GameMode::ItemSelection)),
            Command::OpenMagic => Ok(self.open_magic_menu()),
            Command::Aim(_) | Command::Buy(_) | Command::Cancel => Err(ActionError::WrongMode),
        }
    }

    /// Runs the turn pipeline once, unless the player is already dead.
    pub(crate) fn run_turn(&mut self) -> TurnReport {
        let advanced = !self.ecs.player().is_dead();
        if advanced {
            self.ecs.advance(&self.map);
            self.ecs.finish_turn();
        }
        if self.ecs.player().is_dead() {
            self.mode = GameMode::Dead;
        }
        self.refresh();
        self.report(advanced)
    }

    /// Recomputes the view, reveals what is seen and notifies the hooks.
    pub(crate) fn refresh(&mut self) {
        self.visible = self.ecs.refresh_view(&self.map);
        for point in &self.visible {
            self.map.reveal(*point);
        }
        self.flush();
    }

    fn flush(&mut self) {
        for event in self.ecs.drain_sounds() {
            self.hooks.play_sound(event);
        }
        for entry in self.ecs.take_fresh_messages() {
            self.hooks.message(&entry);
        }
        let frame = self.frame();
        self.hooks.render(&frame);
    }

    pub(crate) fn report(&self, turn_advanced: bool) -> TurnReport {
        let clock = self.ecs.clock();
        TurnReport {
            turn_advanced,
            turn: clock.turn,
            floor: clock.floor,
            mode: self.mode,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn player(&self) -> Fetch<'_, PlayerState> {
        self.ecs.player()
    }

    pub fn player_mut(&mut self) -> FetchMut<'_, PlayerState> {
        self.ecs.player_mut()
    }

    pub fn map(&self) -> &FloorMap {
        &self.map
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn shop_room(&self) -> Option<usize> {
        self.shop_room
    }

    pub fn floor(&self) -> u32 {
        self.ecs.clock().floor
    }

    pub fn turn(&self) -> u64 {
        self.ecs.clock().turn
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn messages(&self) -> Vec<LogEntry> {
        self.ecs.log_entries()
    }

    pub fn is_visible(&self, point: Point) -> bool {
        self.visible.contains(&point)
    }

    pub fn ecs(&self) -> &EcsWorld {
        &self.ecs
    }

    pub fn ecs_mut(&mut self) -> &mut EcsWorld {
        &mut self.ecs
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn frame(&self) -> FrameView {
        let player = self.ecs.player();
        let clock = self.ecs.clock();
        let world = self.ecs.specs();
        let entities = world.entities();
        let positions = world.read_storage::<Position>();
        let renderables = world.read_storage::<Renderable>();
        let monsters = world.read_storage::<Monster>();
        let statuses = world.read_storage::<MonsterStatus>();
        let merchants = world.read_storage::<Merchant>();
        let ground = world.read_storage::<GroundItem>();
        let traps = world.read_storage::<Trap>();
        let projectiles = world.read_storage::<Projectile>();

        let see_invisible = player.status.has(StatusKind::SeeInvisible);
        let detect_monsters = player.status.has(StatusKind::DetectMonsters);
        let detect_magic = player.status.has(StatusKind::DetectMagic);
        let hallucinating = player.status.has(StatusKind::Hallucinating);

        let tiles = self
            .map
            .points()
            .map(|point| TileView {
                kind: self.map.tile(point),
                visible: self.visible.contains(&point),
                revealed: self.map.is_revealed(point),
            })
            .collect();

        let glyph = |point: Point, render: &Renderable| GlyphView {
            point,
            glyph: render.glyph,
            color: render.color,
        };

        let mut monster_glyphs: Vec<GlyphView> = Vec::new();
        for (entity, pos, render, monster, status) in
            (&entities, &positions, &renderables, &monsters, &statuses).join()
        {
            if !monster.alive {
                continue;
            }
            let in_sight = self.visible.contains(&pos.point)
                && (!status.is_invisible || see_invisible);
            if !(in_sight || detect_monsters) {
                continue;
            }
            let mut view = glyph(pos.point, render);
            if hallucinating {
                let roll = (entity.id() as u64).wrapping_mul(31).wrapping_add(clock.turn);
                view.glyph = MONSTER_TEMPLATES[(roll % MONSTER_TEMPLATES.len() as u64) as usize].glyph;
            }
            monster_glyphs.push(view);
        }
        monster_glyphs.extend(
            (&positions, &renderables, &merchants)
                .join()
                .filter(|(pos, _, _)| self.visible.contains(&pos.point))
                .map(|(pos, render, _)| glyph(pos.point, render)),
        );

        let items = (&positions, &renderables, &ground)
            .join()
            .filter(|(pos, _, _)| detect_magic || self.visible.contains(&pos.point))
            .map(|(pos, render, _)| glyph(pos.point, render))
            .collect();

        let trap_glyphs = (&positions, &renderables, &traps)
            .join()
            .filter(|(pos, _, trap)| trap.visible && self.map.is_revealed(pos.point))
            .map(|(pos, render, _)| glyph(pos.point, render))
            .collect();

        let projectile_glyphs = (&positions, &renderables, &projectiles)
            .join()
            .filter(|(pos, _, _)| self.visible.contains(&pos.point))
            .map(|(pos, render, _)| glyph(pos.point, render))
            .collect();

        FrameView {
            width: self.map.width,
            height: self.map.height,
            floor: clock.floor,
            turn: clock.turn,
            mode: self.mode,
            tiles,
            player: PlayerView {
                point: player.position,
                glyph: '@',
                color: PLAYER_COLOR,
                hp: player.hp,
                max_hp: player.max_hp,
                mp: player.mp,
                max_mp: player.max_mp,
                level: player.level,
                experience: player.experience,
                experience_to_next: player.experience_to_next,
                gold: player.gold,
                attack: player.stats.attack,
                defense: player.stats.defense,
                dexterity: player.stats.dexterity,
                statuses: player.status.iter().collect(),
            },
            monsters: monster_glyphs,
            items,
            traps: trap_glyphs,
            projectiles: projectile_glyphs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{data::monsters::MonsterTemplate, hooks::NullHooks};

    fn session_with(monster: &str, at: Point) -> Session<NullHooks> {
        let mut session = Session::on_map(
            GameConfig::default().with_seed(4),
            NullHooks,
            FloorMap::from_rows(&["#######", "#.....#", "#######"]),
            Point::new(1, 1),
        )
        .expect("valid config");
        let template = MonsterTemplate::by_name(monster).expect("known monster");
        session.ecs_mut().spawn_monster(template, at);
        session
            .ecs()
            .affect_monsters_within(at, 0, |status| status.frozen = 10);
        session.refresh();
        session
    }

    #[test]
    fn invisible_monsters_need_see_invisible() {
        let mut session = session_with("Phantom", Point::new(4, 1));
        assert!(session.frame().monsters.is_empty());

        session
            .player_mut()
            .status
            .set(StatusKind::SeeInvisible, 5);
        assert_eq!(session.frame().monsters.len(), 1);
    }

    #[test]
    fn hallucination_disguises_but_keeps_positions() {
        let mut session = session_with("Emu", Point::new(4, 1));
        session
            .player_mut()
            .status
            .set(StatusKind::Hallucinating, 5);
        let first = session.frame().monsters;
        let second = session.frame().monsters;
        assert_eq!(first, second);
        assert_eq!(first[0].point, Point::new(4, 1));
    }

    #[test]
    fn monster_detection_shows_monsters_out_of_sight() {
        let mut session = session_with("Emu", Point::new(4, 1));
        session.visible.clear();
        assert!(!session.is_visible(Point::new(4, 1)));
        assert!(session.frame().monsters.is_empty());
        session
            .player_mut()
            .status
            .set(StatusKind::DetectMonsters, 5);
        assert_eq!(session.frame().monsters.len(), 1);
    }

    #[test]
    fn dead_sessions_refuse_everything() {
        let mut session = session_with("Emu", Point::new(4, 1));
        session.mode = GameMode::Dead;
        assert_eq!(session.handle(Command::Cancel), Err(ActionError::GameOver));
        assert_eq!(
            session.handle(Command::Move(Direction::East)),
            Err(ActionError::GameOver)
        );
    }
}
