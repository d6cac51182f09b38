//! Save and load: a [`SessionSnapshot`] captures everything needed to resume
//! a session and is stored as JSON.

use std::path::Path;

use bracket_geometry::prelude::Point;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use specs::prelude::{Builder, Component, Join, World, WorldExt};
use tracing::{debug, info};

use crate::{
    config::GameConfig,
    ecs::{
        EcsWorld,
        components::{
            CombatStats, GroundItem, Loot, Merchant, Monster, MonsterAbilities, MonsterStatus,
            Position, Projectile, Renderable, Trap,
        },
        resources::{ItemIdAllocator, LogEntry, MessageLog, TurnClock},
    },
    error::PersistenceError,
    hooks::GameHooks,
    map::{FloorMap, PointDef, Room},
    player::PlayerState,
    rng::GameRng,
    session::{GameMode, Session},
    text::{MessageCategory, MessageKey, params},
};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonsterRecord {
    #[serde(with = "PointDef")]
    pub position: Point,
    pub renderable: Renderable,
    pub monster: Monster,
    pub stats: CombatStats,
    pub abilities: MonsterAbilities,
    pub status: MonsterStatus,
    pub loot: Option<Loot>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacedRecord<T> {
    #[serde(with = "PointDef")]
    pub position: Point,
    pub renderable: Renderable,
    pub value: T,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub config: GameConfig,
    pub seed: u64,
    pub floor: u32,
    pub turn: u64,
    pub next_item_id: u64,
    pub mode: GameMode,
    pub map: FloorMap,
    pub rooms: Vec<Room>,
    pub shop_room: Option<usize>,
    pub player: PlayerState,
    pub monsters: Vec<MonsterRecord>,
    pub ground_items: Vec<PlacedRecord<GroundItem>>,
    pub traps: Vec<PlacedRecord<Trap>>,
    pub projectiles: Vec<PlacedRecord<Projectile>>,
    pub merchants: Vec<PlacedRecord<Merchant>>,
    pub messages: Vec<LogEntry>,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, PersistenceError> {
        let snapshot: SessionSnapshot = serde_json::from_str(raw)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::Version {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        snapshot.check()?;
        Ok(snapshot)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        std::fs::write(path.as_ref(), self.to_json()?)?;
        debug!(path = %path.as_ref().display(), "snapshot written");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    fn check(&self) -> Result<(), PersistenceError> {
        self.config
            .validate()
            .map_err(|err| PersistenceError::Corrupted(err.to_string()))?;
        if !self.map.is_consistent() {
            return Err(PersistenceError::Corrupted(format!(
                "map grid does not match {}x{}",
                self.map.width, self.map.height
            )));
        }
        if !self.map.in_bounds(self.player.position) {
            return Err(PersistenceError::Corrupted(
                "player is outside the map".to_string(),
            ));
        }
        if self.shop_room.is_some_and(|idx| idx >= self.rooms.len()) {
            return Err(PersistenceError::Corrupted(
                "shop room index out of range".to_string(),
            ));
        }
        Ok(())
    }
}

fn placed<T: Clone>(position: &Position, renderable: &Renderable, value: &T) -> PlacedRecord<T> {
    PlacedRecord {
        position: position.point,
        renderable: *renderable,
        value: value.clone(),
    }
}

impl<H: GameHooks> Session<H> {
    pub fn snapshot(&self) -> SessionSnapshot {
        let world = self.ecs.specs();
        let positions = world.read_storage::<Position>();
        let renderables = world.read_storage::<Renderable>();
        let monsters = world.read_storage::<Monster>();
        let stats = world.read_storage::<CombatStats>();
        let abilities = world.read_storage::<MonsterAbilities>();
        let statuses = world.read_storage::<MonsterStatus>();
        let loot = world.read_storage::<Loot>();
        let ground = world.read_storage::<GroundItem>();
        let traps = world.read_storage::<Trap>();
        let projectiles = world.read_storage::<Projectile>();
        let merchants = world.read_storage::<Merchant>();

        let monster_records = (
            &positions,
            &renderables,
            &monsters,
            &stats,
            &abilities,
            &statuses,
            loot.maybe(),
        )
            .join()
            .map(
                |(pos, render, monster, stats, abilities, status, loot)| MonsterRecord {
                    position: pos.point,
                    renderable: *render,
                    monster: monster.clone(),
                    stats: stats.clone(),
                    abilities: abilities.clone(),
                    status: status.clone(),
                    loot: loot.cloned(),
                },
            )
            .collect();

        let clock = self.ecs.clock();
        SessionSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            config: self.config.clone(),
            seed: self.ecs.rng_seed(),
            floor: clock.floor,
            turn: clock.turn,
            next_item_id: self.ecs.next_item_id(),
            mode: self.mode,
            map: self.map.clone(),
            rooms: self.rooms.clone(),
            shop_room: self.shop_room,
            player: (*self.ecs.player()).clone(),
            monsters: monster_records,
            ground_items: (&positions, &renderables, &ground)
                .join()
                .map(|(pos, render, item)| placed(pos, render, item))
                .collect(),
            traps: (&positions, &renderables, &traps)
                .join()
                .map(|(pos, render, trap)| placed(pos, render, trap))
                .collect(),
            projectiles: (&positions, &renderables, &projectiles)
                .join()
                .map(|(pos, render, projectile)| placed(pos, render, projectile))
                .collect(),
            merchants: (&positions, &renderables, &merchants)
                .join()
                .map(|(pos, render, merchant)| placed(pos, render, merchant))
                .collect(),
            messages: self.ecs.log_entries(),
        }
    }

    /// Rebuilds a session from a snapshot. The random stream continues from a
    /// seed derived from the saved seed and turn.
    pub fn restore(snapshot: SessionSnapshot, hooks: H) -> Result<Self, PersistenceError> {
        snapshot.check()?;
        let SessionSnapshot {
            config,
            seed,
            floor,
            turn,
            next_item_id,
            mode,
            map,
            rooms,
            shop_room,
            player,
            monsters,
            ground_items,
            traps,
            projectiles,
            merchants,
            messages,
            ..
        } = snapshot;

        let mut ecs = EcsWorld::new(
            player,
            GameRng::resumed(seed, turn),
            ItemIdAllocator::starting_at(next_item_id),
            MessageLog::restore(config.message_capacity, messages, turn),
            TurnClock { turn, floor },
            config.view_radius,
        );

        let world = ecs.specs_mut();
        for record in monsters {
            let builder = world
                .create_entity()
                .with(Position {
                    point: record.position,
                })
                .with(record.renderable)
                .with(record.monster)
                .with(record.stats)
                .with(record.abilities)
                .with(record.status);
            match record.loot {
                Some(loot) => builder.with(loot).build(),
                None => builder.build(),
            };
        }
        for record in ground_items {
            import(world, record);
        }
        for record in traps {
            import(world, record);
        }
        for record in projectiles {
            import(world, record);
        }
        for record in merchants {
            import(world, record);
        }

        let mut session = Session::from_parts(config, hooks, map, rooms, shop_room, ecs, mode);
        session.ecs.context().log.push_with(
            MessageKey::GameLoaded,
            MessageCategory::System,
            params([("floor", floor.to_string()), ("turn", turn.to_string())]),
        );
        info!(floor, turn, "session restored");
        session.refresh();
        Ok(session)
    }
}

fn import<T>(world: &mut World, record: PlacedRecord<T>)
where
    T: Component + Send + Sync,
{
    world
        .create_entity()
        .with(Position {
            point: record.position,
        })
        .with(record.renderable)
        .with(record.value)
        .build();
}
