pub mod components;
pub mod resources;
pub mod systems;

use std::collections::HashSet;

use bracket_geometry::prelude::Point;
use specs::prelude::{
    Builder, Dispatcher, DispatcherBuilder, Entity, Join, LazyUpdate, RunNow, World as SpecsWorld,
    WorldExt,
};
use specs::shred::{Fetch, FetchMut};
use tracing::{debug, warn};

use crate::{
    ai,
    combat::resolve_attack,
    data::{
        MERCHANT_COLOR, PROJECTILE_COLOR, TRAP_COLOR,
        items::{ItemId, ItemInstance},
        monsters::MonsterTemplate,
    },
    hooks::SoundEvent,
    map::FloorMap,
    player::PlayerState,
    rng::GameRng,
    text::{MessageCategory, MessageKey, params},
};

use self::{
    components::{
        CombatStats, GroundItem, Loot, Merchant, Monster, MonsterAbilities, MonsterStatus,
        Position, Projectile, Renderable, Trap, TrapKind,
    },
    resources::{
        ItemIdAllocator, LogEntry, MessageLog, MovementContext, SoundQueue, TurnClock, Viewshed,
    },
    systems::{
        FovSystem, MonsterAbilitySystem, MonsterAiSystem, PlayerStatusSystem, ProjectileSystem,
        settle_kill,
    },
};

/// The player and the session-wide resources, borrowed together for one action.
///
/// While a context is alive, `EcsWorld` helpers must be handed these resources
/// instead of fetching them again.
pub struct PlayerContext<'a> {
    pub player: FetchMut<'a, PlayerState>,
    pub rng: FetchMut<'a, GameRng>,
    pub ids: FetchMut<'a, ItemIdAllocator>,
    pub log: FetchMut<'a, MessageLog>,
    pub sounds: FetchMut<'a, SoundQueue>,
    pub clock: Fetch<'a, TurnClock>,
}

pub struct EcsWorld {
    specs_world: SpecsWorld,
    dispatcher: Dispatcher<'static, 'static>,
}

impl EcsWorld {
    pub fn new(
        player: PlayerState,
        rng: GameRng,
        ids: ItemIdAllocator,
        log: MessageLog,
        clock: TurnClock,
        view_radius: i32,
    ) -> Self {
        let mut specs_world = SpecsWorld::new();
        Self::register_components(&mut specs_world);
        specs_world.insert(player);
        specs_world.insert(rng);
        specs_world.insert(ids);
        specs_world.insert(log);
        specs_world.insert(clock);
        specs_world.insert(SoundQueue::default());
        specs_world.insert(Viewshed {
            radius: view_radius,
            visible: HashSet::new(),
        });

        let dispatcher = DispatcherBuilder::new()
            .with_thread_local(ProjectileSystem)
            .with_thread_local(PlayerStatusSystem)
            .with_thread_local(MonsterAbilitySystem)
            .with_thread_local(MonsterAiSystem)
            .build();

        Self {
            specs_world,
            dispatcher,
        }
    }

    fn register_components(world: &mut SpecsWorld) {
        world.register::<Position>();
        world.register::<Renderable>();
        world.register::<Monster>();
        world.register::<CombatStats>();
        world.register::<MonsterAbilities>();
        world.register::<MonsterStatus>();
        world.register::<Loot>();
        world.register::<GroundItem>();
        world.register::<Trap>();
        world.register::<Projectile>();
        world.register::<Merchant>();
    }

    /// Runs one pass of the turn pipeline against `map`.
    pub fn advance(&mut self, map: &FloorMap) {
        let context = MovementContext::from_map(map, self.player().position);
        self.specs_world.insert(context);
        self.dispatcher.dispatch(&self.specs_world);
        self.specs_world.maintain();
    }

    /// Moves the turn counter on and stamps later messages with it.
    pub fn finish_turn(&mut self) -> u64 {
        let turn = {
            let mut clock = self.specs_world.write_resource::<TurnClock>();
            clock.turn += 1;
            clock.turn
        };
        self.specs_world.write_resource::<MessageLog>().set_turn(turn);
        turn
    }

    /// Recomputes the player's field of view and returns the visible tiles.
    pub fn refresh_view(&mut self, map: &FloorMap) -> HashSet<Point> {
        self.specs_world.maintain();
        let context = MovementContext::from_map(map, self.player().position);
        self.specs_world.insert(context);
        FovSystem.run_now(&self.specs_world);
        self.specs_world.read_resource::<Viewshed>().visible.clone()
    }

    pub fn context(&self) -> PlayerContext<'_> {
        PlayerContext {
            player: self.specs_world.fetch_mut(),
            rng: self.specs_world.fetch_mut(),
            ids: self.specs_world.fetch_mut(),
            log: self.specs_world.fetch_mut(),
            sounds: self.specs_world.fetch_mut(),
            clock: self.specs_world.fetch(),
        }
    }

    pub fn player(&self) -> Fetch<'_, PlayerState> {
        self.specs_world.fetch()
    }

    pub fn player_mut(&self) -> FetchMut<'_, PlayerState> {
        self.specs_world.fetch_mut()
    }

    pub fn with_rng<R>(&self, f: impl FnOnce(&mut GameRng) -> R) -> R {
        let mut rng = self.specs_world.write_resource::<GameRng>();
        f(&mut rng)
    }

    pub fn mint_id(&self) -> ItemId {
        self.specs_world.write_resource::<ItemIdAllocator>().mint()
    }

    pub fn clock(&self) -> TurnClock {
        *self.specs_world.read_resource::<TurnClock>()
    }

    pub fn set_floor(&mut self, floor: u32) {
        self.specs_world.write_resource::<TurnClock>().floor = floor;
    }

    pub fn next_item_id(&self) -> u64 {
        self.specs_world.read_resource::<ItemIdAllocator>().peek()
    }

    pub fn rng_seed(&self) -> u64 {
        self.specs_world.read_resource::<GameRng>().seed()
    }

    pub fn log_entries(&self) -> Vec<LogEntry> {
        self.specs_world
            .read_resource::<MessageLog>()
            .entries()
            .cloned()
            .collect()
    }

    pub fn take_fresh_messages(&self) -> Vec<LogEntry> {
        self.specs_world.write_resource::<MessageLog>().take_fresh()
    }

    pub fn drain_sounds(&self) -> Vec<SoundEvent> {
        self.specs_world.write_resource::<SoundQueue>().drain()
    }

    pub(crate) fn specs(&self) -> &SpecsWorld {
        &self.specs_world
    }

    pub(crate) fn specs_mut(&mut self) -> &mut SpecsWorld {
        &mut self.specs_world
    }

    /// Deletes every entity of the current floor. Resources carry over.
    pub fn clear_floor(&mut self) {
        self.specs_world.delete_all();
        self.specs_world.maintain();
    }

    pub fn spawn_monster(&mut self, template: &MonsterTemplate, point: Point) -> Entity {
        let floor = self.clock().floor;
        let scaled = template.spawn_stats(floor);
        let (gold, regen_interval) = {
            let mut rng = self.specs_world.write_resource::<GameRng>();
            (rng.range(5, 25) + floor as i32 * 2, rng.range(4, 9) as u64)
        };
        let abilities = MonsterAbilities::from_template(template);
        let status = MonsterStatus {
            is_invisible: abilities.has_invisibility,
            regen_interval,
            ..MonsterStatus::default()
        };
        let thief = abilities.thief.is_some();
        debug!(name = template.name, x = point.x, y = point.y, "spawn monster");

        let builder = self
            .specs_world
            .create_entity()
            .with(Position { point })
            .with(Renderable {
                glyph: template.glyph,
                color: template.color,
                order: 1,
            })
            .with(Monster {
                name: template.name.to_string(),
                experience: scaled.experience,
                gold,
                alive: true,
            })
            .with(CombatStats {
                max_hp: scaled.hp,
                hp: scaled.hp,
                attack: scaled.attack,
                defense: scaled.defense,
            })
            .with(abilities)
            .with(status);
        if thief {
            builder.with(Loot::default()).build()
        } else {
            builder.build()
        }
    }

    pub fn spawn_ground_item(&mut self, item: ItemInstance, point: Point) -> Entity {
        self.specs_world
            .create_entity()
            .with(Position { point })
            .with(Renderable {
                glyph: item.glyph,
                color: item.color,
                order: 0,
            })
            .with(GroundItem { item })
            .build()
    }

    pub fn spawn_trap(&mut self, kind: TrapKind, point: Point) -> Entity {
        self.specs_world
            .create_entity()
            .with(Position { point })
            .with(Renderable {
                glyph: '^',
                color: TRAP_COLOR,
                order: 0,
            })
            .with(Trap {
                kind,
                triggered: false,
                visible: false,
            })
            .build()
    }

    pub fn spawn_merchant(&mut self, merchant: Merchant, point: Point, glyph: char) -> Entity {
        self.specs_world
            .create_entity()
            .with(Position { point })
            .with(Renderable {
                glyph,
                color: MERCHANT_COLOR,
                order: 1,
            })
            .with(merchant)
            .build()
    }

    pub fn spawn_projectile(&mut self, point: Point, projectile: Projectile) -> Entity {
        self.specs_world
            .create_entity()
            .with(Position { point })
            .with(Renderable {
                glyph: '*',
                color: PROJECTILE_COLOR,
                order: 2,
            })
            .with(projectile)
            .build()
    }

    pub fn living_monster_at(&self, point: Point) -> Option<Entity> {
        let entities = self.specs_world.entities();
        let positions = self.specs_world.read_storage::<Position>();
        let monsters = self.specs_world.read_storage::<Monster>();
        (&entities, &positions, &monsters)
            .join()
            .find(|(_, pos, monster)| monster.alive && pos.point == point)
            .map(|(entity, _, _)| entity)
    }

    /// Index of the merchant standing on `point`, counted in entity order.
    pub fn merchant_at(&self, point: Point) -> Option<usize> {
        let positions = self.specs_world.read_storage::<Position>();
        let merchants = self.specs_world.read_storage::<Merchant>();
        (&positions, &merchants)
            .join()
            .position(|(pos, _)| pos.point == point)
    }

    pub fn merchant(&self, index: usize) -> Option<Merchant> {
        let merchants = self.specs_world.read_storage::<Merchant>();
        merchants.join().nth(index).cloned()
    }

    /// Removes one offer from a merchant's stock.
    pub fn take_offer(&mut self, merchant: usize, offer: usize) -> Option<ItemInstance> {
        let mut merchants = self.specs_world.write_storage::<Merchant>();
        let stock = &mut (&mut merchants).join().nth(merchant)?.stock;
        if offer >= stock.len() {
            return None;
        }
        Some(stock.remove(offer))
    }

    /// Tiles a step may not enter: living monsters and merchants.
    pub fn is_occupied(&self, point: Point) -> bool {
        let positions = self.specs_world.read_storage::<Position>();
        let merchants = self.specs_world.read_storage::<Merchant>();
        self.living_monster_at(point).is_some()
            || (&positions, &merchants)
                .join()
                .any(|(pos, _)| pos.point == point)
    }

    pub fn take_ground_item_at(&mut self, point: Point) -> Option<ItemInstance> {
        let found = {
            let entities = self.specs_world.entities();
            let positions = self.specs_world.read_storage::<Position>();
            let items = self.specs_world.read_storage::<GroundItem>();
            (&entities, &positions, &items)
                .join()
                .find(|(_, pos, _)| pos.point == point)
                .map(|(entity, _, ground)| (entity, ground.item.clone()))
        };
        let (entity, item) = found?;
        if let Err(err) = self.specs_world.delete_entity(entity) {
            warn!(?err, "ground item vanished before pickup");
        }
        Some(item)
    }

    /// An untriggered trap on `point`, marked as triggered and revealed.
    pub fn spring_trap_at(&mut self, point: Point) -> Option<TrapKind> {
        let positions = self.specs_world.read_storage::<Position>();
        let mut traps = self.specs_world.write_storage::<Trap>();
        let (_, trap) = (&positions, &mut traps)
            .join()
            .find(|(pos, trap)| pos.point == point && !trap.triggered)?;
        trap.triggered = true;
        trap.visible = true;
        Some(trap.kind)
    }

    /// Player melee. A kill pays out immediately; dropped loot appears at the
    /// next maintain.
    pub fn player_attack(&self, target: Entity, ctx: &mut PlayerContext) {
        let entities = self.specs_world.entities();
        let lazy = self.specs_world.read_resource::<LazyUpdate>();
        let positions = self.specs_world.read_storage::<Position>();
        let mut monsters = self.specs_world.write_storage::<Monster>();
        let mut stats = self.specs_world.write_storage::<CombatStats>();
        let mut loots = self.specs_world.write_storage::<Loot>();

        let (Some(monster), Some(stat), Some(pos)) = (
            monsters.get_mut(target),
            stats.get_mut(target),
            positions.get(target),
        ) else {
            warn!(?target, "attack target has no combat data");
            return;
        };

        let outcome = resolve_attack(&*ctx.player, stat, &mut ctx.rng);
        ctx.sounds.push(SoundEvent::SwordHit);
        ctx.log.push_with(
            MessageKey::PlayerHits,
            MessageCategory::Combat,
            params([
                ("monster", monster.name.clone()),
                ("damage", outcome.damage.to_string()),
            ]),
        );
        if outcome.defender_died {
            settle_kill(
                monster,
                pos.point,
                loots.get_mut(target),
                &mut ctx.player,
                &mut ctx.rng,
                &mut ctx.ids,
                &mut ctx.log,
                &mut ctx.sounds,
                &entities,
                &lazy,
            );
        }
    }

    /// Applies `effect` to every living monster within Manhattan `radius` of
    /// `origin` and returns how many were touched.
    pub fn affect_monsters_within<F>(&self, origin: Point, radius: i32, mut effect: F) -> usize
    where
        F: FnMut(&mut MonsterStatus),
    {
        let positions = self.specs_world.read_storage::<Position>();
        let monsters = self.specs_world.read_storage::<Monster>();
        let mut statuses = self.specs_world.write_storage::<MonsterStatus>();
        let mut touched = 0;
        for (pos, monster, status) in (&positions, &monsters, &mut statuses).join() {
            if monster.alive && ai::manhattan(pos.point, origin) <= radius {
                effect(status);
                touched += 1;
            }
        }
        touched
    }

    /// Wakes every living monster and turns it hostile for a while.
    pub fn rouse_all(&self, rng: &mut GameRng) {
        let monsters = self.specs_world.read_storage::<Monster>();
        let mut abilities = self.specs_world.write_storage::<MonsterAbilities>();
        let mut statuses = self.specs_world.write_storage::<MonsterStatus>();
        for (monster, ability, status) in (&monsters, &mut abilities, &mut statuses).join() {
            if !monster.alive {
                continue;
            }
            ability.is_mean = true;
            status.sleeping = 0;
            status.aggravated = rng.range(50, 100) as u32;
        }
    }

    pub fn living_monster_count(&self) -> usize {
        let monsters = self.specs_world.read_storage::<Monster>();
        monsters.join().filter(|monster| monster.alive).count()
    }
}
