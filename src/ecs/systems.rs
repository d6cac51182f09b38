use std::collections::HashSet;

use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::{Algorithm2D, BaseMap, DistanceAlg, field_of_view};
use smallvec::SmallVec;
use specs::prelude::*;
use specs::world::EntitiesRes;
use tracing::debug;

use super::{
    components::{
        CombatStats, GroundItem, Loot, Merchant, Monster, MonsterAbilities, MonsterStatus,
        Position, Projectile, Renderable,
    },
    resources::{ItemIdAllocator, MessageLog, MovementContext, SoundQueue, TurnClock, Viewshed},
};
use crate::{
    ai::{self, MonsterAction, Surroundings},
    combat::{OnHit, resolve_attack, roll_on_hit},
    hooks::SoundEvent,
    player::{DeathReport, PlayerState},
    progression,
    rng::GameRng,
    status::{StatusKind, tick_player_status},
    text::{MessageCategory, MessageKey, params},
};

/// Marks a monster dead, pays the player and drops whatever it had stolen on
/// the corpse tile under fresh ids.
#[allow(clippy::too_many_arguments)]
pub(crate) fn settle_kill(
    monster: &mut Monster,
    point: Point,
    loot: Option<&mut Loot>,
    player: &mut PlayerState,
    rng: &mut GameRng,
    ids: &mut ItemIdAllocator,
    log: &mut MessageLog,
    sounds: &mut SoundQueue,
    entities: &EntitiesRes,
    lazy: &LazyUpdate,
) {
    monster.alive = false;
    sounds.push(SoundEvent::EnemyDeath);
    log.push_with(
        MessageKey::MonsterDies,
        MessageCategory::Combat,
        params([("monster", monster.name.clone())]),
    );
    let gains = progression::award_kill(player, monster.experience, monster.gold, rng);
    progression::announce(&gains, log, sounds);

    let Some(loot) = loot else {
        return;
    };
    if loot.items.is_empty() {
        return;
    }
    for item in loot.items.drain(..) {
        let item = item.relocated(ids.mint());
        lazy.create_entity(entities)
            .with(Position { point })
            .with(Renderable {
                glyph: item.glyph,
                color: item.color,
                order: 0,
            })
            .with(GroundItem { item })
            .build();
    }
    log.push_with(
        MessageKey::LootDropped,
        MessageCategory::Item,
        params([("monster", monster.name.clone())]),
    );
}

pub(crate) fn record_death(
    player: &mut PlayerState,
    cause: &str,
    clock: &TurnClock,
    log: &mut MessageLog,
    sounds: &mut SoundQueue,
) {
    if player.death.is_some() {
        return;
    }
    let score = progression::final_score(player, clock.floor, clock.turn);
    player.hp = 0;
    player.death = Some(DeathReport {
        cause: cause.to_string(),
        floor: clock.floor,
        turn: clock.turn,
        score,
    });
    sounds.push(SoundEvent::Death);
    log.push(MessageKey::PlayerDies, MessageCategory::Combat);
    log.push_with(
        MessageKey::KilledBy,
        MessageCategory::Combat,
        params([
            ("cause", cause.to_string()),
            ("floor", clock.floor.to_string()),
            ("score", score.to_string()),
        ]),
    );
    debug!(cause, floor = clock.floor, turn = clock.turn, score, "player died");
}

/// Whether the player notices a monster well enough to be told about it.
pub(crate) fn is_noticed(
    point: Point,
    status: &MonsterStatus,
    player: &PlayerState,
    rng: &mut GameRng,
) -> bool {
    let distance = ai::manhattan(point, player.position);
    if status.is_invisible && !player.status.has(StatusKind::SeeInvisible) {
        return distance <= 1 && rng.percent(30);
    }
    distance <= 8
}

#[derive(Default)]
pub struct ProjectileSystem;

impl<'a> System<'a> for ProjectileSystem {
    type SystemData = (
        Entities<'a>,
        WriteStorage<'a, Position>,
        WriteStorage<'a, Projectile>,
        WriteStorage<'a, Monster>,
        WriteStorage<'a, CombatStats>,
        WriteStorage<'a, Loot>,
        ReadExpect<'a, MovementContext>,
        WriteExpect<'a, PlayerState>,
        WriteExpect<'a, GameRng>,
        WriteExpect<'a, ItemIdAllocator>,
        WriteExpect<'a, MessageLog>,
        WriteExpect<'a, SoundQueue>,
        Read<'a, LazyUpdate>,
    );

    fn run(
        &mut self,
        (
            entities,
            mut positions,
            mut projectiles,
            mut monsters,
            mut stats,
            mut loots,
            movement,
            mut player,
            mut rng,
            mut ids,
            mut log,
            mut sounds,
            lazy,
        ): Self::SystemData,
    ) {
        let in_flight: Vec<(Entity, Point, Projectile)> = (&entities, &positions, &projectiles)
            .join()
            .map(|(entity, pos, projectile)| (entity, pos.point, *projectile))
            .collect();

        for (entity, point, projectile) in in_flight {
            let next = point + projectile.direction;
            if !movement.is_passable(next, true) {
                let _ = entities.delete(entity);
                continue;
            }

            let target = (&entities, &positions, &monsters)
                .join()
                .find(|(_, pos, monster)| monster.alive && pos.point == next)
                .map(|(target, _, _)| target);

            if let Some(target) = target {
                if let (Some(stat), Some(monster)) = (stats.get_mut(target), monsters.get_mut(target)) {
                    stat.hp -= projectile.damage;
                    sounds.push(SoundEvent::Magic);
                    log.push_with(
                        MessageKey::ProjectileHits,
                        MessageCategory::Combat,
                        params([
                            ("monster", monster.name.clone()),
                            ("damage", projectile.damage.to_string()),
                        ]),
                    );
                    if stat.hp <= 0 {
                        settle_kill(
                            monster,
                            next,
                            loots.get_mut(target),
                            &mut player,
                            &mut rng,
                            &mut ids,
                            &mut log,
                            &mut sounds,
                            &entities,
                            &lazy,
                        );
                    }
                }
                let _ = entities.delete(entity);
                continue;
            }

            if let Some(pos) = positions.get_mut(entity) {
                pos.point = next;
            }
            let spent = projectiles.get_mut(entity).map(|projectile| {
                projectile.range -= 1;
                projectile.range <= 0
            });
            if spent.unwrap_or(true) {
                let _ = entities.delete(entity);
            }
        }
    }
}

#[derive(Default)]
pub struct PlayerStatusSystem;

impl<'a> System<'a> for PlayerStatusSystem {
    type SystemData = (
        WriteExpect<'a, PlayerState>,
        WriteExpect<'a, GameRng>,
        WriteExpect<'a, MessageLog>,
        WriteExpect<'a, SoundQueue>,
    );

    fn run(&mut self, (mut player, mut rng, mut log, mut sounds): Self::SystemData) {
        if player.is_dead() {
            return;
        }
        tick_player_status(&mut player, &mut rng, &mut log, &mut sounds);
    }
}

#[derive(Default)]
pub struct MonsterAbilitySystem;

impl<'a> System<'a> for MonsterAbilitySystem {
    type SystemData = (
        ReadStorage<'a, Monster>,
        ReadStorage<'a, MonsterAbilities>,
        WriteStorage<'a, MonsterStatus>,
        WriteStorage<'a, CombatStats>,
        ReadStorage<'a, Position>,
        ReadExpect<'a, TurnClock>,
        ReadExpect<'a, PlayerState>,
        WriteExpect<'a, GameRng>,
        WriteExpect<'a, MessageLog>,
    );

    fn run(
        &mut self,
        (monsters, abilities, mut statuses, mut stats, positions, clock, player, mut rng, mut log): Self::SystemData,
    ) {
        for (monster, ability, status, stat, pos) in
            (&monsters, &abilities, &mut statuses, &mut stats, &positions).join()
        {
            if !monster.alive {
                continue;
            }

            if ability.can_regenerate
                && stat.hp < stat.max_hp
                && clock.turn.saturating_sub(status.last_regen_turn) >= status.regen_interval
            {
                stat.hp = (stat.hp + (stat.max_hp / 10).max(1)).min(stat.max_hp);
                status.last_regen_turn = clock.turn;
                status.regen_interval = rng.range(4, 9) as u64;
                if is_noticed(pos.point, status, &player, &mut rng) {
                    log.push_with(
                        MessageKey::MonsterRegenerates,
                        MessageCategory::Combat,
                        params([("monster", monster.name.clone())]),
                    );
                }
            }

            if ability.has_invisibility && rng.percent(5) {
                status.is_invisible = !status.is_invisible;
                if !status.is_invisible && is_noticed(pos.point, status, &player, &mut rng) {
                    log.push_with(
                        MessageKey::MonsterAppears,
                        MessageCategory::Combat,
                        params([("monster", monster.name.clone())]),
                    );
                }
            }

            status.enraged = ability.is_mean && stat.hp * 2 < stat.max_hp;
            status.aggravated = status.aggravated.saturating_sub(1);
        }
    }
}

#[derive(Default)]
pub struct MonsterAiSystem;

impl<'a> System<'a> for MonsterAiSystem {
    type SystemData = (
        Entities<'a>,
        WriteStorage<'a, Position>,
        ReadStorage<'a, Monster>,
        ReadStorage<'a, MonsterAbilities>,
        WriteStorage<'a, MonsterStatus>,
        ReadStorage<'a, CombatStats>,
        WriteStorage<'a, Loot>,
        ReadStorage<'a, Merchant>,
        ReadExpect<'a, MovementContext>,
        ReadExpect<'a, TurnClock>,
        WriteExpect<'a, PlayerState>,
        WriteExpect<'a, GameRng>,
        WriteExpect<'a, ItemIdAllocator>,
        WriteExpect<'a, MessageLog>,
        WriteExpect<'a, SoundQueue>,
    );

    fn run(
        &mut self,
        (
            entities,
            mut positions,
            monsters,
            abilities,
            mut statuses,
            stats,
            mut loots,
            merchants,
            movement,
            clock,
            mut player,
            mut rng,
            mut ids,
            mut log,
            mut sounds,
        ): Self::SystemData,
    ) {
        if player.is_dead() {
            return;
        }

        let mut occupied: HashSet<Point> = (&positions, &monsters)
            .join()
            .filter(|(_, monster)| monster.alive)
            .map(|(pos, _)| pos.point)
            .chain((&positions, &merchants).join().map(|(pos, _)| pos.point))
            .collect();

        let order: Vec<Entity> = (&entities, &monsters)
            .join()
            .filter(|(_, monster)| monster.alive)
            .map(|(entity, _)| entity)
            .collect();

        for entity in order {
            if player.is_dead() {
                break;
            }
            let (Some(monster), Some(ability), Some(stat)) =
                (monsters.get(entity), abilities.get(entity), stats.get(entity))
            else {
                continue;
            };
            let Some(point) = positions.get(entity).map(|pos| pos.point) else {
                continue;
            };
            let Some(status) = statuses.get_mut(entity) else {
                continue;
            };

            let turn = {
                let around = Surroundings {
                    map: &movement,
                    player: player.position,
                    occupied: &occupied,
                };
                ai::monster_turn(point, ability, status, &around, &mut rng)
            };

            if turn.woke {
                log.push_with(
                    MessageKey::MonsterWakes,
                    MessageCategory::Combat,
                    params([("monster", monster.name.clone())]),
                );
            }

            let mut destination = None;
            match turn.action {
                MonsterAction::Idle => {}
                MonsterAction::Step(to) => destination = Some(to),
                MonsterAction::Attack => {
                    let outcome = resolve_attack(stat, &mut *player, &mut rng);
                    sounds.push(SoundEvent::Hurt);
                    log.push_with(
                        MessageKey::MonsterHits,
                        MessageCategory::Combat,
                        params([
                            ("monster", monster.name.clone()),
                            ("damage", outcome.damage.to_string()),
                        ]),
                    );
                    if outcome.defender_died {
                        record_death(&mut player, &monster.name, &clock, &mut log, &mut sounds);
                        break;
                    }
                    let effects: SmallVec<[OnHit; 4]> =
                        roll_on_hit(&ability.on_hit, &mut player, &mut rng);
                    for effect in &effects {
                        sounds.push(effect.sound());
                        let mut message = params([("monster", monster.name.clone())]);
                        if let OnHit::StoleGold(amount) | OnHit::Drained(amount) = effect {
                            message.insert("amount".to_string(), amount.to_string());
                        }
                        log.push_with(effect.message(), MessageCategory::Combat, message);
                    }
                    if effects.iter().any(|effect| effect.is_theft()) {
                        let around = Surroundings {
                            map: &movement,
                            player: player.position,
                            occupied: &occupied,
                        };
                        destination = ai::flee_step(point, ability.can_fly, &around);
                    }
                }
                MonsterAction::Steal => {
                    let Some(idx) = rng.index(player.inventory.len()) else {
                        log.push_with(
                            MessageKey::TheftNothing,
                            MessageCategory::Combat,
                            params([("monster", monster.name.clone())]),
                        );
                        continue;
                    };
                    let stolen = player.inventory.remove(idx);
                    sounds.push(SoundEvent::Steal);
                    log.push_with(
                        MessageKey::TheftItem,
                        MessageCategory::Combat,
                        params([
                            ("monster", monster.name.clone()),
                            ("item", stolen.name.clone()),
                        ]),
                    );
                    let stolen = stolen.relocated(ids.mint());
                    match loots.get_mut(entity) {
                        Some(loot) => loot.items.push(stolen),
                        None => {
                            let _ = loots.insert(
                                entity,
                                Loot {
                                    items: vec![stolen],
                                },
                            );
                        }
                    }
                    let around = Surroundings {
                        map: &movement,
                        player: player.position,
                        occupied: &occupied,
                    };
                    destination = ai::flee_step(point, ability.can_fly, &around);
                }
            }

            if let Some(to) = destination {
                occupied.remove(&point);
                occupied.insert(to);
                if let Some(pos) = positions.get_mut(entity) {
                    pos.point = to;
                }
            }
        }
    }
}

/// Recomputes the player's viewshed. Run after the turn counter moves.
#[derive(Default)]
pub struct FovSystem;

impl<'a> System<'a> for FovSystem {
    type SystemData = (
        ReadExpect<'a, MovementContext>,
        ReadExpect<'a, PlayerState>,
        WriteExpect<'a, Viewshed>,
    );

    fn run(&mut self, (movement, player, mut viewshed): Self::SystemData) {
        let map = MovementFov { ctx: &movement };
        let radius = if player.status.has(StatusKind::Blind) {
            1
        } else {
            viewshed.radius
        };
        viewshed.visible = field_of_view(player.position, radius, &map)
            .into_iter()
            .filter(|point| movement.in_bounds(*point))
            .collect();
    }
}

struct MovementFov<'a> {
    ctx: &'a MovementContext,
}

impl<'a> BaseMap for MovementFov<'a> {
    fn is_opaque(&self, idx: usize) -> bool {
        let point = self.index_to_point2d(idx);
        self.ctx.blocks_sight(point)
    }

    fn get_available_exits(&self, idx: usize) -> SmallVec<[(usize, f32); 10]> {
        let mut exits = SmallVec::new();
        let point = self.index_to_point2d(idx);
        for dir in ai::ORTHOGONAL {
            let dest = point + dir;
            if self.in_bounds(dest) && self.ctx.is_walkable(dest) {
                exits.push((self.point2d_to_index(dest), 1.0));
            }
        }
        exits
    }

    fn get_pathing_distance(&self, idx1: usize, idx2: usize) -> f32 {
        let p1 = self.index_to_point2d(idx1);
        let p2 = self.index_to_point2d(idx2);
        DistanceAlg::Pythagoras.distance2d(p1, p2)
    }
}

impl<'a> Algorithm2D for MovementFov<'a> {
    fn dimensions(&self) -> Point {
        Point::new(self.ctx.width, self.ctx.height)
    }

    fn in_bounds(&self, point: Point) -> bool {
        self.ctx.in_bounds(point)
    }
}
