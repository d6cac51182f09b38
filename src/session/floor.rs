use bracket_geometry::prelude::Point;
use tracing::{debug, info};

use super::Session;
use crate::{
    data::{
        items::{ItemTemplate, SHOP_ITEMS},
        monsters::MonsterTemplate,
    },
    ecs::components::{Merchant, TrapKind},
    hooks::{GameHooks, SoundEvent},
    map::{GeneratedFloor, TileKind, generate},
    text::{MessageCategory, MessageKey, params},
};

const TRAP_KINDS: [TrapKind; 3] = [TrapKind::Damage, TrapKind::Teleport, TrapKind::Alarm];
const SHOP_STOCK: usize = 4;
const MERCHANT_GLYPH: char = '&';

impl<H: GameHooks> Session<H> {
    /// Generates and populates `floor`, then puts the player on its start tile.
    pub(crate) fn enter_floor(&mut self, floor: u32) {
        self.ecs.set_floor(floor);
        let generated = self
            .ecs
            .with_rng(|rng| generate(floor, rng, &self.config));
        self.ecs.player_mut().position = generated.start;
        self.populate(floor, &generated);

        let GeneratedFloor {
            map,
            rooms,
            shop_room,
            ..
        } = generated;
        self.map = map;
        self.rooms = rooms;
        self.shop_room = shop_room;
    }

    /// Stairs: clear the old floor, build the next one and announce it.
    pub(crate) fn descend(&mut self) {
        let floor = self.ecs.clock().floor + 1;
        self.ecs.clear_floor();
        self.enter_floor(floor);
        let mut ctx = self.ecs.context();
        ctx.sounds.push(SoundEvent::Stairs);
        ctx.log.push_with(
            MessageKey::Descend,
            MessageCategory::System,
            params([("floor", floor.to_string())]),
        );
        info!(floor, "descended");
    }

    fn populate(&mut self, floor: u32, generated: &GeneratedFloor) {
        for site in &generated.trap_sites {
            let kind = self
                .ecs
                .with_rng(|rng| rng.pick(&TRAP_KINDS).copied())
                .unwrap_or(TrapKind::Damage);
            self.ecs.spawn_trap(kind, *site);
        }

        if let Some(room) = generated.shop_room.and_then(|idx| generated.rooms.get(idx)) {
            let stock = (0..SHOP_STOCK)
                .filter_map(|_| self.ecs.with_rng(|rng| rng.pick(&SHOP_ITEMS)))
                .map(|template| {
                    let mut item = template.instantiate(self.ecs.mint_id());
                    item.price = template.base_price + floor as i32 * 5;
                    item
                })
                .collect();
            self.ecs.spawn_merchant(
                Merchant {
                    name: "The merchant".to_string(),
                    stock,
                },
                room.center(),
                MERCHANT_GLYPH,
            );
        }

        let templates = MonsterTemplate::for_floor(floor);
        let per_room_cap = (2 + floor as i32 / 3).min(4);
        for (idx, room) in generated.rooms.iter().enumerate() {
            if idx == 0 || generated.shop_room == Some(idx) {
                continue;
            }
            let count = self.ecs.with_rng(|rng| rng.range(1, per_room_cap));
            for _ in 0..count {
                let (point, template) = self.ecs.with_rng(|rng| {
                    (room.interior_point(rng), rng.pick(&templates).copied())
                });
                let Some(template) = template else {
                    continue;
                };
                if !self.is_free_floor(generated.map.tile(point), point, generated.start) {
                    continue;
                }
                self.ecs.spawn_monster(template, point);
            }
        }

        for (idx, room) in generated.rooms.iter().enumerate() {
            if generated.shop_room == Some(idx) {
                continue;
            }
            let roll = self.ecs.with_rng(|rng| {
                rng.percent(self.config.item_chance_percent)
                    .then(|| (room.interior_point(rng), ItemTemplate::random_floor_item(rng)))
            });
            let Some((point, template)) = roll else {
                continue;
            };
            if generated.map.tile(point) != TileKind::Floor {
                continue;
            }
            let item = template.instantiate(self.ecs.mint_id());
            self.ecs.spawn_ground_item(item, point);
        }

        debug!(
            floor,
            monsters = self.ecs.living_monster_count(),
            traps = generated.trap_sites.len(),
            "populated floor"
        );
    }

    fn is_free_floor(&self, tile: TileKind, point: Point, start: Point) -> bool {
        tile == TileKind::Floor && point != start && !self.ecs.is_occupied(point)
    }
}
