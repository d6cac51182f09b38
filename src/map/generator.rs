use bracket_geometry::prelude::Point;
use tracing::debug;

use super::{FloorMap, Room, TileKind, corridor_path};
use crate::{config::GameConfig, rng::GameRng};

/// A freshly carved floor before anything is placed on it.
#[derive(Clone, Debug)]
pub struct GeneratedFloor {
    pub map: FloorMap,
    pub rooms: Vec<Room>,
    pub shop_room: Option<usize>,
    pub start: Point,
    pub stairs: Point,
    pub trap_sites: Vec<Point>,
}

pub fn generate(floor: u32, rng: &mut GameRng, config: &GameConfig) -> GeneratedFloor {
    let width = config.map_width;
    let height = config.map_height;
    let mut map = FloorMap::new(width, height);
    let mut rooms: Vec<Room> = Vec::new();

    let attempts = rng.range(config.room_attempts_min, config.room_attempts_max);
    for _ in 0..attempts {
        let room_w = rng.range(config.room_size_min, config.room_size_max);
        let room_h = rng.range(config.room_size_min, config.room_size_max);
        let x = rng.range(1, width - room_w - 1);
        let y = rng.range(1, height - room_h - 1);
        let candidate = Room::new(x, y, room_w, room_h);

        if rooms
            .iter()
            .any(|room| room.rect().intersect(&candidate.rect()))
        {
            continue;
        }
        map.carve_room(&candidate);
        rooms.push(candidate);
    }

    if rooms.is_empty() {
        let room_w = config.room_size_max.min(width - 2);
        let room_h = config.room_size_max.min(height - 2);
        let fallback = Room::new((width - room_w) / 2, (height - room_h) / 2, room_w, room_h);
        debug!(floor, "no rooms accepted, carving fallback room");
        map.carve_room(&fallback);
        rooms.push(fallback);
    }

    for pair in rooms.windows(2) {
        let path = corridor_path(pair[0].center(), pair[1].center());
        map.carve_path(&path);
    }

    let mut shop_room = None;
    if floor > 1 && rooms.len() >= 3 && rng.percent(config.shop_chance_percent) {
        let idx = rng.range(1, rooms.len() as i32 - 1) as usize;
        rooms[idx].is_shop = true;
        shop_room = Some(idx);
    }

    let stairs = rooms
        .iter()
        .rev()
        .find(|room| !room.is_shop)
        .map(Room::center)
        .unwrap_or_else(|| rooms[0].center());
    map.set_tile(stairs, TileKind::Stairs);

    let start = start_point(&rooms[0], stairs, &map);

    let trap_sites: Vec<Point> = map
        .floor_points()
        .into_iter()
        .filter(|point| *point != start)
        .filter(|point| shop_room.map_or(true, |idx| !rooms[idx].contains(*point)))
        .filter(|_| rng.percent(config.trap_density_percent))
        .collect();

    debug!(
        floor,
        rooms = rooms.len(),
        shop = shop_room.is_some(),
        traps = trap_sites.len(),
        "generated floor"
    );

    GeneratedFloor {
        map,
        rooms,
        shop_room,
        start,
        stairs,
        trap_sites,
    }
}

fn start_point(first: &Room, stairs: Point, map: &FloorMap) -> Point {
    let center = first.center();
    if center != stairs {
        return center;
    }
    let mut alternative = None;
    first.rect().for_each(|point| {
        if alternative.is_none() && map.tile(point) == TileKind::Floor {
            alternative = Some(point);
        }
    });
    alternative.unwrap_or(center)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_floor_tile_is_reachable_from_start() {
        let config = GameConfig::default();
        for seed in 0..40 {
            let mut rng = GameRng::seeded(seed);
            let floor = generate(1 + (seed as u32 % 6), &mut rng, &config);
            assert!(
                floor.map.unreachable_floor_tiles(floor.start).is_empty(),
                "seed {seed} left unreachable tiles"
            );
        }
    }

    #[test]
    fn rooms_never_overlap_and_stairs_sit_in_last_room() {
        let config = GameConfig::default();
        for seed in 0..40 {
            let mut rng = GameRng::seeded(seed);
            let floor = generate(3, &mut rng, &config);
            for (i, a) in floor.rooms.iter().enumerate() {
                for b in floor.rooms.iter().skip(i + 1) {
                    assert!(!a.rect().intersect(&b.rect()));
                }
            }
            let last = floor.rooms.iter().rev().find(|room| !room.is_shop).expect("room");
            assert_eq!(floor.stairs, last.center());
            assert_eq!(floor.map.tile(floor.stairs), TileKind::Stairs);
            assert_ne!(floor.start, floor.stairs);
        }
    }

    #[test]
    fn first_floor_never_has_a_shop() {
        let config = GameConfig {
            shop_chance_percent: 100,
            ..GameConfig::default()
        };
        let mut rng = GameRng::seeded(12);
        assert!(generate(1, &mut rng, &config).shop_room.is_none());
    }

    #[test]
    fn shop_is_never_first_or_last_and_has_no_traps() {
        let config = GameConfig {
            shop_chance_percent: 100,
            trap_density_percent: 100,
            ..GameConfig::default()
        };
        for seed in 0..20 {
            let mut rng = GameRng::seeded(seed);
            let floor = generate(4, &mut rng, &config);
            if let Some(idx) = floor.shop_room {
                assert!(idx > 0 && idx < floor.rooms.len() - 1);
                let shop = floor.rooms[idx];
                assert!(floor.trap_sites.iter().all(|p| !shop.contains(*p)));
            } else {
                assert!(floor.rooms.len() < 3);
            }
            assert!(!floor.trap_sites.contains(&floor.start));
            assert!(!floor.trap_sites.contains(&floor.stairs));
        }
    }

    #[test]
    fn cramped_map_still_yields_a_walkable_start() {
        let config = GameConfig {
            map_width: 12,
            map_height: 12,
            room_size_min: 4,
            room_size_max: 8,
            room_attempts_min: 1,
            room_attempts_max: 2,
            ..GameConfig::default()
        };
        let mut rng = GameRng::seeded(3);
        let floor = generate(1, &mut rng, &config);
        assert!(!floor.rooms.is_empty());
        assert!(floor.map.is_walkable(floor.start));
        assert_ne!(floor.start, floor.stairs);
    }
}
