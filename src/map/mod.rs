pub mod generator;

use bracket_geometry::prelude::{Point, Rect};
use bracket_pathfinding::prelude::{Algorithm2D, BaseMap, DijkstraMap, DistanceAlg};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::rng::GameRng;

pub use generator::{GeneratedFloor, generate};

/// Serde shim for bracket-geometry's `Point`.
#[derive(Serialize, Deserialize)]
#[serde(remote = "Point")]
pub struct PointDef {
    pub x: i32,
    pub y: i32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Wall,
    Floor,
    Stairs,
}

impl TileKind {
    pub fn glyph(self) -> char {
        match self {
            TileKind::Wall => '#',
            TileKind::Floor => '.',
            TileKind::Stairs => '%',
        }
    }

    pub fn is_walkable(self) -> bool {
        matches!(self, TileKind::Floor | TileKind::Stairs)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub is_shop: bool,
}

impl Room {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            is_shop: false,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::with_size(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    /// Random tile that is not on the room's outer ring.
    pub fn interior_point(&self, rng: &mut GameRng) -> Point {
        Point::new(
            rng.range(self.x + 1, self.x + self.width - 1),
            rng.range(self.y + 1, self.y + self.height - 1),
        )
    }
}

pub(crate) fn corridor_path(start: Point, end: Point) -> Vec<Point> {
    let mut path = Vec::new();
    let mut cursor = start;
    path.push(cursor);

    while cursor.x != end.x {
        cursor.x += if end.x > cursor.x { 1 } else { -1 };
        path.push(cursor);
    }

    while cursor.y != end.y {
        cursor.y += if end.y > cursor.y { 1 } else { -1 };
        path.push(cursor);
    }

    path
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloorMap {
    pub width: i32,
    pub height: i32,
    tiles: Vec<TileKind>,
    revealed: Vec<bool>,
}

impl FloorMap {
    pub fn new(width: i32, height: i32) -> Self {
        let size = (width.max(0) * height.max(0)) as usize;
        Self {
            width,
            height,
            tiles: vec![TileKind::Wall; size],
            revealed: vec![false; size],
        }
    }

    /// Builds a map from text rows: `#` wall, `.` floor, `%` or `>` stairs.
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0) as i32;
        let mut map = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let kind = match ch {
                    '.' => TileKind::Floor,
                    '%' | '>' => TileKind::Stairs,
                    _ => TileKind::Wall,
                };
                map.set_tile(Point::new(x as i32, y as i32), kind);
            }
        }
        map
    }

    fn idx(&self, point: Point) -> Option<usize> {
        if self.in_bounds(point) {
            Some((point.y * self.width + point.x) as usize)
        } else {
            None
        }
    }

    /// True when the tile and reveal grids match the declared size.
    pub fn is_consistent(&self) -> bool {
        let size = (self.width.max(0) * self.height.max(0)) as usize;
        self.tiles.len() == size && self.revealed.len() == size
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height
    }

    pub fn tile(&self, point: Point) -> TileKind {
        self.idx(point)
            .map(|idx| self.tiles[idx])
            .unwrap_or(TileKind::Wall)
    }

    pub fn set_tile(&mut self, point: Point, kind: TileKind) {
        if let Some(idx) = self.idx(point) {
            self.tiles[idx] = kind;
        }
    }

    pub fn is_walkable(&self, point: Point) -> bool {
        self.tile(point).is_walkable()
    }

    /// Flying monsters cross anything that is not solid rock.
    pub fn is_passable(&self, point: Point, can_fly: bool) -> bool {
        if can_fly {
            self.in_bounds(point) && self.tile(point) != TileKind::Wall
        } else {
            self.is_walkable(point)
        }
    }

    pub fn carve_room(&mut self, room: &Room) {
        room.rect().for_each(|point| self.set_tile(point, TileKind::Floor));
    }

    pub fn carve_path(&mut self, path: &[Point]) {
        for &point in path {
            if self.tile(point) == TileKind::Wall {
                self.set_tile(point, TileKind::Floor);
            }
        }
    }

    pub fn reveal(&mut self, point: Point) {
        if let Some(idx) = self.idx(point) {
            self.revealed[idx] = true;
        }
    }

    pub fn reveal_all(&mut self) {
        self.revealed.iter_mut().for_each(|seen| *seen = true);
    }

    pub fn is_revealed(&self, point: Point) -> bool {
        self.idx(point).map(|idx| self.revealed[idx]).unwrap_or(false)
    }

    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Point::new(x, y)))
    }

    pub fn floor_points(&self) -> Vec<Point> {
        self.points()
            .filter(|point| self.tile(*point) == TileKind::Floor)
            .collect()
    }

    pub fn first_walkable(&self) -> Option<Point> {
        self.points().find(|point| self.tile(*point) == TileKind::Floor)
    }

    /// Walkable tiles that cannot be reached from `start` moving orthogonally.
    pub fn unreachable_floor_tiles(&self, start: Point) -> Vec<Point> {
        let Some(start_idx) = self.idx(start) else {
            return self.points().filter(|p| self.is_walkable(*p)).collect();
        };
        let max_depth = (self.width * self.height) as f32;
        let flood = DijkstraMap::new(self.width, self.height, &[start_idx], self, max_depth);
        self.points()
            .filter(|point| self.is_walkable(*point))
            .filter(|point| {
                self.idx(*point)
                    .map(|idx| flood.map[idx] == f32::MAX)
                    .unwrap_or(true)
            })
            .collect()
    }
}

impl BaseMap for FloorMap {
    fn is_opaque(&self, idx: usize) -> bool {
        self.tiles
            .get(idx)
            .map(|kind| *kind == TileKind::Wall)
            .unwrap_or(true)
    }

    fn get_available_exits(&self, idx: usize) -> SmallVec<[(usize, f32); 10]> {
        let mut exits = SmallVec::new();
        let point = self.index_to_point2d(idx);
        let steps = [
            Point::new(1, 0),
            Point::new(-1, 0),
            Point::new(0, 1),
            Point::new(0, -1),
        ];
        for dir in steps {
            let dest = point + dir;
            if self.is_walkable(dest) {
                exits.push((self.point2d_to_index(dest), 1.0));
            }
        }
        exits
    }

    fn get_pathing_distance(&self, idx1: usize, idx2: usize) -> f32 {
        let p1 = self.index_to_point2d(idx1);
        let p2 = self.index_to_point2d(idx2);
        DistanceAlg::Manhattan.distance2d(p1, p2)
    }
}

impl Algorithm2D for FloorMap {
    fn dimensions(&self) -> Point {
        Point::new(self.width, self.height)
    }

    fn in_bounds(&self, point: Point) -> bool {
        FloorMap::in_bounds(self, point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corridor_runs_horizontal_then_vertical() {
        let path = corridor_path(Point::new(1, 1), Point::new(3, 3));
        assert_eq!(
            path,
            vec![
                Point::new(1, 1),
                Point::new(2, 1),
                Point::new(3, 1),
                Point::new(3, 2),
                Point::new(3, 3),
            ]
        );
    }

    #[test]
    fn touching_rooms_count_as_overlapping() {
        let left = Room::new(1, 1, 4, 4);
        let touching = Room::new(5, 1, 4, 4);
        let apart = Room::new(6, 1, 4, 4);
        assert!(left.rect().intersect(&touching.rect()));
        assert!(!left.rect().intersect(&apart.rect()));
    }

    #[test]
    fn fliers_pass_everything_but_walls() {
        let map = FloorMap::from_rows(&["###", "#.%", "###"]);
        assert!(map.is_passable(Point::new(2, 1), false));
        assert!(map.is_passable(Point::new(1, 1), true));
        assert!(!map.is_passable(Point::new(0, 1), true));
        assert!(!map.is_passable(Point::new(5, 5), true));
    }

    #[test]
    fn isolated_pocket_is_unreachable() {
        let map = FloorMap::from_rows(&[
            "#######",
            "#..#..#",
            "#..#..#",
            "#######",
        ]);
        let unreachable = map.unreachable_floor_tiles(Point::new(1, 1));
        assert_eq!(unreachable.len(), 4);
        assert!(unreachable.contains(&Point::new(5, 2)));
    }

    #[test]
    fn reveal_all_marks_every_tile() {
        let mut map = FloorMap::from_rows(&["#.#"]);
        assert!(!map.is_revealed(Point::new(0, 0)));
        map.reveal_all();
        assert!(map.points().all(|p| map.is_revealed(p)));
    }
}
