use std::collections::{HashSet, VecDeque};

use bracket_geometry::prelude::Point;
use serde::{Deserialize, Serialize};

use crate::{
    data::items::ItemId,
    hooks::SoundEvent,
    map::{FloorMap, TileKind},
    text::{MessageCategory, MessageKey, MessageParams},
};

/// Per-turn snapshot of the floor layout handed to the systems.
#[derive(Clone)]
pub struct MovementContext {
    pub player_point: Point,
    pub width: i32,
    pub height: i32,
    tiles: Vec<TileKind>,
}

impl MovementContext {
    pub fn from_map(map: &FloorMap, player_point: Point) -> Self {
        let tiles = map.points().map(|point| map.tile(point)).collect();
        Self {
            player_point,
            width: map.width,
            height: map.height,
            tiles,
        }
    }

    fn tile(&self, point: Point) -> TileKind {
        if !self.in_bounds(point) {
            return TileKind::Wall;
        }
        let idx = (point.y * self.width + point.x) as usize;
        self.tiles.get(idx).copied().unwrap_or(TileKind::Wall)
    }

    pub fn is_walkable(&self, point: Point) -> bool {
        self.tile(point).is_walkable()
    }

    pub fn is_passable(&self, point: Point, can_fly: bool) -> bool {
        if can_fly {
            self.in_bounds(point) && self.tile(point) != TileKind::Wall
        } else {
            self.is_walkable(point)
        }
    }

    pub fn blocks_sight(&self, point: Point) -> bool {
        self.tile(point) == TileKind::Wall
    }

    pub fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0 && point.x < self.width && point.y >= 0 && point.y < self.height
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub key: MessageKey,
    pub params: MessageParams,
    pub category: MessageCategory,
    pub turn: u64,
}

/// Bounded message history. New entries are also queued for the hooks.
#[derive(Clone, Debug)]
pub struct MessageLog {
    entries: VecDeque<LogEntry>,
    fresh: Vec<LogEntry>,
    capacity: usize,
    turn: u64,
}

impl MessageLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            fresh: Vec::new(),
            capacity: capacity.max(1),
            turn: 0,
        }
    }

    pub fn restore(capacity: usize, entries: Vec<LogEntry>, turn: u64) -> Self {
        let mut log = Self::new(capacity);
        log.turn = turn;
        for entry in entries {
            log.store(entry);
        }
        log
    }

    pub fn set_turn(&mut self, turn: u64) {
        self.turn = turn;
    }

    pub fn push(&mut self, key: MessageKey, category: MessageCategory) {
        self.push_with(key, category, MessageParams::new());
    }

    pub fn push_with(&mut self, key: MessageKey, category: MessageCategory, params: MessageParams) {
        let entry = LogEntry {
            key,
            params,
            category,
            turn: self.turn,
        };
        self.fresh.push(entry.clone());
        self.store(entry);
    }

    fn store(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn take_fresh(&mut self) -> Vec<LogEntry> {
        std::mem::take(&mut self.fresh)
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(50)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SoundQueue {
    pending: Vec<SoundEvent>,
}

impl SoundQueue {
    pub fn push(&mut self, event: SoundEvent) {
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<SoundEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnClock {
    pub turn: u64,
    pub floor: u32,
}

impl Default for TurnClock {
    fn default() -> Self {
        Self { turn: 0, floor: 1 }
    }
}

/// Session-wide item id counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ItemIdAllocator {
    next: u64,
}

impl Default for ItemIdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl ItemIdAllocator {
    pub fn starting_at(next: u64) -> Self {
        Self { next: next.max(1) }
    }

    pub fn mint(&mut self) -> ItemId {
        let id = ItemId(self.next);
        self.next += 1;
        id
    }

    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// Tiles the player currently sees.
#[derive(Clone, Debug, Default)]
pub struct Viewshed {
    pub radius: i32,
    pub visible: HashSet<Point>,
}

impl Viewshed {
    pub fn contains(&self, point: Point) -> bool {
        self.visible.contains(&point)
    }
}
