//! Boundaries to presentation collaborators: rendering, audio and the
//! message panel. The core calls these fire-and-forget and never waits.

use bracket_geometry::prelude::Point;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};

use crate::{
    data::Rgb,
    ecs::resources::LogEntry,
    map::TileKind,
    session::GameMode,
    status::StatusKind,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum SoundEvent {
    Footstep,
    SwordHit,
    Hurt,
    Death,
    EnemyDeath,
    LevelUp,
    Gold,
    ItemPickup,
    Equip,
    Magic,
    Poison,
    Drain,
    MetalBreak,
    Steal,
    Stairs,
    Heal,
    Mana,
}

impl SoundEvent {
    pub fn name(self) -> &'static str {
        self.into()
    }
}

pub trait GameHooks {
    fn render(&mut self, _frame: &FrameView) {}

    fn play_sound(&mut self, _event: SoundEvent) {}

    fn message(&mut self, _entry: &LogEntry) {}
}

/// Hooks that drop every notification. Used headless and in tests.
#[derive(Default)]
pub struct NullHooks;

impl GameHooks for NullHooks {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileView {
    pub kind: TileKind,
    pub visible: bool,
    pub revealed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GlyphView {
    pub point: Point,
    pub glyph: char,
    pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerView {
    pub point: Point,
    pub glyph: char,
    pub color: Rgb,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub level: i32,
    pub experience: i32,
    pub experience_to_next: i32,
    pub gold: i32,
    pub attack: i32,
    pub defense: i32,
    pub dexterity: i32,
    pub statuses: Vec<(StatusKind, u32)>,
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug)]
pub struct FrameView {
    pub width: i32,
    pub height: i32,
    pub floor: u32,
    pub turn: u64,
    pub mode: GameMode,
    pub tiles: Vec<TileView>,
    pub player: PlayerView,
    pub monsters: Vec<GlyphView>,
    pub items: Vec<GlyphView>,
    pub traps: Vec<GlyphView>,
    pub projectiles: Vec<GlyphView>,
}

impl FrameView {
    pub fn tile(&self, point: Point) -> Option<&TileView> {
        if point.x < 0 || point.x >= self.width || point.y < 0 || point.y >= self.height {
            return None;
        }
        self.tiles.get((point.y * self.width + point.x) as usize)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn sound_names_are_camel_case() {
        assert_eq!(SoundEvent::SwordHit.name(), "swordHit");
        assert_eq!(SoundEvent::MetalBreak.name(), "metalBreak");
        assert_eq!(SoundEvent::Footstep.name(), "footstep");
        assert_eq!(SoundEvent::iter().count(), 17);
    }
}
