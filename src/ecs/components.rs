use bracket_geometry::prelude::Point;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use specs::prelude::{Component, VecStorage};

use crate::{
    data::{
        Rgb,
        items::ItemInstance,
        monsters::{Ability, MonsterTemplate},
    },
    map::PointDef,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    #[serde(with = "PointDef")]
    pub point: Point,
}

impl Component for Position {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Renderable {
    pub glyph: char,
    pub color: Rgb,
    pub order: i32,
}

impl Component for Renderable {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub name: String,
    pub experience: i32,
    pub gold: i32,
    pub alive: bool,
}

impl Component for Monster {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub max_hp: i32,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
}

impl Component for CombatStats {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThiefKind {
    Gold,
    Everything,
}

/// Ability flags copied from the template; `is_mean` can be switched on later
/// by aggravation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterAbilities {
    pub can_fly: bool,
    pub is_mean: bool,
    pub can_regenerate: bool,
    pub has_invisibility: bool,
    pub thief: Option<ThiefKind>,
    pub on_hit: SmallVec<[Ability; 4]>,
}

impl MonsterAbilities {
    pub fn from_template(template: &MonsterTemplate) -> Self {
        let thief = if template.has(Ability::StealAll) {
            Some(ThiefKind::Everything)
        } else if template.has(Ability::Steal) {
            Some(ThiefKind::Gold)
        } else {
            None
        };
        let on_hit = template
            .abilities
            .iter()
            .copied()
            .filter(|ability| {
                matches!(
                    ability,
                    Ability::Poison
                        | Ability::Hold
                        | Ability::Confusion
                        | Ability::Drain
                        | Ability::Rust
                        | Ability::Steal
                        | Ability::StealAll
                )
            })
            .collect();
        Self {
            can_fly: template.has(Ability::Fly),
            is_mean: template.has(Ability::Mean),
            can_regenerate: template.has(Ability::Regen),
            has_invisibility: template.has(Ability::Invisible),
            thief,
            on_hit,
        }
    }
}

impl Component for MonsterAbilities {
    type Storage = VecStorage<Self>;
}

/// Transient per-monster counters. Counters tick down inside the AI step.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterStatus {
    pub frozen: u32,
    pub sleeping: u32,
    pub confused: u32,
    pub scared: u32,
    pub aggravated: u32,
    pub is_invisible: bool,
    pub enraged: bool,
    pub last_regen_turn: u64,
    pub regen_interval: u64,
}

impl Component for MonsterStatus {
    type Storage = VecStorage<Self>;
}

/// Items a thief has taken from the player.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Loot {
    pub items: Vec<ItemInstance>,
}

impl Component for Loot {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundItem {
    pub item: ItemInstance,
}

impl Component for GroundItem {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrapKind {
    Damage,
    Teleport,
    Alarm,
}

impl TrapKind {
    pub fn name(self) -> &'static str {
        match self {
            TrapKind::Damage => "damage",
            TrapKind::Teleport => "teleport",
            TrapKind::Alarm => "alarm",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trap {
    pub kind: TrapKind,
    pub triggered: bool,
    pub visible: bool,
}

impl Component for Trap {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectile {
    #[serde(with = "PointDef")]
    pub direction: Point,
    pub range: i32,
    pub damage: i32,
}

impl Component for Projectile {
    type Storage = VecStorage<Self>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub name: String,
    pub stock: Vec<ItemInstance>,
}

impl Component for Merchant {
    type Storage = VecStorage<Self>;
}
