use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpellKind {
    MagicMissile,
    Heal,
    HoldMonsters,
}

pub const MISSILE_RANGE: i32 = 8;
pub const HOLD_RADIUS: i32 = 3;

impl SpellKind {
    pub fn name(self) -> &'static str {
        match self {
            SpellKind::MagicMissile => "Magic Missile",
            SpellKind::Heal => "Heal",
            SpellKind::HoldMonsters => "Hold Monsters",
        }
    }

    pub fn mana_cost(self) -> i32 {
        match self {
            SpellKind::MagicMissile => 5,
            SpellKind::Heal => 8,
            SpellKind::HoldMonsters => 12,
        }
    }

    /// Targeted spells wait for a direction before the turn is spent.
    pub fn is_targeted(self) -> bool {
        matches!(self, SpellKind::MagicMissile)
    }

    pub fn missile_damage(level: i32) -> i32 {
        6 + level * 2
    }

    /// Character level at which the spell is learned, if not known from the start.
    pub fn learned_at(self) -> Option<i32> {
        match self {
            SpellKind::HoldMonsters => Some(3),
            _ => None,
        }
    }
}

pub const STARTING_SPELLS: [SpellKind; 2] = [SpellKind::MagicMissile, SpellKind::Heal];
pub const ALL_SPELLS: [SpellKind; 3] = [
    SpellKind::MagicMissile,
    SpellKind::Heal,
    SpellKind::HoldMonsters,
];
