use serde::{Deserialize, Serialize};

use super::Rgb;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ability {
    Fly,
    Mean,
    Freeze,
    Steal,
    StealAll,
    Greed,
    Poison,
    Rust,
    Regen,
    Hold,
    Confusion,
    Invisible,
    Drain,
    Mimic,
    Flame,
}

#[derive(Clone, Debug)]
pub struct MonsterTemplate {
    pub name: &'static str,
    pub glyph: char,
    pub color: Rgb,
    pub tier: u8,
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub experience: i32,
    pub abilities: &'static [Ability],
}

/// Template stats after floor scaling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaledStats {
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub experience: i32,
}

const TIER_COLORS: [Rgb; 6] = [
    (231, 76, 60),
    (230, 126, 34),
    (211, 84, 0),
    (192, 57, 43),
    (155, 89, 182),
    (142, 68, 173),
];

const fn tier_color(tier: u8) -> Rgb {
    TIER_COLORS[(tier as usize - 1) % TIER_COLORS.len()]
}

impl MonsterTemplate {
    const fn new(
        name: &'static str,
        glyph: char,
        tier: u8,
        hp: i32,
        attack: i32,
        defense: i32,
        experience: i32,
        abilities: &'static [Ability],
    ) -> Self {
        Self {
            name,
            glyph,
            color: tier_color(tier),
            tier,
            hp,
            attack,
            defense,
            experience,
            abilities,
        }
    }

    pub fn has(&self, ability: Ability) -> bool {
        self.abilities.contains(&ability)
    }

    /// Scales hp/attack/defense/experience by `1 + (floor-1) * 0.1`, floored.
    pub fn spawn_stats(&self, floor: u32) -> ScaledStats {
        let multiplier = 1.0 + (floor.max(1) - 1) as f64 * 0.1;
        let scale = |value: i32| (value as f64 * multiplier).floor() as i32;
        ScaledStats {
            hp: scale(self.hp),
            attack: scale(self.attack),
            defense: scale(self.defense),
            experience: scale(self.experience),
        }
    }

    /// Templates allowed on `floor`: each depth band unlocks one more tier.
    pub fn for_floor(floor: u32) -> Vec<&'static MonsterTemplate> {
        let max_tier = match floor {
            0..=3 => 1,
            4..=6 => 2,
            7..=10 => 3,
            11..=15 => 4,
            16..=20 => 5,
            _ => 6,
        };
        let available: Vec<&'static MonsterTemplate> = MONSTER_TEMPLATES
            .iter()
            .filter(|template| template.tier <= max_tier)
            .collect();
        if available.is_empty() {
            vec![&MONSTER_TEMPLATES[0]]
        } else {
            available
        }
    }

    pub fn by_name(name: &str) -> Option<&'static MonsterTemplate> {
        MONSTER_TEMPLATES.iter().find(|template| template.name == name)
    }
}

use Ability::*;

pub static MONSTER_TEMPLATES: [MonsterTemplate; 26] = [
    MonsterTemplate::new("Bat", 'B', 1, 8, 3, 1, 2, &[Fly]),
    MonsterTemplate::new("Emu", 'E', 1, 12, 4, 2, 3, &[Mean]),
    MonsterTemplate::new("Hobgoblin", 'H', 1, 15, 6, 3, 5, &[Mean]),
    MonsterTemplate::new("Kestrel", 'K', 1, 10, 5, 2, 4, &[Fly, Mean]),
    MonsterTemplate::new("Snake", 'S', 1, 10, 4, 2, 3, &[Mean]),
    MonsterTemplate::new("Centaur", 'C', 2, 25, 8, 4, 15, &[]),
    MonsterTemplate::new("Ice Monster", 'I', 2, 18, 6, 5, 8, &[Freeze]),
    MonsterTemplate::new("Leprechaun", 'L', 2, 20, 5, 6, 12, &[Steal]),
    MonsterTemplate::new("Orc", 'O', 2, 22, 7, 4, 10, &[Greed]),
    MonsterTemplate::new("Rattlesnake", 'R', 2, 16, 8, 3, 12, &[Poison, Mean]),
    MonsterTemplate::new("Aquator", 'A', 3, 35, 10, 5, 25, &[Rust, Mean]),
    MonsterTemplate::new("Nymph", 'N', 3, 28, 6, 7, 20, &[StealAll]),
    MonsterTemplate::new("Quagga", 'Q', 3, 30, 9, 5, 18, &[Mean]),
    MonsterTemplate::new("Troll", 'T', 3, 45, 12, 6, 35, &[Regen, Mean]),
    MonsterTemplate::new("Zombie", 'Z', 3, 25, 8, 4, 15, &[Mean]),
    MonsterTemplate::new("Venus Flytrap", 'F', 4, 50, 14, 7, 45, &[Hold, Mean]),
    MonsterTemplate::new("Medusa", 'M', 4, 40, 16, 6, 40, &[Confusion, Mean]),
    MonsterTemplate::new("Phantom", 'P', 4, 35, 12, 8, 50, &[Invisible]),
    MonsterTemplate::new("Black Unicorn", 'U', 4, 55, 18, 4, 60, &[Mean]),
    MonsterTemplate::new("Wraith", 'W', 4, 38, 14, 7, 45, &[Drain]),
    MonsterTemplate::new("Griffin", 'G', 5, 70, 20, 8, 80, &[Fly, Regen, Mean]),
    MonsterTemplate::new("Vampire", 'V', 5, 60, 22, 6, 90, &[Regen, Drain, Mean]),
    MonsterTemplate::new("Xeroc", 'X', 5, 50, 16, 9, 70, &[Mimic]),
    MonsterTemplate::new("Yeti", 'Y', 5, 65, 18, 7, 75, &[Freeze]),
    MonsterTemplate::new("Dragon", 'D', 6, 120, 30, 10, 200, &[Flame, Mean]),
    MonsterTemplate::new("Jabberwock", 'J', 6, 100, 28, 12, 180, &[Confusion]),
];
