use serde::{Deserialize, Serialize};

use super::Rgb;
use crate::rng::GameRng;

const POTION_COLOR: Rgb = (155, 89, 182);
const SCROLL_COLOR: Rgb = (243, 156, 18);
const RING_COLOR: Rgb = (243, 156, 18);
const WEAPON_COLOR: Rgb = (230, 126, 34);
const ARMOR_COLOR: Rgb = (52, 152, 219);
const GOLD_COLOR: Rgb = (241, 196, 15);

/// Session-unique item identifier. A fresh id is minted whenever an item
/// changes owner (ground, inventory, equipment, stock, loot).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PotionEffect {
    Healing,
    ExtraHealing,
    RestoreHealth,
    RestoreMana,
    GainStrength,
    RestoreStrength,
    RaiseLevel,
    HasteSelf,
    SeeInvisible,
    MonsterDetection,
    MagicDetection,
    Levitation,
    Confusion,
    Hallucination,
    Poison,
    Blindness,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollEffect {
    MonsterConfusion,
    MagicMapping,
    HoldMonster,
    Sleep,
    EnchantArmor,
    IdentifyPotion,
    IdentifyScroll,
    IdentifyWeapon,
    IdentifyArmor,
    IdentifyRing,
    ScareMonster,
    FoodDetection,
    Teleportation,
    EnchantWeapon,
    CreateMonster,
    RemoveCurse,
    AggravateMonsters,
    ProtectArmor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingEffect {
    Protection,
    AddStrength,
    SustainStrength,
    Searching,
    SeeInvisible,
    Adornment,
    AggravateMonster,
    Dexterity,
    IncreaseDamage,
    Regeneration,
    SlowDigestion,
    Teleportation,
    Stealth,
    MaintainArmor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Potion { effect: PotionEffect, magnitude: i32 },
    Scroll { effect: ScrollEffect },
    Ring { effect: RingEffect, power: i32 },
    Weapon { attack: i32 },
    Armor { defense: i32 },
    Gold { value: i32 },
}

impl ItemKind {
    pub fn is_equipment(&self) -> bool {
        matches!(
            self,
            ItemKind::Weapon { .. } | ItemKind::Armor { .. } | ItemKind::Ring { .. }
        )
    }
}

#[derive(Clone, Debug)]
pub struct ItemTemplate {
    pub name: &'static str,
    pub glyph: char,
    pub color: Rgb,
    pub kind: ItemKind,
    pub weight: u32,
    pub base_price: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemInstance {
    pub id: ItemId,
    pub name: String,
    pub glyph: char,
    pub color: Rgb,
    pub kind: ItemKind,
    pub price: i32,
}

impl ItemInstance {
    /// Moves the item to a new owner under a freshly minted id.
    pub fn relocated(self, id: ItemId) -> Self {
        Self { id, ..self }
    }
}

impl ItemTemplate {
    const fn new(
        name: &'static str,
        glyph: char,
        color: Rgb,
        kind: ItemKind,
        weight: u32,
        base_price: i32,
    ) -> Self {
        Self {
            name,
            glyph,
            color,
            kind,
            weight,
            base_price,
        }
    }

    const fn potion(name: &'static str, effect: PotionEffect, weight: u32) -> Self {
        Self::new(
            name,
            '!',
            POTION_COLOR,
            ItemKind::Potion {
                effect,
                magnitude: 0,
            },
            weight,
            0,
        )
    }

    const fn scroll(name: &'static str, effect: ScrollEffect, weight: u32) -> Self {
        Self::new(name, '?', SCROLL_COLOR, ItemKind::Scroll { effect }, weight, 0)
    }

    const fn ring(name: &'static str, effect: RingEffect, power: i32, weight: u32) -> Self {
        Self::new(name, '=', RING_COLOR, ItemKind::Ring { effect, power }, weight, 0)
    }

    pub fn instantiate(&self, id: ItemId) -> ItemInstance {
        ItemInstance {
            id,
            name: self.name.to_string(),
            glyph: self.glyph,
            color: self.color,
            kind: self.kind,
            price: self.base_price,
        }
    }

    /// Weighted pick over [`FLOOR_ITEMS`].
    pub fn random_floor_item(rng: &mut GameRng) -> &'static ItemTemplate {
        weighted_pick(&FLOOR_ITEMS, rng)
    }

    pub fn by_name(name: &str) -> Option<&'static ItemTemplate> {
        FLOOR_ITEMS
            .iter()
            .chain(SHOP_ITEMS.iter())
            .find(|template| template.name == name)
    }
}

fn weighted_pick<'a>(table: &'a [ItemTemplate], rng: &mut GameRng) -> &'a ItemTemplate {
    let total: u32 = table.iter().map(|template| template.weight.max(1)).sum();
    let mut roll = rng.range(0, total as i32) as u32;
    for template in table {
        let weight = template.weight.max(1);
        if roll < weight {
            return template;
        }
        roll -= weight;
    }
    &table[table.len() - 1]
}

use PotionEffect as P;
use RingEffect as R;
use ScrollEffect as S;

/// Items that appear lying around on dungeon floors.
pub static FLOOR_ITEMS: [ItemTemplate; 49] = [
    ItemTemplate::potion("Potion of confusion", P::Confusion, 7),
    ItemTemplate::potion("Potion of hallucination", P::Hallucination, 8),
    ItemTemplate::potion("Potion of poison", P::Poison, 8),
    ItemTemplate::potion("Potion of gain strength", P::GainStrength, 13),
    ItemTemplate::potion("Potion of see invisible", P::SeeInvisible, 3),
    ItemTemplate::potion("Potion of healing", P::Healing, 13),
    ItemTemplate::potion("Potion of monster detection", P::MonsterDetection, 6),
    ItemTemplate::potion("Potion of magic detection", P::MagicDetection, 6),
    ItemTemplate::potion("Potion of raise level", P::RaiseLevel, 2),
    ItemTemplate::potion("Potion of extra healing", P::ExtraHealing, 5),
    ItemTemplate::potion("Potion of haste self", P::HasteSelf, 5),
    ItemTemplate::potion("Potion of restore strength", P::RestoreStrength, 13),
    ItemTemplate::potion("Potion of blindness", P::Blindness, 5),
    ItemTemplate::potion("Potion of levitation", P::Levitation, 6),
    ItemTemplate::scroll("Scroll of monster confusion", S::MonsterConfusion, 7),
    ItemTemplate::scroll("Scroll of magic mapping", S::MagicMapping, 4),
    ItemTemplate::scroll("Scroll of hold monster", S::HoldMonster, 2),
    ItemTemplate::scroll("Scroll of sleep", S::Sleep, 3),
    ItemTemplate::scroll("Scroll of enchant armor", S::EnchantArmor, 7),
    ItemTemplate::scroll("Scroll of identify potion", S::IdentifyPotion, 10),
    ItemTemplate::scroll("Scroll of identify scroll", S::IdentifyScroll, 10),
    ItemTemplate::scroll("Scroll of identify weapon", S::IdentifyWeapon, 6),
    ItemTemplate::scroll("Scroll of identify armor", S::IdentifyArmor, 7),
    ItemTemplate::scroll("Scroll of identify ring, wand or staff", S::IdentifyRing, 10),
    ItemTemplate::scroll("Scroll of scare monster", S::ScareMonster, 3),
    ItemTemplate::scroll("Scroll of food detection", S::FoodDetection, 2),
    ItemTemplate::scroll("Scroll of teleportation", S::Teleportation, 5),
    ItemTemplate::scroll("Scroll of enchant weapon", S::EnchantWeapon, 8),
    ItemTemplate::scroll("Scroll of create monster", S::CreateMonster, 4),
    ItemTemplate::scroll("Scroll of remove curse", S::RemoveCurse, 7),
    ItemTemplate::scroll("Scroll of aggravate monsters", S::AggravateMonsters, 3),
    ItemTemplate::scroll("Scroll of protect armor", S::ProtectArmor, 2),
    ItemTemplate::ring("Ring of protection", R::Protection, 1, 9),
    ItemTemplate::ring("Ring of add strength", R::AddStrength, 1, 9),
    ItemTemplate::ring("Ring of sustain strength", R::SustainStrength, 0, 5),
    ItemTemplate::ring("Ring of searching", R::Searching, 0, 10),
    ItemTemplate::ring("Ring of see invisible", R::SeeInvisible, 0, 10),
    ItemTemplate::ring("Ring of adornment", R::Adornment, 0, 1),
    ItemTemplate::ring("Ring of aggravate monster", R::AggravateMonster, 0, 10),
    ItemTemplate::ring("Ring of dexterity", R::Dexterity, 1, 8),
    ItemTemplate::ring("Ring of increase damage", R::IncreaseDamage, 1, 8),
    ItemTemplate::ring("Ring of regeneration", R::Regeneration, 0, 4),
    ItemTemplate::ring("Ring of slow digestion", R::SlowDigestion, 0, 9),
    ItemTemplate::ring("Ring of teleportation", R::Teleportation, 0, 5),
    ItemTemplate::ring("Ring of stealth", R::Stealth, 0, 7),
    ItemTemplate::ring("Ring of maintain armor", R::MaintainArmor, 0, 5),
    ItemTemplate::new("Sword", ')', WEAPON_COLOR, ItemKind::Weapon { attack: 5 }, 7, 0),
    ItemTemplate::new("Shield", ']', WEAPON_COLOR, ItemKind::Armor { defense: 3 }, 7, 0),
    ItemTemplate::new("Gold Coin", '*', GOLD_COLOR, ItemKind::Gold { value: 25 }, 15, 25),
];

/// Merchant catalogue with base prices.
pub static SHOP_ITEMS: [ItemTemplate; 13] = [
    ItemTemplate::new(
        "Health Potion",
        '!',
        POTION_COLOR,
        ItemKind::Potion {
            effect: P::RestoreHealth,
            magnitude: 30,
        },
        1,
        50,
    ),
    ItemTemplate::new(
        "Mana Potion",
        '!',
        POTION_COLOR,
        ItemKind::Potion {
            effect: P::RestoreMana,
            magnitude: 20,
        },
        1,
        40,
    ),
    ItemTemplate::new(
        "Super Health Potion",
        '!',
        (231, 76, 60),
        ItemKind::Potion {
            effect: P::RestoreHealth,
            magnitude: 60,
        },
        1,
        120,
    ),
    ItemTemplate::new(
        "Super Mana Potion",
        '!',
        (52, 152, 219),
        ItemKind::Potion {
            effect: P::RestoreMana,
            magnitude: 40,
        },
        1,
        100,
    ),
    ItemTemplate::new("Dagger", ')', WEAPON_COLOR, ItemKind::Weapon { attack: 3 }, 1, 40),
    ItemTemplate::new("Short Sword", ')', WEAPON_COLOR, ItemKind::Weapon { attack: 5 }, 1, 80),
    ItemTemplate::new("Long Sword", ')', WEAPON_COLOR, ItemKind::Weapon { attack: 8 }, 1, 150),
    ItemTemplate::new("Axe", ')', WEAPON_COLOR, ItemKind::Weapon { attack: 7 }, 1, 120),
    ItemTemplate::new("Mace", ')', WEAPON_COLOR, ItemKind::Weapon { attack: 6 }, 1, 100),
    ItemTemplate::new("Leather Armor", ']', ARMOR_COLOR, ItemKind::Armor { defense: 2 }, 1, 70),
    ItemTemplate::new("Chain Mail", ']', ARMOR_COLOR, ItemKind::Armor { defense: 4 }, 1, 130),
    ItemTemplate::new("Plate Mail", ']', ARMOR_COLOR, ItemKind::Armor { defense: 6 }, 1, 200),
    ItemTemplate::new("Buckler", ']', ARMOR_COLOR, ItemKind::Armor { defense: 2 }, 1, 60),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relocation_keeps_payload_and_changes_id() {
        let template = ItemTemplate::by_name("Long Sword").expect("long sword");
        let item = template.instantiate(ItemId(3));
        let moved = item.clone().relocated(ItemId(9));
        assert_eq!(moved.id, ItemId(9));
        assert_eq!(moved.kind, item.kind);
        assert_eq!(moved.name, item.name);
        assert_eq!(moved.price, 150);
    }

    #[test]
    fn weighted_pick_covers_heavy_entries() {
        let mut rng = GameRng::seeded(11);
        let mut saw_gold = false;
        for _ in 0..400 {
            if matches!(ItemTemplate::random_floor_item(&mut rng).kind, ItemKind::Gold { .. }) {
                saw_gold = true;
                break;
            }
        }
        assert!(saw_gold);
    }

    #[test]
    fn equipment_kinds() {
        assert!(ItemKind::Weapon { attack: 1 }.is_equipment());
        assert!(
            ItemKind::Ring {
                effect: RingEffect::Protection,
                power: 1
            }
            .is_equipment()
        );
        assert!(!ItemKind::Gold { value: 1 }.is_equipment());
    }
}
