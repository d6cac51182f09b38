use bracket_geometry::prelude::Point;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};
use tracing::warn;

use crate::{
    data::{
        items::{ItemId, ItemInstance, ItemKind, RingEffect},
        spells::{STARTING_SPELLS, SpellKind},
    },
    ecs::resources::ItemIdAllocator,
    error::ActionError,
    map::PointDef,
    status::StatusEffects,
};

pub const STARTING_HP: i32 = 100;
pub const STARTING_MP: i32 = 50;
pub const STARTING_EXPERIENCE_TO_NEXT: i32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub attack: i32,
    pub defense: i32,
    pub dexterity: i32,
}

impl Default for BaseStats {
    fn default() -> Self {
        Self {
            attack: 10,
            defense: 5,
            dexterity: 10,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub attack: i32,
    pub defense: i32,
    pub dexterity: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum EquipSlot {
    Weapon,
    Armor,
    LeftRing,
    RightRing,
}

impl EquipSlot {
    pub fn hand(self) -> Option<&'static str> {
        match self {
            EquipSlot::LeftRing => Some("left"),
            EquipSlot::RightRing => Some("right"),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub weapon: Option<ItemInstance>,
    pub armor: Option<ItemInstance>,
    pub left_ring: Option<ItemInstance>,
    pub right_ring: Option<ItemInstance>,
}

impl Equipment {
    pub fn get(&self, slot: EquipSlot) -> Option<&ItemInstance> {
        match slot {
            EquipSlot::Weapon => self.weapon.as_ref(),
            EquipSlot::Armor => self.armor.as_ref(),
            EquipSlot::LeftRing => self.left_ring.as_ref(),
            EquipSlot::RightRing => self.right_ring.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<ItemInstance> {
        match slot {
            EquipSlot::Weapon => &mut self.weapon,
            EquipSlot::Armor => &mut self.armor,
            EquipSlot::LeftRing => &mut self.left_ring,
            EquipSlot::RightRing => &mut self.right_ring,
        }
    }

    pub fn rings(&self) -> impl Iterator<Item = &ItemInstance> {
        self.left_ring.iter().chain(self.right_ring.iter())
    }

    pub fn weapon_attack(&self) -> i32 {
        match self.weapon.as_ref().map(|item| item.kind) {
            Some(ItemKind::Weapon { attack }) => attack,
            _ => 0,
        }
    }

    pub fn armor_defense(&self) -> i32 {
        match self.armor.as_ref().map(|item| item.kind) {
            Some(ItemKind::Armor { defense }) => defense,
            _ => 0,
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        [&self.weapon, &self.armor, &self.left_ring, &self.right_ring]
            .into_iter()
            .flatten()
            .map(|item| item.id)
    }
}

/// Pure stat derivation: base stats plus weapon, armour and ring bonuses.
pub fn derive_stats(base: &BaseStats, equipment: &Equipment) -> DerivedStats {
    let mut stats = DerivedStats {
        attack: base.attack + equipment.weapon_attack(),
        defense: base.defense + equipment.armor_defense(),
        dexterity: base.dexterity,
    };
    for ring in equipment.rings() {
        let ItemKind::Ring { effect, power } = ring.kind else {
            continue;
        };
        let power = if power == 0 { 1 } else { power };
        match effect {
            RingEffect::Protection => stats.defense += power,
            RingEffect::AddStrength | RingEffect::IncreaseDamage => stats.attack += power,
            RingEffect::Dexterity => stats.dexterity += power,
            _ => {}
        }
    }
    stats
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathReport {
    pub cause: String,
    pub floor: u32,
    pub turn: u64,
    pub score: i64,
}

/// Which slot an equip landed in and what it pushed back into the pack.
#[derive(Clone, Debug, PartialEq)]
pub struct EquipOutcome {
    pub slot: EquipSlot,
    pub equipped: ItemInstance,
    pub displaced: Option<ItemInstance>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    #[serde(with = "PointDef")]
    pub position: Point,
    pub hp: i32,
    pub max_hp: i32,
    pub mp: i32,
    pub max_mp: i32,
    pub base: BaseStats,
    pub stats: DerivedStats,
    pub level: i32,
    pub experience: i32,
    pub experience_to_next: i32,
    pub gold: i32,
    pub inventory: Vec<ItemInstance>,
    pub equipment: Equipment,
    pub status: StatusEffects,
    pub spells: Vec<SpellKind>,
    pub death: Option<DeathReport>,
}

impl PlayerState {
    pub fn new(position: Point) -> Self {
        let base = BaseStats::default();
        let equipment = Equipment::default();
        Self {
            position,
            hp: STARTING_HP,
            max_hp: STARTING_HP,
            mp: STARTING_MP,
            max_mp: STARTING_MP,
            stats: derive_stats(&base, &equipment),
            base,
            level: 1,
            experience: 0,
            experience_to_next: STARTING_EXPERIENCE_TO_NEXT,
            gold: 0,
            inventory: Vec::new(),
            equipment,
            status: StatusEffects::default(),
            spells: STARTING_SPELLS.to_vec(),
            death: None,
        }
    }

    pub fn recompute_stats(&mut self) {
        self.stats = derive_stats(&self.base, &self.equipment);
    }

    pub fn is_dead(&self) -> bool {
        self.death.is_some() || self.hp <= 0
    }

    /// Restores up to `amount` hp and returns what was actually gained.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
        self.hp - before
    }

    pub fn restore_mana(&mut self, amount: i32) -> i32 {
        let before = self.mp;
        self.mp = (self.mp + amount.max(0)).min(self.max_mp);
        self.mp - before
    }

    pub fn item(&self, index: usize) -> Result<&ItemInstance, ActionError> {
        self.inventory
            .get(index)
            .ok_or(ActionError::InvalidItemIndex(index))
    }

    pub fn remove_item(&mut self, id: ItemId) -> Option<ItemInstance> {
        let Some(pos) = self.inventory.iter().position(|item| item.id == id) else {
            warn!(?id, "item not found in inventory");
            return None;
        };
        Some(self.inventory.remove(pos))
    }

    pub fn take_item_at(&mut self, index: usize) -> Result<ItemInstance, ActionError> {
        if index >= self.inventory.len() {
            return Err(ActionError::InvalidItemIndex(index));
        }
        Ok(self.inventory.remove(index))
    }

    /// Equips the inventory item at `index`, returning anything it displaced to
    /// the inventory under a fresh id. Rings fill the left hand, then the right,
    /// then replace the left.
    pub fn equip(
        &mut self,
        index: usize,
        ids: &mut ItemIdAllocator,
    ) -> Result<EquipOutcome, ActionError> {
        let kind = self.item(index)?.kind;
        let slot = match kind {
            ItemKind::Weapon { .. } => EquipSlot::Weapon,
            ItemKind::Armor { .. } => EquipSlot::Armor,
            ItemKind::Ring { .. } if self.equipment.left_ring.is_none() => EquipSlot::LeftRing,
            ItemKind::Ring { .. } if self.equipment.right_ring.is_none() => EquipSlot::RightRing,
            ItemKind::Ring { .. } => EquipSlot::LeftRing,
            _ => return Err(ActionError::NotUsable),
        };
        let item = self.take_item_at(index)?;
        let displaced = self
            .equipment
            .slot_mut(slot)
            .replace(item.clone())
            .map(|old| old.relocated(ids.mint()));
        if let Some(old) = &displaced {
            self.inventory.push(old.clone());
        }
        self.recompute_stats();
        Ok(EquipOutcome {
            slot,
            equipped: item,
            displaced,
        })
    }

    pub fn unequip(
        &mut self,
        slot: EquipSlot,
        ids: &mut ItemIdAllocator,
    ) -> Result<ItemInstance, ActionError> {
        let item = self
            .equipment
            .slot_mut(slot)
            .take()
            .ok_or(ActionError::EmptySlot(slot))?;
        let returned = item.relocated(ids.mint());
        self.inventory.push(returned.clone());
        self.recompute_stats();
        Ok(returned)
    }

    pub fn knows(&self, spell: SpellKind) -> bool {
        self.spells.contains(&spell)
    }

    /// Every item id the player currently holds, equipped or carried.
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.inventory
            .iter()
            .map(|item| item.id)
            .chain(self.equipment.ids())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::items::ItemTemplate;

    fn sword(ids: &mut ItemIdAllocator, attack: i32) -> ItemInstance {
        let mut item = ItemTemplate::by_name("Sword").expect("sword").instantiate(ids.mint());
        item.kind = ItemKind::Weapon { attack };
        item
    }

    #[test]
    fn starting_player_matches_classic_stats() {
        let player = PlayerState::new(Point::new(3, 3));
        assert_eq!(player.hp, 100);
        assert_eq!(player.mp, 50);
        assert_eq!(player.stats.attack, 10);
        assert_eq!(player.stats.defense, 5);
        assert_eq!(player.experience_to_next, 100);
        assert!(player.knows(SpellKind::MagicMissile));
        assert!(!player.knows(SpellKind::HoldMonsters));
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut ids = ItemIdAllocator::default();
        let mut player = PlayerState::new(Point::new(0, 0));
        player.inventory.push(sword(&mut ids, 5));
        player.equip(0, &mut ids).expect("equip");
        player.recompute_stats();
        let first = player.stats;
        player.recompute_stats();
        assert_eq!(first, player.stats);
        assert_eq!(first.attack, 15);
    }

    #[test]
    fn equipping_over_a_weapon_returns_it_with_new_id() {
        let mut ids = ItemIdAllocator::default();
        let mut player = PlayerState::new(Point::new(0, 0));
        player.inventory.push(sword(&mut ids, 5));
        player.inventory.push(sword(&mut ids, 8));
        let first = player.equip(0, &mut ids).expect("first equip");
        let first_id = first.equipped.id;
        let second = player.equip(0, &mut ids).expect("second equip");
        assert_eq!(player.stats.attack, 18);
        assert_eq!(player.inventory.len(), 1);
        let returned = second.displaced.expect("displaced weapon");
        assert_ne!(returned.id, first_id);
        assert_eq!(player.inventory[0].id, returned.id);
        let mut all = player.item_ids();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn ring_bonuses_apply_by_effect() {
        let mut ids = ItemIdAllocator::default();
        let mut player = PlayerState::new(Point::new(0, 0));
        for name in ["Ring of protection", "Ring of dexterity", "Ring of increase damage"] {
            let ring = ItemTemplate::by_name(name).expect("ring").instantiate(ids.mint());
            player.inventory.push(ring);
        }
        let left = player.equip(0, &mut ids).expect("left");
        assert_eq!(left.slot, EquipSlot::LeftRing);
        let right = player.equip(0, &mut ids).expect("right");
        assert_eq!(right.slot, EquipSlot::RightRing);
        assert_eq!(player.stats.defense, 6);
        assert_eq!(player.stats.dexterity, 11);
        let swap = player.equip(0, &mut ids).expect("swap");
        assert_eq!(swap.slot, EquipSlot::LeftRing);
        assert!(swap.displaced.is_some());
        assert_eq!(player.stats.defense, 5);
        assert_eq!(player.stats.attack, 11);
    }

    #[test]
    fn unequip_empty_slot_is_rejected() {
        let mut ids = ItemIdAllocator::default();
        let mut player = PlayerState::new(Point::new(0, 0));
        assert_eq!(
            player.unequip(EquipSlot::Armor, &mut ids),
            Err(ActionError::EmptySlot(EquipSlot::Armor))
        );
    }

    #[test]
    fn removing_an_unknown_id_is_a_no_op() {
        let mut ids = ItemIdAllocator::default();
        let mut player = PlayerState::new(Point::new(0, 0));
        let kept = sword(&mut ids, 5);
        let kept_id = kept.id;
        player.inventory.push(kept);
        assert!(player.remove_item(ids.mint()).is_none());
        assert_eq!(player.inventory.len(), 1);
        assert_eq!(player.remove_item(kept_id).map(|item| item.id), Some(kept_id));
        assert!(player.inventory.is_empty());
    }

    #[test]
    fn potions_cannot_be_equipped() {
        let mut ids = ItemIdAllocator::default();
        let mut player = PlayerState::new(Point::new(0, 0));
        let potion = ItemTemplate::by_name("Health Potion")
            .expect("potion")
            .instantiate(ids.mint());
        player.inventory.push(potion);
        assert_eq!(player.equip(0, &mut ids), Err(ActionError::NotUsable));
        assert_eq!(player.inventory.len(), 1);
    }
}
