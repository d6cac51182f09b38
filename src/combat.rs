use smallvec::SmallVec;

use crate::{
    data::{items::ItemKind, monsters::Ability},
    ecs::components::CombatStats,
    hooks::SoundEvent,
    player::PlayerState,
    rng::GameRng,
    status::StatusKind,
    text::MessageKey,
};

/// Anything that can trade blows.
pub trait Combatant {
    fn attack_power(&self) -> i32;
    fn defense(&self) -> i32;
    fn hp_mut(&mut self) -> &mut i32;
}

impl Combatant for PlayerState {
    fn attack_power(&self) -> i32 {
        self.stats.attack
    }

    fn defense(&self) -> i32 {
        self.stats.defense
    }

    fn hp_mut(&mut self) -> &mut i32 {
        &mut self.hp
    }
}

impl Combatant for CombatStats {
    fn attack_power(&self) -> i32 {
        self.attack
    }

    fn defense(&self) -> i32 {
        self.defense
    }

    fn hp_mut(&mut self) -> &mut i32 {
        &mut self.hp
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackOutcome {
    pub damage: i32,
    pub defender_died: bool,
}

/// Damage for one blow; never less than 1.
pub fn damage_roll(attack: i32, defense: i32, offset: i32) -> i32 {
    (attack - defense + offset).max(1)
}

pub fn resolve_attack<A, D>(attacker: &A, defender: &mut D, rng: &mut GameRng) -> AttackOutcome
where
    A: Combatant + ?Sized,
    D: Combatant + ?Sized,
{
    let damage = damage_roll(attacker.attack_power(), defender.defense(), rng.range(-2, 3));
    let hp = defender.hp_mut();
    *hp -= damage;
    AttackOutcome {
        damage,
        defender_died: *hp <= 0,
    }
}

/// Extra effect of a monster's blow that landed on the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnHit {
    Poisoned,
    Paralyzed,
    Confused,
    Drained(i32),
    Rusted,
    StoleAllGold,
    StoleGold(i32),
}

impl OnHit {
    pub fn message(self) -> MessageKey {
        match self {
            OnHit::Poisoned => MessageKey::PoisonBite,
            OnHit::Paralyzed => MessageKey::Paralyze,
            OnHit::Confused => MessageKey::Confuse,
            OnHit::Drained(_) => MessageKey::Drain,
            OnHit::Rusted => MessageKey::Rust,
            OnHit::StoleAllGold => MessageKey::StealAllGold,
            OnHit::StoleGold(_) => MessageKey::StealGold,
        }
    }

    pub fn sound(self) -> SoundEvent {
        match self {
            OnHit::Poisoned => SoundEvent::Poison,
            OnHit::Paralyzed | OnHit::Confused => SoundEvent::Magic,
            OnHit::Drained(_) => SoundEvent::Drain,
            OnHit::Rusted => SoundEvent::MetalBreak,
            OnHit::StoleAllGold | OnHit::StoleGold(_) => SoundEvent::Steal,
        }
    }

    pub fn is_theft(self) -> bool {
        matches!(self, OnHit::StoleAllGold | OnHit::StoleGold(_))
    }
}

pub const MIN_DRAINED_MAX_HP: i32 = 10;

/// Rolls every special attack the monster carries, each independently.
pub fn roll_on_hit(
    abilities: &[Ability],
    player: &mut PlayerState,
    rng: &mut GameRng,
) -> SmallVec<[OnHit; 4]> {
    let mut effects = SmallVec::new();

    if abilities.contains(&Ability::Poison) && rng.percent(25) {
        player.status.set(StatusKind::Poisoned, 5);
        effects.push(OnHit::Poisoned);
    }
    if abilities.contains(&Ability::Hold) && rng.percent(15) {
        player.status.set(StatusKind::Paralyzed, 3);
        effects.push(OnHit::Paralyzed);
    }
    if abilities.contains(&Ability::Confusion) && rng.percent(20) {
        player.status.set(StatusKind::Confused, 4);
        effects.push(OnHit::Confused);
    }
    if abilities.contains(&Ability::Drain) && rng.percent(30) {
        let amount = rng.range(1, 4);
        player.max_hp = (player.max_hp - amount).max(MIN_DRAINED_MAX_HP);
        player.hp = player.hp.min(player.max_hp);
        effects.push(OnHit::Drained(amount));
    }
    if abilities.contains(&Ability::Rust) && rng.percent(20) {
        if let Some(armor) = player.equipment.armor.as_mut() {
            if let ItemKind::Armor { defense } = &mut armor.kind {
                *defense = (*defense - 1).max(0);
            }
            player.recompute_stats();
            effects.push(OnHit::Rusted);
        }
    }

    let steals_all = abilities.contains(&Ability::StealAll);
    if (steals_all || abilities.contains(&Ability::Steal)) && rng.percent(15) {
        if steals_all {
            if player.gold > 0 {
                player.gold = 0;
                effects.push(OnHit::StoleAllGold);
            }
        } else {
            let stolen = player.gold.min(rng.range(10, 60));
            if stolen > 0 {
                player.gold -= stolen;
                effects.push(OnHit::StoleGold(stolen));
            }
        }
    }

    effects
}

#[cfg(test)]
mod tests {
    use bracket_geometry::prelude::Point;

    use super::*;
    use crate::data::items::{ItemId, ItemTemplate};

    #[test]
    fn classic_exchange_without_variance() {
        assert_eq!(damage_roll(10, 5, 0), 5);
    }

    #[test]
    fn damage_is_never_below_one() {
        assert_eq!(damage_roll(1, 50, -2), 1);
        let mut rng = GameRng::seeded(8);
        let weak = CombatStats {
            max_hp: 5,
            hp: 5,
            attack: 0,
            defense: 0,
        };
        for _ in 0..50 {
            let mut player = PlayerState::new(Point::new(0, 0));
            let outcome = resolve_attack(&weak, &mut player, &mut rng);
            assert!(outcome.damage >= 1);
        }
    }

    #[test]
    fn lethal_blow_reports_death() {
        let mut rng = GameRng::seeded(2);
        let mut victim = CombatStats {
            max_hp: 3,
            hp: 1,
            attack: 1,
            defense: 0,
        };
        let player = PlayerState::new(Point::new(0, 0));
        let outcome = resolve_attack(&player, &mut victim, &mut rng);
        assert!(outcome.defender_died);
        assert!(victim.hp <= 0);
    }

    #[test]
    fn drain_floors_max_hp() {
        let mut rng = GameRng::seeded(4);
        let mut player = PlayerState::new(Point::new(0, 0));
        player.max_hp = 11;
        player.hp = 11;
        for _ in 0..200 {
            roll_on_hit(&[Ability::Drain], &mut player, &mut rng);
        }
        assert_eq!(player.max_hp, MIN_DRAINED_MAX_HP);
        assert!(player.hp <= player.max_hp);
    }

    #[test]
    fn rust_needs_armor_and_stops_at_zero() {
        let mut rng = GameRng::seeded(6);
        let mut player = PlayerState::new(Point::new(0, 0));
        for _ in 0..100 {
            assert!(!roll_on_hit(&[Ability::Rust], &mut player, &mut rng).contains(&OnHit::Rusted));
        }
        let shield = ItemTemplate::by_name("Buckler").expect("buckler").instantiate(ItemId(1));
        player.equipment.armor = Some(shield);
        player.recompute_stats();
        for _ in 0..200 {
            roll_on_hit(&[Ability::Rust], &mut player, &mut rng);
        }
        assert_eq!(player.equipment.armor_defense(), 0);
        assert_eq!(player.stats.defense, player.base.defense);
    }

    #[test]
    fn nymph_takes_everything() {
        let mut rng = GameRng::seeded(10);
        let mut player = PlayerState::new(Point::new(0, 0));
        player.gold = 500;
        let mut stolen = false;
        for _ in 0..200 {
            if roll_on_hit(&[Ability::StealAll], &mut player, &mut rng).contains(&OnHit::StoleAllGold) {
                stolen = true;
                break;
            }
        }
        assert!(stolen);
        assert_eq!(player.gold, 0);
    }

    #[test]
    fn leprechaun_takes_at_most_what_you_carry() {
        let mut rng = GameRng::seeded(10);
        let mut player = PlayerState::new(Point::new(0, 0));
        player.gold = 12;
        for _ in 0..200 {
            roll_on_hit(&[Ability::Steal], &mut player, &mut rng);
            assert!(player.gold >= 0);
        }
        assert_eq!(player.gold, 0);
    }
}
