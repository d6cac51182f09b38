use crate::{
    data::spells::{ALL_SPELLS, SpellKind},
    ecs::resources::{MessageLog, SoundQueue},
    hooks::SoundEvent,
    player::PlayerState,
    rng::GameRng,
    text::{MessageCategory, MessageKey, params},
};

/// What one level gained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelGain {
    pub level: i32,
    pub hp: i32,
    pub mp: i32,
    pub attack: i32,
    pub defense: i32,
    pub learned: Vec<SpellKind>,
}

/// Grants one level: raises the threshold and rolls the stat gains. Does not
/// touch the experience pool.
pub fn raise_level(player: &mut PlayerState, rng: &mut GameRng) -> LevelGain {
    player.level += 1;
    player.experience_to_next = (player.experience_to_next as f64 * 1.5).floor() as i32;

    let hp = rng.range(8, 15);
    let mp = rng.range(3, 8);
    let attack = rng.range(1, 3);
    let defense = rng.range(1, 2);

    player.max_hp += hp;
    player.hp += hp;
    player.max_mp += mp;
    player.mp += mp;
    player.base.attack += attack;
    player.base.defense += defense;
    if player.level % 2 == 0 {
        player.base.dexterity += 1;
    }
    player.recompute_stats();

    let learned: Vec<SpellKind> = ALL_SPELLS
        .iter()
        .copied()
        .filter(|spell| spell.learned_at().is_some_and(|level| level <= player.level))
        .filter(|spell| !player.knows(*spell))
        .collect();
    player.spells.extend(learned.iter().copied());

    LevelGain {
        level: player.level,
        hp,
        mp,
        attack,
        defense,
        learned,
    }
}

/// Converts banked experience into levels, as many as it pays for.
pub fn check_level_up(player: &mut PlayerState, rng: &mut GameRng) -> Vec<LevelGain> {
    let mut gains = Vec::new();
    while player.experience >= player.experience_to_next {
        player.experience -= player.experience_to_next;
        gains.push(raise_level(player, rng));
    }
    gains
}

pub fn award_kill(
    player: &mut PlayerState,
    experience: i32,
    gold: i32,
    rng: &mut GameRng,
) -> Vec<LevelGain> {
    player.experience += experience;
    player.gold += gold;
    check_level_up(player, rng)
}

pub fn announce(gains: &[LevelGain], log: &mut MessageLog, sounds: &mut SoundQueue) {
    for gain in gains {
        sounds.push(SoundEvent::LevelUp);
        log.push_with(
            MessageKey::LevelUp,
            MessageCategory::System,
            params([("level", gain.level.to_string())]),
        );
        log.push_with(
            MessageKey::LevelUpGains,
            MessageCategory::System,
            params([
                ("hp", gain.hp.to_string()),
                ("mp", gain.mp.to_string()),
                ("attack", gain.attack.to_string()),
                ("defense", gain.defense.to_string()),
            ]),
        );
        for spell in &gain.learned {
            log.push_with(
                MessageKey::SpellLearned,
                MessageCategory::System,
                params([("spell", spell.name().to_string())]),
            );
        }
    }
}

pub fn final_score(player: &PlayerState, floor: u32, turn: u64) -> i64 {
    player.gold as i64
        + player.experience as i64 * 2
        + (player.level as i64 - 1) * 100
        + floor as i64 * 50
        + turn as i64
        + player.equipment.weapon_attack() as i64 * 25
        + player.equipment.armor_defense() as i64 * 25
}

#[cfg(test)]
mod tests {
    use bracket_geometry::prelude::Point;

    use super::*;

    #[test]
    fn two_level_cascade() {
        let mut player = PlayerState::new(Point::new(0, 0));
        let mut rng = GameRng::seeded(21);
        player.experience = 260;
        let gains = check_level_up(&mut player, &mut rng);
        assert_eq!(gains.len(), 2);
        assert_eq!(player.level, 3);
        assert_eq!(player.experience, 10);
        assert_eq!(player.experience_to_next, 225);
        assert!(player.knows(SpellKind::HoldMonsters));
    }

    #[test]
    fn gains_stay_in_range() {
        let mut player = PlayerState::new(Point::new(0, 0));
        let mut rng = GameRng::seeded(22);
        let gain = raise_level(&mut player, &mut rng);
        assert!((8..15).contains(&gain.hp));
        assert!((3..8).contains(&gain.mp));
        assert!((1..3).contains(&gain.attack));
        assert_eq!(gain.defense, 1);
        assert_eq!(player.base.dexterity, 11);
        assert_eq!(player.stats.attack, player.base.attack);
    }

    #[test]
    fn kill_awards_experience_and_gold() {
        let mut player = PlayerState::new(Point::new(0, 0));
        let mut rng = GameRng::seeded(23);
        let gains = award_kill(&mut player, 40, 12, &mut rng);
        assert!(gains.is_empty());
        assert_eq!(player.experience, 40);
        assert_eq!(player.gold, 12);
    }

    #[test]
    fn score_counts_every_source() {
        let mut player = PlayerState::new(Point::new(0, 0));
        player.gold = 30;
        player.experience = 20;
        player.level = 2;
        assert_eq!(final_score(&player, 3, 100), 30 + 40 + 100 + 150 + 100);
    }

    #[test]
    fn announcing_logs_each_level() {
        let mut player = PlayerState::new(Point::new(0, 0));
        let mut rng = GameRng::seeded(24);
        let mut log = MessageLog::new(50);
        let mut sounds = SoundQueue::default();
        player.experience = 100;
        let gains = check_level_up(&mut player, &mut rng);
        announce(&gains, &mut log, &mut sounds);
        assert_eq!(sounds.drain(), vec![SoundEvent::LevelUp]);
        assert!(log.entries().any(|entry| entry.key == MessageKey::LevelUp));
    }
}
