//! Timed conditions on the player.
//!
//! Every effect is a plain countdown: it is set to a number of turns, loses one
//! per turn tick and is removed (with a single wears-off message) when it hits
//! zero. Poison is the only effect that does something every tick, and it is
//! not lethal on its own: it never takes the player below 1 hp.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};

use crate::{
    ecs::resources::{MessageLog, SoundQueue},
    hooks::SoundEvent,
    player::PlayerState,
    rng::GameRng,
    text::{MessageCategory, MessageKey},
};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, IntoStaticStr, EnumIter,
)]
#[strum(serialize_all = "camelCase")]
pub enum StatusKind {
    Confused,
    Poisoned,
    Paralyzed,
    Hallucinating,
    Blind,
    Levitating,
    Hasted,
    SeeInvisible,
    DetectMonsters,
    DetectMagic,
    Frozen,
    Sleeping,
    Scared,
}

impl StatusKind {
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn wears_off(self) -> MessageKey {
        match self {
            StatusKind::Confused => MessageKey::ConfusionWearsOff,
            StatusKind::Poisoned => MessageKey::PoisonWearsOff,
            StatusKind::Paralyzed => MessageKey::ParalysisWearsOff,
            StatusKind::Hallucinating => MessageKey::HallucinationWearsOff,
            StatusKind::Blind => MessageKey::BlindnessWearsOff,
            StatusKind::Levitating => MessageKey::LevitationWearsOff,
            StatusKind::Hasted => MessageKey::HasteWearsOff,
            StatusKind::SeeInvisible => MessageKey::SeeInvisibleWearsOff,
            StatusKind::DetectMonsters => MessageKey::DetectMonstersWearsOff,
            StatusKind::DetectMagic => MessageKey::DetectMagicWearsOff,
            StatusKind::Frozen => MessageKey::FrozenWearsOff,
            StatusKind::Sleeping => MessageKey::SleepWearsOff,
            StatusKind::Scared => MessageKey::FearWearsOff,
        }
    }

    /// Conditions under which the player cannot act.
    pub fn is_incapacitating(self) -> bool {
        matches!(
            self,
            StatusKind::Paralyzed | StatusKind::Frozen | StatusKind::Sleeping
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffects {
    active: BTreeMap<StatusKind, u32>,
}

impl StatusEffects {
    /// Sets `kind` to `turns` remaining, replacing any previous duration.
    pub fn set(&mut self, kind: StatusKind, turns: u32) {
        if turns == 0 {
            self.active.remove(&kind);
        } else {
            self.active.insert(kind, turns);
        }
    }

    pub fn remaining(&self, kind: StatusKind) -> u32 {
        self.active.get(&kind).copied().unwrap_or(0)
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.remaining(kind) > 0
    }

    pub fn is_incapacitated(&self) -> bool {
        self.active.keys().any(|kind| kind.is_incapacitating())
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatusKind, u32)> + '_ {
        self.active.iter().map(|(kind, turns)| (*kind, *turns))
    }

    /// Decrements every active effect once and returns the ones that expired.
    pub fn tick(&mut self) -> Vec<StatusKind> {
        let mut expired = Vec::new();
        for (kind, turns) in self.active.iter_mut() {
            *turns = turns.saturating_sub(1);
            if *turns == 0 {
                expired.push(*kind);
            }
        }
        self.active.retain(|_, turns| *turns > 0);
        expired
    }
}

/// Per-turn player status pass: poison damage first, then the countdowns.
pub fn tick_player_status(
    player: &mut PlayerState,
    rng: &mut GameRng,
    log: &mut MessageLog,
    sounds: &mut SoundQueue,
) {
    if player.status.has(StatusKind::Poisoned) {
        let damage = rng.range(1, 4);
        player.hp = (player.hp - damage).max(1);
        sounds.push(SoundEvent::Poison);
    }

    for kind in player.status.tick() {
        log.push(kind.wears_off(), MessageCategory::System);
    }
}

#[cfg(test)]
mod tests {
    use bracket_geometry::prelude::Point;

    use super::*;

    #[test]
    fn countdown_clears_exactly_once() {
        let mut player = PlayerState::new(Point::new(0, 0));
        let mut rng = GameRng::seeded(1);
        let mut log = MessageLog::new(50);
        let mut sounds = SoundQueue::default();
        player.status.set(StatusKind::Confused, 2);

        tick_player_status(&mut player, &mut rng, &mut log, &mut sounds);
        assert_eq!(player.status.remaining(StatusKind::Confused), 1);
        assert_eq!(log.len(), 0);

        tick_player_status(&mut player, &mut rng, &mut log, &mut sounds);
        assert!(!player.status.has(StatusKind::Confused));
        tick_player_status(&mut player, &mut rng, &mut log, &mut sounds);

        let wear_offs = log
            .entries()
            .filter(|entry| entry.key == MessageKey::ConfusionWearsOff)
            .count();
        assert_eq!(wear_offs, 1);
    }

    #[test]
    fn poison_never_kills() {
        let mut player = PlayerState::new(Point::new(0, 0));
        let mut rng = GameRng::seeded(5);
        let mut log = MessageLog::new(50);
        let mut sounds = SoundQueue::default();
        player.hp = 2;
        player.status.set(StatusKind::Poisoned, 10);
        for _ in 0..10 {
            tick_player_status(&mut player, &mut rng, &mut log, &mut sounds);
            assert!(player.hp >= 1);
        }
        assert_eq!(player.hp, 1);
        assert!(!player.status.has(StatusKind::Poisoned));
        assert_eq!(
            log.entries().filter(|e| e.key == MessageKey::PoisonWearsOff).count(),
            1
        );
    }

    #[test]
    fn every_kind_has_its_own_wear_off_message() {
        use strum::IntoEnumIterator;
        let mut keys: Vec<MessageKey> = StatusKind::iter().map(StatusKind::wears_off).collect();
        let total = keys.len();
        keys.sort_by_key(|key| key.as_str());
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn setting_zero_removes_the_effect() {
        let mut status = StatusEffects::default();
        status.set(StatusKind::Blind, 4);
        status.set(StatusKind::Blind, 0);
        assert_eq!(status.iter().count(), 0);
    }
}
