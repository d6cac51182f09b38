//! Symbolic message keys and the default English text table.
//!
//! The core never produces literal prose; it logs a [`MessageKey`] with a
//! parameter map and a presentation layer renders it through a [`Localizer`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoStaticStr};

pub type MessageParams = BTreeMap<String, String>;

pub fn params<const N: usize>(pairs: [(&str, String); N]) -> MessageParams {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum MessageKey {
    // session
    Welcome,
    FindStairs,
    Descend,
    PlayerDies,
    KilledBy,
    GameOverHint,
    GameLoaded,
    // refused input
    MoveBlocked,
    InvalidItemNumber,
    InvalidSpellNumber,
    InvalidOfferNumber,
    NotEnoughMana,
    NotEnoughGold,
    NothingEquipped,
    CannotUseItem,
    NothingToPickUp,
    CommandUnavailable,
    // movement
    Paralyzed,
    Stumble,
    FloatOverStairs,
    // modal prompts
    InventoryEmpty,
    InventoryLine,
    SelectItemPrompt,
    SelectSpellPrompt,
    SpellLine,
    SelectionCancelled,
    AimPrompt,
    SpellCancelled,
    ShopWelcome,
    ShopOffer,
    ShopBought,
    ShopLeave,
    // status wear-off
    ConfusionWearsOff,
    PoisonWearsOff,
    ParalysisWearsOff,
    HallucinationWearsOff,
    BlindnessWearsOff,
    LevitationWearsOff,
    HasteWearsOff,
    SeeInvisibleWearsOff,
    DetectMonstersWearsOff,
    DetectMagicWearsOff,
    FrozenWearsOff,
    SleepWearsOff,
    FearWearsOff,
    // progression
    LevelUp,
    LevelUpGains,
    SpellLearned,
    // combat
    PlayerHits,
    MonsterHits,
    MonsterDies,
    LootDropped,
    PoisonBite,
    Paralyze,
    Confuse,
    Drain,
    Rust,
    StealAllGold,
    StealGold,
    TheftNothing,
    TheftItem,
    MonsterWakes,
    MonsterRegenerates,
    MonsterAppears,
    ProjectileHits,
    // traps
    TrapAvoided,
    TrapDamage,
    TrapTeleport,
    TrapAlarm,
    // items
    PickedUpGold,
    PickedUpItem,
    Dropped,
    Drink,
    Read,
    Heal,
    HealMuch,
    ManaRestored,
    Stronger,
    StrengthRestored,
    NothingHappens,
    RaiseLevel,
    Haste,
    EyesTingle,
    SenseMonsters,
    SenseMagic,
    Float,
    FeelConfused,
    Hallucinate,
    FeelSick,
    Darkness,
    HummingNoise,
    StrangeFeeling,
    MonstersFreeze,
    FaintCry,
    ArmorGlows,
    SkinCrawls,
    WeaponGlows,
    HandsTingle,
    IdentifyScroll,
    ManiacalLaughter,
    NoseTingles,
    StrangeSensation,
    WatchedOver,
    ArmorShielded,
    // equipment
    EquipWeapon,
    EquipArmor,
    PutOnRing,
    Unequip,
    RemoveRing,
    // spells
    CastSpell,
    SpellHeal,
    HoldMonsters,
}

impl MessageKey {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageCategory {
    System,
    Combat,
    Item,
}

pub trait Localizer {
    fn text(&self, key: MessageKey, params: &MessageParams) -> String;
}

/// Built-in English table. Placeholders use `{name}` syntax.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnglishText;

impl Localizer for EnglishText {
    fn text(&self, key: MessageKey, params: &MessageParams) -> String {
        let mut text = english(key).to_string();
        for (name, value) in params {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }
}

fn english(key: MessageKey) -> &'static str {
    match key {
        MessageKey::Welcome => "Welcome to the dungeon! (Floor {floor})",
        MessageKey::FindStairs => "Find the stairs to descend deeper.",
        MessageKey::Descend => "You descend deeper into the dungeon... (Floor {floor})",
        MessageKey::PlayerDies => "You have died! Game Over.",
        MessageKey::KilledBy => "Killed by {cause} on floor {floor}. Final score: {score}",
        MessageKey::GameOverHint => "You are dead. Start a new game or load a save.",
        MessageKey::GameLoaded => "Game loaded! (Floor {floor}, Turn {turn})",
        MessageKey::MoveBlocked => "Something blocks your way.",
        MessageKey::InvalidItemNumber => "Invalid item number.",
        MessageKey::InvalidSpellNumber => "Invalid spell number.",
        MessageKey::InvalidOfferNumber => "The merchant has nothing like that.",
        MessageKey::NotEnoughMana => "Not enough mana! ({need} needed, {have} available)",
        MessageKey::NotEnoughGold => "You can't afford that! ({price} gold, you have {have})",
        MessageKey::NothingEquipped => "You have nothing equipped there.",
        MessageKey::CannotUseItem => "You can't use that item.",
        MessageKey::NothingToPickUp => "There's nothing here to pick up.",
        MessageKey::CommandUnavailable => "You can't do that right now.",
        MessageKey::Paralyzed => "You are paralyzed and cannot move!",
        MessageKey::Stumble => "You stumble around in confusion!",
        MessageKey::FloatOverStairs => "You float over the stairs.",
        MessageKey::InventoryEmpty => "Your inventory is empty.",
        MessageKey::InventoryLine => "{index}: {glyph} {name}",
        MessageKey::SelectItemPrompt => "Press 1-9 to use item, or ESC to cancel.",
        MessageKey::SelectSpellPrompt => "Press 1-9 to cast a spell, or ESC to cancel.",
        MessageKey::SpellLine => "{index}: {name} ({cost} MP)",
        MessageKey::SelectionCancelled => "Selection cancelled.",
        MessageKey::AimPrompt => "Choose a direction for {spell}, or ESC to cancel.",
        MessageKey::SpellCancelled => "You stop casting {spell}. ({cost} MP refunded)",
        MessageKey::ShopWelcome => "{merchant} greets you. You have {gold} gold.",
        MessageKey::ShopOffer => "{index}: {name} - {price} gold",
        MessageKey::ShopBought => "You buy {item} for {price} gold.",
        MessageKey::ShopLeave => "You leave the shop.",
        MessageKey::ConfusionWearsOff => "You feel less confused.",
        MessageKey::PoisonWearsOff => "You feel better now.",
        MessageKey::ParalysisWearsOff => "You can move again.",
        MessageKey::HallucinationWearsOff => "The strange visions fade away.",
        MessageKey::BlindnessWearsOff => "You can see again!",
        MessageKey::LevitationWearsOff => "You float gently to the ground.",
        MessageKey::HasteWearsOff => "You feel yourself slow down.",
        MessageKey::SeeInvisibleWearsOff => "Your eyes stop tingling.",
        MessageKey::DetectMonstersWearsOff => "You no longer sense monsters.",
        MessageKey::DetectMagicWearsOff => "You no longer sense magic.",
        MessageKey::FrozenWearsOff => "You thaw out.",
        MessageKey::SleepWearsOff => "You wake up.",
        MessageKey::FearWearsOff => "You regain your courage.",
        MessageKey::LevelUp => "Level up! You are now level {level}!",
        MessageKey::LevelUpGains => "HP +{hp}, MP +{mp}, Attack +{attack}, Defense +{defense}",
        MessageKey::SpellLearned => "You learn the spell {spell}!",
        MessageKey::PlayerHits => "You hit {monster} for {damage} damage!",
        MessageKey::MonsterHits => "{monster} hits you for {damage} damage!",
        MessageKey::MonsterDies => "{monster} dies!",
        MessageKey::LootDropped => "{monster} drops what it stole.",
        MessageKey::PoisonBite => "{monster}'s poison weakens you!",
        MessageKey::Paralyze => "{monster} paralyzes you!",
        MessageKey::Confuse => "{monster} confuses you!",
        MessageKey::Drain => "{monster} drains your life force!",
        MessageKey::Rust => "{monster}'s acid damages your armor!",
        MessageKey::StealAllGold => "{monster} charms you and steals all your gold!",
        MessageKey::StealGold => "{monster} steals {amount} gold!",
        MessageKey::TheftNothing => "{monster} tries to steal but you have nothing!",
        MessageKey::TheftItem => "{monster} steals your {item}!",
        MessageKey::MonsterWakes => "The {monster} wakes up!",
        MessageKey::MonsterRegenerates => "{monster} regenerates health!",
        MessageKey::MonsterAppears => "{monster} suddenly appears!",
        MessageKey::ProjectileHits => "The bolt strikes {monster} for {damage} damage!",
        MessageKey::TrapAvoided => "You nimbly avoid a {trap} trap!",
        MessageKey::TrapDamage => "A hidden trap wounds you for {damage} damage!",
        MessageKey::TrapTeleport => "A teleport trap whisks you away!",
        MessageKey::TrapAlarm => "An alarm blares through the dungeon!",
        MessageKey::PickedUpGold => "You picked up {amount} gold!",
        MessageKey::PickedUpItem => "You picked up {item}!",
        MessageKey::Dropped => "You drop {item}.",
        MessageKey::Drink => "You drink the {item}.",
        MessageKey::Read => "You read the {item}.",
        MessageKey::Heal => "You feel better! (+{amount} HP)",
        MessageKey::HealMuch => "You feel much better! (+{amount} HP)",
        MessageKey::ManaRestored => "Your magic returns! (+{amount} MP)",
        MessageKey::Stronger => "You feel stronger!",
        MessageKey::StrengthRestored => "Your strength is restored!",
        MessageKey::NothingHappens => "Nothing happens.",
        MessageKey::RaiseLevel => "You feel more experienced!",
        MessageKey::Haste => "You feel yourself speed up!",
        MessageKey::EyesTingle => "Your eyes begin to tingle!",
        MessageKey::SenseMonsters => "You sense monsters around you!",
        MessageKey::SenseMagic => "You sense magic around you!",
        MessageKey::Float => "You start to float in the air!",
        MessageKey::FeelConfused => "You feel confused!",
        MessageKey::Hallucinate => "You begin to hallucinate...",
        MessageKey::FeelSick => "You feel very sick!",
        MessageKey::Darkness => "A cloak of darkness falls around you!",
        MessageKey::HummingNoise => "You hear a high pitched humming noise.",
        MessageKey::StrangeFeeling => "You have a strange feeling for a moment, then it passes.",
        MessageKey::MonstersFreeze => "The monsters around you freeze!",
        MessageKey::FaintCry => "You hear a faint cry of anguish in the distance.",
        MessageKey::ArmorGlows => "Your {item} glows for a moment!",
        MessageKey::SkinCrawls => "Your skin crawls for a moment.",
        MessageKey::WeaponGlows => "Your {item} glows for a moment!",
        MessageKey::HandsTingle => "Your hands tingle for a moment.",
        MessageKey::IdentifyScroll => "This is an identify scroll.",
        MessageKey::ManiacalLaughter => "You hear maniacal laughter in the distance.",
        MessageKey::NoseTingles => "Your nose tingles.",
        MessageKey::StrangeSensation => "You feel a strange sensation!",
        MessageKey::WatchedOver => "You feel as if somebody is watching over you.",
        MessageKey::ArmorShielded => "Your {item} is covered by a shimmering gold shield!",
        MessageKey::EquipWeapon => "You equip {item}! Attack +{attack}",
        MessageKey::EquipArmor => "You equip {item}! Defense +{defense}",
        MessageKey::PutOnRing => "You put on {item} on your {hand} hand.",
        MessageKey::Unequip => "You unequip {item}.",
        MessageKey::RemoveRing => "You remove {item} from your {hand} hand.",
        MessageKey::CastSpell => "You cast {spell}!",
        MessageKey::SpellHeal => "Warm light mends your wounds. (+{amount} HP)",
        MessageKey::HoldMonsters => "{count} monsters are held in place!",
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn placeholders_are_substituted() {
        let mut params = MessageParams::new();
        params.insert("monster".to_string(), "Bat".to_string());
        params.insert("damage".to_string(), "4".to_string());
        let text = EnglishText.text(MessageKey::MonsterHits, &params);
        assert_eq!(text, "Bat hits you for 4 damage!");
    }

    #[test]
    fn every_key_has_text_and_a_symbolic_name() {
        for key in MessageKey::iter() {
            assert!(!english(key).is_empty());
            assert!(key.as_str().chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
