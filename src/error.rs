//! Error types surfaced by the simulation core.

use thiserror::Error;

use crate::{
    player::EquipSlot,
    text::{MessageKey, MessageParams, params},
};

/// Rejected player input. The action is refused and no turn is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("no inventory item at index {0}")]
    InvalidItemIndex(usize),

    #[error("no known spell at index {0}")]
    InvalidSpellIndex(usize),

    #[error("no shop offer at index {0}")]
    InvalidOfferIndex(usize),

    #[error("the way is blocked")]
    Blocked,

    #[error("not enough mana: need {need}, have {have}")]
    InsufficientMana { need: i32, have: i32 },

    #[error("not enough gold: price {price}, have {have}")]
    InsufficientGold { price: i32, have: i32 },

    #[error("nothing equipped in the {0:?} slot")]
    EmptySlot(EquipSlot),

    #[error("that item cannot be used")]
    NotUsable,

    #[error("nothing here to pick up")]
    NothingHere,

    #[error("command is not available right now")]
    WrongMode,

    #[error("the game is over")]
    GameOver,
}

impl ActionError {
    /// Message shown to the player when the action is refused.
    pub fn message_key(&self) -> MessageKey {
        match self {
            ActionError::InvalidItemIndex(_) => MessageKey::InvalidItemNumber,
            ActionError::InvalidSpellIndex(_) => MessageKey::InvalidSpellNumber,
            ActionError::InvalidOfferIndex(_) => MessageKey::InvalidOfferNumber,
            ActionError::Blocked => MessageKey::MoveBlocked,
            ActionError::InsufficientMana { .. } => MessageKey::NotEnoughMana,
            ActionError::InsufficientGold { .. } => MessageKey::NotEnoughGold,
            ActionError::EmptySlot(_) => MessageKey::NothingEquipped,
            ActionError::NotUsable => MessageKey::CannotUseItem,
            ActionError::NothingHere => MessageKey::NothingToPickUp,
            ActionError::WrongMode => MessageKey::CommandUnavailable,
            ActionError::GameOver => MessageKey::GameOverHint,
        }
    }

    pub fn message_params(&self) -> MessageParams {
        match self {
            ActionError::InsufficientMana { need, have } => {
                params([("need", need.to_string()), ("have", have.to_string())])
            }
            ActionError::InsufficientGold { price, have } => {
                params([("price", price.to_string()), ("have", have.to_string())])
            }
            _ => MessageParams::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("corrupted snapshot: {0}")]
    Corrupted(String),
}
