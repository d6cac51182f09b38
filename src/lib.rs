//! Turn resolution and entity simulation for a classic-rules dungeon crawler.
//!
//! A [`Session`] owns one game: the floor map, a `specs` world holding the
//! monsters, items, traps, merchants and projectiles, and the player. Each
//! [`Command`] is resolved against that state and, when it costs a turn, the
//! monster pipeline runs once. Presentation is left to [`GameHooks`].

pub mod ai;
pub mod combat;
pub mod config;
pub mod data;
pub mod ecs;
pub mod error;
pub mod hooks;
pub mod map;
pub mod persistence;
pub mod player;
pub mod progression;
pub mod rng;
pub mod session;
pub mod status;
pub mod text;

pub use config::GameConfig;
pub use error::{ActionError, ConfigError, PersistenceError};
pub use hooks::{FrameView, GameHooks, NullHooks, SoundEvent};
pub use persistence::SessionSnapshot;
pub use player::{EquipSlot, PlayerState};
pub use session::{Command, Direction, GameMode, Session, TurnReport};
pub use text::{EnglishText, Localizer, MessageKey};
