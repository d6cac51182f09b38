//! Tunable game parameters. Defaults mirror the classic browser game.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MAP_WIDTH: i32 = 40;
pub const DEFAULT_MAP_HEIGHT: i32 = 40;
pub const DEFAULT_SEED: u64 = 0x51ec_5ead;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub seed: u64,
    pub map_width: i32,
    pub map_height: i32,
    pub message_capacity: usize,
    pub room_attempts_min: i32,
    pub room_attempts_max: i32,
    pub room_size_min: i32,
    pub room_size_max: i32,
    pub trap_density_percent: i32,
    pub shop_chance_percent: i32,
    pub item_chance_percent: i32,
    pub view_radius: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            map_width: DEFAULT_MAP_WIDTH,
            map_height: DEFAULT_MAP_HEIGHT,
            message_capacity: 50,
            room_attempts_min: 5,
            room_attempts_max: 10,
            room_size_min: 4,
            room_size_max: 8,
            trap_density_percent: 3,
            shop_chance_percent: 20,
            item_chance_percent: 60,
            view_radius: 8,
        }
    }
}

impl GameConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: GameConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.room_size_min < 3 || self.room_size_max <= self.room_size_min {
            return Err(ConfigError::Invalid(format!(
                "room size range {}..{} is unusable",
                self.room_size_min, self.room_size_max
            )));
        }
        if self.map_width < self.room_size_max + 4 || self.map_height < self.room_size_max + 4 {
            return Err(ConfigError::Invalid(format!(
                "map {}x{} cannot hold rooms up to {}",
                self.map_width, self.map_height, self.room_size_max
            )));
        }
        if self.room_attempts_min < 1 || self.room_attempts_max <= self.room_attempts_min {
            return Err(ConfigError::Invalid("room attempt range is empty".to_string()));
        }
        if self.message_capacity == 0 {
            return Err(ConfigError::Invalid("message capacity must be positive".to_string()));
        }
        Ok(())
    }
}
