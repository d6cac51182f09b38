pub mod items;
pub mod monsters;
pub mod spells;

/// Presentation colour carried by templates; renderers convert it.
pub type Rgb = (u8, u8, u8);

pub const PLAYER_COLOR: Rgb = (125, 216, 125);
pub const MERCHANT_COLOR: Rgb = (241, 196, 15);
pub const TRAP_COLOR: Rgb = (231, 76, 60);
pub const PROJECTILE_COLOR: Rgb = (120, 170, 255);
