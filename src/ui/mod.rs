//! Terminal screens.

pub mod error;
pub mod player;

pub use error::ErrorScreen;
pub use player::{ClickTarget, PlayerCommand, PlayerTui, PlayerView};
