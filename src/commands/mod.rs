//! Command handlers for wavescrub.
//!
//! # Commands
//! - `play`: Interactive waveform player (default)
//! - `download`: Save a source to disk
//! - `profiles`: List the built-in visual profiles
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio output devices
//! - `logs`: Display recent log entries

pub mod config;
pub mod download;
pub mod list_devices;
pub mod logs;
pub mod play;
pub mod profiles;

pub use config::handle_config;
pub use download::handle_download;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use play::{handle_play, PlayArgs};
pub use profiles::handle_profiles;
