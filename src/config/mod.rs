//! Configuration management for wavescrub.
//!
//! Settings live in a TOML file in the user's config directory. The file is
//! created from an embedded template on first run (see [`crate::setup`]).

pub mod file;

pub use file::{
    config_dir, get_config_path, AudioConfig, DisplayConfig, DownloadConfig, PlayerConfig,
    WavescrubConfig,
};
