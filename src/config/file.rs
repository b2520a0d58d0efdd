//! Configuration file management for wavescrub.
//!
//! Loads the application configuration from
//! `~/.config/wavescrub/wavescrub.toml`. Every field has a default so a
//! partially filled file still loads.

use crate::player::ProfileName;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Player defaults, overridable per invocation from the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Visual profile used when `--profile` is not given
    #[serde(default)]
    pub profile: ProfileName,
    /// Start playing as soon as the source is ready
    #[serde(default)]
    pub autoplay: bool,
    /// Restart from the beginning at the end of the source
    #[serde(default, rename = "loop")]
    pub looping: bool,
    /// Offer the download action in the player
    #[serde(default = "default_true")]
    pub show_download: bool,
    /// Initial volume in [0, 1]
    #[serde(default = "default_volume")]
    pub volume: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            profile: ProfileName::default(),
            autoplay: false,
            looping: false,
            show_download: true,
            volume: default_volume(),
        }
    }
}

/// Rendering and interaction tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Interval between animation frames in milliseconds
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    /// Time constant of the scroll easing in milliseconds (0 snaps)
    #[serde(default = "default_scroll_smoothing_ms")]
    pub scroll_smoothing_ms: u64,
    /// Seconds skipped by the arrow keys
    #[serde(default = "default_seek_step_secs")]
    pub seek_step_secs: f64,
}

impl DisplayConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }

    pub fn scroll_smoothing(&self) -> Duration {
        Duration::from_millis(self.scroll_smoothing_ms)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            scroll_smoothing_ms: default_scroll_smoothing_ms(),
            seek_step_secs: default_seek_step_secs(),
        }
    }
}

/// Audio output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Output device. Options:
    /// - "default" for the system default device
    /// - numeric index (0, 1, 2, etc.) from `wavescrub list-devices`
    /// - device name from `wavescrub list-devices`
    #[serde(default = "default_device")]
    pub device: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
        }
    }
}

/// Where downloads are written.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Target directory; empty means the user's download directory
    #[serde(default)]
    pub directory: String,
}

impl DownloadConfig {
    /// Resolves the target directory, falling back to `~/Downloads` and then
    /// the working directory.
    pub fn resolve_directory(&self) -> PathBuf {
        if !self.directory.trim().is_empty() {
            return expand_home(self.directory.trim());
        }
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f64 {
    1.0
}

fn default_frame_interval_ms() -> u64 {
    16
}

fn default_scroll_smoothing_ms() -> u64 {
    150
}

fn default_seek_step_secs() -> f64 {
    5.0
}

fn default_device() -> String {
    "default".to_string()
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WavescrubConfig {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

impl WavescrubConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        let config_content = fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", config_path.display()))?;
        Self::parse(&config_content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    /// - If the TOML is malformed or a value has the wrong type
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: WavescrubConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
        Ok(config)
    }
}

/// Path of the config file. Creates the config directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let config_dir = config_dir()?;
    fs::create_dir_all(&config_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create config directory: {e}"))?;
    Ok(config_dir.join("wavescrub.toml"))
}

/// `~/.config/wavescrub`
///
/// # Errors
/// - If the home directory cannot be determined
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".config").join("wavescrub"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = WavescrubConfig::parse("").unwrap();
        assert_eq!(config, WavescrubConfig::default());
        assert_eq!(config.player.profile, ProfileName::UltraSmooth);
        assert!(config.player.show_download);
        assert_eq!(config.display.frame_interval(), Duration::from_millis(16));
        assert_eq!(config.audio.device, "default");
    }

    #[test]
    fn test_partial_sections() {
        let config = WavescrubConfig::parse(
            r#"
config_version = "0.1.0"

[player]
profile = "beautiful"
loop = true

[display]
seek_step_secs = 10.0
"#,
        )
        .unwrap();
        assert_eq!(config.player.profile, ProfileName::Beautiful);
        assert!(config.player.looping);
        assert!(!config.player.autoplay);
        assert_eq!(config.player.volume, 1.0);
        assert_eq!(config.display.seek_step_secs, 10.0);
        assert_eq!(config.display.scroll_smoothing_ms, 150);
    }

    #[test]
    fn test_unknown_profile_is_rejected() {
        let err = WavescrubConfig::parse("[player]\nprofile = \"neon\"\n").unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }

    #[test]
    fn test_embedded_template_parses() {
        let template = include_str!("../../environments/wavescrub.toml");
        let config = WavescrubConfig::parse(template).unwrap();
        assert_eq!(config, WavescrubConfig::default());
    }

    #[test]
    fn test_zero_frame_interval_is_clamped() {
        let display = DisplayConfig {
            frame_interval_ms: 0,
            ..DisplayConfig::default()
        };
        assert_eq!(display.frame_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_explicit_download_directory() {
        let download = DownloadConfig {
            directory: "/tmp/music".to_string(),
        };
        assert_eq!(download.resolve_directory(), PathBuf::from("/tmp/music"));
    }

    #[test]
    fn test_round_trip_serialization() {
        let mut config = WavescrubConfig::default();
        config.player.profile = ProfileName::Professional;
        config.download.directory = "~/Music".to_string();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(WavescrubConfig::parse(&text).unwrap(), config);
    }
}
