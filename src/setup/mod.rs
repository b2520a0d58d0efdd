//! First-run setup.
//!
//! Writes the default configuration file when it is missing or was created by
//! an older release.

pub mod version;

use crate::config::get_config_path;
use std::path::Path;

/// Embedded default configuration template.
const DEFAULT_CONFIG: &str = include_str!("../../environments/wavescrub.toml");

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Checks the config file version and runs setup when required.
///
/// - Missing config file: full setup
/// - Older or unversioned config file: only the version line is rewritten,
///   so user edits survive
/// - Current config file: nothing
///
/// # Errors
/// - If the config path cannot be determined
/// - If writing the config file fails
pub fn check_and_run_setup() -> anyhow::Result<()> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        tracing::info!("No config file found, writing defaults to {}", config_path.display());
        write_default_config(&config_path)?;
        return Ok(());
    }

    match version::check_setup_needed(&config_path)? {
        Some(old_version) => {
            tracing::info!(
                "Migrating config from version {} to {}",
                old_version,
                CURRENT_VERSION
            );
            version::update_config_version(&config_path).map_err(|e| {
                tracing::error!("Failed to update config version: {e}");
                anyhow::anyhow!("Failed to update config version: {e}")
            })?;
        }
        None => {
            tracing::debug!("Config version up to date ({})", CURRENT_VERSION);
        }
    }

    Ok(())
}

/// Writes the embedded template, prefixed with the current `config_version`.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_default_config(config_path: &Path) -> anyhow::Result<()> {
    std::fs::write(config_path, default_config_contents())?;
    Ok(())
}

fn default_config_contents() -> String {
    format!(r#"config_version = "{CURRENT_VERSION}""#) + "\n" + DEFAULT_CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WavescrubConfig;

    #[test]
    fn test_default_contents_start_with_version() {
        let contents = default_config_contents();
        let first = contents.lines().next().unwrap();
        assert_eq!(first, format!(r#"config_version = "{CURRENT_VERSION}""#));
        assert!(WavescrubConfig::parse(&contents).is_ok());
    }

    #[test]
    fn test_written_file_is_current() {
        let path = std::env::temp_dir().join(format!("wavescrub-setup-{}.toml", std::process::id()));
        write_default_config(&path).unwrap();
        assert_eq!(version::check_setup_needed(&path).unwrap(), None);
        std::fs::remove_file(&path).unwrap();
    }
}
