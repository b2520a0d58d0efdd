//! Opens the wavescrub configuration file in the user's editor.

use crate::config::get_config_path;
use std::process::Command;

/// Editors tried, in order, when `$EDITOR` is unset.
const FALLBACK_EDITORS: [&str; 2] = ["nano", "vi"];

/// Opens the configuration file in `$EDITOR`, falling back to nano, then vi.
///
/// # Errors
/// - If no editor can be found or executed
/// - If the editor exits with a failure status
pub fn handle_config() -> anyhow::Result<()> {
    let config_path = get_config_path()?;

    tracing::info!("Opening config file: {}", config_path.display());

    let editor = find_editor(std::env::var("EDITOR").ok(), is_editor_available)?;
    tracing::debug!("Using editor: {}", editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to open editor '{editor}': {e}. Make sure the editor is installed and accessible."
            )
        })?;

    if !status.success() {
        return Err(anyhow::anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    // catch typos now rather than at the next `play`
    if let Err(e) = crate::config::WavescrubConfig::load() {
        println!("Warning: {e}");
        tracing::warn!("Edited config does not parse: {e}");
    }

    tracing::info!("Config file edited successfully");
    Ok(())
}

fn find_editor(
    from_env: Option<String>,
    available: impl Fn(&str) -> bool,
) -> anyhow::Result<String> {
    if let Some(editor) = from_env.filter(|e| !e.trim().is_empty()) {
        return Ok(editor);
    }

    FALLBACK_EDITORS
        .iter()
        .find(|editor| available(editor))
        .map(|editor| editor.to_string())
        .ok_or_else(|| anyhow::anyhow!("No editor found. Please set the $EDITOR environment variable."))
}

/// Checks if an editor is available in the system PATH.
fn is_editor_available(editor: &str) -> bool {
    Command::new("which")
        .arg(editor)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_env_wins() {
        let editor = find_editor(Some("hx".to_string()), |_| false).unwrap();
        assert_eq!(editor, "hx");
    }

    #[test]
    fn test_blank_env_falls_back() {
        let editor = find_editor(Some("  ".to_string()), |e| e == "vi").unwrap();
        assert_eq!(editor, "vi");
    }

    #[test]
    fn test_no_editor_found() {
        assert!(find_editor(None, |_| false).is_err());
    }
}
