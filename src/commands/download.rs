//! Save a source to disk without opening the player.

use crate::config;
use crate::player::download;
use std::path::PathBuf;

/// Downloads `source` into `dir`, or the configured download directory.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the download fails
pub async fn handle_download(source: String, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => config::WavescrubConfig::load()?.download.resolve_directory(),
    };

    tracing::info!("Downloading {source} into {}", dir.display());
    let path = download::download(&source, &dir).await?;
    println!("{}", path.display());
    Ok(())
}
