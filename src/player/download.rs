//! Saving the current source to disk.
//!
//! Remote sources are fetched with reqwest, local ones are copied. Bytes go to
//! a `.part` file next to the target first and are renamed into place once
//! complete, so a failed download never leaves a truncated file behind.

use super::waveform::seed_for_source;
use anyhow::anyhow;
use std::path::{Path, PathBuf};

/// Whether `source` has to be fetched over HTTP.
pub fn is_remote(source: &str) -> bool {
    let lower = source.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Filesystem path of a local source: a plain path or a `file://` URI.
pub fn local_path(source: &str) -> Option<PathBuf> {
    let source = source.trim();
    if source.is_empty() || is_remote(source) {
        return None;
    }
    match source.strip_prefix("file://") {
        Some(rest) => {
            let decoded = urlencoding::decode(rest).ok()?;
            Some(PathBuf::from(decoded.into_owned()))
        }
        None => Some(PathBuf::from(source)),
    }
}

/// File name to save `source` under.
///
/// The percent-decoded last path segment, or `audio_<millis>.mp3` when the
/// source has none.
pub fn file_name_for(source: &str, now_millis: i64) -> String {
    let without_query = source
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let without_scheme = without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest);
    // a bare host has no file segment
    let path = without_scheme
        .split_once('/')
        .map_or("", |(_, path)| path);
    let segment = if source.contains("://") {
        path.rsplit('/').next().unwrap_or_default()
    } else {
        without_query.rsplit(['/', '\\']).next().unwrap_or_default()
    };

    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    let cleaned: String = decoded
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        format!("audio_{now_millis}.mp3")
    } else {
        cleaned.to_string()
    }
}

/// First of `name`, `stem (1).ext`, `stem (2).ext`, ... that does not exist in `dir`.
fn unique_target(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

async fn fetch_bytes(source: &str) -> anyhow::Result<Vec<u8>> {
    if let Some(path) = local_path(source) {
        return tokio::fs::read(&path)
            .await
            .map_err(|e| anyhow!("Failed to read {}: {e}", path.display()));
    }

    let response = reqwest::get(source.trim()).await.map_err(|e| {
        if e.is_connect() {
            anyhow!("Failed to connect to {source}. Check your internet connection.")
        } else if e.is_timeout() {
            anyhow!("Request to {source} timed out.")
        } else {
            anyhow!("Network error fetching {source}: {e}")
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("Server returned {status} for {source}"));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| anyhow!("Failed to read response body: {e}"))?;
    Ok(bytes.to_vec())
}

/// Writes the fetched bytes to `target` through a sibling `.part` file.
async fn save_to(source: &str, target: &Path) -> anyhow::Result<()> {
    let mut partial = target.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    let result = async {
        let bytes = fetch_bytes(source).await?;
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, target).await?;
        anyhow::Ok(bytes.len())
    }
    .await;

    match result {
        Ok(size) => {
            tracing::info!("Saved {} ({} bytes)", target.display(), size);
            Ok(())
        }
        Err(e) => {
            if tokio::fs::try_exists(&partial).await.unwrap_or(false) {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    tracing::warn!("Failed to remove {}: {cleanup}", partial.display());
                }
            }
            Err(e)
        }
    }
}

/// Downloads `source` into `dir` and returns the saved path.
///
/// # Errors
/// - If `dir` cannot be created
/// - If the source cannot be fetched or read
/// - If the file cannot be written
pub async fn download(source: &str, dir: &Path) -> anyhow::Result<PathBuf> {
    if source.trim().is_empty() {
        return Err(anyhow!("Nothing to download: source is empty"));
    }
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| anyhow!("Failed to create {}: {e}", dir.display()))?;

    let name = file_name_for(source, chrono::Utc::now().timestamp_millis());
    let target = unique_target(dir, &name);

    tracing::info!("Downloading {} to {}", source, target.display());
    if let Err(e) = save_to(source, &target).await {
        tracing::error!("Download failed: {e}");
        return Err(e);
    }
    Ok(target)
}

/// Cache location for `source`: the source's seed in hex plus its extension.
///
/// The same source always maps to the same file.
pub fn cache_path(cache_dir: &Path, source: &str) -> PathBuf {
    let name = file_name_for(source, 0);
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "mp3".to_string());
    cache_dir.join(format!("{:016x}.{ext}", seed_for_source(source)))
}

/// Returns the cached copy of `source`, fetching it on the first request.
///
/// # Errors
/// - If `cache_dir` cannot be created
/// - If the source cannot be fetched or the file cannot be written
pub async fn fetch_cached(source: &str, cache_dir: &Path) -> anyhow::Result<PathBuf> {
    let target = cache_path(cache_dir, source);
    if tokio::fs::try_exists(&target).await.unwrap_or(false) {
        tracing::debug!("Using cached {} for {}", target.display(), source);
        return Ok(target);
    }
    tokio::fs::create_dir_all(cache_dir)
        .await
        .map_err(|e| anyhow!("Failed to create {}: {e}", cache_dir.display()))?;

    tracing::info!("Caching {} at {}", source, target.display());
    save_to(source, &target).await?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wavescrub-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_remote_detection() {
        assert!(is_remote("https://example.com/a.mp3"));
        assert!(is_remote("HTTP://example.com/a.mp3"));
        assert!(!is_remote("file:///music/a.mp3"));
        assert!(!is_remote("/music/a.mp3"));
    }

    #[test]
    fn test_local_path() {
        assert_eq!(local_path("/music/a.wav"), Some(PathBuf::from("/music/a.wav")));
        assert_eq!(
            local_path("file:///music/my%20song.wav"),
            Some(PathBuf::from("/music/my song.wav"))
        );
        assert_eq!(local_path("https://example.com/a.wav"), None);
        assert_eq!(local_path(""), None);
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_for("https://cdn.example.com/tracks/My%20Song.mp3?sig=abc", 1),
            "My Song.mp3"
        );
        assert_eq!(file_name_for("/home/me/music/take.wav", 1), "take.wav");
    }

    #[test]
    fn test_file_name_fallback() {
        assert_eq!(file_name_for("https://example.com/", 1700), "audio_1700.mp3");
        assert_eq!(file_name_for("https://example.com", 1700), "audio_1700.mp3");
        assert_eq!(file_name_for("https://example.com/%2F", 5), "audio_5.mp3");
    }

    #[test]
    fn test_unique_target_numbers_duplicates() {
        let dir = scratch_dir("unique");
        std::fs::write(dir.join("song.mp3"), "a").unwrap();
        std::fs::write(dir.join("song (1).mp3"), "b").unwrap();
        assert_eq!(unique_target(&dir, "song.mp3"), dir.join("song (2).mp3"));
        assert_eq!(unique_target(&dir, "other.mp3"), dir.join("other.mp3"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_download_local_file() {
        let source_dir = scratch_dir("dl-src");
        let target_dir = scratch_dir("dl-dst");
        let source = source_dir.join("clip.wav");
        std::fs::write(&source, b"RIFF....WAVE").unwrap();

        let saved = download(source.to_str().unwrap(), &target_dir).await.unwrap();
        assert_eq!(saved, target_dir.join("clip.wav"));
        assert_eq!(std::fs::read(&saved).unwrap(), b"RIFF....WAVE");
        assert!(!target_dir.join("clip.wav.part").exists());

        std::fs::remove_dir_all(&source_dir).unwrap();
        std::fs::remove_dir_all(&target_dir).unwrap();
    }

    #[tokio::test]
    async fn test_failed_download_leaves_nothing() {
        let target_dir = scratch_dir("dl-missing");
        let result = download("/definitely/not/here.wav", &target_dir).await;
        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(&target_dir).unwrap().count(), 0);
        std::fs::remove_dir_all(&target_dir).unwrap();
    }

    #[test]
    fn test_cache_path_is_stable_per_source() {
        let dir = Path::new("/cache");
        let a = cache_path(dir, "https://example.com/tracks/a.OGG?sig=1");
        assert_eq!(a, cache_path(dir, "https://example.com/tracks/a.OGG?sig=1"));
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("ogg"));
        assert_ne!(a, cache_path(dir, "https://example.com/tracks/b.ogg"));
        assert_eq!(
            cache_path(dir, "https://example.com/").extension().and_then(|e| e.to_str()),
            Some("mp3")
        );
    }

    #[tokio::test]
    async fn test_fetch_cached_reuses_single_entry() {
        let source_dir = scratch_dir("cache-src");
        let cache_dir = scratch_dir("cache-dst");
        let source = source_dir.join("loop.wav");
        std::fs::write(&source, b"first").unwrap();
        let source = source.to_str().unwrap().to_string();

        let first = fetch_cached(&source, &cache_dir).await.unwrap();
        std::fs::write(source_dir.join("loop.wav"), b"second").unwrap();
        let second = fetch_cached(&source, &cache_dir).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read_dir(&cache_dir).unwrap().count(), 1);
        assert_eq!(std::fs::read(&second).unwrap(), b"first");

        std::fs::remove_dir_all(&source_dir).unwrap();
        std::fs::remove_dir_all(&cache_dir).unwrap();
    }
}
