//! ffmpeg discovery and transcoding.
//!
//! Anything hound cannot read (mp3, ogg, flac, ...) is converted to a 16-bit
//! PCM WAV with ffmpeg before decoding.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Locates the ffmpeg binary.
///
/// Checks the usual install locations for the platform, then falls back to a
/// PATH search via `which` or `where`.
pub fn find_ffmpeg() -> Result<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/opt/homebrew/bin/ffmpeg",
            "/usr/local/bin/ffmpeg",
            "/usr/bin/ffmpeg",
        ]
    } else if cfg!(target_os = "linux") {
        &["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg", "/snap/bin/ffmpeg"]
    } else if cfg!(target_os = "windows") {
        &[
            "C:\\ffmpeg\\bin\\ffmpeg.exe",
            "C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe",
        ]
    } else {
        &[]
    };

    if let Some(path) = candidates.iter().map(PathBuf::from).find(|p| p.exists()) {
        tracing::debug!("Found ffmpeg at: {}", path.display());
        return Ok(path);
    }

    let path = find_in_path("ffmpeg")?;
    tracing::debug!("Found ffmpeg in PATH at: {}", path.display());
    Ok(path)
}

fn find_in_path(binary_name: &str) -> Result<PathBuf> {
    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let output = Command::new(search_cmd)
        .arg(binary_name)
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for {binary_name}: {e}"))?;

    if output.status.success() {
        let path_str = String::from_utf8_lossy(&output.stdout);
        let path = PathBuf::from(path_str.lines().next().unwrap_or_default().trim());
        if !path.as_os_str().is_empty() {
            return Ok(path);
        }
    }

    Err(anyhow!(
        "ffmpeg not found, it is needed to play non-WAV files. Please install ffmpeg:\n\
         macOS: brew install ffmpeg\n\
         Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)\n\
         Windows: Download from https://ffmpeg.org/download.html"
    ))
}

/// Arguments for converting `input` into a PCM WAV at `output`.
fn transcode_args(input: &Path, output: &Path) -> Vec<std::ffi::OsString> {
    let mut args: Vec<std::ffi::OsString> = ["-loglevel", "error", "-i"]
        .iter()
        .map(Into::into)
        .collect();
    args.push(input.into());
    for arg in ["-vn", "-acodec", "pcm_s16le", "-f", "wav", "-y"] {
        args.push(arg.into());
    }
    args.push(output.into());
    args
}

/// Converts `input` to a temporary WAV file and returns its path.
///
/// The caller owns the returned file and should remove it when done.
///
/// # Errors
/// - If ffmpeg cannot be found or started
/// - If the conversion fails
pub fn transcode_to_wav(input: &Path) -> Result<PathBuf> {
    let ffmpeg_path = find_ffmpeg()?;
    let output_path = std::env::temp_dir().join(format!(
        "wavescrub_{}_{}.wav",
        std::process::id(),
        chrono::Utc::now().timestamp_millis()
    ));

    let output = Command::new(&ffmpeg_path)
        .args(transcode_args(input, &output_path))
        .output()?;

    if output.status.success() {
        tracing::debug!("Transcoded {} to {}", input.display(), output_path.display());
        Ok(output_path)
    } else {
        let error_msg = String::from_utf8_lossy(&output.stderr);
        tracing::error!("ffmpeg conversion failed: {}", error_msg);
        let _ = std::fs::remove_file(&output_path);
        Err(anyhow!("Could not decode {}: {}", input.display(), error_msg.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcode_args_order() {
        let args = transcode_args(Path::new("in.mp3"), Path::new("out.wav"));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(args[3], "in.mp3");
        assert_eq!(args.last().map(String::as_str), Some("out.wav"));
        assert!(args.windows(2).any(|w| w[0] == "-acodec" && w[1] == "pcm_s16le"));
    }

    #[test]
    fn test_find_ffmpeg() {
        // succeeds only where ffmpeg is installed
        match find_ffmpeg() {
            Ok(path) => assert!(!path.as_os_str().is_empty()),
            Err(e) => assert!(e.to_string().contains("ffmpeg")),
        }
    }
}
