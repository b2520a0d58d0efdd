//! Decoding sources into interleaved f32 PCM.

use super::ffmpeg;
use anyhow::{anyhow, Result};
use std::path::Path;

/// A fully decoded source held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Interleaved samples in [-1, 1].
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn frame_count(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / f64::from(self.sample_rate)
    }

    /// Sample of `channel` at `frame`. Missing channels repeat the last one,
    /// so mono sources play on every output channel.
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        let channels = usize::from(self.channels.max(1));
        let channel = channel.min(channels - 1);
        self.samples
            .get(frame * channels + channel)
            .copied()
            .unwrap_or(0.0)
    }
}

/// Reads a WAV file with hound.
///
/// # Errors
/// - If the file is not a readable WAV
pub fn decode_wav(path: &Path) -> Result<DecodedAudio> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| anyhow!("Failed to open {}: {e}", path.display()))?;
    read_wav(reader)
}

fn read_wav<R: std::io::Read>(reader: hound::WavReader<R>) -> Result<DecodedAudio> {
    let spec = reader.spec();
    if spec.channels == 0 {
        return Err(anyhow!("WAV file has no channels"));
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    tracing::debug!(
        "Decoded {} samples ({} Hz, {} channels, {} bit)",
        samples.len(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );

    Ok(DecodedAudio {
        samples,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

fn has_wav_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav") || e.eq_ignore_ascii_case("wave"))
}

/// Decodes any file: WAV directly, everything else through ffmpeg.
///
/// # Errors
/// - If the file cannot be read or decoded
pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
    if has_wav_extension(path) {
        match decode_wav(path) {
            Ok(audio) => return Ok(audio),
            // some .wav files use codecs hound does not read
            Err(e) => tracing::debug!("hound could not read {}: {e}", path.display()),
        }
    }

    let temp_wav = ffmpeg::transcode_to_wav(path)?;
    let result = decode_wav(&temp_wav);
    if let Err(e) = std::fs::remove_file(&temp_wav) {
        tracing::debug!("Failed to remove temp file: {}", e);
    }
    result
}
