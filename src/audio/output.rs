//! cpal-backed media collaborator.
//!
//! Loading runs on the tokio runtime: remote sources are fetched into the
//! cache directory, then decoded on a blocking thread. Playback renders from
//! the decoded buffer inside the cpal output callback, which shares a
//! [`Transport`] with the UI thread.

use super::decode::{self, DecodedAudio};
use super::device::{find_output_device, suppress_alsa_warnings};
use crate::player::download;
use crate::player::{ListenerId, Listeners, MediaElement, MediaError, MediaEvent};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Seconds of playback between `TimeUpdate` notifications.
const TIME_UPDATE_INTERVAL: f64 = 0.25;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What one render call produced besides samples.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenderOutcome {
    pub time_update: bool,
    pub ended: bool,
}

/// Playback cursor and controls shared with the audio callback.
#[derive(Debug)]
pub struct Transport {
    audio: Option<Arc<DecodedAudio>>,
    /// Position in source frames, fractional when resampling.
    position: f64,
    playing: bool,
    volume: f32,
    muted: bool,
    looping: bool,
    since_update: f64,
    /// Bumped on every load so a slow load cannot land on a newer source.
    generation: u64,
}

impl Default for Transport {
    fn default() -> Self {
        Self {
            audio: None,
            position: 0.0,
            playing: false,
            volume: 1.0,
            muted: false,
            looping: false,
            since_update: 0.0,
            generation: 0,
        }
    }
}

impl Transport {
    pub fn current_time(&self) -> f64 {
        match &self.audio {
            Some(audio) if audio.sample_rate > 0 => self.position / f64::from(audio.sample_rate),
            _ => 0.0,
        }
    }

    pub fn duration(&self) -> f64 {
        self.audio
            .as_ref()
            .map_or(f64::NAN, |audio| audio.duration_secs())
    }

    pub fn seek(&mut self, seconds: f64) {
        if let Some(audio) = &self.audio {
            let seconds = seconds.clamp(0.0, audio.duration_secs());
            self.position = seconds * f64::from(audio.sample_rate);
        }
    }

    /// Fills `output` (interleaved, `channels` wide, at `output_rate`) and
    /// advances the cursor. Silence when paused or nothing is loaded.
    pub fn render(&mut self, output: &mut [f32], channels: usize, output_rate: u32) -> RenderOutcome {
        let mut outcome = RenderOutcome::default();
        let channels = channels.max(1);

        let audio = match (&self.audio, self.playing) {
            (Some(audio), true) if output_rate > 0 && audio.frame_count() > 0 => Arc::clone(audio),
            _ => {
                output.fill(0.0);
                return outcome;
            }
        };

        let step = f64::from(audio.sample_rate) / f64::from(output_rate);
        let frames = audio.frame_count() as f64;
        let gain = if self.muted { 0.0 } else { self.volume };
        let mut played = 0usize;

        for frame in output.chunks_mut(channels) {
            if self.position >= frames {
                if self.looping {
                    self.position -= frames;
                } else {
                    frame.fill(0.0);
                    continue;
                }
            }
            let index = self.position as usize;
            for (channel, sample) in frame.iter_mut().enumerate() {
                *sample = audio.sample(index, channel) * gain;
            }
            self.position += step;
            played += 1;
        }

        self.since_update += played as f64 / f64::from(output_rate);
        if self.since_update >= TIME_UPDATE_INTERVAL {
            self.since_update = 0.0;
            outcome.time_update = true;
        }

        if !self.looping && self.position >= frames {
            self.position = frames;
            self.playing = false;
            self.since_update = 0.0;
            outcome.time_update = true;
            outcome.ended = true;
        }
        outcome
    }
}

/// Media collaborator playing through the system audio output.
pub struct CpalMedia {
    device_spec: String,
    cache_dir: PathBuf,
    transport: Arc<Mutex<Transport>>,
    listeners: Arc<Mutex<Listeners>>,
    stream: Option<cpal::Stream>,
}

impl CpalMedia {
    /// `device_spec` is "default", an index or a name from `list-devices`.
    /// Remote sources are cached under `cache_dir`.
    pub fn new(device_spec: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            device_spec: device_spec.into(),
            cache_dir: cache_dir.into(),
            transport: Arc::new(Mutex::new(Transport::default())),
            listeners: Arc::new(Mutex::new(Listeners::new())),
            stream: None,
        }
    }

    fn emit(&self, event: MediaEvent) {
        lock(&self.listeners).emit(event);
    }

    fn ensure_stream(&mut self) -> anyhow::Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let device_spec = self.device_spec.clone();
        let transport = Arc::clone(&self.transport);
        let listeners = Arc::clone(&self.listeners);

        let stream = suppress_alsa_warnings(move || {
            let host = cpal::default_host();
            let device = find_output_device(&host, &device_spec)?;
            let device_name = device.name().unwrap_or_else(|_| "Unknown device".to_string());
            let supported = device.default_output_config()?;
            tracing::info!(
                "Output device: {} ({}Hz, {} channels, {:?})",
                device_name,
                supported.sample_rate().0,
                supported.channels(),
                supported.sample_format()
            );

            let config: cpal::StreamConfig = supported.config();
            match supported.sample_format() {
                cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, transport, listeners),
                cpal::SampleFormat::F64 => build_stream::<f64>(&device, &config, transport, listeners),
                cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, transport, listeners),
                cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, transport, listeners),
                cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, transport, listeners),
                cpal::SampleFormat::U8 => build_stream::<u8>(&device, &config, transport, listeners),
                other => Err(anyhow::anyhow!("Unsupported output sample format {other:?}")),
            }
        })?;

        stream.play()?;
        self.stream = Some(stream);
        Ok(())
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    transport: Arc<Mutex<Transport>>,
    listeners: Arc<Mutex<Listeners>>,
) -> anyhow::Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = usize::from(config.channels);
    let output_rate = config.sample_rate.0;
    let mut scratch: Vec<f32> = Vec::new();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.resize(data.len(), 0.0);
            let outcome = lock(&transport).render(&mut scratch, channels, output_rate);
            for (out, &sample) in data.iter_mut().zip(scratch.iter()) {
                *out = T::from_sample(sample);
            }

            if outcome.time_update || outcome.ended {
                let mut listeners = lock(&listeners);
                if outcome.time_update {
                    listeners.emit(MediaEvent::TimeUpdate);
                }
                if outcome.ended {
                    listeners.emit(MediaEvent::Ended);
                }
            }
        },
        |err| {
            tracing::error!("Audio stream error: {}", err);
        },
        None,
    )?;
    Ok(stream)
}

/// Resolves `source` to a local file, caching remote sources in `cache_dir`.
async fn resolve_source(source: &str, cache_dir: &Path) -> anyhow::Result<PathBuf> {
    match download::local_path(source) {
        Some(path) if path.exists() => Ok(path),
        Some(path) => Err(anyhow::anyhow!("File not found: {}", path.display())),
        None => download::fetch_cached(source, cache_dir).await,
    }
}

async fn load_source(source: String, cache_dir: PathBuf) -> anyhow::Result<DecodedAudio> {
    let path = resolve_source(&source, &cache_dir).await?;
    tokio::task::spawn_blocking(move || decode::decode_file(&path))
        .await
        .map_err(|e| anyhow::anyhow!("Decoder task failed: {e}"))?
}

impl MediaElement for CpalMedia {
    fn load(&mut self, source: &str) {
        let generation = {
            let mut transport = lock(&self.transport);
            transport.generation += 1;
            transport.audio = None;
            transport.position = 0.0;
            transport.playing = false;
            transport.since_update = 0.0;
            transport.generation
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.emit(MediaEvent::Error("no async runtime to load audio on".to_string()));
            return;
        };

        let source = source.to_string();
        let cache_dir = self.cache_dir.clone();
        let transport = Arc::clone(&self.transport);
        let listeners = Arc::clone(&self.listeners);

        tracing::info!("Loading {}", source);
        runtime.spawn(async move {
            let result = load_source(source.clone(), cache_dir).await;

            let mut transport = lock(&transport);
            if transport.generation != generation {
                tracing::debug!("Discarding stale load of {}", source);
                return;
            }
            match result {
                Ok(audio) => {
                    tracing::info!(
                        "Loaded {} ({:.2}s, {} Hz, {} channels)",
                        source,
                        audio.duration_secs(),
                        audio.sample_rate,
                        audio.channels
                    );
                    transport.audio = Some(Arc::new(audio));
                    drop(transport);
                    let mut listeners = lock(&listeners);
                    listeners.emit(MediaEvent::MetadataLoaded);
                    listeners.emit(MediaEvent::CanPlay);
                }
                Err(e) => {
                    drop(transport);
                    tracing::error!("Failed to load {}: {e}", source);
                    lock(&listeners).emit(MediaEvent::Error(e.to_string()));
                }
            }
        });
    }

    fn play(&mut self) -> Result<(), MediaError> {
        {
            let mut transport = lock(&self.transport);
            let Some(audio) = transport.audio.clone() else {
                return Err(MediaError::PlaybackRejected("nothing loaded".to_string()));
            };
            if transport.position >= audio.frame_count() as f64 {
                transport.position = 0.0;
            }
        }

        self.ensure_stream()
            .map_err(|e| MediaError::Device(e.to_string()))?;

        lock(&self.transport).playing = true;
        self.emit(MediaEvent::Play);
        Ok(())
    }

    fn pause(&mut self) {
        lock(&self.transport).playing = false;
        self.emit(MediaEvent::Pause);
    }

    fn current_time(&self) -> f64 {
        lock(&self.transport).current_time()
    }

    fn set_current_time(&mut self, seconds: f64) {
        lock(&self.transport).seek(seconds);
        self.emit(MediaEvent::TimeUpdate);
    }

    fn duration(&self) -> f64 {
        lock(&self.transport).duration()
    }

    fn volume(&self) -> f64 {
        f64::from(lock(&self.transport).volume)
    }

    fn set_volume(&mut self, volume: f64) {
        lock(&self.transport).volume = volume.clamp(0.0, 1.0) as f32;
        self.emit(MediaEvent::VolumeChange);
    }

    fn muted(&self) -> bool {
        lock(&self.transport).muted
    }

    fn set_muted(&mut self, muted: bool) {
        lock(&self.transport).muted = muted;
        self.emit(MediaEvent::VolumeChange);
    }

    fn set_looping(&mut self, looping: bool) {
        lock(&self.transport).looping = looping;
    }

    fn subscribe(&mut self, listener: Sender<MediaEvent>) -> ListenerId {
        lock(&self.listeners).add(listener)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        lock(&self.listeners).remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport_with(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Transport {
        Transport {
            audio: Some(Arc::new(DecodedAudio {
                samples,
                channels,
                sample_rate,
            })),
            playing: true,
            ..Transport::default()
        }
    }

    #[test]
    fn test_paused_renders_silence() {
        let mut transport = transport_with(vec![1.0; 8], 1, 4);
        transport.playing = false;
        let mut out = [0.5; 4];
        let outcome = transport.render(&mut out, 1, 4);
        assert_eq!(out, [0.0; 4]);
        assert_eq!(outcome, RenderOutcome::default());
        assert_eq!(transport.current_time(), 0.0);
    }

    #[test]
    fn test_mono_source_on_stereo_output() {
        let mut transport = transport_with(vec![0.1, 0.2, 0.3, 0.4], 1, 4);
        let mut out = [0.0; 4];
        transport.render(&mut out, 2, 4);
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2]);
        assert_eq!(transport.current_time(), 0.5);
    }

    #[test]
    fn test_volume_and_mute_scale_output() {
        let mut transport = transport_with(vec![1.0; 4], 1, 4);
        transport.volume = 0.5;
        let mut out = [0.0; 2];
        transport.render(&mut out, 1, 4);
        assert_eq!(out, [0.5, 0.5]);

        transport.muted = true;
        transport.render(&mut out, 1, 4);
        assert_eq!(out, [0.0, 0.0]);
    }

    #[test]
    fn test_resampling_steps_through_source() {
        // source at half the output rate: each source frame plays twice
        let mut transport = transport_with(vec![0.1, 0.2], 1, 2);
        let mut out = [0.0; 4];
        transport.render(&mut out, 1, 4);
        assert_eq!(out, [0.1, 0.1, 0.2, 0.2]);
    }

    #[test]
    fn test_end_stops_and_reports() {
        let mut transport = transport_with(vec![0.3; 4], 1, 4);
        let mut out = [0.0; 6];
        let outcome = transport.render(&mut out, 1, 4);
        assert!(outcome.ended);
        assert!(outcome.time_update);
        assert!(!transport.playing);
        assert_eq!(&out[4..], &[0.0, 0.0]);
        assert_eq!(transport.current_time(), 1.0);
    }

    #[test]
    fn test_looping_wraps_without_ending() {
        let mut transport = transport_with(vec![0.1, 0.2, 0.3, 0.4], 1, 4);
        transport.looping = true;
        let mut out = [0.0; 6];
        let outcome = transport.render(&mut out, 1, 4);
        assert!(!outcome.ended);
        assert!(transport.playing);
        assert_eq!(out, [0.1, 0.2, 0.3, 0.4, 0.1, 0.2]);
        assert_eq!(transport.current_time(), 0.5);
    }

    #[test]
    fn test_time_updates_are_throttled() {
        let mut transport = transport_with(vec![0.0; 400], 1, 100);
        let mut out = [0.0; 10];
        let first = transport.render(&mut out, 1, 100);
        assert!(!first.time_update);
        let mut fired = 0;
        for _ in 0..5 {
            if transport.render(&mut out, 1, 100).time_update {
                fired += 1;
            }
        }
        // 0.6 s rendered in total
        assert_eq!(fired, 2);
    }

    #[test]
    fn test_seek_clamps_to_duration() {
        let mut transport = transport_with(vec![0.0; 8], 2, 2);
        transport.seek(10.0);
        assert_eq!(transport.current_time(), 2.0);
        transport.seek(-1.0);
        assert_eq!(transport.current_time(), 0.0);
    }

    #[test]
    fn test_unloaded_transport() {
        let transport = Transport::default();
        assert!(transport.duration().is_nan());
        assert_eq!(transport.current_time(), 0.0);
    }

    #[test]
    fn test_play_rejected_before_load() {
        let mut media = CpalMedia::new("default", std::env::temp_dir());
        assert!(matches!(media.play(), Err(MediaError::PlaybackRejected(_))));
    }

    #[test]
    fn test_load_without_runtime_reports_error() {
        let mut media = CpalMedia::new("default", std::env::temp_dir());
        let (tx, rx) = std::sync::mpsc::channel();
        media.subscribe(tx);
        media.load("/tmp/whatever.wav");
        assert!(matches!(rx.try_recv(), Ok(MediaEvent::Error(_))));
        assert!(media.duration().is_nan());
    }

    #[tokio::test]
    async fn test_missing_file_reports_error() {
        let mut media = CpalMedia::new("default", std::env::temp_dir());
        let (tx, rx) = std::sync::mpsc::channel();
        media.subscribe(tx);
        media.load("/definitely/not/here.wav");
        let mut event = None;
        for _ in 0..100 {
            if let Ok(e) = rx.try_recv() {
                event = Some(e);
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(matches!(event, Some(MediaEvent::Error(_))));
    }
}
