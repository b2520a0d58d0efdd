//! The waveform playback visualizer.
//!
//! Owns the playback state for one mounted source, applies media notifications
//! to it, and exposes the derived bar classification, scroll offset and
//! animation phase to whatever renders it.
//!
//! Reconciliation rule for seeks: a seek writes the target into the local state
//! immediately, before the collaborator confirms it. The next `TimeUpdate`
//! always overwrites that value with the collaborator's own clock.

use super::animation::{AnimationDriver, FrameHandle, FrameScheduler, IntervalScheduler};
use super::error::PlayerError;
use super::media::{ListenerId, MediaElement, MediaEvent};
use super::position::{self, known_duration, BarClass, PlaybackPosition};
use super::profile::VisualProfile;
use super::scroll::ScrollFollower;
use super::seek::{self, Region};
use super::waveform::{self, WaveformModel};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

/// Per-instance configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerOptions {
    pub source: String,
    pub autoplay: bool,
    pub looping: bool,
    pub show_download: bool,
}

impl PlayerOptions {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            autoplay: false,
            looping: false,
            show_download: true,
        }
    }
}

/// Called with `(current_time, duration)` on every time update.
pub type TimeUpdateCallback = Box<dyn FnMut(f64, f64)>;
/// Called when a non-looping source finishes.
pub type EndedCallback = Box<dyn FnMut()>;

/// Playback state as last reported by the media collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub current_time: f64,
    /// `None` until metadata has loaded.
    pub duration: Option<f64>,
    pub is_playing: bool,
    pub is_loading: bool,
    pub has_error: bool,
    pub volume: f64,
    pub muted: bool,
}

impl PlaybackState {
    fn loading(volume: f64, muted: bool) -> Self {
        Self {
            current_time: 0.0,
            duration: None,
            is_playing: false,
            is_loading: true,
            has_error: false,
            volume,
            muted,
        }
    }

    /// Duration in the collaborator's convention: NaN while unknown.
    pub fn duration_secs(&self) -> f64 {
        self.duration.unwrap_or(f64::NAN)
    }

    /// Seeking and playing are allowed.
    pub fn is_interactive(&self) -> bool {
        !self.is_loading && !self.has_error
    }
}

/// Everything a renderer needs to draw one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarView {
    pub index: usize,
    pub height: f64,
    /// Height including the cosmetic animation offset.
    pub animated_height: f64,
    pub class: BarClass,
    /// Crossed fraction of this bar in `[0, 1]`.
    pub fill: f64,
}

struct Subscription {
    id: ListenerId,
    events: Receiver<MediaEvent>,
}

/// One player instance bound to one media collaborator.
pub struct Visualizer<M: MediaElement, S: FrameScheduler> {
    media: M,
    options: PlayerOptions,
    profile: VisualProfile,
    state: PlaybackState,
    waveform: WaveformModel,
    scroll: ScrollFollower,
    animation: AnimationDriver<S>,
    subscription: Option<Subscription>,
    autoplay_attempted: bool,
    on_time_update: Option<TimeUpdateCallback>,
    on_ended: Option<EndedCallback>,
}

impl<M: MediaElement, S: FrameScheduler> Visualizer<M, S> {
    /// Generates the waveform for `options.source` and mounts against `media`.
    ///
    /// # Errors
    /// - `InvalidArgument` if the source is empty or the profile has no bars
    pub fn new(
        media: M,
        scheduler: S,
        options: PlayerOptions,
        profile: VisualProfile,
        scroll_smoothing: Duration,
    ) -> Result<Self, PlayerError> {
        validate_source(&options.source)?;
        let waveform = waveform::generate(
            profile.bar_count,
            &profile.shape,
            waveform::seed_for_source(&options.source),
        )?;
        let rate = profile.animation.map_or(0.0, |style| style.rate);
        let scroll = ScrollFollower::new(profile.scroll.unwrap_or_default(), scroll_smoothing);
        let state = PlaybackState::loading(media.volume(), media.muted());

        let mut visualizer = Self {
            media,
            options,
            profile,
            state,
            waveform,
            scroll,
            animation: AnimationDriver::new(scheduler, rate),
            subscription: None,
            autoplay_attempted: false,
            on_time_update: None,
            on_ended: None,
        };
        visualizer.mount();
        Ok(visualizer)
    }

    pub fn on_time_update(mut self, callback: impl FnMut(f64, f64) + 'static) -> Self {
        self.on_time_update = Some(Box::new(callback));
        self
    }

    pub fn on_ended(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_ended = Some(Box::new(callback));
        self
    }

    fn mount(&mut self) {
        let (sender, events) = mpsc::channel();
        let id = self.media.subscribe(sender);
        self.subscription = Some(Subscription { id, events });
        self.media.set_looping(self.options.looping);
        self.state = PlaybackState::loading(self.media.volume(), self.media.muted());
        self.autoplay_attempted = false;

        tracing::info!(
            "Mounted source {} ({} profile, {} bars)",
            self.options.source,
            self.profile.name,
            self.waveform.len()
        );
        self.media.load(&self.options.source);
    }

    fn unmount(&mut self) {
        self.animation.stop();
        if let Some(subscription) = self.subscription.take() {
            if !self.media.unsubscribe(subscription.id) {
                tracing::warn!("Media listener {:?} was already removed", subscription.id);
            }
        }
        self.scroll.reset();
    }

    /// Replaces the source: detaches, regenerates the waveform and re-mounts.
    ///
    /// # Errors
    /// - `InvalidArgument` if `source` is empty
    pub fn change_source(&mut self, source: impl Into<String>) -> Result<(), PlayerError> {
        let source = source.into();
        validate_source(&source)?;
        self.unmount();
        if self.state.is_playing {
            self.media.pause();
        }
        self.waveform = waveform::generate(
            self.profile.bar_count,
            &self.profile.shape,
            waveform::seed_for_source(&source),
        )?;
        self.options.source = source;
        self.mount();
        Ok(())
    }

    /// Detaches from the collaborator. Dropping the visualizer does the same.
    pub fn dispose(mut self) {
        self.unmount();
    }

    /// Applies every queued notification. Returns how many were handled.
    pub fn pump_events(&mut self, now: Instant) -> usize {
        let events: Vec<MediaEvent> = match &self.subscription {
            Some(subscription) => subscription.events.try_iter().collect(),
            None => return 0,
        };
        let count = events.len();
        for event in events {
            self.handle_event(event, now);
        }
        count
    }

    fn handle_event(&mut self, event: MediaEvent, now: Instant) {
        match event {
            MediaEvent::MetadataLoaded => {
                self.state.duration = known_duration(self.media.duration());
                self.state.is_loading = false;
                tracing::debug!("Metadata loaded: duration {:?}", self.state.duration);
                self.maybe_autoplay();
            }
            MediaEvent::CanPlay => {
                self.state.is_loading = false;
                self.maybe_autoplay();
            }
            MediaEvent::TimeUpdate => {
                let time = self.media.current_time();
                self.state.current_time = time;
                if let Some(callback) = self.on_time_update.as_mut() {
                    callback(time, self.media.duration());
                }
            }
            MediaEvent::Play => {
                self.state.is_playing = true;
                if self.profile.animation.is_some() {
                    self.animation.start(now);
                }
            }
            MediaEvent::Pause => {
                self.state.is_playing = false;
                self.animation.stop();
            }
            MediaEvent::Ended => {
                self.state.is_playing = false;
                self.animation.stop();
                if !self.options.looping {
                    self.state.current_time = 0.0;
                }
                tracing::info!("Playback ended");
                if let Some(callback) = self.on_ended.as_mut() {
                    callback();
                }
            }
            MediaEvent::Error(message) => {
                tracing::error!("Audio loading error: {message}");
                self.state.is_loading = false;
                self.state.has_error = true;
                self.state.is_playing = false;
                self.animation.stop();
            }
            MediaEvent::VolumeChange => {
                self.state.volume = self.media.volume();
                self.state.muted = self.media.muted();
            }
        }
    }

    fn maybe_autoplay(&mut self) {
        if self.options.autoplay && !self.autoplay_attempted && self.state.is_interactive() {
            self.autoplay_attempted = true;
            tracing::debug!("Autoplay requested");
            self.request_play();
        }
    }

    fn request_play(&mut self) {
        match self.media.play() {
            Ok(()) => tracing::debug!("Play requested"),
            Err(e) => {
                tracing::warn!("Play failed: {e}");
                self.state.is_playing = false;
            }
        }
    }

    /// Pauses when playing, plays otherwise. Ignored while loading or failed.
    pub fn toggle_play_pause(&mut self) {
        if !self.state.is_interactive() {
            tracing::debug!("Play/pause ignored: player not ready");
            return;
        }
        if self.state.is_playing {
            self.media.pause();
        } else {
            self.request_play();
        }
    }

    /// Seeks to the time under a click. Returns the target, or `None` if no
    /// seek happened.
    pub fn seek_from_click(&mut self, click_x: f64, region: Region) -> Option<f64> {
        if self.state.has_error {
            return None;
        }
        let target = seek::seek_from_click(click_x, region, self.state.duration_secs())?;
        self.seek_to(target);
        Some(target)
    }

    /// Seeks `delta` seconds relative to the current time.
    pub fn seek_by(&mut self, delta: f64) -> Option<f64> {
        if self.state.has_error {
            return None;
        }
        let target = seek::nudge(self.state.current_time, delta, self.state.duration_secs())?;
        self.seek_to(target);
        Some(target)
    }

    fn seek_to(&mut self, target: f64) {
        self.media.set_current_time(target);
        self.state.current_time = target;
        tracing::debug!("Seek to {target:.2}s");
    }

    /// Sets the volume, clamped to `[0, 1]`. Zero mutes.
    pub fn set_volume(&mut self, volume: f64) -> f64 {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            self.state.volume
        };
        self.media.set_volume(volume);
        let muted = volume == 0.0;
        if muted != self.state.muted {
            self.media.set_muted(muted);
        }
        self.state.volume = volume;
        self.state.muted = muted;
        volume
    }

    /// Flips mute. Returns the new mute flag.
    pub fn toggle_mute(&mut self) -> bool {
        let muted = !self.state.muted;
        self.media.set_muted(muted);
        self.state.muted = muted;
        muted
    }

    pub fn position(&self) -> PlaybackPosition {
        position::map(
            self.state.current_time,
            self.state.duration_secs(),
            self.waveform.len(),
            VisualProfile::INDEX_POLICY,
        )
    }

    /// Bars with their classification and animated height.
    pub fn bars(&self) -> Vec<BarView> {
        let position = self.position();
        let phase = self.animation.phase();
        let style = self.profile.animation.filter(|_| self.state.is_playing);

        self.waveform
            .bars()
            .iter()
            .map(|bar| {
                let class = position.classify(bar.index);
                let animated_height = match style {
                    Some(style) => style.animated_height(bar.height, bar.index, phase, class == BarClass::Passed),
                    None => bar.height,
                };
                BarView {
                    index: bar.index,
                    height: bar.height,
                    animated_height,
                    class,
                    fill: position.fill(bar.index),
                }
            })
            .collect()
    }

    /// Advances the scroll follower for a viewport of `viewport_width` columns.
    /// Returns the offset to draw with.
    pub fn follow_viewport(&mut self, viewport_width: f64, elapsed: Duration) -> f64 {
        if self.profile.scroll.is_none() || self.state.duration.is_none() {
            return 0.0;
        }
        let content_width = f64::from(self.profile.content_width());
        self.scroll
            .retarget(self.position().progress, viewport_width, content_width);
        self.scroll.advance(elapsed)
    }

    /// Frame callback for the animation driver.
    pub fn on_frame(&mut self, handle: FrameHandle, now: Instant) -> bool {
        self.animation.on_frame(handle, now)
    }

    /// Whether the download action is available.
    pub fn can_download(&self) -> bool {
        self.options.show_download && !self.state.is_loading
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn waveform(&self) -> &WaveformModel {
        &self.waveform
    }

    pub fn profile(&self) -> &VisualProfile {
        &self.profile
    }

    pub fn source(&self) -> &str {
        &self.options.source
    }

    pub fn phase(&self) -> f64 {
        self.animation.phase()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_running()
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }
}

impl<M: MediaElement> Visualizer<M, IntervalScheduler> {
    /// Runs the animation frame if one is due.
    pub fn pump_frame(&mut self, now: Instant) -> bool {
        self.animation.pump(now)
    }
}

impl<M: MediaElement, S: FrameScheduler> Drop for Visualizer<M, S> {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn validate_source(source: &str) -> Result<(), PlayerError> {
    if source.trim().is_empty() {
        return Err(PlayerError::InvalidArgument("source must not be empty".to_string()));
    }
    Ok(())
}
