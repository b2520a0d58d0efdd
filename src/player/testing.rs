//! Fakes for exercising the visualizer without an audio device.

use super::animation::{FrameHandle, FrameScheduler};
use super::error::MediaError;
use super::media::{ListenerId, Listeners, MediaElement, MediaEvent};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::sync::mpsc::Sender;

/// Scheduler whose frames fire only when a test delivers them.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    pub inner: Rc<RefCell<ManualFrames>>,
}

#[derive(Debug, Default)]
pub struct ManualFrames {
    next_id: u64,
    pub pending: BTreeSet<u64>,
    pub requested: usize,
    pub cancelled: usize,
}

impl ManualScheduler {
    pub fn pending(&self) -> Vec<FrameHandle> {
        self.inner.borrow().pending.iter().map(|&id| FrameHandle(id)).collect()
    }

    /// Removes and returns every pending frame, as a display refresh would.
    pub fn take_pending(&self) -> Vec<FrameHandle> {
        let mut inner = self.inner.borrow_mut();
        std::mem::take(&mut inner.pending)
            .into_iter()
            .map(FrameHandle)
            .collect()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        inner.requested += 1;
        let id = inner.next_id;
        inner.pending.insert(id);
        FrameHandle(id)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut inner = self.inner.borrow_mut();
        if inner.pending.remove(&handle.0) {
            inner.cancelled += 1;
        }
    }
}

/// In-memory media element. Clones share state so a test can drive the
/// collaborator after handing it to a visualizer.
#[derive(Debug, Default, Clone)]
pub struct FakeMedia {
    pub inner: Rc<RefCell<FakeState>>,
}

#[derive(Debug)]
pub struct FakeState {
    pub source: Option<String>,
    pub loads: usize,
    pub current_time: f64,
    pub duration: f64,
    pub playing: bool,
    pub volume: f64,
    pub muted: bool,
    pub looping: bool,
    pub reject_play: bool,
    pub listeners: Listeners,
    pub subscribed: usize,
    pub unsubscribed: usize,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            source: None,
            loads: 0,
            current_time: 0.0,
            duration: f64::NAN,
            playing: false,
            volume: 1.0,
            muted: false,
            looping: false,
            reject_play: false,
            listeners: Listeners::new(),
            subscribed: 0,
            unsubscribed: 0,
        }
    }
}

impl FakeMedia {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata arrives: duration becomes known and the source is playable.
    pub fn finish_loading(&self, duration: f64) {
        let mut inner = self.inner.borrow_mut();
        inner.duration = duration;
        inner.listeners.emit(MediaEvent::MetadataLoaded);
        inner.listeners.emit(MediaEvent::CanPlay);
    }

    /// The playback clock moves to `time`.
    pub fn advance_to(&self, time: f64) {
        let mut inner = self.inner.borrow_mut();
        inner.current_time = time;
        inner.listeners.emit(MediaEvent::TimeUpdate);
    }

    pub fn end(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.playing = false;
        inner.listeners.emit(MediaEvent::Ended);
    }

    pub fn fail(&self, message: &str) {
        self.inner
            .borrow_mut()
            .listeners
            .emit(MediaEvent::Error(message.to_string()));
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

impl MediaElement for FakeMedia {
    fn load(&mut self, source: &str) {
        let mut inner = self.inner.borrow_mut();
        inner.source = Some(source.to_string());
        inner.loads += 1;
        inner.current_time = 0.0;
        inner.duration = f64::NAN;
        inner.playing = false;
    }

    fn play(&mut self) -> Result<(), MediaError> {
        let mut inner = self.inner.borrow_mut();
        if inner.reject_play {
            return Err(MediaError::PlaybackRejected("blocked".to_string()));
        }
        inner.playing = true;
        inner.listeners.emit(MediaEvent::Play);
        Ok(())
    }

    fn pause(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.playing = false;
        inner.listeners.emit(MediaEvent::Pause);
    }

    fn current_time(&self) -> f64 {
        self.inner.borrow().current_time
    }

    fn set_current_time(&mut self, seconds: f64) {
        let mut inner = self.inner.borrow_mut();
        inner.current_time = seconds;
        inner.listeners.emit(MediaEvent::TimeUpdate);
    }

    fn duration(&self) -> f64 {
        self.inner.borrow().duration
    }

    fn volume(&self) -> f64 {
        self.inner.borrow().volume
    }

    fn set_volume(&mut self, volume: f64) {
        let mut inner = self.inner.borrow_mut();
        inner.volume = volume;
        inner.listeners.emit(MediaEvent::VolumeChange);
    }

    fn muted(&self) -> bool {
        self.inner.borrow().muted
    }

    fn set_muted(&mut self, muted: bool) {
        let mut inner = self.inner.borrow_mut();
        inner.muted = muted;
        inner.listeners.emit(MediaEvent::VolumeChange);
    }

    fn set_looping(&mut self, looping: bool) {
        self.inner.borrow_mut().looping = looping;
    }

    fn subscribe(&mut self, listener: Sender<MediaEvent>) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        inner.subscribed += 1;
        inner.listeners.add(listener)
    }

    fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let removed = inner.listeners.remove(id);
        if removed {
            inner.unsubscribed += 1;
        }
        removed
    }
}
