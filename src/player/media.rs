//! Capability interface of the media collaborator.
//!
//! The visualizer never talks to an audio engine directly. Anything that can
//! load a source, play, pause, seek, report its clock and emit lifecycle
//! notifications can drive it: the cpal back-end in production, a fake in tests.

use super::error::MediaError;
use std::sync::mpsc::Sender;

/// Lifecycle notification emitted by a media collaborator.
///
/// Notifications carry no values. Receivers read the collaborator's current
/// state when they handle one, so a notification queued before a seek cannot
/// resurrect the pre-seek time.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Duration is now known.
    MetadataLoaded,
    /// The playback clock moved.
    TimeUpdate,
    /// Playback started.
    Play,
    /// Playback paused.
    Pause,
    /// Playback reached the end of a non-looping source.
    Ended,
    /// Enough data is available to start playing.
    CanPlay,
    /// Loading or decoding failed.
    Error(String),
    /// Volume or mute changed.
    VolumeChange,
}

/// Registration token returned by [`MediaElement::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Minimal media-element interface.
pub trait MediaElement {
    /// Starts loading `source`. Emits `MetadataLoaded`/`CanPlay` or `Error`.
    fn load(&mut self, source: &str);

    /// Starts or resumes playback.
    ///
    /// # Errors
    /// - If the collaborator refuses to play (nothing loaded, device unavailable)
    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self);

    /// Playback clock in seconds.
    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, seconds: f64);

    /// Total length in seconds; NaN until metadata has loaded.
    fn duration(&self) -> f64;

    fn volume(&self) -> f64;

    fn set_volume(&mut self, volume: f64);

    fn muted(&self) -> bool;

    fn set_muted(&mut self, muted: bool);

    /// When looping, the end of the source wraps to the start without `Ended`.
    fn set_looping(&mut self, looping: bool);

    /// Registers a listener for lifecycle notifications.
    fn subscribe(&mut self, listener: Sender<MediaEvent>) -> ListenerId;

    /// Removes a listener. Returns `false` if the id was not registered.
    fn unsubscribe(&mut self, id: ListenerId) -> bool;
}

/// Fan-out of notifications to registered listeners.
#[derive(Debug, Default)]
pub struct Listeners {
    next_id: u64,
    senders: Vec<(ListenerId, Sender<MediaEvent>)>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sender: Sender<MediaEvent>) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.senders.push((id, sender));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.senders.len();
        self.senders.retain(|(existing, _)| *existing != id);
        self.senders.len() != before
    }

    /// Sends `event` to every listener, dropping those whose receiver is gone.
    pub fn emit(&mut self, event: MediaEvent) {
        self.senders
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_emit_reaches_every_listener() {
        let mut listeners = Listeners::new();
        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        listeners.add(tx_a);
        listeners.add(tx_b);

        listeners.emit(MediaEvent::Play);
        assert_eq!(rx_a.try_recv(), Ok(MediaEvent::Play));
        assert_eq!(rx_b.try_recv(), Ok(MediaEvent::Play));
    }

    #[test]
    fn test_remove_is_one_to_one() {
        let mut listeners = Listeners::new();
        let (tx, rx) = mpsc::channel();
        let id = listeners.add(tx);
        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));

        listeners.emit(MediaEvent::Pause);
        assert!(rx.try_recv().is_err());
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_closed_receivers_are_pruned() {
        let mut listeners = Listeners::new();
        let (tx, rx) = mpsc::channel();
        listeners.add(tx);
        drop(rx);
        listeners.emit(MediaEvent::TimeUpdate);
        assert_eq!(listeners.len(), 0);
    }
}
