//! Error types for the playback visualizer core.

use thiserror::Error;

/// Errors raised by the visualizer itself.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlayerError {
    /// A caller passed a value the operation cannot work with.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Errors reported by a media collaborator.
///
/// None of these are fatal; the visualizer logs them and degrades to an inert state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MediaError {
    /// `play()` was refused (device busy, nothing loaded, stream could not start).
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),
    /// The audio output device is unavailable.
    #[error("audio device error: {0}")]
    Device(String),
}
