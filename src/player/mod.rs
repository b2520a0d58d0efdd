//! Playback core for wavescrub.
//!
//! Everything in here is independent of the terminal and the audio device:
//! the media collaborator and the frame scheduler are both traits, so the
//! whole player can be driven from tests.

pub mod animation;
pub mod download;
pub mod error;
pub mod media;
pub mod position;
pub mod profile;
pub mod scroll;
pub mod seek;
pub mod time;
pub mod visualizer;
pub mod waveform;

#[cfg(test)]
pub mod testing;

pub use animation::{AnimationDriver, FrameHandle, FrameScheduler, IntervalScheduler};
pub use error::{MediaError, PlayerError};
pub use media::{ListenerId, Listeners, MediaElement, MediaEvent};
pub use position::{BarClass, IndexPolicy, PlaybackPosition};
pub use profile::{BarStyle, ProfileName, Rgb, VisualProfile};
pub use scroll::ScrollPolicy;
pub use seek::Region;
pub use time::format_time;
pub use visualizer::{BarView, PlaybackState, PlayerOptions, Visualizer};
