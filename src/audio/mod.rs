//! Audio output for wavescrub.
//!
//! Decodes a source into memory and plays it through a cpal output stream.
//! [`CpalMedia`] is the production implementation of the player's media
//! collaborator.

pub mod decode;
pub mod device;
pub mod ffmpeg;
pub mod output;

pub use decode::DecodedAudio;
pub use device::{list_output_devices, OutputDeviceInfo};
pub use output::CpalMedia;
