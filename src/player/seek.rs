//! Converts pointer positions into seek targets.

use super::position::known_duration;

/// Horizontal extent of a clickable region (waveform strip or progress bar).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub left: f64,
    pub width: f64,
}

impl Region {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }
}

/// Returns the playback time a click at `click_x` inside `region` points at.
///
/// `None` means "do not seek": the duration is not known yet or the region has
/// no width.
pub fn seek_from_click(click_x: f64, region: Region, duration: f64) -> Option<f64> {
    let duration = known_duration(duration)?;
    if !(region.width.is_finite() && region.width > 0.0) || !click_x.is_finite() {
        return None;
    }

    let percentage = ((click_x - region.left) / region.width).clamp(0.0, 1.0);
    Some(percentage * duration)
}

/// Moves `current_time` by `delta` seconds, staying inside the track.
pub fn nudge(current_time: f64, delta: f64, duration: f64) -> Option<f64> {
    let duration = known_duration(duration)?;
    Some((current_time + delta).clamp(0.0, duration))
}
