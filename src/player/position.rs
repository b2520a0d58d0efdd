//! Maps playback time onto the bar sequence.
//!
//! Everything here is a pure function of `(current_time, duration, bar_count)`.
//! The result decides which bars render as passed, active, partially filled or
//! upcoming, and feeds the scroll follower with a `[0, 1]` progress fraction.

use serde::{Deserialize, Serialize};

/// How the fractional bar position is turned into a single active bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexPolicy {
    /// A bar becomes active only once it is fully reached.
    Floor,
    /// Nearest bar; reduces the perceived lag behind the audio.
    #[default]
    Round,
}

/// Derived playback position. Never stored, recomputed on every state change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackPosition {
    /// Progress expressed in bar units (`progress * bar_count`).
    pub exact_progress: f64,
    /// Active bar, or -1 while the duration is unknown.
    pub active_index: i64,
    /// Playback completion in `[0, 1]`.
    pub progress: f64,
}

impl PlaybackPosition {
    /// Position used before metadata has arrived.
    pub const UNKNOWN: Self = Self {
        exact_progress: 0.0,
        active_index: -1,
        progress: 0.0,
    };

    /// Classifies the bar at `index`.
    ///
    /// The bar the playhead is inside is `Partial` unless the index policy
    /// already made it the active bar.
    pub fn classify(&self, index: usize) -> BarClass {
        let i = index as i64;
        let crossed = self.exact_progress - index as f64;
        if i != self.active_index && crossed > 0.0 && crossed < 1.0 {
            return BarClass::Partial(crossed);
        }
        if i < self.active_index {
            BarClass::Passed
        } else if i == self.active_index {
            BarClass::Active
        } else {
            BarClass::Upcoming
        }
    }

    /// How much of the bar at `index` the playhead has crossed, in `[0, 1]`.
    pub fn fill(&self, index: usize) -> f64 {
        (self.exact_progress - index as f64).clamp(0.0, 1.0)
    }
}

/// Visual classification of one bar relative to the playhead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarClass {
    Passed,
    Active,
    /// The playhead is inside this bar; carries the crossed fraction in `(0, 1)`.
    Partial(f64),
    Upcoming,
}

/// Returns the duration if it is usable for mapping, `None` while unknown.
///
/// Media back-ends report NaN until metadata loads; zero, negative and infinite
/// values are treated the same way.
pub fn known_duration(duration: f64) -> Option<f64> {
    (duration.is_finite() && duration > 0.0).then_some(duration)
}

/// Maps a playback time onto a bar sequence of `bar_count` bars.
pub fn map(current_time: f64, duration: f64, bar_count: usize, policy: IndexPolicy) -> PlaybackPosition {
    let Some(duration) = known_duration(duration) else {
        return PlaybackPosition::UNKNOWN;
    };
    if bar_count == 0 {
        return PlaybackPosition::UNKNOWN;
    }

    let time = if current_time.is_finite() { current_time } else { 0.0 };
    let progress = (time / duration).clamp(0.0, 1.0);
    let exact_progress = progress * bar_count as f64;

    let raw_index = match policy {
        IndexPolicy::Floor => exact_progress.floor(),
        IndexPolicy::Round => exact_progress.round(),
    } as i64;
    let active_index = raw_index.clamp(0, bar_count as i64 - 1);

    PlaybackPosition {
        exact_progress,
        active_index,
        progress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halfway_scenario() {
        let pos = map(60.0, 120.0, 60, IndexPolicy::Round);
        assert_eq!(pos.progress, 0.5);
        assert_eq!(pos.exact_progress, 30.0);
        assert_eq!(pos.active_index, 30);

        let floor = map(60.0, 120.0, 60, IndexPolicy::Floor);
        assert_eq!(floor.active_index, 30);
        assert_eq!(floor.classify(29), BarClass::Passed);
    }

    #[test]
    fn test_unknown_duration() {
        for duration in [f64::NAN, 0.0, -3.0, f64::INFINITY] {
            let pos = map(0.0, duration, 60, IndexPolicy::Round);
            assert_eq!(pos, PlaybackPosition::UNKNOWN);
        }
    }

    #[test]
    fn test_progress_bounds() {
        let durations = [0.5, 1.0, 37.3, 120.0, 3600.0];
        for &d in &durations {
            for step in 0..=20 {
                let t = d * step as f64 / 20.0;
                let pos = map(t, d, 42, IndexPolicy::Round);
                assert!((0.0..=1.0).contains(&pos.progress));
                assert!((0..=41).contains(&pos.active_index));
            }
            assert_eq!(map(0.0, d, 42, IndexPolicy::Round).progress, 0.0);
            assert_eq!(map(d, d, 42, IndexPolicy::Round).progress, 1.0);
        }
    }

    #[test]
    fn test_end_of_track_clamps_active_index() {
        let pos = map(10.0, 10.0, 60, IndexPolicy::Round);
        assert_eq!(pos.exact_progress, 60.0);
        assert_eq!(pos.active_index, 59);

        let past_end = map(12.0, 10.0, 60, IndexPolicy::Floor);
        assert_eq!(past_end.progress, 1.0);
        assert_eq!(past_end.active_index, 59);
    }

    #[test]
    fn test_map_is_idempotent() {
        let a = map(33.3, 91.0, 85, IndexPolicy::Round);
        let b = map(33.3, 91.0, 85, IndexPolicy::Round);
        assert_eq!(a, b);
    }

    #[test]
    fn test_classification() {
        // exact progress 2.6 on a 10 bar strip
        let pos = map(2.6, 10.0, 10, IndexPolicy::Round);
        assert_eq!(pos.active_index, 3);
        assert_eq!(pos.classify(0), BarClass::Passed);
        assert_eq!(pos.classify(1), BarClass::Passed);
        // rounding jumped ahead, so the crossed bar is only partly passed
        match pos.classify(2) {
            BarClass::Partial(f) => assert!((f - 0.6).abs() < 1e-9),
            other => panic!("expected partial, got {other:?}"),
        }
        assert_eq!(pos.classify(3), BarClass::Active);
        assert_eq!(pos.classify(4), BarClass::Upcoming);

        // floor keeps the crossing bar active
        let pos = map(2.6, 10.0, 10, IndexPolicy::Floor);
        assert_eq!(pos.active_index, 2);
        assert_eq!(pos.classify(2), BarClass::Active);
        assert_eq!(pos.classify(3), BarClass::Upcoming);
    }

    #[test]
    fn test_partial_bar() {
        let pos = PlaybackPosition {
            exact_progress: 4.25,
            active_index: 3,
            progress: 0.425,
        };
        match pos.classify(4) {
            BarClass::Partial(f) => assert!((f - 0.25).abs() < 1e-9),
            other => panic!("expected partial, got {other:?}"),
        }
        assert_eq!(pos.fill(2), 1.0);
        assert!((pos.fill(4) - 0.25).abs() < 1e-9);
        assert_eq!(pos.fill(7), 0.0);
    }

    #[test]
    fn test_round_policy_yields_partial_bars() {
        let mut partials = 0;
        for step in 0..=1000 {
            let pos = map(step as f64 * 0.1, 100.0, 85, IndexPolicy::Round);
            partials += (0..85)
                .filter(|&i| matches!(pos.classify(i), BarClass::Partial(_)))
                .count();
            // at most one bar is ever partly crossed
            assert!((0..85).filter(|&i| matches!(pos.classify(i), BarClass::Partial(_))).count() <= 1);
        }
        assert!(partials > 0);
    }

    #[test]
    fn test_floor_policy_keeps_crossing_bar_active() {
        for step in 0..=1000 {
            let pos = map(step as f64 * 0.1, 100.0, 85, IndexPolicy::Floor);
            assert!((0..85).all(|i| !matches!(pos.classify(i), BarClass::Partial(_))));
        }
    }

    #[test]
    fn test_unknown_position_classifies_everything_upcoming() {
        let pos = PlaybackPosition::UNKNOWN;
        assert_eq!(pos.classify(0), BarClass::Upcoming);
        assert_eq!(pos.classify(5), BarClass::Upcoming);
    }
}
