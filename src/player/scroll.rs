//! Keeps the playhead visible when the bar strip is wider than its viewport.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the playhead sits inside the viewport while following.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScrollPolicy {
    /// Scroll proportionally to progress: the strip's start and end line up with
    /// the viewport's edges at 0% and 100%.
    StartAligned,
    /// Keep the playhead in the middle of the viewport, clamped at both ends.
    #[default]
    CenterAligned,
}

/// Target scroll offset for `progress` in `[0, 1]`.
///
/// Returns 0 when the content fits the viewport.
pub fn follow(progress: f64, viewport_width: f64, content_width: f64, policy: ScrollPolicy) -> f64 {
    let max_scroll = (content_width - viewport_width).max(0.0);
    if max_scroll == 0.0 {
        return 0.0;
    }
    let progress = progress.clamp(0.0, 1.0);

    match policy {
        ScrollPolicy::StartAligned => progress * max_scroll,
        ScrollPolicy::CenterAligned => {
            (progress * content_width - viewport_width / 2.0).clamp(0.0, max_scroll)
        }
    }
}

/// Smoothed scroll offset that eases towards the latest target.
#[derive(Debug, Clone)]
pub struct ScrollFollower {
    policy: ScrollPolicy,
    /// Time constant of the exponential approach.
    smoothing: Duration,
    offset: f64,
    target: f64,
}

impl ScrollFollower {
    /// Offsets closer than this to the target snap onto it.
    const SNAP_DISTANCE: f64 = 0.5;

    pub fn new(policy: ScrollPolicy, smoothing: Duration) -> Self {
        Self {
            policy,
            smoothing,
            offset: 0.0,
            target: 0.0,
        }
    }

    /// Recomputes the target for the current progress and viewport geometry.
    pub fn retarget(&mut self, progress: f64, viewport_width: f64, content_width: f64) -> f64 {
        self.target = follow(progress, viewport_width, content_width, self.policy);
        // a shrinking overflow can leave the offset past the new end
        let max_scroll = (content_width - viewport_width).max(0.0);
        self.offset = self.offset.min(max_scroll);
        self.target
    }

    /// Moves the offset towards the target by the amount `elapsed` allows.
    pub fn advance(&mut self, elapsed: Duration) -> f64 {
        let distance = self.target - self.offset;
        if distance.abs() <= Self::SNAP_DISTANCE || self.smoothing.is_zero() {
            self.offset = self.target;
            return self.offset;
        }
        let alpha = 1.0 - (-elapsed.as_secs_f64() / self.smoothing.as_secs_f64()).exp();
        self.offset += distance * alpha;
        self.offset
    }

    pub fn reset(&mut self) {
        self.offset = 0.0;
        self.target = 0.0;
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_aligned_scenario() {
        let target = follow(0.5, 400.0, 1200.0, ScrollPolicy::CenterAligned);
        assert_eq!(target, 400.0);
    }

    #[test]
    fn test_center_aligned_clamps_at_edges() {
        assert_eq!(follow(0.05, 400.0, 1200.0, ScrollPolicy::CenterAligned), 0.0);
        assert_eq!(follow(0.98, 400.0, 1200.0, ScrollPolicy::CenterAligned), 800.0);
    }

    #[test]
    fn test_start_aligned() {
        assert_eq!(follow(0.5, 400.0, 1200.0, ScrollPolicy::StartAligned), 400.0);
        assert_eq!(follow(0.25, 400.0, 1200.0, ScrollPolicy::StartAligned), 200.0);
        assert_eq!(follow(1.0, 400.0, 1200.0, ScrollPolicy::StartAligned), 800.0);
    }

    #[test]
    fn test_no_scroll_when_content_fits() {
        for policy in [ScrollPolicy::StartAligned, ScrollPolicy::CenterAligned] {
            assert_eq!(follow(0.7, 400.0, 300.0, policy), 0.0);
            assert_eq!(follow(0.7, 400.0, 400.0, policy), 0.0);
        }
    }

    #[test]
    fn test_follower_eases_towards_target() {
        let mut follower = ScrollFollower::new(ScrollPolicy::CenterAligned, Duration::from_millis(150));
        follower.retarget(0.5, 400.0, 1200.0);
        assert_eq!(follower.offset(), 0.0);

        let first = follower.advance(Duration::from_millis(16));
        assert!(first > 0.0 && first < 400.0);

        let mut last = first;
        for _ in 0..200 {
            last = follower.advance(Duration::from_millis(16));
        }
        assert_eq!(last, 400.0);
    }

    #[test]
    fn test_zero_smoothing_jumps() {
        let mut follower = ScrollFollower::new(ScrollPolicy::StartAligned, Duration::ZERO);
        follower.retarget(0.5, 100.0, 300.0);
        assert_eq!(follower.advance(Duration::from_millis(1)), 100.0);
    }

    #[test]
    fn test_shrinking_content_clamps_offset() {
        let mut follower = ScrollFollower::new(ScrollPolicy::StartAligned, Duration::ZERO);
        follower.retarget(1.0, 100.0, 500.0);
        assert_eq!(follower.advance(Duration::from_millis(1)), 400.0);

        follower.retarget(1.0, 100.0, 150.0);
        assert_eq!(follower.offset(), 50.0);
    }
}
