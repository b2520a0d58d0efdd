//! Per-frame animation phase for the "breathing" bar effect.
//!
//! The driver is an explicit Idle/Running state machine. Frames are requested
//! from an injected [`FrameScheduler`]; every exit from Running cancels the
//! pending frame before returning, and a frame callback carrying any handle
//! other than the current pending one is ignored.

use std::f64::consts::PI;
use std::time::{Duration, Instant};

/// Identifies one requested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Source of display frames.
pub trait FrameScheduler {
    /// Requests one callback on the next frame.
    fn request_frame(&mut self) -> FrameHandle;
    /// Cancels a previously requested frame. Unknown handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Fires at most one pending frame per `interval`, polled from the render loop.
#[derive(Debug)]
pub struct IntervalScheduler {
    interval: Duration,
    next_id: u64,
    pending: Option<FrameHandle>,
    last_fired: Option<Instant>,
}

impl IntervalScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_id: 0,
            pending: None,
            last_fired: None,
        }
    }

    /// Returns the pending frame if it is due at `now`, consuming the request.
    pub fn due(&mut self, now: Instant) -> Option<FrameHandle> {
        let handle = self.pending?;
        let ready = self
            .last_fired
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval);
        if !ready {
            return None;
        }
        self.pending = None;
        self.last_fired = Some(now);
        Some(handle)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl FrameScheduler for IntervalScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DriverState {
    Idle,
    Running {
        pending: Option<FrameHandle>,
        last_frame: Instant,
    },
}

/// Advances a phase value once per frame while playback runs.
#[derive(Debug)]
pub struct AnimationDriver<S: FrameScheduler> {
    scheduler: S,
    state: DriverState,
    phase: f64,
    /// Phase units per elapsed millisecond.
    rate: f64,
}

impl<S: FrameScheduler> AnimationDriver<S> {
    /// `sin(phase)` and `sin(phase / 2)` both repeat after 4π.
    const PHASE_PERIOD: f64 = 4.0 * PI;

    pub fn new(scheduler: S, rate: f64) -> Self {
        Self {
            scheduler,
            state: DriverState::Idle,
            phase: 0.0,
            rate,
        }
    }

    /// Idle -> Running. Requests the first frame; no-op when already running.
    pub fn start(&mut self, now: Instant) {
        if self.is_running() {
            return;
        }
        let handle = self.scheduler.request_frame();
        self.state = DriverState::Running {
            pending: Some(handle),
            last_frame: now,
        };
        tracing::trace!("Animation started");
    }

    /// Running -> Idle. The pending frame is cancelled before this returns.
    pub fn stop(&mut self) {
        if let DriverState::Running { pending, .. } = self.state {
            if let Some(handle) = pending {
                self.scheduler.cancel_frame(handle);
            }
            self.state = DriverState::Idle;
            tracing::trace!("Animation stopped");
        }
    }

    /// Frame callback. Returns `true` if the phase advanced.
    pub fn on_frame(&mut self, handle: FrameHandle, now: Instant) -> bool {
        let DriverState::Running { pending, last_frame } = self.state else {
            return false;
        };
        if pending != Some(handle) {
            return false;
        }

        let elapsed_ms = now.saturating_duration_since(last_frame).as_secs_f64() * 1000.0;
        self.phase = (self.phase + elapsed_ms * self.rate) % Self::PHASE_PERIOD;

        let next = self.scheduler.request_frame();
        self.state = DriverState::Running {
            pending: Some(next),
            last_frame: now,
        };
        true
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, DriverState::Running { .. })
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

impl AnimationDriver<IntervalScheduler> {
    /// Fires the pending frame if the interval elapsed. Called once per loop turn.
    pub fn pump(&mut self, now: Instant) -> bool {
        match self.scheduler.due(now) {
            Some(handle) => self.on_frame(handle, now),
            None => false,
        }
    }
}

impl<S: FrameScheduler> Drop for AnimationDriver<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Parameters of the cosmetic height perturbation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationStyle {
    /// Phase units per millisecond.
    pub rate: f64,
    /// Amplitude of the travelling wave applied to every bar.
    pub wave_amplitude: f64,
    /// Phase offset between neighbouring bars.
    pub wave_spread: f64,
    /// Amplitude of the slow pulse applied to played bars.
    pub breathing_amplitude: f64,
    /// Animated heights never drop below this.
    pub floor: f64,
}

impl AnimationStyle {
    /// Height of bar `index` at `phase`.
    pub fn animated_height(&self, height: f64, index: usize, phase: f64, played: bool) -> f64 {
        let wave = (phase + index as f64 * self.wave_spread).sin() * self.wave_amplitude;
        let breathing = if played {
            (phase * 0.5).sin() * self.breathing_amplitude
        } else {
            0.0
        };
        (height + wave + breathing).max(self.floor)
    }
}
