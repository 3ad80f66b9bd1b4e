//! Frame-stepped animation.
//!
//! Nothing here reads a clock: the owner calls `advance(dt)` once per UI tick
//! and reads back the progress. Restarting or cancelling a transition is just
//! resetting its progress.

use web_time::Duration;

/// Length of a linear transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationSpec {
    pub duration: Duration,
}

impl AnimationSpec {
    pub fn linear(duration: Duration) -> Self {
        Self { duration }
    }
}

/// Progress accumulator for a fixed-length transition.
///
/// A fresh transition is finished (`progress() == 1.0`); `restart` rewinds it.
#[derive(Clone, Copy, Debug)]
pub struct Transition {
    spec: AnimationSpec,
    elapsed: Duration,
}

impl Transition {
    pub fn new(spec: AnimationSpec) -> Self {
        Self {
            spec,
            elapsed: spec.duration,
        }
    }

    pub fn restart(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    /// Jumps to the terminal value without passing through the frames in between.
    pub fn finish(&mut self) {
        self.elapsed = self.spec.duration;
    }

    pub fn is_running(&self) -> bool {
        self.elapsed < self.spec.duration
    }

    /// Advances by one frame and returns the progress.
    pub fn advance(&mut self, dt: Duration) -> f32 {
        if self.is_running() {
            self.elapsed = (self.elapsed + dt).min(self.spec.duration);
        }
        self.progress()
    }

    /// Progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.spec.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed.as_secs_f32() / self.spec.duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}
