//! Checkpoint cadence
//!
//! A checkpoint becomes pending each time cumulative destructions cross a
//! multiple of the interval. It is shown only once the screen has settled and
//! a fixed delay has run out.

use crate::consts::{CHECKPOINT_INTERVAL, CHECKPOINT_SETTLE_FRAMES};

#[derive(Debug, Clone)]
pub struct CheckpointTracker {
    interval: u32,
    settle_frames: u32,
    /// Index of the last threshold that latched (destroyed / interval)
    last_triggered: u32,
    waiting: bool,
    delay: u32,
}

impl Default for CheckpointTracker {
    fn default() -> Self {
        Self::new(CHECKPOINT_INTERVAL, CHECKPOINT_SETTLE_FRAMES)
    }
}

impl CheckpointTracker {
    pub fn new(interval: u32, settle_frames: u32) -> Self {
        Self {
            interval: interval.max(1),
            settle_frames,
            last_triggered: 0,
            waiting: false,
            delay: 0,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// Latch a pending checkpoint when a new threshold is crossed.
    ///
    /// Suppressed on the frame a group completes. Returns whether it latched.
    pub fn observe(&mut self, destroyed: u32, just_completed_group: bool) -> bool {
        if self.waiting || just_completed_group || destroyed == 0 {
            return false;
        }
        let threshold = destroyed / self.interval;
        if destroyed % self.interval == 0 && threshold > self.last_triggered {
            self.last_triggered = threshold;
            self.waiting = true;
            self.delay = self.settle_frames;
            log::debug!("Checkpoint pending at {} destroyed", destroyed);
            return true;
        }
        false
    }

    /// Count down a pending checkpoint; true on the frame it should show
    pub fn poll(&mut self, effects_settled: bool) -> bool {
        if !self.waiting {
            return false;
        }
        if self.delay == 0 && effects_settled {
            self.waiting = false;
            return true;
        }
        self.delay = self.delay.saturating_sub(1);
        false
    }

    /// Align with the run total after a group transition
    pub fn rebase(&mut self, destroyed: u32) {
        self.last_triggered = destroyed / self.interval;
    }

    /// Forget any pending checkpoint
    pub fn clear_pending(&mut self) {
        self.waiting = false;
        self.delay = 0;
    }
}
