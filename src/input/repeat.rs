//! Key repeat
//!
//! Per-binding state machine turning one sustained press into an
//! immediate action plus a periodic repeat stream:
//!
//! ```text
//! Idle --press--> Armed --delay--> Repeating
//!   ^               |                  |
//!   +----release----+------release-----+
//! ```
//!
//! The delay expiry itself does not fire; the first repeat comes one
//! interval after it. A binding holds at most one delay timer and one
//! interval timer, and every press cancels both before arming again.

use std::time::{Duration, Instant};

use super::binder::ElementId;
use super::timers::{Expired, TimerHandle, Timers};

/// Repeat timing of a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatTiming {
    pub delay: Duration,
    pub rate: Duration,
}

impl RepeatTiming {
    pub fn from_millis(delay_ms: u64, rate_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            rate: Duration::from_millis(rate_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatPhase {
    Idle,
    /// Pressed, waiting for the delay (or momentary)
    Armed,
    Repeating,
}

#[derive(Debug)]
pub struct KeyRepeat {
    /// None: momentary button, fires once per press
    timing: Option<RepeatTiming>,
    phase: RepeatPhase,
    delay: Option<TimerHandle>,
    interval: Option<TimerHandle>,
}

impl KeyRepeat {
    pub fn new(timing: Option<RepeatTiming>) -> Self {
        Self {
            timing,
            phase: RepeatPhase::Idle,
            delay: None,
            interval: None,
        }
    }

    pub fn phase(&self) -> RepeatPhase {
        self.phase
    }

    pub fn timing(&self) -> Option<RepeatTiming> {
        self.timing
    }

    /// Begin a press sequence. The caller fires the action once.
    ///
    /// Any stale sequence (missed release) is stopped first.
    pub fn press(&mut self, owner: ElementId, now: Instant, timers: &mut Timers) {
        self.stop(timers);
        self.phase = RepeatPhase::Armed;
        if let Some(timing) = self.timing {
            self.delay = Some(timers.once(owner, now + timing.delay));
        }
    }

    /// End the press sequence. Safe without a prior press.
    pub fn release(&mut self, timers: &mut Timers) {
        self.stop(timers);
    }

    /// Route an expired timer. Returns true when the action should fire.
    pub fn on_timer(&mut self, expired: &Expired, timers: &mut Timers) -> bool {
        if self.delay == Some(expired.handle) {
            self.delay = None;
            if let Some(previous) = self.interval.take() {
                timers.cancel(previous);
            }
            if let Some(timing) = self.timing {
                self.interval = Some(timers.every(
                    expired.owner,
                    expired.at + timing.rate,
                    timing.rate,
                ));
                self.phase = RepeatPhase::Repeating;
            }
            false
        } else {
            self.interval == Some(expired.handle)
        }
    }

    fn stop(&mut self, timers: &mut Timers) {
        if let Some(handle) = self.delay.take() {
            timers.cancel(handle);
        }
        if let Some(handle) = self.interval.take() {
            timers.cancel(handle);
        }
        self.phase = RepeatPhase::Idle;
    }
}
