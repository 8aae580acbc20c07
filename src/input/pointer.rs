//! Pointer input
//!
//! `PointerInput` is what the physical sources report for mice and
//! touch screens. `PointerTracker` is the drag side: a press over the
//! rendering surface starts tracking, any button down-edge or arrow key
//! ends it through the shared coordinator.

use log::{debug, trace};
use std::rc::Rc;

use super::coordinator::InputCoordinator;

/// libinput number of the left mouse button
pub const BTN_LEFT: u32 = 0x110;

/// Pointer or touch event in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Move { x: f64, y: f64 },
    Press { button: u32, x: f64, y: f64 },
    Release { button: u32, x: f64, y: f64 },
    TouchDown { slot: u32, x: f64, y: f64 },
    TouchMotion { slot: u32, x: f64, y: f64 },
    TouchUp { slot: u32 },
    /// The whole touch sequence was cancelled
    TouchCancel,
}

pub struct PointerTracker {
    coordinator: Rc<InputCoordinator>,
    /// Last tracked position
    last: Option<(f64, f64)>,
}

impl PointerTracker {
    pub fn new(coordinator: Rc<InputCoordinator>) -> Self {
        Self {
            coordinator,
            last: None,
        }
    }

    /// Start a drag at (x, y)
    pub fn begin(&mut self, x: f64, y: f64) {
        debug!("pointer drag from ({:.0}, {:.0})", x, y);
        self.last = Some((x, y));
        self.coordinator.begin_pointer_tracking();
    }

    /// Pointer moved. Returns the drag delta while tracking.
    pub fn motion(&mut self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !self.coordinator.is_pointer_tracking() {
            // Cancelled by a button or an arrow key
            self.last = None;
            return None;
        }
        let (lx, ly) = self.last.replace((x, y))?;
        let delta = (x - lx, y - ly);
        trace!("pointer drag ({:.1}, {:.1})", delta.0, delta.1);
        Some(delta)
    }

    /// Release anywhere ends the drag
    pub fn end(&mut self) {
        self.last = None;
        self.coordinator.cancel_pointer_tracking();
    }

    pub fn is_tracking(&self) -> bool {
        self.coordinator.is_pointer_tracking()
    }
}
