//! Input coordinator
//!
//! Shared state between the keyboard, pointer and button paths:
//! - pointer-tracking flag (drag mode vs. discrete keys)
//! - input focus (rendering surface or a virtual button)
//! - the audio collaborator, activated on user gestures
//!
//! Shared through `Rc` and mutated through `Cell`/`RefCell`, which keeps
//! every write on the thread that owns the event loop.

use log::{debug, trace};
use std::cell::{Cell, RefCell};

use super::binder::ElementId;
use crate::engine::AudioOutput;

/// Current keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Rendering surface: keys go to the emulator
    Surface,
    /// A virtual button holds focus
    Element(ElementId),
}

pub struct InputCoordinator {
    /// Pointer drag mode active
    pointer_tracking: Cell<bool>,
    /// Focus target
    focus: Cell<Focus>,
    /// Audio collaborator
    audio: RefCell<Box<dyn AudioOutput>>,
}

impl InputCoordinator {
    pub fn new(audio: Box<dyn AudioOutput>) -> Self {
        Self {
            pointer_tracking: Cell::new(false),
            focus: Cell::new(Focus::Surface),
            audio: RefCell::new(audio),
        }
    }

    /// Enter pointer drag mode. Only the pointer tracker calls this.
    pub fn begin_pointer_tracking(&self) {
        trace!("pointer tracking on");
        self.pointer_tracking.set(true);
    }

    /// Leave pointer drag mode. Writers clear unconditionally.
    pub fn cancel_pointer_tracking(&self) {
        if self.pointer_tracking.replace(false) {
            debug!("pointer tracking cancelled");
        }
    }

    pub fn is_pointer_tracking(&self) -> bool {
        self.pointer_tracking.get()
    }

    /// Activate audio output (idempotent on the collaborator side)
    pub fn ensure_audio_active(&self) {
        self.audio.borrow_mut().ensure_active();
    }

    #[allow(dead_code)]
    pub fn focus(&self) -> Focus {
        self.focus.get()
    }

    /// Move focus to a virtual button
    pub fn focus_element(&self, element: ElementId) {
        self.focus.set(Focus::Element(element));
    }

    /// Blur `element` (if focused) and give focus back to the surface
    pub fn restore_surface_focus(&self) {
        self.focus.set(Focus::Surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{Call, FakeAudio, Recorder};

    #[test]
    fn test_tracking_flag() {
        let rec = Recorder::new(true);
        let coord = InputCoordinator::new(Box::new(FakeAudio(rec.clone())));
        assert!(!coord.is_pointer_tracking());
        coord.begin_pointer_tracking();
        assert!(coord.is_pointer_tracking());
        coord.cancel_pointer_tracking();
        assert!(!coord.is_pointer_tracking());
        // Clearing twice is fine
        coord.cancel_pointer_tracking();
        assert!(!coord.is_pointer_tracking());
    }

    #[test]
    fn test_focus_round_trip() {
        let rec = Recorder::new(true);
        let coord = InputCoordinator::new(Box::new(FakeAudio(rec.clone())));
        assert_eq!(coord.focus(), Focus::Surface);
        coord.focus_element(3);
        assert_eq!(coord.focus(), Focus::Element(3));
        coord.restore_surface_focus();
        assert_eq!(coord.focus(), Focus::Surface);
        coord.ensure_audio_active();
        assert_eq!(rec.calls(), vec![Call::Audio]);
    }
}
