//! Event normalization
//!
//! Collapses the native pointer/touch events of a virtual button into
//! one logical press or release:
//! - down-type: mouse-down, touch-start
//! - up-type: mouse-up, mouse-leave, touch-end, touch-cancel
//!
//! All up-type events reach the same release handler, which must be
//! idempotent (a mouse-up is usually followed by a mouse-leave).

use log::trace;

use super::binder::{ActionContext, ButtonActions, ElementId};
use super::coordinator::InputCoordinator;

/// Native event delivered to a virtual button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeEvent {
    MouseDown,
    MouseUp,
    MouseLeave,
    TouchStart,
    TouchEnd,
    TouchCancel,
    /// Activation (pointer click or keyboard activation of a focused button)
    Click,
}

/// Logical edge of a native event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Down,
    Up,
    Click,
}

impl NativeEvent {
    pub fn edge(self) -> Edge {
        match self {
            NativeEvent::MouseDown | NativeEvent::TouchStart => Edge::Down,
            NativeEvent::MouseUp
            | NativeEvent::MouseLeave
            | NativeEvent::TouchEnd
            | NativeEvent::TouchCancel => Edge::Up,
            NativeEvent::Click => Edge::Click,
        }
    }
}

/// What happened to the native default action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Disposition {
    pub default_prevented: bool,
}

impl Disposition {
    pub fn prevented() -> Self {
        Self {
            default_prevented: true,
        }
    }

    pub fn kept() -> Self {
        Self::default()
    }
}

/// Route one native event to a binding.
///
/// `passive` bindings (click-style) keep the native default action;
/// all others suppress it, so no synthetic click or scroll follows.
pub fn normalize(
    event: NativeEvent,
    id: ElementId,
    passive: bool,
    actions: &mut dyn ButtonActions,
    coordinator: &InputCoordinator,
    ctx: &mut ActionContext<'_>,
) -> Disposition {
    trace!("element {} <- {:?}", id, event);
    let disposition = if passive {
        Disposition::kept()
    } else {
        Disposition::prevented()
    };

    match event.edge() {
        Edge::Down => {
            coordinator.cancel_pointer_tracking();
            coordinator.ensure_audio_active();
            // A press moves focus to the control unless its default is suppressed
            if passive {
                coordinator.focus_element(id);
            }
            actions.on_down(id, ctx);
            disposition
        }
        Edge::Up => {
            actions.on_up(id, ctx);
            coordinator.restore_surface_focus();
            disposition
        }
        Edge::Click => {
            if actions.has_click() {
                actions.on_click(id, ctx);
            }
            Disposition::kept()
        }
    }
}
