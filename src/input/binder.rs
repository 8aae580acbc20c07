//! Physical button binding
//!
//! A virtual button is an element plus a small capability
//! (`on_down`, `on_up`, optional `on_click`). The binder owns every
//! binding, runs native events through the normalizer and keeps the
//! gamepad index table.
//!
//! Gamepad buttons mirror a tap: press calls `on_down`, release calls
//! `on_click` (if any) and then `on_up`.

use log::{debug, trace, warn};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use super::coordinator::InputCoordinator;
use super::dispatch::DispatchSink;
use super::normalize::{normalize, Disposition, NativeEvent};
use super::timers::{Expired, Timers};

/// Index of a bound element
pub type ElementId = usize;

/// Services available to button actions
pub struct ActionContext<'a> {
    pub now: Instant,
    pub sink: &'a mut DispatchSink,
    pub timers: &'a mut Timers,
    pub highlights: &'a mut Highlights,
}

/// Capability of a virtual button
pub trait ButtonActions {
    fn on_down(&mut self, id: ElementId, ctx: &mut ActionContext<'_>);

    fn on_up(&mut self, _id: ElementId, _ctx: &mut ActionContext<'_>) {}

    fn on_click(&mut self, _id: ElementId, _ctx: &mut ActionContext<'_>) {}

    /// Click-style button. Such buttons keep native default actions.
    fn has_click(&self) -> bool {
        false
    }

    /// A timer owned by this button expired
    fn on_timer(&mut self, _expired: &Expired, _ctx: &mut ActionContext<'_>) {}
}

/// Element description at bind time
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    pub name: String,
    /// Sibling group for exclusive selection
    pub group: Option<String>,
    /// Gamepad button index
    pub gamepad: Option<u32>,
}

/// "Active" styling state of every element
#[derive(Debug, Default)]
pub struct Highlights {
    active: Vec<bool>,
    groups: Vec<Option<String>>,
}

impl Highlights {
    fn add(&mut self, group: Option<String>) {
        self.active.push(false);
        self.groups.push(group);
    }

    #[cfg(test)]
    pub fn is_active(&self, id: ElementId) -> bool {
        self.active.get(id).copied().unwrap_or(false)
    }

    pub fn set_active(&mut self, id: ElementId, active: bool) {
        if let Some(slot) = self.active.get_mut(id) {
            *slot = active;
        }
    }

    /// Activate `id` and deactivate its group siblings
    pub fn select(&mut self, id: ElementId) {
        let group = self.groups.get(id).cloned().flatten();
        if let Some(group) = group {
            for (i, g) in self.groups.iter().enumerate() {
                if g.as_deref() == Some(group.as_str()) {
                    self.active[i] = false;
                }
            }
        }
        self.set_active(id, true);
    }
}

/// Sparse gamepad index -> element map.
/// Binding an index twice keeps the last binding.
#[derive(Debug, Default)]
pub struct GamepadTable {
    slots: HashMap<u32, ElementId>,
}

impl GamepadTable {
    /// Map `index` to `id`, returning the element it replaced
    pub fn bind(&mut self, index: u32, id: ElementId) -> Option<ElementId> {
        self.slots.insert(index, id)
    }

    pub fn get(&self, index: u32) -> Option<ElementId> {
        self.slots.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

struct ButtonBinding {
    name: String,
    actions: Box<dyn ButtonActions>,
}

impl ButtonBinding {
    fn passive(&self) -> bool {
        self.actions.has_click()
    }
}

pub struct ButtonBinder {
    coordinator: Rc<InputCoordinator>,
    bindings: Vec<ButtonBinding>,
    highlights: Highlights,
    gamepad: GamepadTable,
}

impl ButtonBinder {
    pub fn new(coordinator: Rc<InputCoordinator>) -> Self {
        Self {
            coordinator,
            bindings: Vec::new(),
            highlights: Highlights::default(),
            gamepad: GamepadTable::default(),
        }
    }

    /// Register a virtual button. Call once per element.
    pub fn bind(&mut self, element: ElementSpec, actions: Box<dyn ButtonActions>) -> ElementId {
        let id = self.bindings.len();
        if let Some(index) = element.gamepad {
            if let Some(previous) = self.gamepad.bind(index, id) {
                warn!(
                    "Gamepad button {} rebound from '{}' to '{}'",
                    index, self.bindings[previous].name, element.name
                );
            }
        }
        debug!(
            "Bound '{}' as element {} (click={}, gamepad={:?})",
            element.name,
            id,
            actions.has_click(),
            element.gamepad
        );
        self.highlights.add(element.group);
        self.bindings.push(ButtonBinding {
            name: element.name,
            actions,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[cfg(test)]
    pub fn coordinator(&self) -> &InputCoordinator {
        &self.coordinator
    }

    #[cfg(test)]
    pub fn name(&self, id: ElementId) -> Option<&str> {
        self.bindings.get(id).map(|b| b.name.as_str())
    }

    #[cfg(test)]
    pub fn is_passive(&self, id: ElementId) -> bool {
        self.bindings.get(id).map(|b| b.passive()).unwrap_or(false)
    }

    #[cfg(test)]
    pub fn is_active(&self, id: ElementId) -> bool {
        self.highlights.is_active(id)
    }

    /// Element currently mapped to a gamepad index
    #[cfg(test)]
    pub fn gamepad_owner(&self, index: u32) -> Option<ElementId> {
        self.gamepad.get(index)
    }

    /// Deliver a native event to an element
    pub fn native(
        &mut self,
        id: ElementId,
        event: NativeEvent,
        now: Instant,
        sink: &mut DispatchSink,
        timers: &mut Timers,
    ) -> Disposition {
        let Some(binding) = self.bindings.get_mut(id) else {
            warn!("Native event {:?} for unknown element {}", event, id);
            return Disposition::kept();
        };
        let passive = binding.passive();
        let mut ctx = ActionContext {
            now,
            sink,
            timers,
            highlights: &mut self.highlights,
        };
        normalize(
            event,
            id,
            passive,
            binding.actions.as_mut(),
            &self.coordinator,
            &mut ctx,
        )
    }

    /// Polled gamepad transition. Returns false for unmapped indices.
    pub fn gamepad_button(
        &mut self,
        pressed: bool,
        index: u32,
        now: Instant,
        sink: &mut DispatchSink,
        timers: &mut Timers,
    ) -> bool {
        let Some(id) = self.gamepad.get(index) else {
            trace!("Gamepad button {} unmapped", index);
            return false;
        };
        let binding = &mut self.bindings[id];
        let mut ctx = ActionContext {
            now,
            sink,
            timers,
            highlights: &mut self.highlights,
        };

        if pressed {
            self.coordinator.cancel_pointer_tracking();
            self.coordinator.ensure_audio_active();
            binding.actions.on_down(id, &mut ctx);
        } else {
            if binding.actions.has_click() {
                binding.actions.on_click(id, &mut ctx);
            }
            binding.actions.on_up(id, &mut ctx);
        }
        true
    }

    /// Route an expired timer to its owner
    pub fn timer(&mut self, expired: &Expired, now: Instant, sink: &mut DispatchSink, timers: &mut Timers) {
        let Some(binding) = self.bindings.get_mut(expired.owner) else {
            timers.cancel(expired.handle);
            return;
        };
        let mut ctx = ActionContext {
            now,
            sink,
            timers,
            highlights: &mut self.highlights,
        };
        binding.actions.on_timer(expired, &mut ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{Call, FakeAudio, FakeEngine, FakeObserver, Recorder};
    use std::cell::RefCell;

    /// Records edges as strings
    struct Tally {
        log: Rc<RefCell<Vec<String>>>,
        click: bool,
    }

    impl ButtonActions for Tally {
        fn on_down(&mut self, id: ElementId, _ctx: &mut ActionContext<'_>) {
            self.log.borrow_mut().push(format!("down {}", id));
        }
        fn on_up(&mut self, id: ElementId, _ctx: &mut ActionContext<'_>) {
            self.log.borrow_mut().push(format!("up {}", id));
        }
        fn on_click(&mut self, id: ElementId, _ctx: &mut ActionContext<'_>) {
            self.log.borrow_mut().push(format!("click {}", id));
        }
        fn has_click(&self) -> bool {
            self.click
        }
    }

    struct Fixture {
        rec: Rc<Recorder>,
        coord: Rc<InputCoordinator>,
        binder: ButtonBinder,
        sink: DispatchSink,
        timers: Timers,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Fixture {
        fn new() -> Self {
            let rec = Recorder::new(true);
            let coord = Rc::new(InputCoordinator::new(Box::new(FakeAudio(rec.clone()))));
            let sink = DispatchSink::new(
                Box::new(FakeEngine(rec.clone())),
                Box::new(FakeObserver(rec.clone())),
                coord.clone(),
            );
            Self {
                rec,
                binder: ButtonBinder::new(coord.clone()),
                coord,
                sink,
                timers: Timers::new(),
                log: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn bind(&mut self, name: &str, click: bool, gamepad: Option<u32>) -> ElementId {
            let element = ElementSpec {
                name: name.to_string(),
                group: None,
                gamepad,
            };
            let tally = Tally {
                log: self.log.clone(),
                click,
            };
            self.binder.bind(element, Box::new(tally))
        }

        fn native(&mut self, id: ElementId, event: NativeEvent) -> Disposition {
            self.binder
                .native(id, event, Instant::now(), &mut self.sink, &mut self.timers)
        }

        fn pad(&mut self, pressed: bool, index: u32) -> bool {
            self.binder
                .gamepad_button(pressed, index, Instant::now(), &mut self.sink, &mut self.timers)
        }

        fn log(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    #[test]
    fn test_release_events_share_handler() {
        let mut fx = Fixture::new();
        let id = fx.bind("a", false, None);
        for event in [
            NativeEvent::MouseUp,
            NativeEvent::MouseLeave,
            NativeEvent::TouchEnd,
            NativeEvent::TouchCancel,
        ] {
            fx.native(id, event);
        }
        assert_eq!(fx.log(), vec!["up 0", "up 0", "up 0", "up 0"]);
    }

    #[test]
    fn test_down_edge_side_effects() {
        let mut fx = Fixture::new();
        let id = fx.bind("a", false, None);
        fx.coord.begin_pointer_tracking();
        let disposition = fx.native(id, NativeEvent::TouchStart);
        assert!(disposition.default_prevented);
        assert!(!fx.coord.is_pointer_tracking());
        assert_eq!(fx.rec.count(&Call::Audio), 1);
        assert_eq!(fx.log(), vec!["down 0"]);
        // Suppressed press does not take focus
        assert_eq!(fx.coord.focus(), crate::input::Focus::Surface);
    }

    #[test]
    fn test_passive_keeps_default_and_focus_returns() {
        let mut fx = Fixture::new();
        fx.bind("pad", false, None);
        let id = fx.bind("save", true, None);
        assert!(fx.binder.is_passive(id));

        let down = fx.native(id, NativeEvent::MouseDown);
        assert!(!down.default_prevented);
        assert_eq!(fx.coord.focus(), crate::input::Focus::Element(id));

        let up = fx.native(id, NativeEvent::MouseUp);
        assert!(!up.default_prevented);
        assert_eq!(fx.coord.focus(), crate::input::Focus::Surface);

        fx.native(id, NativeEvent::Click);
        assert_eq!(fx.log(), vec!["down 1", "up 1", "click 1"]);
    }

    #[test]
    fn test_click_without_handler_is_ignored() {
        let mut fx = Fixture::new();
        let id = fx.bind("key", false, None);
        fx.native(id, NativeEvent::Click);
        assert!(fx.log().is_empty());
    }

    #[test]
    fn test_gamepad_tap_order() {
        let mut fx = Fixture::new();
        fx.bind("load", true, Some(3));
        fx.bind("key", false, Some(4));
        assert!(fx.pad(true, 3));
        assert!(fx.pad(false, 3));
        assert!(fx.pad(true, 4));
        assert!(fx.pad(false, 4));
        assert!(!fx.pad(true, 9));
        assert_eq!(
            fx.log(),
            vec!["down 0", "click 0", "up 0", "down 1", "up 1"]
        );
    }

    #[test]
    fn test_gamepad_last_binder_wins() {
        let mut fx = Fixture::new();
        fx.bind("first", false, Some(0));
        let second = fx.bind("second", false, Some(0));
        assert_eq!(fx.binder.gamepad_owner(0), Some(second));
        fx.pad(true, 0);
        assert_eq!(fx.log(), vec!["down 1"]);
    }

    #[test]
    fn test_gamepad_press_cancels_tracking() {
        let mut fx = Fixture::new();
        fx.bind("a", false, Some(1));
        fx.coord.begin_pointer_tracking();
        fx.pad(true, 1);
        assert!(!fx.coord.is_pointer_tracking());
    }

    #[test]
    fn test_highlight_groups() {
        let mut highlights = Highlights::default();
        highlights.add(Some("speed".to_string()));
        highlights.add(Some("speed".to_string()));
        highlights.add(None);
        highlights.set_active(2, true);
        highlights.select(0);
        highlights.select(1);
        assert!(!highlights.is_active(0));
        assert!(highlights.is_active(1));
        assert!(highlights.is_active(2));
    }
}
