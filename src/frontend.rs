//! Front-end
//!
//! Owns the input routing graph and turns physical input into native
//! button events the way a browser would:
//!
//! ```text
//!  keyboard ──→ translator ───────────────┐
//!  mouse/touch ─→ layout hit test ─→ binder ─→ dispatch sink ─→ engine
//!  gamepad ────────────────────────↗    ↑
//!                         timers ───────┘
//! ```
//!
//! The caller drains physical sources first and then calls `tick`, so a
//! release seen at time t cancels a repeat due at t.

use log::{debug, info, trace, warn};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use crate::config::Config;
use crate::engine::{AudioOutput, Engine, KeyObserver};
use crate::input::{
    actions_for, ButtonActions, ButtonBinder, ButtonLayout, DispatchSink, Disposition, ElementId,
    ElementSpec, InputCoordinator, KeyInput, KeyboardTranslator, NativeEvent, PointerInput,
    PointerTracker, Rect, Timers, Translation, BTN_LEFT,
};

/// An ongoing mouse or touch press
#[derive(Debug, Clone, Copy)]
struct Press {
    /// Pressed element, None for the rendering surface
    element: Option<ElementId>,
    /// The down edge suppressed its default action
    prevented: bool,
}

pub struct Frontend {
    sink: DispatchSink,
    timers: Timers,
    binder: ButtonBinder,
    translator: KeyboardTranslator,
    layout: ButtonLayout,
    pointer: PointerTracker,
    /// Element under the mouse
    hover: Option<ElementId>,
    /// Left button press in progress
    mouse_press: Option<Press>,
    /// Touch presses by seat slot
    touches: HashMap<u32, Press>,
}

impl Frontend {
    pub fn new(
        engine: Box<dyn Engine>,
        observer: Box<dyn KeyObserver>,
        audio: Box<dyn AudioOutput>,
    ) -> Self {
        let coordinator = Rc::new(InputCoordinator::new(audio));
        Self {
            sink: DispatchSink::new(engine, observer, coordinator.clone()),
            timers: Timers::new(),
            binder: ButtonBinder::new(coordinator.clone()),
            translator: KeyboardTranslator::new(coordinator.clone()),
            layout: ButtonLayout::new(),
            pointer: PointerTracker::new(coordinator),
            hover: None,
            mouse_press: None,
            touches: HashMap::new(),
        }
    }

    /// Build the front-end and bind every configured button
    pub fn from_config(
        config: &Config,
        engine: Box<dyn Engine>,
        observer: Box<dyn KeyObserver>,
        audio: Box<dyn AudioOutput>,
    ) -> Self {
        let mut frontend = Self::new(engine, observer, audio);
        for button in &config.buttons {
            let rect = button.rect.and_then(|r| {
                let rect = Rect::from_array(r);
                if rect.is_none() {
                    warn!("Button '{}': ignoring empty rect {:?}", button.name, r);
                }
                rect
            });
            let element = ElementSpec {
                name: button.name.clone(),
                group: button.group.clone(),
                gamepad: button.gamepad_index(),
            };
            frontend.bind(element, actions_for(button), rect);
        }
        info!(
            "{} virtual buttons bound ({} on screen)",
            frontend.binder.len(),
            frontend.layout.len()
        );
        frontend
    }

    /// Bind one virtual button, optionally placed on screen
    pub fn bind(
        &mut self,
        element: ElementSpec,
        actions: Box<dyn ButtonActions>,
        rect: Option<Rect>,
    ) -> ElementId {
        let id = self.binder.bind(element, actions);
        if let Some(rect) = rect {
            self.layout.place(id, rect);
        }
        id
    }

    #[cfg(test)]
    pub fn element(&self, name: &str) -> Option<ElementId> {
        (0..self.binder.len()).find(|&id| self.binder.name(id) == Some(name))
    }

    #[cfg(test)]
    pub fn coordinator(&self) -> &InputCoordinator {
        self.binder.coordinator()
    }

    #[cfg(test)]
    pub fn binder(&self) -> &ButtonBinder {
        &self.binder
    }

    #[cfg(test)]
    pub fn layout(&self) -> &ButtonLayout {
        &self.layout
    }

    // ========================================================================
    // Keyboard
    // ========================================================================

    /// Physical key press. Keys never activate virtual buttons.
    pub fn handle_key(&mut self, input: &KeyInput) -> Disposition {
        match self.translator.translate(input) {
            Translation::Key(key) => {
                self.sink.deliver(key);
                Disposition::prevented()
            }
            Translation::Ignored => Disposition::kept(),
        }
    }

    // ========================================================================
    // Pointer and touch
    // ========================================================================

    /// Deliver a native event straight to an element
    pub fn native(&mut self, id: ElementId, event: NativeEvent, now: Instant) -> Disposition {
        self.binder
            .native(id, event, now, &mut self.sink, &mut self.timers)
    }

    pub fn handle_pointer(&mut self, input: PointerInput, now: Instant) {
        match input {
            PointerInput::Move { x, y } => {
                self.update_hover(x, y, now);
                if let Some((dx, dy)) = self.pointer.motion(x, y) {
                    trace!("drag ({:.1}, {:.1})", dx, dy);
                }
            }
            PointerInput::Press { button, x, y } => {
                if button != BTN_LEFT {
                    return;
                }
                self.update_hover(x, y, now);
                let press = self.press(self.layout.hit(x, y), NativeEvent::MouseDown, x, y, now);
                self.mouse_press = Some(press);
            }
            PointerInput::Release { button, x, y } => {
                if button != BTN_LEFT {
                    return;
                }
                self.update_hover(x, y, now);
                let press = self.mouse_press.take();
                if let Some(id) = self.layout.hit(x, y) {
                    let up = self.native(id, NativeEvent::MouseUp, now);
                    self.click_if_complete(press, id, up, now);
                }
                self.pointer.end();
            }
            PointerInput::TouchDown { slot, x, y } => {
                let press = self.press(self.layout.hit(x, y), NativeEvent::TouchStart, x, y, now);
                self.touches.insert(slot, press);
            }
            PointerInput::TouchMotion { slot, x, y } => {
                let on_surface = self
                    .touches
                    .get(&slot)
                    .map(|p| p.element.is_none())
                    .unwrap_or(false);
                if on_surface {
                    self.pointer.motion(x, y);
                }
            }
            PointerInput::TouchUp { slot } => {
                let Some(press) = self.touches.remove(&slot) else {
                    return;
                };
                match press.element {
                    Some(id) => {
                        let up = self.native(id, NativeEvent::TouchEnd, now);
                        self.click_if_complete(Some(press), id, up, now);
                    }
                    None => self.pointer.end(),
                }
            }
            PointerInput::TouchCancel => {
                let presses: Vec<Press> = self.touches.drain().map(|(_, p)| p).collect();
                for press in presses {
                    match press.element {
                        Some(id) => {
                            self.native(id, NativeEvent::TouchCancel, now);
                        }
                        None => self.pointer.end(),
                    }
                }
            }
        }
    }

    fn press(
        &mut self,
        target: Option<ElementId>,
        event: NativeEvent,
        x: f64,
        y: f64,
        now: Instant,
    ) -> Press {
        match target {
            Some(id) => {
                let down = self.native(id, event, now);
                Press {
                    element: Some(id),
                    prevented: down.default_prevented,
                }
            }
            None => {
                self.pointer.begin(x, y);
                Press {
                    element: None,
                    prevented: false,
                }
            }
        }
    }

    /// Synthesize a click when down and up landed on the same element
    /// and neither edge suppressed the default action
    fn click_if_complete(
        &mut self,
        press: Option<Press>,
        id: ElementId,
        up: Disposition,
        now: Instant,
    ) {
        let Some(press) = press else {
            return;
        };
        if press.element == Some(id) && !press.prevented && !up.default_prevented {
            self.native(id, NativeEvent::Click, now);
        }
    }

    fn update_hover(&mut self, x: f64, y: f64, now: Instant) {
        let over = self.layout.hit(x, y);
        if over == self.hover {
            return;
        }
        if let Some(previous) = self.hover {
            self.native(previous, NativeEvent::MouseLeave, now);
        }
        self.hover = over;
    }

    // ========================================================================
    // Gamepad
    // ========================================================================

    /// Polled gamepad transition. Unmapped indices are ignored.
    pub fn update_mapped_gamepad_button(
        &mut self,
        pressed: bool,
        index: u32,
        now: Instant,
    ) -> bool {
        self.binder
            .gamepad_button(pressed, index, now, &mut self.sink, &mut self.timers)
    }

    // ========================================================================
    // Timers
    // ========================================================================

    /// Run deferred engine commands and every timer due at `now`.
    /// Returns the number of timer expiries handled.
    pub fn tick(&mut self, now: Instant) -> usize {
        self.sink.flush_deferred();
        let mut fired = 0;
        while let Some(expired) = self.timers.pop_due(now) {
            self.binder
                .timer(&expired, now, &mut self.sink, &mut self.timers);
            fired += 1;
        }
        if fired > 0 {
            debug!("{} timers expired", fired);
        }
        fired
    }

    /// Earliest pending timer
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AttrValue, ButtonConfig, ButtonKind};
    use crate::engine::testing::{Call, FakeAudio, FakeEngine, FakeObserver, Recorder};
    use crate::engine::EngineCommand;
    use crate::input::joystick::decode_js_event;
    use crate::input::keycodes::{JS_EVENT_BUTTON, JS_EVENT_INIT, JS_EVENT_SIZE};
    use crate::input::{Focus, KeyCode, Modifiers};
    use std::time::Duration;

    struct Rig {
        rec: Rc<Recorder>,
        fe: Frontend,
        t0: Instant,
    }

    impl Rig {
        fn with_config(config: &Config, ready: bool) -> Self {
            let rec = Recorder::new(ready);
            let fe = Frontend::from_config(
                config,
                Box::new(FakeEngine(rec.clone())),
                Box::new(FakeObserver(rec.clone())),
                Box::new(FakeAudio(rec.clone())),
            );
            Self {
                rec,
                fe,
                t0: Instant::now(),
            }
        }

        fn new(ready: bool) -> Self {
            Self::with_config(&Config::default(), ready)
        }

        fn at(&self, ms: u64) -> Instant {
            self.t0 + Duration::from_millis(ms)
        }

        /// Center of a named button
        fn center(&self, name: &str) -> (f64, f64) {
            let id = self.fe.element(name).expect("button");
            let r = self.fe.layout().rect(id).expect("placed");
            (r.x + r.w / 2.0, r.y + r.h / 2.0)
        }

        fn pointer(&mut self, input: PointerInput, ms: u64) {
            let now = self.at(ms);
            self.fe.handle_pointer(input, now);
        }

        fn key(&mut self, input: KeyInput) -> Disposition {
            self.fe.handle_key(&input)
        }

        /// Tick every 8 ms in [from, to)
        fn run(&mut self, from: u64, to: u64) {
            let mut ms = from;
            while ms < to {
                let now = self.at(ms);
                self.fe.tick(now);
                ms += 8;
            }
        }
    }

    #[test]
    fn test_held_arrow_button_repeats() {
        let mut rig = Rig::new(true);
        let (x, y) = rig.center("up");
        rig.pointer(PointerInput::TouchDown { slot: 0, x, y }, 0);
        rig.run(0, 1000);
        rig.pointer(PointerInput::TouchUp { slot: 0 }, 1000);
        rig.run(1000, 2000);

        assert_eq!(rig.rec.keys(), vec![(0x00, 0x48); 6]);
        assert_eq!(rig.fe.next_deadline(), None);
    }

    #[test]
    fn test_escape_key() {
        let mut rig = Rig::new(true);
        let disposition = rig.key(KeyInput::named(KeyCode::Escape, Modifiers::empty()));
        assert!(disposition.default_prevented);
        assert_eq!(rig.rec.keys(), vec![(0x1B, 0x01)]);
        assert_eq!(rig.rec.count(&Call::Observed(0x1B, 0x01)), 1);
    }

    #[test]
    fn test_ctrl_letter() {
        let mut rig = Rig::new(true);
        rig.key(KeyInput::text("f", Modifiers::CTRL));
        assert_eq!(rig.rec.keys(), vec![(0x06, 0x00)]);

        let ignored = rig.key(KeyInput::text("1", Modifiers::CTRL));
        assert!(!ignored.default_prevented);
        assert_eq!(rig.rec.keys().len(), 1);
    }

    #[test]
    fn test_unready_engine_still_observed() {
        let mut rig = Rig::new(false);
        rig.key(KeyInput::text("a", Modifiers::empty()));
        assert!(rig.rec.keys().is_empty());
        assert_eq!(rig.rec.count(&Call::Observed('A' as u32, 0)), 1);
        assert_eq!(rig.rec.count(&Call::Audio), 1);
    }

    #[test]
    fn test_surface_drag_and_cancellation() {
        let mut rig = Rig::new(true);
        rig.pointer(PointerInput::Press { button: BTN_LEFT, x: 300.0, y: 100.0 }, 0);
        assert!(rig.fe.coordinator().is_pointer_tracking());

        // An arrow key ends the drag
        rig.key(KeyInput::named(KeyCode::ArrowLeft, Modifiers::empty()));
        assert!(!rig.fe.coordinator().is_pointer_tracking());
        rig.pointer(PointerInput::Release { button: BTN_LEFT, x: 300.0, y: 100.0 }, 10);

        // So does a button press
        rig.pointer(PointerInput::TouchDown { slot: 1, x: 300.0, y: 100.0 }, 20);
        assert!(rig.fe.coordinator().is_pointer_tracking());
        let (x, y) = rig.center("enter");
        rig.pointer(PointerInput::TouchDown { slot: 2, x, y }, 30);
        assert!(!rig.fe.coordinator().is_pointer_tracking());
    }

    #[test]
    fn test_mouse_click_on_save() {
        let mut rig = Rig::new(true);
        let (x, y) = rig.center("save");
        rig.pointer(PointerInput::Press { button: BTN_LEFT, x, y }, 0);
        let id = rig.fe.element("save").expect("save");
        assert_eq!(rig.fe.coordinator().focus(), Focus::Element(id));
        rig.pointer(PointerInput::Release { button: BTN_LEFT, x, y }, 50);
        assert_eq!(rig.fe.coordinator().focus(), Focus::Surface);
        assert_eq!(rig.rec.count(&Call::Command(EngineCommand::SaveGame)), 1);

        // Released somewhere else: no click
        rig.pointer(PointerInput::Press { button: BTN_LEFT, x, y }, 100);
        rig.pointer(PointerInput::Move { x: 600.0, y: 10.0 }, 120);
        rig.pointer(PointerInput::Release { button: BTN_LEFT, x: 600.0, y: 10.0 }, 150);
        assert_eq!(rig.rec.count(&Call::Command(EngineCommand::SaveGame)), 1);
    }

    #[test]
    fn test_keys_do_not_activate_focused_button() {
        let mut rig = Rig::new(true);
        let (x, y) = rig.center("save");
        rig.pointer(PointerInput::Press { button: BTN_LEFT, x, y }, 0);
        let id = rig.fe.element("save").expect("save");
        assert_eq!(rig.fe.coordinator().focus(), Focus::Element(id));

        let chord = Modifiers::CTRL | Modifiers::ALT;
        let ignored = rig.key(KeyInput::named(KeyCode::Enter, chord));
        assert!(!ignored.default_prevented);
        rig.key(KeyInput::named(KeyCode::Enter, Modifiers::empty()));
        assert_eq!(rig.rec.keys(), vec![(0x0D, 0x1C)]);
        assert_eq!(rig.rec.count(&Call::Command(EngineCommand::SaveGame)), 0);
    }

    #[test]
    fn test_key_button_never_clicks() {
        let mut rig = Rig::new(true);
        let (x, y) = rig.center("escape");
        rig.pointer(PointerInput::Press { button: BTN_LEFT, x, y }, 0);
        rig.pointer(PointerInput::Release { button: BTN_LEFT, x, y }, 30);
        assert_eq!(rig.rec.keys(), vec![(0x1B, 0x01)]);
        assert_eq!(rig.fe.coordinator().focus(), Focus::Surface);
    }

    #[test]
    fn test_mouse_leave_stops_repeat() {
        let mut rig = Rig::new(true);
        let (x, y) = rig.center("down");
        rig.pointer(PointerInput::Move { x, y }, 0);
        rig.pointer(PointerInput::Press { button: BTN_LEFT, x, y }, 0);
        rig.run(0, 560);
        rig.pointer(PointerInput::Move { x: 600.0, y: 10.0 }, 560);
        rig.run(560, 2000);
        // Immediate + 500 ms tick
        assert_eq!(rig.rec.keys(), vec![(0x00, 0x50); 2]);
    }

    #[test]
    fn test_gamepad_tap() {
        let mut rig = Rig::new(true);
        // Standard mapping: button 0 is Enter
        assert!(rig.fe.update_mapped_gamepad_button(true, 0, rig.at(0)));
        assert!(rig.fe.update_mapped_gamepad_button(false, 0, rig.at(40)));
        assert!(!rig.fe.update_mapped_gamepad_button(true, 31, rig.at(50)));
        assert_eq!(rig.rec.keys(), vec![(0x0D, 0x1C)]);
    }

    #[test]
    fn test_gamepad_initial_state_does_not_click() {
        let mut save = ButtonConfig::new("save", ButtonKind::SaveGame);
        save.gamepad = Some(AttrValue::Int(3));
        let config = Config {
            buttons: vec![save],
            ..Config::default()
        };
        let mut rig = Rig::with_config(&config, true);

        // js_event: time, value 0, JS_EVENT_BUTTON | JS_EVENT_INIT, number 3
        let mut record = [0u8; JS_EVENT_SIZE];
        record[6] = JS_EVENT_BUTTON | JS_EVENT_INIT;
        record[7] = 3;
        if let Some(event) = decode_js_event(&record) {
            rig.fe
                .update_mapped_gamepad_button(event.pressed, event.index, rig.at(0));
        }
        assert_eq!(rig.rec.count(&Call::Command(EngineCommand::SaveGame)), 0);

        // A real press and release still clicks
        record[4] = 1;
        record[6] = JS_EVENT_BUTTON;
        let press = decode_js_event(&record).expect("press");
        rig.fe
            .update_mapped_gamepad_button(press.pressed, press.index, rig.at(10));
        record[4] = 0;
        let release = decode_js_event(&record).expect("release");
        rig.fe
            .update_mapped_gamepad_button(release.pressed, release.index, rig.at(60));
        assert_eq!(rig.rec.count(&Call::Command(EngineCommand::SaveGame)), 1);
    }

    #[test]
    fn test_gamepad_index_last_binding_wins() {
        let mut first = ButtonConfig::new("first", ButtonKind::Key);
        first.ascii = Some(AttrValue::Text("A".to_string()));
        first.gamepad = Some(AttrValue::Int(5));
        let mut second = ButtonConfig::new("second", ButtonKind::Key);
        second.ascii = Some(AttrValue::Text("B".to_string()));
        second.gamepad = Some(AttrValue::Text("5".to_string()));
        let mut unbound = ButtonConfig::new("unbound", ButtonKind::Key);
        unbound.gamepad = Some(AttrValue::Int(-1));
        let config = Config {
            buttons: vec![first, second, unbound],
            ..Config::default()
        };

        let mut rig = Rig::with_config(&config, true);
        rig.fe.update_mapped_gamepad_button(true, 5, rig.at(0));
        rig.fe.update_mapped_gamepad_button(false, 5, rig.at(10));
        assert_eq!(rig.rec.keys(), vec![('B' as u32, 0)]);
        assert_eq!(rig.fe.layout().len(), 0);
    }

    #[test]
    fn test_gamepad_and_touch_share_release() {
        let mut rig = Rig::new(true);
        let (x, y) = rig.center("up");
        let id = rig.fe.element("up").expect("up");
        // Gamepad 12 is also the up arrow
        rig.pointer(PointerInput::TouchDown { slot: 0, x, y }, 0);
        rig.fe.update_mapped_gamepad_button(true, 12, rig.at(100));
        assert!(rig.fe.binder().is_active(id));
        rig.fe.update_mapped_gamepad_button(false, 12, rig.at(200));
        rig.pointer(PointerInput::TouchUp { slot: 0 }, 210);
        assert!(!rig.fe.binder().is_active(id));
        rig.run(0, 3000);
        assert_eq!(rig.rec.keys().len(), 2);
    }

    #[test]
    fn test_palette_applied_when_ready() {
        let mut rig = Rig::new(false);
        let (x, y) = rig.center("cga");
        rig.pointer(PointerInput::TouchDown { slot: 0, x, y }, 0);
        rig.pointer(PointerInput::TouchUp { slot: 0 }, 20);
        rig.run(0, 100);
        assert_eq!(rig.rec.count(&Call::Command(EngineCommand::PaletteCga)), 0);

        rig.rec.ready.set(true);
        rig.run(100, 110);
        assert_eq!(rig.rec.count(&Call::Command(EngineCommand::PaletteCga)), 1);
    }

    #[test]
    fn test_touch_cancel_releases_everything() {
        let mut rig = Rig::new(true);
        let (x, y) = rig.center("left");
        let id = rig.fe.element("left").expect("left");
        rig.pointer(PointerInput::TouchDown { slot: 0, x, y }, 0);
        rig.pointer(PointerInput::TouchDown { slot: 1, x: 400.0, y: 50.0 }, 0);
        rig.pointer(PointerInput::TouchCancel, 100);
        assert!(!rig.fe.binder().is_active(id));
        assert!(!rig.fe.coordinator().is_pointer_tracking());
        rig.run(0, 2000);
        assert_eq!(rig.rec.keys().len(), 1);
    }
}
