//! evdev input handling
//!
//! Use libinput + xkbcommon to read keyboard, mouse and touch events
//! directly from /dev/input/eventN.
//! Keys come out as `KeyInput`, pointers and touches as `PointerInput`.

use anyhow::{anyhow, Context, Result};
use input::event::keyboard::{KeyState, KeyboardEventTrait};
use input::event::pointer::ButtonState;
use input::event::touch::{TouchEventPosition, TouchEventSlot};
use input::event::{Event, PointerEvent, TouchEvent};
use input::{Libinput, LibinputInterface};
use log::{debug, info, trace, warn};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, OwnedFd};
use std::path::Path;
use std::time::{Duration, Instant};
use xkbcommon::xkb;
use xkbcommon::xkb::keysyms;

use super::keycodes::*;
use super::pointer::PointerInput;
use super::translate::{KeyCode, KeyInput, Modifiers};
use crate::config::KeyboardInputConfig;
use crate::constants::MIN_REPEAT_RATE_MS;

/// LibinputInterface implementation for libinput
struct InputInterface;

impl LibinputInterface for InputInterface {
    fn open_restricted(&mut self, path: &Path, flags: i32) -> std::result::Result<OwnedFd, i32> {
        let f = OpenOptions::new()
            .read(true)
            .write((flags & libc::O_WRONLY != 0) || (flags & libc::O_RDWR != 0))
            .custom_flags(flags & !libc::O_WRONLY & !libc::O_RDWR & !libc::O_RDONLY)
            .open(path)
            .map_err(|e| {
                warn!("Cannot open device: {:?}: {}", path, e);
                e.raw_os_error().unwrap_or(-libc::ENOENT)
            })?;
        Ok(OwnedFd::from(f))
    }

    fn close_restricted(&mut self, fd: OwnedFd) {
        drop(fd);
    }
}

/// Physically held modifier keys
#[derive(Debug, Default, Clone, Copy)]
struct HeldModifiers {
    shift: bool,
    ctrl: bool,
    alt: bool,
    meta: bool,
}

impl HeldModifiers {
    fn update(&mut self, code: u32, pressed: bool) {
        match code {
            KEY_LEFTSHIFT | KEY_RIGHTSHIFT => self.shift = pressed,
            KEY_LEFTCTRL | KEY_RIGHTCTRL => self.ctrl = pressed,
            // Right Alt is AltGr on many layouts; xkb picks the level
            KEY_LEFTALT => self.alt = pressed,
            KEY_LEFTMETA | KEY_RIGHTMETA => self.meta = pressed,
            _ => {}
        }
    }

    fn flags(&self) -> Modifiers {
        let mut mods = Modifiers::empty();
        mods.set(Modifiers::SHIFT, self.shift);
        mods.set(Modifiers::CTRL, self.ctrl);
        mods.set(Modifiers::ALT, self.alt);
        mods.set(Modifiers::META, self.meta);
        mods
    }
}

/// Held keys and their next auto-repeat time
#[derive(Debug)]
struct HeldKeys {
    /// evdev keycode -> (next repeat, key as first reported)
    keys: HashMap<u32, (Instant, KeyInput)>,
    delay: Duration,
    interval: Duration,
}

impl HeldKeys {
    fn new(delay_ms: u64, rate_ms: u64) -> Self {
        Self {
            keys: HashMap::new(),
            delay: Duration::from_millis(delay_ms),
            interval: Duration::from_millis(rate_ms.max(MIN_REPEAT_RATE_MS)),
        }
    }

    fn press(&mut self, code: u32, key: KeyInput, now: Instant) {
        self.keys.insert(code, (now + self.delay, key));
    }

    fn release(&mut self, code: u32) {
        self.keys.remove(&code);
    }

    /// Repeats due at `now`, with the modifiers currently held
    fn due(&mut self, now: Instant, mods: Modifiers) -> Vec<KeyInput> {
        let mut due: Vec<(u32, KeyInput)> = Vec::new();
        for (code, (next_repeat, key)) in self.keys.iter_mut() {
            if now >= *next_repeat {
                let mut repeat = key.clone();
                repeat.mods = mods;
                due.push((*code, repeat));
                *next_repeat = now + self.interval;
            }
        }
        due.sort_by_key(|(code, _)| *code);
        due.into_iter().map(|(_, key)| key).collect()
    }
}

/// evdev input management (keyboard + mouse + touch)
pub struct EvdevInput {
    /// libinput context
    input: Libinput,
    /// xkbcommon keyboard state
    xkb_state: xkb::State,
    held: HeldModifiers,
    /// Non-modifier keys held down (auto-repeat)
    held_keys: HeldKeys,
    /// Mouse X coordinate (pixels)
    mouse_x: f64,
    /// Mouse Y coordinate (pixels)
    mouse_y: f64,
    /// Screen width (for coordinate clamping)
    screen_width: f64,
    /// Screen height (for coordinate clamping)
    screen_height: f64,
}

impl EvdevInput {
    /// Initialize evdev input
    ///
    /// Scan /dev/input/event* and add devices to libinput.
    /// Set up keymap with xkbcommon.
    pub fn new(screen_width: u32, screen_height: u32, kb_config: &KeyboardInputConfig) -> Result<Self> {
        let mut input = Libinput::new_from_path(InputInterface);

        let mut device_count = 0;
        for entry in std::fs::read_dir("/dev/input").context("Cannot scan /dev/input")? {
            let entry = entry?;
            let path = entry.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with("event") {
                let path_str = path.to_str().unwrap_or("");
                if input.path_add_device(path_str).is_some() {
                    debug!("Input device added: {}", path_str);
                    device_count += 1;
                }
            }
        }

        if device_count == 0 {
            return Err(anyhow!(
                "No input devices found. Check permissions for /dev/input/event*."
            ));
        }

        info!("evdev: {} input devices added", device_count);

        // Set fd to non-blocking
        let fd = input.as_raw_fd();
        let flags = nix::fcntl::fcntl(fd, nix::fcntl::FcntlArg::F_GETFL)
            .map_err(|e| anyhow!("F_GETFL failed: {}", e))?;
        let mut flags = nix::fcntl::OFlag::from_bits_truncate(flags);
        flags.insert(nix::fcntl::OFlag::O_NONBLOCK);
        nix::fcntl::fcntl(fd, nix::fcntl::FcntlArg::F_SETFL(flags))
            .map_err(|e| anyhow!("F_SETFL failed: {}", e))?;

        let context = xkb::Context::new(xkb::CONTEXT_NO_FLAGS);
        let options = if kb_config.xkb_options.is_empty() {
            None
        } else {
            Some(kb_config.xkb_options.clone())
        };

        let keymap = xkb::Keymap::new_from_names(
            &context,
            "",
            kb_config.xkb_model.as_str(),
            kb_config.xkb_layout.as_str(),
            kb_config.xkb_variant.as_str(),
            options.clone(),
            xkb::COMPILE_NO_FLAGS,
        )
        .ok_or_else(|| {
            anyhow!(
                "Failed to create xkb keymap (model={}, layout={}, variant={}, options={:?})",
                kb_config.xkb_model,
                kb_config.xkb_layout,
                kb_config.xkb_variant,
                options
            )
        })?;

        info!(
            "evdev keyboard initialized (layout={})",
            if kb_config.xkb_layout.is_empty() { "default" } else { &kb_config.xkb_layout }
        );

        Ok(Self {
            input,
            xkb_state: xkb::State::new(&keymap),
            held: HeldModifiers::default(),
            held_keys: HeldKeys::new(kb_config.repeat_delay, kb_config.repeat_rate),
            mouse_x: screen_width as f64 / 2.0,
            mouse_y: screen_height as f64 / 2.0,
            screen_width: screen_width as f64,
            screen_height: screen_height as f64,
        })
    }

    /// Drain pending events
    ///
    /// Key presses are reported, plus one repeat per held key whose
    /// repeat time has come. Releases only update state.
    pub fn process_events(&mut self, now: Instant) -> (Vec<KeyInput>, Vec<PointerInput>) {
        let mut keys = Vec::new();
        let mut pointer = Vec::new();

        if let Err(e) = self.input.dispatch() {
            warn!("libinput dispatch error: {}", e);
            return (keys, pointer);
        }

        while let Some(event) = self.input.next() {
            match event {
                Event::Keyboard(input::event::KeyboardEvent::Key(key_event)) => {
                    let evdev_code = key_event.key();
                    let xkb_keycode = xkb::Keycode::new(evdev_code + 8);
                    let pressed = key_event.key_state() == KeyState::Pressed;

                    // Keysym before the state update (level chosen by Shift)
                    let sym = self.xkb_state.key_get_one_sym(xkb_keycode);
                    let direction = if pressed {
                        xkb::KeyDirection::Down
                    } else {
                        xkb::KeyDirection::Up
                    };
                    self.xkb_state.update_key(xkb_keycode, direction);

                    if is_modifier(evdev_code) {
                        self.held.update(evdev_code, pressed);
                        continue;
                    }
                    if pressed {
                        let key = key_input_from_sym(sym.raw(), self.held.flags());
                        trace!("evdev key {} -> {:?}", evdev_code, key);
                        self.held_keys.press(evdev_code, key.clone(), now);
                        keys.push(key);
                    } else {
                        self.held_keys.release(evdev_code);
                    }
                }
                Event::Pointer(ptr_event) => self.pointer_event(ptr_event, &mut pointer),
                Event::Touch(touch_event) => self.touch_event(touch_event, &mut pointer),
                _ => {}
            }
        }

        keys.extend(self.held_keys.due(now, self.held.flags()));
        (keys, pointer)
    }

    fn pointer_event(&mut self, event: PointerEvent, out: &mut Vec<PointerInput>) {
        match event {
            PointerEvent::Motion(m) => {
                // Accumulate relative movement, clamped to the screen
                self.mouse_x = (self.mouse_x + m.dx()).clamp(0.0, self.screen_width - 1.0);
                self.mouse_y = (self.mouse_y + m.dy()).clamp(0.0, self.screen_height - 1.0);
                out.push(PointerInput::Move {
                    x: self.mouse_x,
                    y: self.mouse_y,
                });
            }
            PointerEvent::MotionAbsolute(m) => {
                self.mouse_x = m.absolute_x_transformed(self.screen_width as u32);
                self.mouse_y = m.absolute_y_transformed(self.screen_height as u32);
                out.push(PointerInput::Move {
                    x: self.mouse_x,
                    y: self.mouse_y,
                });
            }
            PointerEvent::Button(b) => {
                let button = b.button();
                debug!("Mouse button: {} state={:?}", button, b.button_state());
                let (x, y) = (self.mouse_x, self.mouse_y);
                out.push(match b.button_state() {
                    ButtonState::Pressed => PointerInput::Press { button, x, y },
                    ButtonState::Released => PointerInput::Release { button, x, y },
                });
            }
            other => {
                trace!("Unhandled pointer event: {:?}", other);
            }
        }
    }

    fn touch_event(&mut self, event: TouchEvent, out: &mut Vec<PointerInput>) {
        let (w, h) = (self.screen_width as u32, self.screen_height as u32);
        match event {
            TouchEvent::Down(t) => out.push(PointerInput::TouchDown {
                slot: t.seat_slot(),
                x: t.x_transformed(w),
                y: t.y_transformed(h),
            }),
            TouchEvent::Motion(t) => out.push(PointerInput::TouchMotion {
                slot: t.seat_slot(),
                x: t.x_transformed(w),
                y: t.y_transformed(h),
            }),
            TouchEvent::Up(t) => out.push(PointerInput::TouchUp {
                slot: t.seat_slot(),
            }),
            TouchEvent::Cancel(_) => out.push(PointerInput::TouchCancel),
            _ => {}
        }
    }
}

/// Build a `KeyInput` from a keysym and the held modifiers.
///
/// Text comes from the keysym itself, so Ctrl+F still reads "f"
/// rather than the 0x06 xkb would produce with Ctrl applied.
pub fn key_input_from_sym(raw: u32, mods: Modifiers) -> KeyInput {
    let named = match raw {
        _ if raw == keysyms::KEY_Up || raw == keysyms::KEY_KP_Up => Some(KeyCode::ArrowUp),
        _ if raw == keysyms::KEY_Down || raw == keysyms::KEY_KP_Down => Some(KeyCode::ArrowDown),
        _ if raw == keysyms::KEY_Left || raw == keysyms::KEY_KP_Left => Some(KeyCode::ArrowLeft),
        _ if raw == keysyms::KEY_Right || raw == keysyms::KEY_KP_Right => {
            Some(KeyCode::ArrowRight)
        }
        _ if raw == keysyms::KEY_BackSpace => Some(KeyCode::Backspace),
        _ if raw == keysyms::KEY_Return || raw == keysyms::KEY_KP_Enter => Some(KeyCode::Enter),
        _ if raw == keysyms::KEY_Escape => Some(KeyCode::Escape),
        _ => None,
    };
    if let Some(code) = named {
        return KeyInput::named(code, mods);
    }

    let utf8 = xkb::keysym_to_utf8(xkb::Keysym::new(raw));
    let text = utf8.trim_end_matches('\0');
    if text.is_empty() || text.chars().any(char::is_control) {
        // Function keys, Tab, ...
        return KeyInput::named(KeyCode::Other, mods);
    }
    KeyInput::text(text, mods)
}
