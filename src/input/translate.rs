//! Keyboard translation
//!
//! Maps a physical key (+ modifiers) to the emulator's
//! character code / scancode pair. Rules are checked in priority order:
//!
//! | Key                         | Result                        |
//! |-----------------------------|-------------------------------|
//! | Arrow                       | (0, scancode) / shifted digit |
//! | Backspace                   | (0x08, 0)                     |
//! | Enter                       | (0x0D, 0x1C)                  |
//! | Escape                      | (0x1B, 0x01)                  |
//! | printable, no ctrl/alt/meta | (uppercase, 0)                |
//! | Ctrl + letter               | (letter - 'A' + 1, 0)         |
//!
//! Anything else is ignored and keeps its native default action.

use bitflags::bitflags;
use log::trace;
use smol_str::SmolStr;
use std::rc::Rc;

use super::coordinator::InputCoordinator;
use crate::constants::*;

bitflags! {
    /// Keyboard modifier state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

impl Modifiers {
    /// No Ctrl, Alt or Meta (Shift allowed)
    pub fn is_plain(self) -> bool {
        !self.intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::META)
    }
}

/// Physical key identity (layout independent where it matters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Backspace,
    Enter,
    Escape,
    Space,
    /// Anything else; see `KeyInput::key` for its text
    Other,
}

impl KeyCode {
    pub fn is_arrow(self) -> bool {
        matches!(
            self,
            KeyCode::ArrowUp | KeyCode::ArrowDown | KeyCode::ArrowLeft | KeyCode::ArrowRight
        )
    }
}

/// Physical key press, independent of the input source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub code: KeyCode,
    /// Printable text produced by the key, empty for non-printing keys
    pub key: SmolStr,
    pub mods: Modifiers,
}

impl KeyInput {
    pub fn new(code: KeyCode, key: &str, mods: Modifiers) -> Self {
        Self {
            code,
            key: SmolStr::new(key),
            mods,
        }
    }

    /// Printable character key
    pub fn text(key: &str, mods: Modifiers) -> Self {
        let code = if key == " " { KeyCode::Space } else { KeyCode::Other };
        Self::new(code, key, mods)
    }

    /// Named key without text
    pub fn named(code: KeyCode, mods: Modifiers) -> Self {
        Self::new(code, "", mods)
    }

    /// The single character of `key`, if it is exactly one
    pub fn single_char(&self) -> Option<char> {
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Some(ch),
            _ => None,
        }
    }

    /// Lowercase name for keybind matching
    pub fn name(&self) -> String {
        match self.code {
            KeyCode::ArrowUp => "up".to_string(),
            KeyCode::ArrowDown => "down".to_string(),
            KeyCode::ArrowLeft => "left".to_string(),
            KeyCode::ArrowRight => "right".to_string(),
            KeyCode::Backspace => "backspace".to_string(),
            KeyCode::Enter => "enter".to_string(),
            KeyCode::Escape => "escape".to_string(),
            KeyCode::Space => "space".to_string(),
            KeyCode::Other => self.key.to_lowercase(),
        }
    }
}

/// Emulator key: character code + scancode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: u32,
    pub scancode: u8,
}

impl KeyEvent {
    pub fn new(code: u32, scancode: u8) -> Self {
        Self { code, scancode }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    /// Dispatch, then suppress the native default action
    Key(KeyEvent),
    /// Not understood: leave the native default action alone
    Ignored,
}

/// Control code for Ctrl + letter (Ctrl+A = 0x01 .. Ctrl+Z = 0x1A).
/// Other characters have no control code.
pub fn control_code(ch: char) -> Option<u32> {
    if ch.is_ascii_alphabetic() {
        Some((ch.to_ascii_uppercase() as u32) - ('A' as u32) + 1)
    } else {
        None
    }
}

fn upper(ch: char) -> u32 {
    ch.to_uppercase().next().unwrap_or(ch) as u32
}

/// Translate a key without side effects
pub fn translate_key(input: &KeyInput) -> Translation {
    let shift = input.mods.contains(Modifiers::SHIFT);
    let plain = input.mods.is_plain();

    let arrow = match input.code {
        KeyCode::ArrowUp => Some((SCANCODE_UP, '8')),
        KeyCode::ArrowDown => Some((SCANCODE_DOWN, '2')),
        KeyCode::ArrowLeft => Some((SCANCODE_LEFT, '4')),
        KeyCode::ArrowRight => Some((SCANCODE_RIGHT, '6')),
        _ => None,
    };
    if let Some((scancode, digit)) = arrow {
        let code = if shift { digit as u32 } else { CHAR_NONE };
        return Translation::Key(KeyEvent::new(code, scancode));
    }

    match input.code {
        KeyCode::Backspace if plain => return Translation::Key(KeyEvent::new(CHAR_BACKSPACE, 0)),
        KeyCode::Enter if plain => {
            return Translation::Key(KeyEvent::new(CHAR_ENTER, SCANCODE_ENTER))
        }
        KeyCode::Escape if plain => {
            return Translation::Key(KeyEvent::new(CHAR_ESCAPE, SCANCODE_ESCAPE))
        }
        KeyCode::Backspace | KeyCode::Enter | KeyCode::Escape => return Translation::Ignored,
        _ => {}
    }

    let Some(ch) = input.single_char().filter(|c| !c.is_control()) else {
        return Translation::Ignored;
    };

    if plain {
        return Translation::Key(KeyEvent::new(upper(ch), 0));
    }

    let ctrl_only = input.mods.contains(Modifiers::CTRL)
        && !input.mods.intersects(Modifiers::ALT | Modifiers::META);
    if ctrl_only {
        if let Some(code) = control_code(ch) {
            return Translation::Key(KeyEvent::new(code, 0));
        }
    }

    Translation::Ignored
}

/// Keyboard translator bound to the input coordinator
pub struct KeyboardTranslator {
    coordinator: Rc<InputCoordinator>,
}

impl KeyboardTranslator {
    pub fn new(coordinator: Rc<InputCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Translate a key press.
    ///
    /// Arrow keys always end pointer tracking, whatever the outcome.
    pub fn translate(&self, input: &KeyInput) -> Translation {
        if input.code.is_arrow() {
            self.coordinator.cancel_pointer_tracking();
        }
        let result = translate_key(input);
        trace!("translate {:?} -> {:?}", input, result);
        result
    }
}
