//! evdev keycode constants
//!
//! Linux input event codes from <linux/input-event-codes.h> that the
//! physical sources need to recognise directly.

// ============================================================================
// Modifier Keys
// ============================================================================

/// Left Control key
pub const KEY_LEFTCTRL: u32 = 29;

/// Right Control key
pub const KEY_RIGHTCTRL: u32 = 97;

/// Left Shift key
pub const KEY_LEFTSHIFT: u32 = 42;

/// Right Shift key
pub const KEY_RIGHTSHIFT: u32 = 54;

/// Left Alt key
pub const KEY_LEFTALT: u32 = 56;

/// Right Alt key (AltGr on some keyboards)
pub const KEY_RIGHTALT: u32 = 100;

/// Left Super/Meta key
pub const KEY_LEFTMETA: u32 = 125;

/// Right Super/Meta key
pub const KEY_RIGHTMETA: u32 = 126;

/// Modifier keys never produce a key of their own
pub fn is_modifier(code: u32) -> bool {
    matches!(
        code,
        KEY_LEFTCTRL
            | KEY_RIGHTCTRL
            | KEY_LEFTSHIFT
            | KEY_RIGHTSHIFT
            | KEY_LEFTALT
            | KEY_RIGHTALT
            | KEY_LEFTMETA
            | KEY_RIGHTMETA
    )
}

// ============================================================================
// Joystick interface (<linux/joystick.h>)
// ============================================================================

/// js_event type: button
pub const JS_EVENT_BUTTON: u8 = 0x01;

/// js_event type: axis
pub const JS_EVENT_AXIS: u8 = 0x02;

/// js_event flag: synthetic initial state
pub const JS_EVENT_INIT: u8 = 0x80;

/// Size of one js_event record
pub const JS_EVENT_SIZE: usize = 8;
