//! Global constants for emukeys
//!
//! Consolidates scancodes, character codes and timing constants
//! to eliminate magic numbers throughout the codebase.

#![allow(dead_code)]

// ============================================================================
// Emulator Scancodes (PC/XT set 1)
// ============================================================================

/// Escape key scancode
pub const SCANCODE_ESCAPE: u8 = 0x01;

/// Enter key scancode
pub const SCANCODE_ENTER: u8 = 0x1C;

/// Cursor up scancode (keypad 8)
pub const SCANCODE_UP: u8 = 0x48;

/// Cursor left scancode (keypad 4)
pub const SCANCODE_LEFT: u8 = 0x4B;

/// Cursor right scancode (keypad 6)
pub const SCANCODE_RIGHT: u8 = 0x4D;

/// Cursor down scancode (keypad 2)
pub const SCANCODE_DOWN: u8 = 0x50;

// ============================================================================
// Character Codes
// ============================================================================

/// Cursor movement carries no character
pub const CHAR_NONE: u32 = 0x00;

/// Backspace character
pub const CHAR_BACKSPACE: u32 = 0x08;

/// Carriage return
pub const CHAR_ENTER: u32 = 0x0D;

/// Escape character
pub const CHAR_ESCAPE: u32 = 0x1B;

// ============================================================================
// Timing Constants
// ============================================================================

/// Main loop sleep when no timer is due sooner (milliseconds)
pub const LOOP_IDLE_SLEEP_MS: u64 = 8;

/// Smallest accepted repeat interval (milliseconds).
/// A zero period would make the timer queue spin.
pub const MIN_REPEAT_RATE_MS: u64 = 1;

/// Physical key auto-repeat delay (milliseconds)
pub const DEFAULT_KEY_REPEAT_DELAY_MS: u64 = 400;

/// Physical key auto-repeat interval (milliseconds)
pub const DEFAULT_KEY_REPEAT_RATE_MS: u64 = 30;

/// Default engine warm-up for the tracing engine (milliseconds)
pub const DEFAULT_ENGINE_READY_DELAY_MS: u64 = 500;

// ============================================================================
// Screen Defaults
// ============================================================================

/// Default pointer clamp width (pixels)
pub const DEFAULT_SCREEN_WIDTH: u32 = 1280;

/// Default pointer clamp height (pixels)
pub const DEFAULT_SCREEN_HEIGHT: u32 = 800;
