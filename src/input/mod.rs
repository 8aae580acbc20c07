//! Input handling
//!
//! Route every physical input source into one key/scancode stream.
//! - Physical sources: evdev + xkbcommon, raw TTY stdin, Linux joystick
//! - Keyboard translation to emulator key codes
//! - Virtual buttons: event normalization, binding, key repeat
//! - Dispatch to the engine once it is ready

pub mod actions;
pub mod binder;
pub mod coordinator;
pub mod dispatch;
pub mod evdev;
pub mod joystick;
pub mod keyboard;
pub mod keycodes;
pub mod layout;
pub mod normalize;
pub mod pointer;
pub mod repeat;
pub mod timers;
pub mod translate;

pub use actions::actions_for;
pub use binder::{ButtonActions, ButtonBinder, ElementId, ElementSpec};
pub use coordinator::{Focus, InputCoordinator};
pub use dispatch::DispatchSink;
pub use evdev::EvdevInput;
pub use joystick::{DeviceError, Joystick};
pub use keyboard::Keyboard;
pub use layout::{ButtonLayout, Rect};
pub use normalize::{Disposition, NativeEvent};
pub use pointer::{PointerInput, PointerTracker, BTN_LEFT};
pub use repeat::{KeyRepeat, RepeatTiming};
pub use timers::Timers;
pub use translate::{KeyCode, KeyEvent, KeyInput, KeyboardTranslator, Modifiers, Translation};
