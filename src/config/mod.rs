//! Configuration file management
//!
//! Loads TOML configuration files and provides application settings,
//! including the declarative virtual button layout.
//! Default config path: ~/.config/emukeys/config.toml

#![allow(dead_code)]

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::constants::{
    DEFAULT_ENGINE_READY_DELAY_MS, DEFAULT_KEY_REPEAT_DELAY_MS, DEFAULT_KEY_REPEAT_RATE_MS,
    DEFAULT_SCREEN_HEIGHT, DEFAULT_SCREEN_WIDTH, MIN_REPEAT_RATE_MS,
};

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Screen settings (pointer coordinate space)
    pub screen: ScreenConfig,
    /// Keyboard settings
    pub keyboard: KeyboardInputConfig,
    /// Keybind settings
    pub keybinds: KeybindConfig,
    /// Engine settings
    pub engine: EngineConfig,
    /// Gamepad settings
    pub joystick: JoystickConfig,
    /// Virtual buttons
    pub buttons: Vec<ButtonConfig>,
}

/// Screen settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Width in pixels (mouse coordinate clamping, touch transform)
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Keyboard input settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardInputConfig {
    /// XKB keyboard model (empty = default)
    pub xkb_model: String,
    /// XKB keyboard layout (e.g., "us", "de", empty = default)
    pub xkb_layout: String,
    /// XKB keyboard variant (empty = default)
    pub xkb_variant: String,
    /// XKB keyboard options (e.g., "ctrl:nocaps", empty = default)
    pub xkb_options: String,
    /// Held key repeat delay in milliseconds (evdev only, default: 400)
    pub repeat_delay: u64,
    /// Held key repeat interval in milliseconds (evdev only, default: 30)
    pub repeat_rate: u64,
}

impl Default for KeyboardInputConfig {
    fn default() -> Self {
        Self {
            xkb_model: String::new(),
            xkb_layout: String::new(),
            xkb_variant: String::new(),
            xkb_options: String::new(),
            repeat_delay: DEFAULT_KEY_REPEAT_DELAY_MS,
            repeat_rate: DEFAULT_KEY_REPEAT_RATE_MS,
        }
    }
}

/// Keybind settings
/// Each keybind can be a single key ("ctrl+alt+q") or multiple keys (["ctrl+alt+q", "alt+q"])
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindConfig {
    /// Quit the front-end (default: "ctrl+alt+q", "alt+q")
    #[serde(deserialize_with = "deserialize_keybind")]
    pub quit: Vec<String>,
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Simulated load time of the tracing engine (ms)
    pub ready_delay_ms: u64,
}

/// Gamepad settings (Linux joystick interface)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JoystickConfig {
    /// Poll a joystick device
    pub enabled: bool,
    /// Device path
    pub device: String,
}

/// Virtual button kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonKind {
    /// Sends a key, optionally with repeat
    Key,
    /// Sets emulation speed
    Speed,
    /// Loads the saved game
    LoadGame,
    /// Saves the game
    SaveGame,
    /// Opens the save file picker
    LoadSaveFile,
    /// Selects a palette
    Palette,
}

/// Loosely typed attribute value (number or string)
///
/// Attributes come from hand-written config, so "400", 400 and "0x190"
/// are all accepted. Anything unparseable is treated as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Why an attribute was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttrError {
    #[error("{attr}: expected an integer, got {value:?}")]
    NotInteger { attr: &'static str, value: String },
    #[error("{attr}: expected a number, got {value:?}")]
    NotNumber { attr: &'static str, value: String },
    #[error("{attr}: {value} is out of range")]
    OutOfRange { attr: &'static str, value: i64 },
}

/// Virtual button declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonConfig {
    /// Display name (also used in logs)
    pub name: String,
    /// Button behaviour
    pub kind: ButtonKind,
    /// Sibling group: selecting one button deactivates the others
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Hit rectangle [x, y, width, height] in screen pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<[f64; 4]>,
    /// Gamepad button index (negative = unbound)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gamepad: Option<AttrValue>,
    /// Character: single character, decimal or 0x-hex code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ascii: Option<AttrValue>,
    /// Scancode: decimal or 0x-hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scancode: Option<AttrValue>,
    /// Repeat delay in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdelay: Option<AttrValue>,
    /// Repeat rate in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rrate: Option<AttrValue>,
    /// Speed multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<AttrValue>,
    /// Palette name ("hgr" or "cga")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<String>,
    /// Color tile image source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

/// Keybind deserializer: accepts string or array
fn deserialize_keybind<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeybindVisitor;

    impl<'de> Visitor<'de> for KeybindVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeybindVisitor)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screen: ScreenConfig::default(),
            keyboard: KeyboardInputConfig::default(),
            keybinds: KeybindConfig::default(),
            engine: EngineConfig::default(),
            joystick: JoystickConfig::default(),
            buttons: ButtonConfig::default_layout(),
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SCREEN_WIDTH,
            height: DEFAULT_SCREEN_HEIGHT,
        }
    }
}

impl Default for KeybindConfig {
    fn default() -> Self {
        Self {
            quit: vec!["ctrl+alt+q".to_string(), "alt+q".to_string()],
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ready_delay_ms: DEFAULT_ENGINE_READY_DELAY_MS,
        }
    }
}

impl Default for JoystickConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device: "/dev/input/js0".to_string(),
        }
    }
}

// ============================================================================
// Attribute parsing
// ============================================================================

/// Parse an integer attribute: optional sign, decimal or 0x-hex
pub fn parse_int_attr(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.starts_with(['-', '+']) {
        return None;
    }
    let value = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

impl AttrValue {
    fn describe(&self) -> String {
        match self {
            AttrValue::Int(v) => v.to_string(),
            AttrValue::Float(v) => v.to_string(),
            AttrValue::Text(s) => s.clone(),
        }
    }

    /// Integer view
    pub fn as_int(&self, attr: &'static str) -> Result<i64, AttrError> {
        let parsed = match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            AttrValue::Float(_) => None,
            AttrValue::Text(s) => parse_int_attr(s),
        };
        parsed.ok_or_else(|| AttrError::NotInteger {
            attr,
            value: self.describe(),
        })
    }

    /// Floating point view
    pub fn as_float(&self, attr: &'static str) -> Result<f64, AttrError> {
        let parsed = match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v),
            AttrValue::Text(s) => s.trim().parse::<f64>().ok(),
        };
        parsed
            .filter(|v| v.is_finite())
            .ok_or_else(|| AttrError::NotNumber {
                attr,
                value: self.describe(),
            })
    }

    /// Character code view: a single character stands for itself
    pub fn as_char_code(&self, attr: &'static str) -> Result<u32, AttrError> {
        if let AttrValue::Text(s) = self {
            let mut chars = s.chars();
            if let (Some(ch), None) = (chars.next(), chars.next()) {
                return Ok(ch as u32);
            }
        }
        let value = self.as_int(attr)?;
        u32::try_from(value).map_err(|_| AttrError::OutOfRange { attr, value })
    }
}

/// Log a rejected attribute and treat it as absent
fn lenient<T>(button: &str, result: Result<T, AttrError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("Button '{}': ignoring attribute ({})", button, e);
            None
        }
    }
}

impl ButtonConfig {
    /// Plain declaration with no optional attributes
    pub fn new(name: &str, kind: ButtonKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            group: None,
            rect: None,
            gamepad: None,
            ascii: None,
            scancode: None,
            rdelay: None,
            rrate: None,
            speed: None,
            palette: None,
            src: None,
        }
    }

    /// Gamepad button index, None when unbound or negative
    pub fn gamepad_index(&self) -> Option<u32> {
        let value = lenient(&self.name, self.gamepad.as_ref()?.as_int("gamepad"))?;
        u32::try_from(value).ok()
    }

    /// Character code sent by a key button (absent = 0)
    pub fn ascii_code(&self) -> u32 {
        self.ascii
            .as_ref()
            .and_then(|v| lenient(&self.name, v.as_char_code("ascii")))
            .unwrap_or(0)
    }

    /// Scancode sent by a key button (absent = 0)
    pub fn scancode_value(&self) -> u8 {
        self.scancode
            .as_ref()
            .and_then(|v| {
                let result = v.as_int("scancode").and_then(|value| {
                    u8::try_from(value).map_err(|_| AttrError::OutOfRange {
                        attr: "scancode",
                        value,
                    })
                });
                lenient(&self.name, result)
            })
            .unwrap_or(0)
    }

    /// Repeat timing (delay, rate) in ms; None unless both are valid
    pub fn repeat_timing(&self) -> Option<(u64, u64)> {
        let delay = self.millis(self.rdelay.as_ref()?, "rdelay")?;
        let rate = self.millis(self.rrate.as_ref()?, "rrate")?;
        Some((delay, rate.max(MIN_REPEAT_RATE_MS)))
    }

    fn millis(&self, value: &AttrValue, attr: &'static str) -> Option<u64> {
        let result = value.as_int(attr).and_then(|ms| {
            u64::try_from(ms).map_err(|_| AttrError::OutOfRange { attr, value: ms })
        });
        lenient(&self.name, result)
    }

    /// Speed multiplier
    pub fn speed_multiplier(&self) -> Option<f32> {
        let value = lenient(&self.name, self.speed.as_ref()?.as_float("speed"))?;
        Some(value as f32)
    }

    fn key(name: &str, ascii: AttrValue, scancode: i64, gamepad: i64, rect: [f64; 4]) -> Self {
        let mut button = Self::placed(name, ButtonKind::Key, rect);
        button.ascii = Some(ascii);
        button.scancode = Some(AttrValue::Int(scancode));
        button.gamepad = Some(AttrValue::Int(gamepad));
        button
    }

    fn arrow(name: &str, scancode: i64, gamepad: i64, rect: [f64; 4]) -> Self {
        let mut button = Self::key(name, AttrValue::Text("0x00".to_string()), scancode, gamepad, rect);
        button.rdelay = Some(AttrValue::Int(400));
        button.rrate = Some(AttrValue::Int(100));
        button
    }

    fn placed(name: &str, kind: ButtonKind, rect: [f64; 4]) -> Self {
        let mut button = Self::new(name, kind);
        button.rect = Some(rect);
        button
    }

    fn grouped(name: &str, kind: ButtonKind, group: &str, rect: [f64; 4]) -> Self {
        let mut button = Self::placed(name, kind, rect);
        button.group = Some(group.to_string());
        button
    }

    /// Built-in layout: a control strip along the bottom of the screen.
    /// Gamepad indices follow the standard gamepad mapping.
    pub fn default_layout() -> Vec<Self> {
        let y = (DEFAULT_SCREEN_HEIGHT - 64) as f64;
        let cell = |col: u32| [col as f64 * 72.0 + 8.0, y, 64.0, 56.0];

        let mut speed_slow = Self::grouped("slow", ButtonKind::Speed, "speed", cell(8));
        speed_slow.speed = Some(AttrValue::Float(0.5));
        let mut speed_normal = Self::grouped("normal", ButtonKind::Speed, "speed", cell(9));
        speed_normal.speed = Some(AttrValue::Float(1.0));
        let mut speed_fast = Self::grouped("fast", ButtonKind::Speed, "speed", cell(10));
        speed_fast.speed = Some(AttrValue::Float(2.0));

        let mut palette_hgr = Self::grouped("hgr", ButtonKind::Palette, "palette", cell(14));
        palette_hgr.palette = Some("hgr".to_string());
        let mut palette_cga = Self::grouped("cga", ButtonKind::Palette, "palette", cell(15));
        palette_cga.palette = Some("cga".to_string());

        vec![
            Self::arrow("up", 0x48, 12, cell(0)),
            Self::arrow("down", 0x50, 13, cell(1)),
            Self::arrow("left", 0x4B, 14, cell(2)),
            Self::arrow("right", 0x4D, 15, cell(3)),
            Self::key("enter", AttrValue::Text("0x0d".to_string()), 0x1C, 0, cell(4)),
            Self::key("escape", AttrValue::Text("0x1b".to_string()), 0x01, 1, cell(5)),
            Self::key("space", AttrValue::Text(" ".to_string()), 0, 2, cell(6)),
            Self::key("sound", AttrValue::Text("0x13".to_string()), 0, 3, cell(7)),
            speed_slow,
            speed_normal,
            speed_fast,
            Self::placed("save", ButtonKind::SaveGame, cell(11)),
            Self::placed("load", ButtonKind::LoadGame, cell(12)),
            Self::placed("load-file", ButtonKind::LoadSaveFile, cell(13)),
            palette_hgr,
            palette_cga,
        ]
    }
}

impl Config {
    /// System-wide config path
    const SYSTEM_CONFIG_PATH: &'static str = "/etc/emukeys/config.toml";

    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. EMUKEYS_CONFIG environment variable
        if let Ok(path) = std::env::var("EMUKEYS_CONFIG") {
            let p = std::path::Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
        }

        // 2. User config: ~/.config/emukeys/config.toml
        if let Some(config_path) = default_config_path() {
            if config_path.exists() {
                return Some(config_path);
            }
        }

        // 3. System config: /etc/emukeys/config.toml
        let system_config = std::path::Path::new(Self::SYSTEM_CONFIG_PATH);
        if system_config.exists() {
            return Some(system_config.to_path_buf());
        }

        None
    }

    /// Load configuration with priority:
    /// 1. EMUKEYS_CONFIG environment variable
    /// 2. ~/.config/emukeys/config.toml (user config)
    /// 3. /etc/emukeys/config.toml (system config)
    /// 4. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(path.to_string_lossy().as_ref()) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Render the default config as a commented template
    pub fn default_template() -> Result<String> {
        let body = toml::to_string_pretty(&Self::default())?;
        Ok(format!(
            r#"# emukeys configuration
#
# Location: ~/.config/emukeys/config.toml
# Override with EMUKEYS_CONFIG=/path/to/config.toml
#
# [[buttons]] attributes:
#   kind      key | speed | load_game | save_game | load_save_file | palette
#   rect      [x, y, width, height] in screen pixels (omit: gamepad only)
#   gamepad   button index, negative = unbound
#   ascii     "A", "0x1b" or 27
#   scancode  0x48 or "0x48"
#   rdelay    repeat delay (ms), needs rrate too
#   rrate     repeat interval (ms)
#   speed     multiplier for speed buttons
#   palette   "hgr" or "cga"; src = color tile image
#   group     siblings share one active button

{}"#,
            body
        ))
    }

    /// Write default config to the user config path
    pub fn write_default_config() -> Result<PathBuf> {
        let config_path = Self::get_default_config_path()?;
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        std::fs::write(&config_path, Self::default_template()?)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        Ok(config_path)
    }

    /// Get user config file path (without writing)
    pub fn get_default_config_path() -> Result<PathBuf> {
        default_config_path().ok_or_else(|| anyhow::anyhow!("Config directory not found"))
    }
}

/// Parse multiple keybindings
#[derive(Debug, Clone, Default)]
pub struct ParsedKeybinds {
    pub bindings: Vec<ParsedKeybind>,
}

impl ParsedKeybinds {
    /// Parse from string array
    pub fn parse(keys: &[String]) -> Self {
        Self {
            bindings: keys.iter().map(|s| ParsedKeybind::parse(s)).collect(),
        }
    }

    /// Check if any keybind matches
    pub fn matches(&self, ctrl: bool, shift: bool, alt: bool, key: &str) -> bool {
        self.bindings
            .iter()
            .any(|kb| kb.matches(ctrl, shift, alt, key))
    }
}

/// Parse keybind string
/// Example: "ctrl+alt+q" -> (ctrl: true, alt: true, key: "q")
#[derive(Debug, Clone, Default)]
pub struct ParsedKeybind {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub key: String,
}

impl ParsedKeybind {
    pub fn parse(s: &str) -> Self {
        let lowercase = s.to_lowercase();
        let mut result = Self::default();

        for part in lowercase.split('+') {
            match part {
                "ctrl" | "control" => result.ctrl = true,
                "shift" => result.shift = true,
                "alt" => result.alt = true,
                "esc" => result.key = "escape".to_string(),
                "return" => result.key = "enter".to_string(),
                other => result.key = other.to_string(),
            }
        }

        result
    }

    /// Check against modifiers and a key name
    /// (lowercase text of the key, or "up", "escape", "enter", ...)
    pub fn matches(&self, ctrl: bool, shift: bool, alt: bool, key: &str) -> bool {
        self.ctrl == ctrl && self.shift == shift && self.alt == alt && self.key == key
    }
}

/// Get default config file path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("emukeys").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_attr() {
        assert_eq!(parse_int_attr("400"), Some(400));
        assert_eq!(parse_int_attr(" 0x1b "), Some(27));
        assert_eq!(parse_int_attr("0X4D"), Some(0x4D));
        assert_eq!(parse_int_attr("-1"), Some(-1));
        assert_eq!(parse_int_attr("fast"), None);
        assert_eq!(parse_int_attr(""), None);
    }

    #[test]
    fn test_char_code_attr() {
        let single = AttrValue::Text("A".to_string());
        assert_eq!(single.as_char_code("ascii"), Ok(0x41));
        let hex = AttrValue::Text("0x1b".to_string());
        assert_eq!(hex.as_char_code("ascii"), Ok(0x1b));
        let number = AttrValue::Int(13);
        assert_eq!(number.as_char_code("ascii"), Ok(13));
        let bad = AttrValue::Text("esc".to_string());
        assert!(matches!(
            bad.as_char_code("ascii"),
            Err(AttrError::NotInteger { attr: "ascii", .. })
        ));
    }

    #[test]
    fn test_button_attributes_from_toml() {
        let config = Config::from_toml(
            r#"
            [[buttons]]
            name = "up"
            kind = "key"
            ascii = "0x00"
            scancode = "0x48"
            gamepad = 12
            rdelay = "400"
            rrate = 100
            rect = [0.0, 0.0, 10.0, 10.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.buttons.len(), 1);
        let up = &config.buttons[0];
        assert_eq!(up.kind, ButtonKind::Key);
        assert_eq!(up.ascii_code(), 0);
        assert_eq!(up.scancode_value(), 0x48);
        assert_eq!(up.gamepad_index(), Some(12));
        assert_eq!(up.repeat_timing(), Some((400, 100)));
    }

    #[test]
    fn test_malformed_repeat_degrades_to_momentary() {
        let mut button = ButtonConfig::new("left", ButtonKind::Key);
        button.rdelay = Some(AttrValue::Text("soon".to_string()));
        button.rrate = Some(AttrValue::Int(100));
        assert_eq!(button.repeat_timing(), None);

        // Only one of the pair
        button.rdelay = None;
        assert_eq!(button.repeat_timing(), None);

        button.rdelay = Some(AttrValue::Int(-5));
        assert_eq!(button.repeat_timing(), None);
    }

    #[test]
    fn test_negative_gamepad_is_unbound() {
        let mut button = ButtonConfig::new("save", ButtonKind::SaveGame);
        button.gamepad = Some(AttrValue::Int(-1));
        assert_eq!(button.gamepad_index(), None);
        button.gamepad = Some(AttrValue::Text("x".to_string()));
        assert_eq!(button.gamepad_index(), None);
        button.gamepad = Some(AttrValue::Text("3".to_string()));
        assert_eq!(button.gamepad_index(), Some(3));
    }

    #[test]
    fn test_out_of_range_scancode_is_zero() {
        let mut button = ButtonConfig::new("x", ButtonKind::Key);
        button.scancode = Some(AttrValue::Int(0x1ff));
        assert_eq!(button.scancode_value(), 0);
    }

    #[test]
    fn test_default_template_parses_back() {
        let template = Config::default_template().unwrap();
        let config = Config::from_toml(&template).unwrap();
        assert_eq!(config.buttons.len(), Config::default().buttons.len());
        assert_eq!(config.keybinds.quit, vec!["ctrl+alt+q", "alt+q"]);
        let speeds: Vec<f32> = config
            .buttons
            .iter()
            .filter_map(|b| b.speed_multiplier())
            .collect();
        assert_eq!(speeds, vec![0.5, 1.0, 2.0]);
        assert_eq!(config.keyboard.repeat_delay, 400);
        assert_eq!(config.keyboard.repeat_rate, 30);
    }

    #[test]
    fn test_keyboard_repeat_partial_section() {
        let config = Config::from_toml("[keyboard]\nrepeat_rate = 50\n").unwrap();
        assert_eq!(config.keyboard.repeat_delay, 400);
        assert_eq!(config.keyboard.repeat_rate, 50);
        assert!(config.keyboard.xkb_layout.is_empty());
    }

    #[test]
    fn test_parse_keybind() {
        let kb = ParsedKeybind::parse("ctrl+alt+q");
        assert!(kb.ctrl);
        assert!(kb.alt);
        assert!(!kb.shift);
        assert_eq!(kb.key, "q");

        let kbs = ParsedKeybinds::parse(&["alt+esc".to_string()]);
        assert!(kbs.matches(false, false, true, "escape"));
        assert!(!kbs.matches(true, false, true, "escape"));
    }

    #[test]
    fn test_keybind_accepts_string() {
        let config = Config::from_toml("[keybinds]\nquit = \"ctrl+q\"\n").unwrap();
        assert_eq!(config.keybinds.quit, vec!["ctrl+q"]);
    }
}
