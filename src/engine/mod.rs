//! Collaborator contracts
//!
//! The emulation engine, the audio context and the menu layer are opaque
//! to the input layer. They are reached only through the traits below.
//! - `Engine`: ready gate, key press primitive and UI commands
//! - `AudioOutput`: lazily activated on user gestures
//! - `KeyObserver`: secondary consumer of every translated key

pub mod trace;

pub use trace::{LogAudio, LogObserver, TraceEngine};

/// Emulation engine as seen from the input layer
pub trait Engine {
    /// Engine finished loading and accepts calls
    fn is_ready(&self) -> bool;
    /// Deliver one key (character code + scancode)
    fn press_key(&mut self, code: u32, scancode: u8);
    /// Best-effort persistence after an accepted key
    fn auto_persist(&mut self);
    fn set_speed(&mut self, multiplier: f32);
    fn load_game(&mut self);
    fn save_game(&mut self);
    fn open_load_file_picker(&mut self);
    fn set_palette_hgr(&mut self);
    fn set_palette_cga(&mut self);
    fn set_color_tiles_from_image(&mut self, uri: &str);
}

/// Audio context that platforms only unlock after a user gesture
pub trait AudioOutput {
    /// Activate output. Must be idempotent.
    fn ensure_active(&mut self);
}

/// Secondary observer (menu layer)
pub trait KeyObserver {
    fn on_key_translated(&mut self, code: u32, scancode: u8);
}

/// Engine call issued by a virtual button
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    SetSpeed(f32),
    LoadGame,
    SaveGame,
    OpenLoadFilePicker,
    PaletteHgr,
    PaletteCga,
    /// Color tiles from an image URI
    ColorTiles(String),
}

impl EngineCommand {
    /// Apply to an engine (readiness is the caller's business)
    pub fn apply(&self, engine: &mut dyn Engine) {
        match self {
            EngineCommand::SetSpeed(multiplier) => engine.set_speed(*multiplier),
            EngineCommand::LoadGame => engine.load_game(),
            EngineCommand::SaveGame => engine.save_game(),
            EngineCommand::OpenLoadFilePicker => engine.open_load_file_picker(),
            EngineCommand::PaletteHgr => engine.set_palette_hgr(),
            EngineCommand::PaletteCga => engine.set_palette_cga(),
            EngineCommand::ColorTiles(uri) => engine.set_color_tiles_from_image(uri),
        }
    }
}
