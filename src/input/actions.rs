//! Virtual button actions
//!
//! One `ButtonActions` implementation per button kind. Built from the
//! `[[buttons]]` config entries.

use log::{debug, warn};

use super::binder::{ActionContext, ButtonActions, ElementId};
use super::repeat::{KeyRepeat, RepeatTiming};
use super::timers::Expired;
use super::translate::KeyEvent;
use crate::config::{ButtonConfig, ButtonKind};
use crate::engine::EngineCommand;

/// Sends a key, with optional repeat while held
pub struct KeyButton {
    key: KeyEvent,
    repeat: KeyRepeat,
}

impl KeyButton {
    pub fn new(key: KeyEvent, timing: Option<RepeatTiming>) -> Self {
        Self {
            key,
            repeat: KeyRepeat::new(timing),
        }
    }
}

impl ButtonActions for KeyButton {
    fn on_down(&mut self, id: ElementId, ctx: &mut ActionContext<'_>) {
        ctx.highlights.set_active(id, true);
        self.repeat.press(id, ctx.now, ctx.timers);
        ctx.sink.deliver(self.key);
    }

    fn on_up(&mut self, id: ElementId, ctx: &mut ActionContext<'_>) {
        ctx.highlights.set_active(id, false);
        self.repeat.release(ctx.timers);
    }

    fn on_timer(&mut self, expired: &Expired, ctx: &mut ActionContext<'_>) {
        if self.repeat.on_timer(expired, ctx.timers) {
            ctx.sink.deliver(self.key);
        }
    }
}

/// Selects an emulation speed
pub struct SpeedButton {
    multiplier: f32,
}

impl SpeedButton {
    pub fn new(multiplier: f32) -> Self {
        Self { multiplier }
    }
}

impl ButtonActions for SpeedButton {
    fn on_down(&mut self, id: ElementId, ctx: &mut ActionContext<'_>) {
        if !ctx.sink.is_engine_ready() {
            debug!("speed {} ignored, engine not ready", self.multiplier);
            return;
        }
        ctx.highlights.select(id);
        ctx.sink.run(EngineCommand::SetSpeed(self.multiplier));
    }
}

/// Load / save / file picker. Acts on click.
pub struct CommandButton {
    command: EngineCommand,
}

impl CommandButton {
    pub fn new(command: EngineCommand) -> Self {
        Self { command }
    }
}

impl ButtonActions for CommandButton {
    fn on_down(&mut self, id: ElementId, ctx: &mut ActionContext<'_>) {
        ctx.highlights.set_active(id, true);
    }

    fn on_up(&mut self, id: ElementId, ctx: &mut ActionContext<'_>) {
        ctx.highlights.set_active(id, false);
    }

    fn on_click(&mut self, _id: ElementId, ctx: &mut ActionContext<'_>) {
        ctx.sink.run(self.command.clone());
    }

    fn has_click(&self) -> bool {
        true
    }
}

/// Selects a palette and/or color tile image, applied once the engine is ready
pub struct PaletteButton {
    palette: Option<EngineCommand>,
    tiles: Option<String>,
}

impl PaletteButton {
    pub fn new(palette: Option<EngineCommand>, tiles: Option<String>) -> Self {
        Self { palette, tiles }
    }
}

impl ButtonActions for PaletteButton {
    fn on_down(&mut self, id: ElementId, ctx: &mut ActionContext<'_>) {
        ctx.highlights.select(id);
        if let Some(palette) = &self.palette {
            ctx.sink.when_ready(palette.clone());
        }
        if let Some(src) = &self.tiles {
            ctx.sink.when_ready(EngineCommand::ColorTiles(src.clone()));
        }
    }
}

/// Does nothing. Stands in for misconfigured buttons so indices stay stable.
pub struct InertButton;

impl ButtonActions for InertButton {
    fn on_down(&mut self, _id: ElementId, _ctx: &mut ActionContext<'_>) {}
}

/// Build the actions of a configured button
pub fn actions_for(button: &ButtonConfig) -> Box<dyn ButtonActions> {
    match button.kind {
        ButtonKind::Key => {
            let key = KeyEvent::new(button.ascii_code(), button.scancode_value());
            let timing = button
                .repeat_timing()
                .map(|(delay, rate)| RepeatTiming::from_millis(delay, rate));
            Box::new(KeyButton::new(key, timing))
        }
        ButtonKind::Speed => match button.speed_multiplier() {
            Some(multiplier) => Box::new(SpeedButton::new(multiplier)),
            None => {
                warn!("Speed button '{}' has no usable speed", button.name);
                Box::new(InertButton)
            }
        },
        ButtonKind::LoadGame => Box::new(CommandButton::new(EngineCommand::LoadGame)),
        ButtonKind::SaveGame => Box::new(CommandButton::new(EngineCommand::SaveGame)),
        ButtonKind::LoadSaveFile => {
            Box::new(CommandButton::new(EngineCommand::OpenLoadFilePicker))
        }
        ButtonKind::Palette => {
            let palette = match button.palette.as_deref().map(str::to_ascii_lowercase) {
                Some(name) if name == "hgr" => Some(EngineCommand::PaletteHgr),
                Some(name) if name == "cga" => Some(EngineCommand::PaletteCga),
                Some(name) => {
                    warn!("Palette button '{}': unknown palette {:?}", button.name, name);
                    None
                }
                None => None,
            };
            Box::new(PaletteButton::new(palette, button.src.clone()))
        }
    }
}
