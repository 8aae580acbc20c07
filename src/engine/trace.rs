//! Tracing stand-ins for the engine collaborators
//!
//! Print every accepted engine call to stdout, one line per call,
//! so the routing layer can be driven from a console and observed
//! (or piped into another process).

use log::{debug, info};
use std::io::Write;
use std::time::{Duration, Instant};

use super::{AudioOutput, Engine, KeyObserver};

/// Engine that becomes ready after a simulated load time
pub struct TraceEngine {
    /// Instant the simulated load completes
    ready_at: Instant,
    /// Set once the first key was accepted
    announced: bool,
}

impl TraceEngine {
    pub fn new(ready_delay: Duration) -> Self {
        Self {
            ready_at: Instant::now() + ready_delay,
            announced: false,
        }
    }

    fn emit(&self, line: std::fmt::Arguments) {
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }
}

impl Engine for TraceEngine {
    fn is_ready(&self) -> bool {
        Instant::now() >= self.ready_at
    }

    fn press_key(&mut self, code: u32, scancode: u8) {
        if !self.announced {
            self.announced = true;
            info!("Engine ready, first key accepted");
        }
        match char::from_u32(code).filter(|c| !c.is_control()) {
            Some(ch) => self.emit(format_args!(
                "key code=0x{:02x} ({:?}) scancode=0x{:02x}",
                code, ch, scancode
            )),
            None => self.emit(format_args!(
                "key code=0x{:02x} scancode=0x{:02x}",
                code, scancode
            )),
        }
    }

    fn auto_persist(&mut self) {
        debug!("auto-persist");
    }

    fn set_speed(&mut self, multiplier: f32) {
        self.emit(format_args!("speed {}", multiplier));
    }

    fn load_game(&mut self) {
        self.emit(format_args!("load-game"));
    }

    fn save_game(&mut self) {
        self.emit(format_args!("save-game"));
    }

    fn open_load_file_picker(&mut self) {
        self.emit(format_args!("load-file-picker"));
    }

    fn set_palette_hgr(&mut self) {
        self.emit(format_args!("palette hgr"));
    }

    fn set_palette_cga(&mut self) {
        self.emit(format_args!("palette cga"));
    }

    fn set_color_tiles_from_image(&mut self, uri: &str) {
        self.emit(format_args!("color-tiles {}", uri));
    }
}

/// Audio context placeholder: logs the first activation only
#[derive(Default)]
pub struct LogAudio {
    active: bool,
}

impl AudioOutput for LogAudio {
    fn ensure_active(&mut self) {
        if !self.active {
            self.active = true;
            info!("Audio context activated");
        }
    }
}

/// Menu layer placeholder
#[derive(Default)]
pub struct LogObserver;

impl KeyObserver for LogObserver {
    fn on_key_translated(&mut self, code: u32, scancode: u8) {
        debug!("menu: key 0x{:02x} scancode 0x{:02x}", code, scancode);
    }
}
