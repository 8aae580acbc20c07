//! Dispatch sink
//!
//! Last stop before the engine. Key delivery is gated on engine
//! readiness; the menu observer and audio activation are not.
//! Dropping a key during engine start-up is expected and not reported.

use log::{debug, trace};
use std::rc::Rc;

use super::coordinator::InputCoordinator;
use super::translate::KeyEvent;
use crate::engine::{Engine, EngineCommand, KeyObserver};

pub struct DispatchSink {
    engine: Box<dyn Engine>,
    observer: Box<dyn KeyObserver>,
    coordinator: Rc<InputCoordinator>,
    /// Commands waiting for the engine to become ready
    deferred: Vec<EngineCommand>,
}

impl DispatchSink {
    pub fn new(
        engine: Box<dyn Engine>,
        observer: Box<dyn KeyObserver>,
        coordinator: Rc<InputCoordinator>,
    ) -> Self {
        Self {
            engine,
            observer,
            coordinator,
            deferred: Vec::new(),
        }
    }

    pub fn is_engine_ready(&self) -> bool {
        self.engine.is_ready()
    }

    /// Deliver one key
    pub fn deliver(&mut self, key: KeyEvent) {
        if self.engine.is_ready() {
            trace!("deliver 0x{:02x}/0x{:02x}", key.code, key.scancode);
            self.engine.press_key(key.code, key.scancode);
            self.engine.auto_persist();
        } else {
            debug!("engine not ready, key 0x{:02x} dropped", key.code);
        }
        self.observer.on_key_translated(key.code, key.scancode);
        self.coordinator.ensure_audio_active();
    }

    /// Run a command now if the engine is ready, otherwise drop it.
    /// Returns true if it ran.
    pub fn run(&mut self, command: EngineCommand) -> bool {
        if self.engine.is_ready() {
            command.apply(self.engine.as_mut());
            true
        } else {
            debug!("engine not ready, {:?} dropped", command);
            false
        }
    }

    /// Run a command now, or as soon as the engine becomes ready
    pub fn when_ready(&mut self, command: EngineCommand) {
        if self.engine.is_ready() && self.deferred.is_empty() {
            command.apply(self.engine.as_mut());
        } else {
            debug!("deferring {:?} until engine is ready", command);
            self.deferred.push(command);
        }
    }

    /// Apply deferred commands in order once the engine is ready.
    /// Returns the number applied.
    pub fn flush_deferred(&mut self) -> usize {
        if self.deferred.is_empty() || !self.engine.is_ready() {
            return 0;
        }
        let pending = std::mem::take(&mut self.deferred);
        for command in &pending {
            command.apply(self.engine.as_mut());
        }
        debug!("applied {} deferred engine commands", pending.len());
        pending.len()
    }

    #[cfg(test)]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{Call, FakeAudio, FakeEngine, FakeObserver, Recorder};

    fn sink(rec: &Rc<Recorder>) -> DispatchSink {
        let coord = Rc::new(InputCoordinator::new(Box::new(FakeAudio(rec.clone()))));
        DispatchSink::new(
            Box::new(FakeEngine(rec.clone())),
            Box::new(FakeObserver(rec.clone())),
            coord,
        )
    }

    #[test]
    fn test_deliver_ready() {
        let rec = Recorder::new(true);
        let mut sink = sink(&rec);
        sink.deliver(KeyEvent::new(0x1B, 0x01));
        assert_eq!(
            rec.calls(),
            vec![
                Call::Key(0x1B, 0x01),
                Call::Persist,
                Call::Observed(0x1B, 0x01),
                Call::Audio,
            ]
        );
    }

    #[test]
    fn test_deliver_unready_still_observed() {
        let rec = Recorder::new(false);
        let mut sink = sink(&rec);
        sink.deliver(KeyEvent::new(0x41, 0));
        assert_eq!(rec.calls(), vec![Call::Observed(0x41, 0), Call::Audio]);
    }

    #[test]
    fn test_run_is_gated() {
        let rec = Recorder::new(false);
        let mut sink = sink(&rec);
        assert!(!sink.run(EngineCommand::SaveGame));
        rec.ready.set(true);
        assert!(sink.run(EngineCommand::SaveGame));
        assert_eq!(rec.calls(), vec![Call::Command(EngineCommand::SaveGame)]);
    }

    #[test]
    fn test_deferred_commands_keep_order() {
        let rec = Recorder::new(false);
        let mut sink = sink(&rec);
        sink.when_ready(EngineCommand::PaletteCga);
        sink.when_ready(EngineCommand::ColorTiles("tiles.png".to_string()));
        assert_eq!(sink.flush_deferred(), 0);
        assert!(rec.calls().is_empty());

        rec.ready.set(true);
        // Queued commands stay ahead of new ones
        sink.when_ready(EngineCommand::PaletteHgr);
        assert_eq!(sink.flush_deferred(), 3);
        assert_eq!(
            rec.calls(),
            vec![
                Call::Command(EngineCommand::PaletteCga),
                Call::Command(EngineCommand::ColorTiles("tiles.png".to_string())),
                Call::Command(EngineCommand::PaletteHgr),
            ]
        );
        assert_eq!(sink.deferred_len(), 0);
    }
}
