//! Gamepad input
//!
//! Reads the Linux joystick interface (/dev/input/jsN) non-blocking.
//! Each record is an 8-byte `js_event`:
//!
//! ```text
//! u32 time (ms) | i16 value | u8 type | u8 number
//! ```
//!
//! Only button records are reported. Of the synthetic initial-state
//! records the kernel sends on open, only held buttons are reported; a
//! button that is merely up was never released.

use log::{debug, info, trace};
use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use std::os::fd::RawFd;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::keycodes::{JS_EVENT_AXIS, JS_EVENT_BUTTON, JS_EVENT_INIT, JS_EVENT_SIZE};

/// Physical source failures
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: nix::errno::Errno,
    },
    #[error("{path} disappeared")]
    Gone { path: PathBuf },
    #[error("read from {path} failed: {source}")]
    Read {
        path: PathBuf,
        source: nix::errno::Errno,
    },
}

/// Gamepad button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub index: u32,
    pub pressed: bool,
}

/// Decode one `js_event` record. Non-button records and initial-state
/// records of released buttons yield None.
pub fn decode_js_event(record: &[u8; JS_EVENT_SIZE]) -> Option<ButtonEvent> {
    let value = i16::from_ne_bytes([record[4], record[5]]);
    let init = record[6] & JS_EVENT_INIT != 0;
    let kind = record[6] & !JS_EVENT_INIT;
    let number = record[7];
    match kind {
        JS_EVENT_BUTTON if init && value == 0 => None,
        JS_EVENT_BUTTON => Some(ButtonEvent {
            index: number as u32,
            pressed: value != 0,
        }),
        JS_EVENT_AXIS => None,
        _ => None,
    }
}

pub struct Joystick {
    fd: RawFd,
    path: PathBuf,
    /// Partial record carried over between reads
    pending: Vec<u8>,
}

impl Joystick {
    pub fn open(path: &Path) -> Result<Self, DeviceError> {
        let fd = open(path, OFlag::O_RDONLY | OFlag::O_NONBLOCK, Mode::empty()).map_err(
            |source| DeviceError::Open {
                path: path.to_path_buf(),
                source,
            },
        )?;
        info!("Joystick opened: {}", path.display());
        Ok(Self {
            fd,
            path: path.to_path_buf(),
            pending: Vec::with_capacity(JS_EVENT_SIZE),
        })
    }

    /// Drain pending button transitions
    pub fn poll(&mut self) -> Result<Vec<ButtonEvent>, DeviceError> {
        let mut buf = [0u8; JS_EVENT_SIZE * 32];
        let mut events = Vec::new();

        loop {
            let n = match nix::unistd::read(self.fd, &mut buf) {
                Ok(0) => {
                    return Err(DeviceError::Gone {
                        path: self.path.clone(),
                    })
                }
                Ok(n) => n,
                Err(nix::errno::Errno::EAGAIN) => break,
                Err(nix::errno::Errno::ENODEV) => {
                    return Err(DeviceError::Gone {
                        path: self.path.clone(),
                    })
                }
                Err(source) => {
                    return Err(DeviceError::Read {
                        path: self.path.clone(),
                        source,
                    })
                }
            };
            self.pending.extend_from_slice(&buf[..n]);
            events.extend(self.take_records());
        }

        Ok(events)
    }

    fn take_records(&mut self) -> Vec<ButtonEvent> {
        let whole = self.pending.len() / JS_EVENT_SIZE * JS_EVENT_SIZE;
        let mut events = Vec::new();
        for chunk in self.pending[..whole].chunks_exact(JS_EVENT_SIZE) {
            let mut record = [0u8; JS_EVENT_SIZE];
            record.copy_from_slice(chunk);
            if let Some(event) = decode_js_event(&record) {
                trace!("js button {} pressed={}", event.index, event.pressed);
                events.push(event);
            }
        }
        self.pending.drain(..whole);
        events
    }
}

impl Drop for Joystick {
    fn drop(&mut self) {
        let _ = nix::unistd::close(self.fd);
        debug!("Joystick closed: {}", self.path.display());
    }
}
