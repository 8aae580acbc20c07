//! Keyboard input
//!
//! Set console TTY stdin to raw mode and
//! read keystrokes non-blocking.
//! The kernel VT layer (or the SSH client) already turned keys into
//! characters and escape sequences; `parse_tty_bytes` turns them back
//! into `KeyInput`s.

use anyhow::{anyhow, Result};
use log::{info, trace};
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::termios::{self, Termios};
use std::os::fd::{AsRawFd, BorrowedFd};

use super::translate::{KeyCode, KeyInput, Modifiers};

/// Keyboard input management
pub struct Keyboard {
    /// stdin file descriptor
    fd: i32,
    /// Original termios settings (for restoration)
    orig_termios: Termios,
    /// Escape sequence split across reads
    pending: Vec<u8>,
}

impl Keyboard {
    /// Initialize keyboard input by setting TTY to raw mode
    pub fn new() -> Result<Self> {
        let fd = std::io::stdin().as_raw_fd();
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };

        // Save original settings
        let orig_termios =
            termios::tcgetattr(borrowed).map_err(|e| anyhow!("tcgetattr failed: {}", e))?;

        // Set to raw mode
        let mut raw = orig_termios.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(borrowed, termios::SetArg::TCSAFLUSH, &raw)
            .map_err(|e| anyhow!("tcsetattr failed: {}", e))?;

        // Set non-blocking
        let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(|e| anyhow!("F_GETFL failed: {}", e))?;
        let mut flags = OFlag::from_bits_truncate(flags);
        flags.insert(OFlag::O_NONBLOCK);
        fcntl(fd, FcntlArg::F_SETFL(flags)).map_err(|e| anyhow!("F_SETFL failed: {}", e))?;

        info!("Keyboard initialized (raw mode)");

        Ok(Self {
            fd,
            orig_termios,
            pending: Vec::new(),
        })
    }

    /// Read key input non-blocking
    ///
    /// Returns number of bytes read if data available.
    /// Returns Ok(0) if no data available.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        match nix::unistd::read(self.fd, buf) {
            Ok(n) => Ok(n),
            Err(nix::errno::Errno::EAGAIN) => Ok(0),
            Err(e) => Err(anyhow!("Keyboard read error: {}", e)),
        }
    }

    /// Read and parse whatever is pending
    ///
    /// An incomplete trailing sequence waits for the next read. If that
    /// read comes back empty it is taken as typed (a lone ESC is Escape).
    pub fn poll_keys(&mut self) -> Result<Vec<KeyInput>> {
        let mut buf = [0u8; 256];
        let n = self.read(&mut buf)?;
        self.pending.extend_from_slice(&buf[..n]);
        if self.pending.is_empty() {
            return Ok(Vec::new());
        }
        let (keys, consumed) = parse_tty_bytes(&self.pending, n == 0);
        trace!("tty {:02x?} -> {} keys", &self.pending[..consumed], keys.len());
        self.pending.drain(..consumed);
        Ok(keys)
    }
}

impl Drop for Keyboard {
    fn drop(&mut self) {
        // Restore original termios settings
        let borrowed = unsafe { BorrowedFd::borrow_raw(self.fd) };
        let _ = termios::tcsetattr(borrowed, termios::SetArg::TCSAFLUSH, &self.orig_termios);
        info!("Keyboard settings restored");
    }
}

// ============================================================================
// Byte stream parsing
// ============================================================================

const ESC: u8 = 0x1b;

/// xterm modifier parameter (1 + bits) to modifier flags
fn xterm_modifiers(param: u32) -> Modifiers {
    let bits = param.saturating_sub(1);
    let mut mods = Modifiers::empty();
    mods.set(Modifiers::SHIFT, bits & 1 != 0);
    mods.set(Modifiers::ALT, bits & 2 != 0);
    mods.set(Modifiers::CTRL, bits & 4 != 0);
    mods.set(Modifiers::META, bits & 8 != 0);
    mods
}

fn arrow_final(byte: u8) -> Option<KeyCode> {
    match byte {
        b'A' => Some(KeyCode::ArrowUp),
        b'B' => Some(KeyCode::ArrowDown),
        b'C' => Some(KeyCode::ArrowRight),
        b'D' => Some(KeyCode::ArrowLeft),
        _ => None,
    }
}

/// Parse a CSI sequence starting after "ESC [".
/// Returns the key (None when truncated) and the bytes consumed.
fn parse_csi(bytes: &[u8]) -> (Option<KeyInput>, usize) {
    // Parameter and intermediate bytes, then one final byte 0x40..=0x7e
    let Some(end) = bytes.iter().position(|b| (0x40..=0x7e).contains(b)) else {
        return (None, bytes.len());
    };
    let params = std::str::from_utf8(&bytes[..end]).unwrap_or("");
    let final_byte = bytes[end];
    let consumed = end + 1;

    let mods = params
        .split(';')
        .nth(1)
        .and_then(|p| p.parse::<u32>().ok())
        .map(xterm_modifiers)
        .unwrap_or_else(Modifiers::empty);

    // Function keys, Home/End, ... are passed on unnamed
    let code = arrow_final(final_byte).unwrap_or(KeyCode::Other);
    (Some(KeyInput::named(code, mods)), consumed)
}

/// Single control or printable byte, no escape prefix
fn control_key(byte: u8, mods: Modifiers) -> Option<KeyInput> {
    match byte {
        0x08 | 0x7f => Some(KeyInput::named(KeyCode::Backspace, mods)),
        b'\r' | b'\n' => Some(KeyInput::named(KeyCode::Enter, mods)),
        b'\t' => Some(KeyInput::named(KeyCode::Other, mods)),
        // C0 control letters: Ctrl+A .. Ctrl+Z
        0x01..=0x1a => {
            let letter = (b'a' + byte - 1) as char;
            Some(KeyInput::text(&letter.to_string(), mods | Modifiers::CTRL))
        }
        _ => None,
    }
}

/// Length of the UTF-8 sequence starting with `lead`
fn utf8_len(lead: u8) -> usize {
    match lead {
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 1,
    }
}

/// A UTF-8 lead byte whose continuation bytes have not arrived yet
fn truncated_utf8(bytes: &[u8]) -> bool {
    bytes[0] >= 0xc0 && utf8_len(bytes[0]) > bytes.len()
}

/// Parse raw TTY bytes into key presses.
///
/// Handles CSI/SS3 arrow keys (with xterm modifier parameter), lone ESC,
/// ESC-prefixed keys as Alt, DEL/BS, CR/LF, C0 control letters as
/// Ctrl+letter and UTF-8 text.
///
/// Returns the keys and the number of bytes consumed. Unless `at_end`,
/// parsing stops before an incomplete trailing sequence so a later read
/// can complete it. At the end a lone ESC is Escape, ESC O is Alt+O and
/// other truncated sequences are dropped.
pub fn parse_tty_bytes(bytes: &[u8], at_end: bool) -> (Vec<KeyInput>, usize) {
    let mut keys = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];

        if byte == ESC {
            match bytes.get(i + 1) {
                None if !at_end => break,
                None => {
                    keys.push(KeyInput::named(KeyCode::Escape, Modifiers::empty()));
                    i += 1;
                }
                Some(b'[') => {
                    let (key, consumed) = parse_csi(&bytes[i + 2..]);
                    if key.is_none() && !at_end {
                        break;
                    }
                    keys.extend(key);
                    i += 2 + consumed;
                }
                Some(b'O') => {
                    // SS3: one final byte
                    match bytes.get(i + 2) {
                        Some(&final_byte) => {
                            let code = arrow_final(final_byte).unwrap_or(KeyCode::Other);
                            keys.push(KeyInput::named(code, Modifiers::empty()));
                            i += 3;
                        }
                        None if !at_end => break,
                        None => {
                            // ESC then 'O' typed with Alt
                            keys.push(KeyInput::text("O", Modifiers::ALT));
                            i += 2;
                        }
                    }
                }
                Some(&ESC) => {
                    keys.push(KeyInput::named(KeyCode::Escape, Modifiers::empty()));
                    i += 1;
                }
                Some(_) => {
                    // Alt + key
                    if !at_end && truncated_utf8(&bytes[i + 1..]) {
                        break;
                    }
                    let (key, consumed) = plain_key(&bytes[i + 1..], Modifiers::ALT);
                    keys.extend(key);
                    i += 1 + consumed;
                }
            }
            continue;
        }

        if !at_end && truncated_utf8(&bytes[i..]) {
            break;
        }
        let (key, consumed) = plain_key(&bytes[i..], Modifiers::empty());
        keys.extend(key);
        i += consumed;
    }

    (keys, i)
}

/// One key from a control byte or a UTF-8 character. Always consumes.
fn plain_key(bytes: &[u8], mods: Modifiers) -> (Option<KeyInput>, usize) {
    let byte = bytes[0];
    if byte < 0x20 || byte == 0x7f {
        return (control_key(byte, mods), 1);
    }
    let len = utf8_len(byte).min(bytes.len());
    match std::str::from_utf8(&bytes[..len]) {
        Ok(text) => (Some(KeyInput::text(text, mods)), len),
        Err(_) => (None, 1),
    }
}
