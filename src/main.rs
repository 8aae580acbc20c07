//! emukeys - input routing front-end for emulators on the Linux console
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              Event Loop                  │
//! ├──────────────────────────────────────────┤
//! │  evdev / TTY / joystick                  │
//! │        ↓                                 │
//! │  Frontend (translate, bind, repeat)      │
//! │        ↓                                 │
//! │  Engine (key + scancode stream)          │
//! └──────────────────────────────────────────┘
//! ```

mod config;
mod constants;
mod engine;
mod frontend;
mod input;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::constants::LOOP_IDLE_SLEEP_MS;
use crate::engine::{LogAudio, LogObserver, TraceEngine};
use crate::frontend::Frontend;
use crate::input::{EvdevInput, Joystick, KeyInput, Keyboard, Modifiers, PointerInput};

// ============================================================================
// Signal Handling
// ============================================================================

/// Global flag for graceful shutdown (set by signal handler)
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Check if shutdown was requested via signal
fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::Relaxed)
}

/// Set up signal handlers for graceful shutdown (call once at startup)
///
/// Handles SIGTERM (systemd stop), SIGINT (Ctrl+C), and SIGHUP (terminal hangup).
fn setup_signal_handlers() {
    unsafe {
        libc::signal(
            libc::SIGTERM,
            shutdown_signal_handler as *const () as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGINT,
            shutdown_signal_handler as *const () as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGHUP,
            shutdown_signal_handler as *const () as libc::sighandler_t,
        );
    }
}

extern "C" fn shutdown_signal_handler(_signo: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::Relaxed);
}

// ============================================================================
// Input Sources
// ============================================================================

/// Keyboard/pointer source
enum Source {
    /// libinput devices (DRM console)
    Evdev(EvdevInput),
    /// Raw stdin (SSH development)
    Tty(Keyboard),
}

impl Source {
    fn poll(&mut self, now: Instant) -> Result<(Vec<KeyInput>, Vec<PointerInput>)> {
        match self {
            Source::Evdev(evdev) => Ok(evdev.process_events(now)),
            Source::Tty(keyboard) => Ok((keyboard.poll_keys()?, Vec::new())),
        }
    }
}

/// Print help message
fn print_help() {
    println!(
        r#"emukeys {} - input routing front-end for emulators

USAGE:
    emukeys [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    -t, --test              Test mode (verify build and config without devices)
    --tty                   Read the keyboard from stdin instead of evdev
    --joystick=PATH         Gamepad device (default: from config)
    --init-config           Generate config file
    -f, --force             Overwrite config file without confirmation

EXAMPLES:
    emukeys                           Run on the console (needs /dev/input access)
    emukeys --tty                     Run over SSH, keyboard only
    emukeys --init-config --force     Overwrite config with defaults
    RUST_LOG=debug emukeys --tty      Show routing decisions

CONFIG FILE:
    ~/.config/emukeys/config.toml
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Ask before overwriting an existing config file
fn confirm_overwrite(path: &std::path::Path) -> Result<bool> {
    println!("Config file already exists: {}", path.display());
    print!("Overwrite? [y/N]: ");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Check command line arguments
    let args: Vec<String> = std::env::args().collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("emukeys {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    info!("emukeys starting...");

    // Config file generation mode
    if args.iter().any(|a| a == "--init-config") {
        let force = args.iter().any(|a| a == "--force" || a == "-f");
        let config_path = config::Config::get_default_config_path()?;
        if config_path.exists() && !force && !confirm_overwrite(&config_path)? {
            println!("Aborted.");
            return Ok(());
        }
        let path = config::Config::write_default_config()?;
        println!("Config file generated: {}", path.display());
        return Ok(());
    }

    let cfg = config::Config::load();
    let quit = config::ParsedKeybinds::parse(&cfg.keybinds.quit);

    let test_mode = args.iter().any(|a| a == "--test" || a == "-t");
    if test_mode {
        info!("Test mode: skipping device initialization");
        eprintln!(
            "[OK] emukeys build verification complete ({} buttons configured)",
            cfg.buttons.len()
        );
        return Ok(());
    }

    setup_signal_handlers();

    let engine = TraceEngine::new(Duration::from_millis(cfg.engine.ready_delay_ms));
    let mut frontend = Frontend::from_config(
        &cfg,
        Box::new(engine),
        Box::new(LogObserver),
        Box::new(LogAudio::default()),
    );

    let use_tty = args.iter().any(|a| a == "--tty");
    let mut source = if use_tty {
        Source::Tty(Keyboard::new().context("Failed to put stdin in raw mode")?)
    } else {
        let evdev = EvdevInput::new(cfg.screen.width, cfg.screen.height, &cfg.keyboard)
            .context("Failed to open evdev devices (try --tty)")?;
        Source::Evdev(evdev)
    };

    // --joystick=PATH overrides config
    let joystick_path = args
        .iter()
        .find_map(|a| a.strip_prefix("--joystick="))
        .map(PathBuf::from)
        .or_else(|| cfg.joystick.enabled.then(|| PathBuf::from(&cfg.joystick.device)));
    let mut joystick = joystick_path.and_then(|path| match Joystick::open(&path) {
        Ok(js) => Some(js),
        Err(e) => {
            warn!("Gamepad disabled: {}", e);
            None
        }
    });

    info!("Entering main loop (quit: {:?})", cfg.keybinds.quit);

    'main: loop {
        if shutdown_requested() {
            info!("Shutdown signal received, exiting");
            break;
        }

        // Physical sources first, then timers
        let now = Instant::now();
        let (keys, pointer) = source.poll(now)?;
        for key in &keys {
            let ctrl = key.mods.contains(Modifiers::CTRL);
            let shift = key.mods.contains(Modifiers::SHIFT);
            let alt = key.mods.contains(Modifiers::ALT);
            if quit.matches(ctrl, shift, alt, &key.name()) {
                info!("Quit keybind pressed");
                break 'main;
            }
            frontend.handle_key(key);
        }
        for event in pointer {
            frontend.handle_pointer(event, now);
        }

        if let Some(js) = joystick.as_mut() {
            match js.poll() {
                Ok(buttons) => {
                    for b in buttons {
                        frontend.update_mapped_gamepad_button(b.pressed, b.index, now);
                    }
                }
                Err(e) => {
                    warn!("Gamepad lost: {}", e);
                    joystick = None;
                }
            }
        }

        frontend.tick(Instant::now());

        // Sleep until the next repeat is due, at most one idle interval
        let idle = Duration::from_millis(LOOP_IDLE_SLEEP_MS);
        let sleep = frontend
            .next_deadline()
            .map(|due| due.saturating_duration_since(Instant::now()).min(idle))
            .unwrap_or(idle);
        std::thread::sleep(sleep);
    }

    debug!("Main loop finished");
    Ok(())
}
