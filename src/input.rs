//! Input monitor: raw-mode single-key transport control.
//!
//! Runs on its own thread for the lifetime of the playback run. It only
//! ever writes the shared transport state; it has no reference to the sink
//! or the compressed data. Input is polled on a short interval so the
//! thread also notices terminal states it did not cause (end of playback,
//! a command from the other key) and exits promptly.

use std::io::{self, Write};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use crate::transport::Transport;

const EVENT_POLL: Duration = Duration::from_millis(100);

/// Transport commands understood on stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,
    Stop,
    Quit,
}

/// Key-to-command mapping; anything else is ignored.
pub fn command_for_key(key: char) -> Option<Command> {
    match key {
        'p' => Some(Command::Pause),
        'r' => Some(Command::Resume),
        's' => Some(Command::Stop),
        'q' => Some(Command::Quit),
        _ => None,
    }
}

/// Apply a command to the transport. Returns the status line for an
/// accepted transition, or `None` if the command was a no-op in the
/// current state.
pub fn apply_command(transport: &Transport, command: Command) -> Option<&'static str> {
    let accepted = match command {
        Command::Pause => transport.request_pause(),
        Command::Resume => transport.request_resume(),
        Command::Stop => transport.request_stop(),
        Command::Quit => transport.request_quit(),
    };
    if !accepted {
        return None;
    }
    Some(match command {
        Command::Pause => ">> PAUSED. (press 'r' to resume)",
        Command::Resume => ">> RESUMED.",
        Command::Stop => ">> STOPPED. cleaning up...",
        Command::Quit => ">> QUIT. exiting...",
    })
}

/// Spawn the monitor thread. Join the handle after the decode pipeline has
/// returned and the transport has been marked terminal.
pub fn spawn_monitor(transport: Transport) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("input-monitor".into())
        .spawn(move || monitor(&transport))
        .context("failed to spawn input monitor thread")
}

fn monitor(transport: &Transport) {
    let raw = enable_raw_mode();
    if let Err(e) = &raw {
        // Keys still arrive line-buffered; playback itself is unaffected.
        log::warn!("could not enable raw terminal mode: {}", e);
    }

    status("--------------------------------------------------");
    status("  controls: (p)ause  (r)esume  (s)top  (q)uit");
    status("--------------------------------------------------");

    while !transport.is_terminal() {
        match event::poll(EVENT_POLL) {
            Ok(false) => continue,
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    let command = match key.code {
                        // Raw mode swallows SIGINT, so ctrl-c quits too.
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            Some(Command::Quit)
                        }
                        KeyCode::Char(c) => command_for_key(c),
                        _ => None,
                    };
                    if let Some(command) = command {
                        if let Some(line) = apply_command(transport, command) {
                            status(line);
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    log::error!("input source failed: {}", e);
                    break;
                }
            },
            Err(e) => {
                log::error!("input poll failed: {}", e);
                break;
            }
        }
    }

    if raw.is_ok() {
        if let Err(e) = disable_raw_mode() {
            log::warn!("could not restore terminal mode: {}", e);
        }
    }
}

/// Print one protocol line to stdout. Raw mode needs an explicit carriage
/// return.
fn status(line: &str) {
    let mut out = io::stdout();
    let _ = write!(out, "{}\r\n", line);
    let _ = out.flush();
}
