//! Shared playback transport state.
//!
//! One small enumerated value shared between the decode thread and the
//! input-monitor thread. Stored in an `AtomicU8` so both sides see whole
//! values without a lock; the monitor is the only writer during playback,
//! the decode pipeline only ever reads.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Playback transport states.
///
/// `Stopped` and `Quit` are terminal: once entered, no command moves the
/// transport out of them.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Playing = 0,
    Paused = 1,
    Stopped = 2,
    Quit = 3,
}

impl TransportState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => TransportState::Playing,
            1 => TransportState::Paused,
            2 => TransportState::Stopped,
            _ => TransportState::Quit,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TransportState::Stopped | TransportState::Quit)
    }
}

/// Cloneable handle to the shared transport state. Starts in `Playing`.
#[derive(Clone)]
pub struct Transport(Arc<AtomicU8>);

impl Transport {
    pub fn new() -> Self {
        Transport(Arc::new(AtomicU8::new(TransportState::Playing as u8)))
    }

    pub fn load(&self) -> TransportState {
        TransportState::from_u8(self.0.load(Ordering::Relaxed))
    }

    pub fn is_terminal(&self) -> bool {
        self.load().is_terminal()
    }

    /// `Playing -> Paused`. Returns `true` if the transition was taken.
    pub fn request_pause(&self) -> bool {
        self.swap_from(TransportState::Playing, TransportState::Paused)
    }

    /// `Paused -> Playing`. Returns `true` if the transition was taken.
    pub fn request_resume(&self) -> bool {
        self.swap_from(TransportState::Paused, TransportState::Playing)
    }

    /// `Playing | Paused -> Stopped`. No-op once terminal.
    pub fn request_stop(&self) -> bool {
        self.enter_terminal(TransportState::Stopped)
    }

    /// `Playing | Paused -> Quit`. No-op once terminal.
    pub fn request_quit(&self) -> bool {
        self.enter_terminal(TransportState::Quit)
    }

    fn swap_from(&self, expected: TransportState, next: TransportState) -> bool {
        self.0
            .compare_exchange(
                expected as u8,
                next as u8,
                Ordering::SeqCst,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    fn enter_terminal(&self, next: TransportState) -> bool {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            if TransportState::from_u8(current).is_terminal() {
                return false;
            }
            match self.0.compare_exchange(
                current,
                next as u8,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}
