//! Audio sink abstraction.
//!
//! The decode pipeline talks to the playback device through this trait;
//! the real implementation is ALSA (`alsa_sink`), tests drive the pipeline
//! against a recording mock.

use thiserror::Error;

/// Errors from sink configuration and recovery calls.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("device rejected configuration: {0}")]
    Config(String),
    #[error("device error: {0}")]
    Device(String),
}

/// Errors from a single write. Underrun is the one recoverable condition:
/// the caller must `prepare()` the sink before the next write.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("playback underrun")]
    Underrun,
    #[error("device write error: {0}")]
    Device(String),
}

/// One playback device handle. Exactly one sink is open per session; the
/// session tears it down with `drain()` then `close()` on every exit path.
pub trait AudioSink {
    /// Request interleaved S16LE output at the given rate and channel
    /// count. The device may negotiate a nearby rate.
    fn configure(&mut self, sample_rate: u32, channels: u16) -> Result<(), SinkError>;

    /// Blocking write of interleaved samples; returns frames accepted,
    /// which may be fewer than offered.
    fn write(&mut self, interleaved: &[i16]) -> Result<usize, WriteError>;

    /// Re-arm the device after an underrun.
    fn prepare(&mut self) -> Result<(), SinkError>;

    /// Pause or resume the device without discarding queued audio.
    fn set_paused(&mut self, paused: bool);

    /// Discard any queued audio immediately (stop/quit path).
    fn discard(&mut self);

    /// Play out whatever is queued, then stop.
    fn drain(&mut self);

    /// Release the device handle.
    fn close(&mut self);
}
