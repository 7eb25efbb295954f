//! Player tunables.

use std::time::Duration;

/// Playback configuration.
///
/// These are tuning parameters, not correctness contracts: the device may
/// negotiate nearby values for rate, period, and buffer, and the pause poll
/// bounds command latency while paused without promising precision.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// ALSA playback device name (e.g. "default", "plughw:0,0")
    pub playback_device: String,
    /// Desired period size in frames
    pub period_size: usize,
    /// Desired device buffer size in frames
    pub buffer_size: usize,
    /// How often the pipeline re-checks the transport while paused
    pub pause_poll: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            playback_device: "default".to_string(),
            period_size: 512,
            buffer_size: 2048,
            pause_poll: Duration::from_millis(100),
        }
    }
}
