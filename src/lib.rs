//! miniplay - interactive command-line FLAC/MP3 player.
//!
//! One compressed file is loaded into memory and decoded frame by frame;
//! decoded samples are converted to interleaved S16LE and written to an
//! ALSA device, while a concurrent input-monitor thread maps single-key
//! commands onto a shared transport (pause / resume / stop / quit).

pub mod alsa_sink;
pub mod codec;
pub mod config;
pub mod convert;
pub mod input;
pub mod pipeline;
pub mod sink;
pub mod transport;

pub use alsa_sink::AlsaSink;
pub use config::PlayerConfig;
pub use pipeline::{PlaybackOutcome, PlaybackSession};
pub use sink::AudioSink;
pub use transport::{Transport, TransportState};
