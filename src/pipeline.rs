//! The decode pipeline: drives a codec binding over the in-memory
//! compressed stream, reacts to transport commands at read and frame
//! boundaries, converts decoded frames, and writes them to the sink with
//! underrun recovery.

use std::io::{self, Read};
use std::thread;
use std::time::Duration;

use bytes::Bytes;

use crate::codec::{CodecBinding, DecodedFrame, DriveOutcome, FrameFlow, FrameHost, StreamParameters};
use crate::config::PlayerConfig;
use crate::convert;
use crate::sink::{AudioSink, WriteError};
use crate::transport::{Transport, TransportState};

/// How one playback run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Decoded and played to end of stream.
    Completed,
    /// Unwound mid-stream by a stop or quit command.
    Aborted,
    /// The codec reported an unrecoverable error.
    FatalDecodeError,
}

// ======================== Read step ========================

/// Result of one request for compressed bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStep {
    /// `n` bytes were copied out.
    Data(usize),
    /// The buffer is exhausted; the codec should finish cleanly.
    EndOfStream,
    /// A terminal transport state was observed; no bytes were copied.
    Abort,
}

/// The compressed input plus the read cursor. This is the pipeline's read
/// step: every request checks the transport first, then hands out at most
/// the remaining bytes. The cursor only moves forward and never passes the
/// end of the buffer.
pub struct ChunkSource {
    data: Bytes,
    cursor: usize,
    transport: Transport,
}

impl ChunkSource {
    pub fn new(data: Bytes, transport: Transport) -> Self {
        Self {
            data,
            cursor: 0,
            transport,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Bytes handed out so far.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn next_chunk(&mut self, buf: &mut [u8]) -> ReadStep {
        if self.transport.is_terminal() {
            return ReadStep::Abort;
        }
        let remaining = self.data.len() - self.cursor;
        if remaining == 0 {
            return ReadStep::EndOfStream;
        }
        let n = buf.len().min(remaining);
        buf[..n].copy_from_slice(&self.data[self.cursor..self.cursor + n]);
        self.cursor += n;
        ReadStep::Data(n)
    }
}

/// Decoder crates pull compressed bytes through `std::io::Read`; an abort
/// surfaces as an error carrying [`AbortRequested`] so bindings can tell
/// a transport-commanded unwind from a real I/O failure.
impl Read for ChunkSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.next_chunk(buf) {
            ReadStep::Data(n) => Ok(n),
            ReadStep::EndOfStream => Ok(0),
            ReadStep::Abort => Err(abort_error()),
        }
    }
}

/// Marker payload for reads aborted by a stop/quit command.
#[derive(Debug)]
pub(crate) struct AbortRequested;

impl std::fmt::Display for AbortRequested {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("decoding aborted by transport command")
    }
}

impl std::error::Error for AbortRequested {}

pub(crate) fn abort_error() -> io::Error {
    io::Error::new(io::ErrorKind::Other, AbortRequested)
}

pub(crate) fn is_abort(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<AbortRequested>())
}

// ======================== Session ========================

/// One playback run: the compressed input, the read cursor, and the
/// configured-once latch for the sink.
pub struct PlaybackSession {
    source: ChunkSource,
    sink_configured: bool,
}

impl PlaybackSession {
    pub fn new(data: Bytes, transport: Transport) -> Self {
        Self {
            source: ChunkSource::new(data, transport),
            sink_configured: false,
        }
    }

    pub fn bytes_consumed(&self) -> usize {
        self.source.position()
    }

    pub fn sink_configured(&self) -> bool {
        self.sink_configured
    }
}

// ======================== Frame step ========================

struct PipelineHost<'a> {
    transport: Transport,
    sink: &'a mut dyn AudioSink,
    sink_configured: &'a mut bool,
    /// Whether we paused the device and have not yet un-paused it.
    device_paused: bool,
    pause_poll: Duration,
}

impl PipelineHost<'_> {
    /// Write one converted frame, looping over short writes. An underrun
    /// abandons the rest of this frame: the device is re-prepared and the
    /// next frame is written normally. Other write errors are logged and
    /// playback continues.
    fn write_frame(&mut self, pcm: &[i16], channel_count: usize) {
        let total_frames = pcm.len() / channel_count;
        let mut written = 0usize;
        while written < total_frames {
            match self.sink.write(&pcm[written * channel_count..]) {
                Ok(0) => break,
                Ok(n) => written += n,
                Err(WriteError::Underrun) => {
                    log::warn!("playback underrun, re-preparing device");
                    if let Err(e) = self.sink.prepare() {
                        log::error!("failed to recover device after underrun: {}", e);
                    }
                    break;
                }
                Err(WriteError::Device(detail)) => {
                    log::error!("device write error (continuing): {}", detail);
                    break;
                }
            }
        }
    }
}

impl FrameHost for PipelineHost<'_> {
    fn on_parameters(&mut self, params: StreamParameters) {
        if *self.sink_configured {
            log::debug!("ignoring repeated stream parameters: {:?}", params);
            return;
        }
        log::info!(
            "stream: {} Hz, {} channel(s), {} bits/sample",
            params.sample_rate,
            params.channels,
            params.bits_per_sample,
        );
        match self.sink.configure(params.sample_rate, params.channels) {
            Ok(()) => *self.sink_configured = true,
            Err(e) => {
                // Degrade instead of dying: the run continues, frames are
                // decoded but never written.
                log::error!("device configuration failed, playback will be silent: {}", e);
            }
        }
    }

    fn on_frame(&mut self, frame: DecodedFrame<'_>) -> FrameFlow {
        match self.transport.load() {
            TransportState::Stopped | TransportState::Quit => {
                self.sink.discard();
                return FrameFlow::Abort;
            }
            TransportState::Paused => {
                self.sink.set_paused(true);
                self.device_paused = true;
                loop {
                    thread::sleep(self.pause_poll);
                    match self.transport.load() {
                        TransportState::Paused => {}
                        TransportState::Stopped | TransportState::Quit => {
                            self.sink.discard();
                            return FrameFlow::Abort;
                        }
                        TransportState::Playing => break,
                    }
                }
            }
            TransportState::Playing => {}
        }

        if self.device_paused {
            self.sink.set_paused(false);
            self.device_paused = false;
        }

        if !*self.sink_configured {
            return FrameFlow::Continue;
        }
        let channel_count = frame.channels.len();
        if channel_count == 0 || frame.samples == 0 {
            return FrameFlow::Continue;
        }
        let pcm = convert::frame_to_s16(&frame);
        self.write_frame(&pcm, channel_count);
        FrameFlow::Continue
    }

    fn on_decode_error(&mut self, detail: &str, recoverable: bool) -> FrameFlow {
        if recoverable {
            log::warn!("recoverable decode error: {}", detail);
            FrameFlow::Continue
        } else {
            log::error!("decode error: {}", detail);
            FrameFlow::Abort
        }
    }
}

// ======================== Entry point ========================

/// Drive the binding to completion or abort, then tear the sink down.
/// Drain and close run exactly once, on every exit path.
pub fn run(
    session: &mut PlaybackSession,
    binding: &mut dyn CodecBinding,
    sink: &mut dyn AudioSink,
    config: &PlayerConfig,
) -> PlaybackOutcome {
    let outcome = {
        let transport = session.source.transport().clone();
        let mut host = PipelineHost {
            transport,
            sink: &mut *sink,
            sink_configured: &mut session.sink_configured,
            device_paused: false,
            pause_poll: config.pause_poll,
        };
        match binding.run(&mut session.source, &mut host) {
            Ok(DriveOutcome::Finished) => PlaybackOutcome::Completed,
            Ok(DriveOutcome::Aborted) => PlaybackOutcome::Aborted,
            Err(e) => {
                log::error!("unrecoverable decode error: {}", e);
                PlaybackOutcome::FatalDecodeError
            }
        }
    };
    sink.drain();
    sink.close();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(len: usize) -> (ChunkSource, Transport) {
        let transport = Transport::new();
        let data = Bytes::from((0..len).map(|b| b as u8).collect::<Vec<u8>>());
        (ChunkSource::new(data, transport.clone()), transport)
    }

    #[test]
    fn cursor_advances_by_min_of_requested_and_remaining() {
        let (mut src, _t) = source(10);
        let mut buf = [0u8; 4];
        assert_eq!(src.next_chunk(&mut buf), ReadStep::Data(4));
        assert_eq!(src.position(), 4);
        assert_eq!(src.next_chunk(&mut buf), ReadStep::Data(4));
        assert_eq!(src.position(), 8);
        // Only 2 bytes remain; a 4-byte request yields 2.
        assert_eq!(src.next_chunk(&mut buf), ReadStep::Data(2));
        assert_eq!(src.position(), 10);
    }

    #[test]
    fn exhausted_source_keeps_signalling_end_of_stream() {
        let (mut src, _t) = source(3);
        let mut buf = [0u8; 8];
        assert_eq!(src.next_chunk(&mut buf), ReadStep::Data(3));
        for _ in 0..3 {
            assert_eq!(src.next_chunk(&mut buf), ReadStep::EndOfStream);
            assert_eq!(src.position(), 3);
        }
    }

    #[test]
    fn terminal_transport_aborts_without_copying() {
        let (mut src, transport) = source(10);
        let mut buf = [0u8; 4];
        assert_eq!(src.next_chunk(&mut buf), ReadStep::Data(4));
        transport.request_stop();
        assert_eq!(src.next_chunk(&mut buf), ReadStep::Abort);
        assert_eq!(src.position(), 4);
    }

    #[test]
    fn read_maps_steps_onto_io_results() {
        let (mut src, transport) = source(2);
        let mut buf = [0u8; 4];
        assert_eq!(src.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[0, 1]);
        assert_eq!(src.read(&mut buf).unwrap(), 0);
        transport.request_quit();
        let err = src.read(&mut buf).unwrap_err();
        assert!(is_abort(&err));
    }

    #[test]
    fn abort_marker_is_distinguishable() {
        assert!(is_abort(&abort_error()));
        let plain = io::Error::new(io::ErrorKind::Other, "disk on fire");
        assert!(!is_abort(&plain));
    }
}
