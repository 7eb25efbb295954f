//! MP3 binding on top of minimp3.
//!
//! MPEG streams carry no up-front stream info, so parameters are reported
//! from the first decoded frame (and again if the stream changes shape
//! mid-file; the host latches the first set). minimp3 yields interleaved
//! i16 samples, which are split into the planar frame view here.

use minimp3::{Decoder as MiniMp3Decoder, Error as MiniMp3Error};

use crate::codec::{
    CodecBinding, CodecError, DecodedFrame, DriveOutcome, FrameFlow, FrameHost, StreamParameters,
};
use crate::pipeline::{ChunkSource, is_abort};

pub struct Mp3Binding {
    planar: Vec<Vec<i32>>,
}

impl Mp3Binding {
    pub fn new() -> Self {
        Mp3Binding { planar: Vec::new() }
    }
}

impl Default for Mp3Binding {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecBinding for Mp3Binding {
    fn run(
        &mut self,
        source: &mut ChunkSource,
        host: &mut dyn FrameHost,
    ) -> Result<DriveOutcome, CodecError> {
        let mut decoder = MiniMp3Decoder::new(&mut *source);
        let mut announced: Option<(i32, usize)> = None;

        loop {
            match decoder.next_frame() {
                Ok(frame) => {
                    if frame.channels == 0 || frame.data.is_empty() {
                        continue;
                    }
                    if announced != Some((frame.sample_rate, frame.channels)) {
                        host.on_parameters(StreamParameters {
                            sample_rate: frame.sample_rate as u32,
                            channels: frame.channels as u16,
                            bits_per_sample: 16,
                        });
                        announced = Some((frame.sample_rate, frame.channels));
                    }

                    let samples = frame.data.len() / frame.channels;
                    self.planar.resize_with(frame.channels, Vec::new);
                    for channel in &mut self.planar {
                        channel.clear();
                        channel.reserve(samples);
                    }
                    for (i, &sample) in frame.data.iter().enumerate() {
                        self.planar[i % frame.channels].push(sample as i32);
                    }

                    let views: Vec<&[i32]> =
                        self.planar.iter().map(|ch| ch.as_slice()).collect();
                    let decoded = DecodedFrame {
                        channels: &views[..],
                        bits_per_sample: 16,
                        samples,
                    };
                    if host.on_frame(decoded) == FrameFlow::Abort {
                        return Ok(DriveOutcome::Aborted);
                    }
                }
                Err(MiniMp3Error::Eof) => return Ok(DriveOutcome::Finished),
                Err(MiniMp3Error::Io(e)) if is_abort(&e) => return Ok(DriveOutcome::Aborted),
                Err(MiniMp3Error::Io(e)) => {
                    host.on_decode_error(&e.to_string(), false);
                    return Err(CodecError::Io(e));
                }
                Err(MiniMp3Error::InsufficientData) => {
                    // Truncated frame at a chunk boundary; the decoder can
                    // resynchronize on the next pull.
                    if host.on_decode_error("truncated frame data", true) == FrameFlow::Abort {
                        return Ok(DriveOutcome::Aborted);
                    }
                }
                Err(MiniMp3Error::SkippedData) => {
                    if host.on_decode_error("skipped non-audio bytes", true) == FrameFlow::Abort {
                        return Ok(DriveOutcome::Aborted);
                    }
                }
            }
        }
    }
}
