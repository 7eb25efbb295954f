//! FLAC binding on top of claxon.
//!
//! Stream parameters come from the STREAMINFO block, before any audio has
//! been decoded. claxon hands back whole blocks with planar per-channel
//! samples, which map directly onto the frame view; its sample buffer is
//! recycled across blocks.

use crate::codec::{
    CodecBinding, CodecError, DecodedFrame, DriveOutcome, FrameFlow, FrameHost, StreamParameters,
};
use crate::pipeline::{ChunkSource, is_abort};

pub struct FlacBinding;

impl FlacBinding {
    pub fn new() -> Self {
        FlacBinding
    }
}

impl Default for FlacBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecBinding for FlacBinding {
    fn run(
        &mut self,
        source: &mut ChunkSource,
        host: &mut dyn FrameHost,
    ) -> Result<DriveOutcome, CodecError> {
        let mut reader = match claxon::FlacReader::new(&mut *source) {
            Ok(reader) => reader,
            Err(claxon::Error::IoError(e)) if is_abort(&e) => return Ok(DriveOutcome::Aborted),
            Err(e) => return Err(CodecError::Stream(format!("invalid FLAC stream: {}", e))),
        };

        let info = reader.streaminfo();
        host.on_parameters(StreamParameters {
            sample_rate: info.sample_rate,
            channels: info.channels as u16,
            bits_per_sample: info.bits_per_sample,
        });

        let mut blocks = reader.blocks();
        let mut buffer = Vec::new();
        loop {
            match blocks.read_next_or_eof(buffer) {
                Ok(Some(block)) => {
                    let planar: Vec<&[i32]> =
                        (0..block.channels()).map(|ch| block.channel(ch)).collect();
                    let frame = DecodedFrame {
                        channels: &planar[..],
                        bits_per_sample: info.bits_per_sample,
                        samples: block.duration() as usize,
                    };
                    if host.on_frame(frame) == FrameFlow::Abort {
                        return Ok(DriveOutcome::Aborted);
                    }
                    drop(planar);
                    buffer = block.into_buffer();
                }
                Ok(None) => return Ok(DriveOutcome::Finished),
                Err(claxon::Error::IoError(e)) if is_abort(&e) => {
                    return Ok(DriveOutcome::Aborted);
                }
                Err(e) => {
                    // A malformed block leaves the decoder state unusable,
                    // so every claxon frame error is unrecoverable.
                    let detail = e.to_string();
                    host.on_decode_error(&detail, false);
                    return Err(CodecError::Stream(detail));
                }
            }
        }
    }
}
