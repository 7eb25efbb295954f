//! Sample conversion: codec-native planar samples to interleaved S16 PCM.
//!
//! Pure and allocation-local; the only numeric policy in the player. Every
//! source bit depth is scaled to 16 bits and saturated to the i16 range,
//! never wrapped, including sources whose samples carry headroom above
//! nominal full scale.

use crate::codec::DecodedFrame;

/// Scale one signed `bits_per_sample`-bit sample to 16 bits, saturating.
pub fn scale_sample(sample: i32, bits_per_sample: u32) -> i16 {
    let wide = sample as i64;
    let scaled = if bits_per_sample > 16 {
        wide >> (bits_per_sample - 16)
    } else {
        wide << (16 - bits_per_sample)
    };
    scaled.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// Convert one decoded frame to interleaved 16-bit samples.
///
/// Output layout is one value per channel per time slot, channel order
/// preserved (L,R,L,R,... for stereo), `samples * channel_count` values
/// total. Written to an S16LE device this is the little-endian byte
/// sequence the sink expects.
pub fn frame_to_s16(frame: &DecodedFrame<'_>) -> Vec<i16> {
    let mut out = Vec::with_capacity(frame.samples * frame.channels.len());
    for i in 0..frame.samples {
        for channel in frame.channels {
            out.push(scale_sample(channel[i], frame.bits_per_sample));
        }
    }
    out
}
