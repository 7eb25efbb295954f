//! ALSA implementation of the audio sink.

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::{Direction, ValueOr};
use anyhow::{Context, Result};

use crate::config::PlayerConfig;
use crate::sink::{AudioSink, SinkError, WriteError};

/// One ALSA playback handle. Opened unconfigured; hardware parameters are
/// applied once the stream parameters are known.
pub struct AlsaSink {
    pcm: Option<PCM>,
    device: String,
    period_size: usize,
    buffer_size: usize,
}

impl AlsaSink {
    /// Open the playback device. Failure here is fatal to the session.
    pub fn open(config: &PlayerConfig) -> Result<Self> {
        let pcm = PCM::new(&config.playback_device, Direction::Playback, false)
            .with_context(|| {
                format!(
                    "failed to open PCM device '{}' for playback",
                    config.playback_device
                )
            })?;
        Ok(Self {
            pcm: Some(pcm),
            device: config.playback_device.clone(),
            period_size: config.period_size,
            buffer_size: config.buffer_size,
        })
    }

    fn handle(&self) -> Result<&PCM, SinkError> {
        self.pcm
            .as_ref()
            .ok_or_else(|| SinkError::Device("device handle already closed".into()))
    }
}

impl AudioSink for AlsaSink {
    fn configure(&mut self, sample_rate: u32, channels: u16) -> Result<(), SinkError> {
        let pcm = self.handle()?;
        let setup = || -> alsa::Result<(u32, u32, usize, usize)> {
            {
                let hwp = HwParams::any(pcm)?;
                hwp.set_access(Access::RWInterleaved)?;
                hwp.set_format(Format::S16LE)?;
                hwp.set_channels(channels as u32)?;
                hwp.set_rate_near(sample_rate, ValueOr::Nearest)?;
                hwp.set_period_size_near(self.period_size as alsa::pcm::Frames, ValueOr::Nearest)?;
                hwp.set_buffer_size_near(self.buffer_size as alsa::pcm::Frames)?;
                pcm.hw_params(&hwp)?;
            }
            // Read back actual negotiated parameters
            let hwp = pcm.hw_params_current()?;
            Ok((
                hwp.get_rate()?,
                hwp.get_channels()?,
                hwp.get_period_size()? as usize,
                hwp.get_buffer_size()? as usize,
            ))
        };
        let (actual_rate, actual_channels, period, buffer) =
            setup().map_err(|e| SinkError::Config(e.to_string()))?;

        log::info!(
            "ALSA playback: device={}, rate={}, channels={}, period={}, buffer={}",
            self.device,
            actual_rate,
            actual_channels,
            period,
            buffer,
        );
        Ok(())
    }

    fn write(&mut self, interleaved: &[i16]) -> Result<usize, WriteError> {
        let pcm = self
            .handle()
            .map_err(|e| WriteError::Device(e.to_string()))?;
        let io = pcm
            .io_i16()
            .map_err(|e| WriteError::Device(e.to_string()))?;
        match io.writei(interleaved) {
            Ok(frames) => Ok(frames),
            Err(e) if e.errno() == libc::EPIPE => Err(WriteError::Underrun),
            Err(e) => Err(WriteError::Device(e.to_string())),
        }
    }

    fn prepare(&mut self) -> Result<(), SinkError> {
        let pcm = self.handle()?;
        pcm.prepare().map_err(|e| SinkError::Device(e.to_string()))
    }

    fn set_paused(&mut self, paused: bool) {
        if let Ok(pcm) = self.handle() {
            // Not every device supports hardware pause; worst case the
            // buffered audio plays out and the device sits idle.
            if let Err(e) = pcm.pause(paused) {
                log::debug!("device pause({}) not honoured: {}", paused, e);
            }
        }
    }

    fn discard(&mut self) {
        if let Ok(pcm) = self.handle() {
            if let Err(e) = pcm.drop() {
                log::warn!("failed to discard queued audio: {}", e);
            }
        }
    }

    fn drain(&mut self) {
        if let Ok(pcm) = self.handle() {
            if let Err(e) = pcm.drain() {
                log::debug!("drain failed: {}", e);
            }
        }
    }

    fn close(&mut self) {
        // snd_pcm_close runs on drop of the handle.
        self.pcm = None;
    }
}
