//! Audio output: sample conversion, queue hysteresis, and device backends

mod convert;
mod device;
mod hysteresis;
mod queue;
mod sink;

#[cfg(feature = "cpal")]
pub mod cpal;

pub use convert::{convert_samples, AudioBuffer};
pub use device::{AudioDevice, AudioDriver};
pub use hysteresis::{DrainOutcome, Hysteresis, Thresholds};
pub use queue::{PacedDriver, PacedQueue, QueueConsumer, QueueDriver, SoftwareQueue};
pub use sink::AudioSink;

use crate::error::{HostError, Result};

/// Output channels; the emulator produces interleaved stereo
pub const CHANNELS: u8 = 2;

/// Bytes per output sample (unsigned 16-bit, little-endian)
pub const SAMPLE_SIZE: usize = std::mem::size_of::<u16>();

/// Bytes per output frame (one sample per channel)
pub const FRAME_SIZE: usize = SAMPLE_SIZE * CHANNELS as usize;

/// Output sample value for silence
pub const SILENCE: u16 = 0x8000;

/// Audio parameters requested from a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpecDesired {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Frames per device buffer
    pub frames: u32,
}

impl AudioSpecDesired {
    /// Sample count to ask the device for
    ///
    /// Counts both channels, so the negotiated buffer holds `frames * CHANNELS`
    /// frames worth of samples. Fails when the count does not fit a `u32`.
    pub fn device_samples(&self) -> Result<u32> {
        self.frames.checked_mul(u32::from(CHANNELS)).ok_or_else(|| {
            HostError::InvalidConfig(format!(
                "{} audio frames per buffer is too large",
                self.frames
            ))
        })
    }
}

/// Audio parameters negotiated with the device, fixed once opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Channel count
    pub channels: u8,
    /// Size of one device buffer in bytes
    pub buffer_size: u32,
}

impl AudioSpec {
    /// Negotiated spec for a stereo u16 device holding `samples` frames per buffer
    ///
    /// Fails when the buffer size in bytes does not fit a `u32`.
    pub fn stereo_u16(sample_rate: u32, samples: u32) -> Result<Self> {
        let buffer_size = samples.checked_mul(FRAME_SIZE as u32).ok_or_else(|| {
            HostError::InvalidConfig(format!(
                "audio buffer of {} samples is too large",
                samples
            ))
        })?;
        Ok(Self {
            sample_rate,
            channels: CHANNELS,
            buffer_size,
        })
    }

    /// Bytes per frame
    pub fn frame_size(&self) -> usize {
        SAMPLE_SIZE * self.channels as usize
    }

    /// Number of frames one device buffer holds
    pub fn buffer_frames(&self) -> usize {
        self.buffer_size as usize / self.frame_size()
    }

    /// Bytes played per second
    pub fn bytes_per_second(&self) -> u64 {
        u64::from(self.sample_rate) * self.frame_size() as u64
    }

    /// Playback duration of `bytes` in milliseconds
    pub fn bytes_to_ms(&self, bytes: u32) -> f64 {
        bytes as f64 * 1000.0 / self.bytes_per_second() as f64
    }
}

impl std::fmt::Display for AudioSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}Hz {}ch u16, {} byte buffer",
            self.sample_rate, self.channels, self.buffer_size
        )
    }
}
