//! Audio sink: device, staging buffer, and queue hysteresis

use crate::audio::{
    convert_samples, AudioBuffer, AudioDevice, AudioDriver, AudioSpec, AudioSpecDesired,
    DrainOutcome, Hysteresis, Thresholds,
};
use crate::error::{HostError, Result};
use crate::hooks::HostHooks;
use tracing::{info, trace};

/// Owns the output device and moves emulator audio into it
pub struct AudioSink<D: AudioDevice> {
    device: D,
    spec: AudioSpec,
    staging: Box<[u8]>,
    hysteresis: Hysteresis,
}

impl<D: AudioDevice> AudioSink<D> {
    /// Open a device through `driver` and allocate the staging buffer
    pub fn open<A>(driver: &mut A, wanted: &AudioSpecDesired, thresholds: Thresholds) -> Result<Self>
    where
        A: AudioDriver<Device = D>,
    {
        let device = driver.open(wanted)?;
        Self::with_device(device, thresholds)
    }

    /// Wrap an already opened device
    pub fn with_device(mut device: D, thresholds: Thresholds) -> Result<Self> {
        let spec = *device.spec();
        if spec.buffer_size == 0 || spec.buffer_frames() == 0 {
            return Err(HostError::UnsupportedFormat(format!(
                "device buffer too small: {}",
                spec
            )));
        }

        let hysteresis = Hysteresis::new(thresholds, spec.buffer_size)?;
        let staging = vec![0u8; spec.buffer_size as usize].into_boxed_slice();

        // Devices open paused; make sure of it so the ready flag matches.
        device.set_paused(true);

        info!("Audio sink ready: {}", spec);

        Ok(Self {
            device,
            spec,
            staging,
            hysteresis,
        })
    }

    /// Negotiated audio parameters
    pub fn spec(&self) -> &AudioSpec {
        &self.spec
    }

    /// Whether the device is playing
    pub fn is_ready(&self) -> bool {
        self.hysteresis.is_ready()
    }

    /// Bytes waiting in the device queue
    pub fn queued_bytes(&self) -> u32 {
        self.device.queued_bytes()
    }

    /// Queue thresholds in bytes as `(start, max)`
    pub fn thresholds(&self) -> (u32, u32) {
        (self.hysteresis.start_bytes(), self.hysteresis.max_bytes())
    }

    /// Underlying device
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Convert one emulator buffer and offer it to the device queue
    pub fn render<H>(&mut self, buffer: AudioBuffer<'_>, hooks: &mut H) -> DrainOutcome
    where
        H: HostHooks + ?Sized,
    {
        let frames = convert_samples(buffer, &mut self.staging);
        if frames < buffer.frames {
            trace!(
                "Audio buffer truncated: {} of {} frames fit",
                frames,
                buffer.frames
            );
        }

        let len = frames * self.spec.frame_size();
        self.hysteresis
            .drain(&mut self.device, &self.staging[..len], hooks)
    }

    /// Stop playback and flush the device queue
    pub fn reset(&mut self) {
        self.hysteresis.reset(&mut self.device);
    }
}
