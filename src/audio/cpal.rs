//! Native audio output using cpal
//!
//! The host pushes into a [`SoftwareQueue`]; the cpal stream callback pulls
//! from its consumer and converts to whatever sample type the device wants.
//!
//! Requires the "cpal" feature.

use crate::audio::{
    AudioDevice, AudioDriver, AudioSpec, AudioSpecDesired, QueueConsumer, SoftwareQueue, CHANNELS,
    SILENCE,
};
use crate::error::{HostError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SampleRate, SizedSample, Stream, StreamConfig};
use tracing::{debug, error, info, warn};

/// Opens the default cpal output device
#[derive(Debug, Default)]
pub struct CpalDriver;

impl AudioDriver for CpalDriver {
    type Device = CpalOutput;

    fn open(&mut self, wanted: &AudioSpecDesired) -> Result<CpalOutput> {
        let spec = AudioSpec::stereo_u16(wanted.sample_rate, wanted.device_samples()?)?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(HostError::NoAudioDevice)?;

        let rate = SampleRate(wanted.sample_rate);
        let supported = device
            .supported_output_configs()
            .map_err(|e| HostError::audio_device(format!("Failed to query output configs: {}", e)))?
            .find(|range| {
                range.channels() == CHANNELS as u16
                    && range.min_sample_rate() <= rate
                    && rate <= range.max_sample_rate()
            })
            .ok_or_else(|| {
                HostError::UnsupportedFormat(format!(
                    "no stereo output at {} Hz",
                    wanted.sample_rate
                ))
            })?
            .with_sample_rate(rate);

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();
        debug!("cpal output config: {:?} {:?}", config, sample_format);

        let queue = SoftwareQueue::new(spec);
        let consumer = queue.consumer();

        let stream = match sample_format {
            SampleFormat::I8 => build_stream::<i8>(&device, &config, consumer),
            SampleFormat::U8 => build_stream::<u8>(&device, &config, consumer),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, consumer),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, consumer),
            SampleFormat::I32 => build_stream::<i32>(&device, &config, consumer),
            SampleFormat::U32 => build_stream::<u32>(&device, &config, consumer),
            SampleFormat::F32 => build_stream::<f32>(&device, &config, consumer),
            SampleFormat::F64 => build_stream::<f64>(&device, &config, consumer),
            other => {
                return Err(HostError::UnsupportedFormat(format!(
                    "sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| HostError::audio_device(format!("Failed to build audio stream: {}", e)))?;

        // The stream stays paused until the queue is primed.
        stream
            .pause()
            .map_err(|e| HostError::audio_device(format!("Failed to pause audio stream: {}", e)))?;

        info!("Opened cpal output: {}", spec);

        Ok(CpalOutput {
            queue,
            stream,
        })
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    consumer: QueueConsumer,
) -> std::result::Result<Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<u16>,
{
    let mut scratch: Vec<u16> = Vec::new();
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            if scratch.len() < data.len() {
                scratch.resize(data.len(), SILENCE);
            }
            let read = consumer.read_samples(&mut scratch[..data.len()]);
            for (out, &sample) in data.iter_mut().zip(&scratch[..read]) {
                *out = T::from_sample(sample);
            }
            for out in &mut data[read..] {
                *out = T::EQUILIBRIUM;
            }
        },
        |err| error!("Audio stream error: {}", err),
        None,
    )
}

/// Audio device backed by a cpal output stream
pub struct CpalOutput {
    queue: SoftwareQueue,
    stream: Stream,
}

impl AudioDevice for CpalOutput {
    fn spec(&self) -> &AudioSpec {
        self.queue.spec()
    }

    fn queue_bytes(&mut self, data: &[u8]) {
        self.queue.queue_bytes(data)
    }

    fn queued_bytes(&self) -> u32 {
        self.queue.queued_bytes()
    }

    fn clear_queue(&mut self) {
        self.queue.clear_queue()
    }

    fn set_paused(&mut self, paused: bool) {
        self.queue.set_paused(paused);
        let result = if paused {
            self.stream.pause()
        } else {
            self.stream.play()
        };
        if let Err(e) = result {
            warn!("Failed to {} audio stream: {}", if paused { "pause" } else { "play" }, e);
        }
    }
}
