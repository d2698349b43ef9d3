//! Two-threshold queue hysteresis for audio playback
//!
//! Playback is held off until the device queue reaches the start threshold,
//! and new audio is dropped while the queue sits at or above the max
//! threshold. The gap between the two keeps the device from toggling between
//! playing and paused when the queue depth hovers near a single limit.

use crate::audio::AudioDevice;
use crate::error::{HostError, Result};
use crate::hooks::HostHooks;
use tracing::{debug, trace};

/// Queue thresholds, in multiples of the negotiated device buffer size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Playback starts once this many buffers are queued
    pub start_buffers: u32,
    /// New audio is dropped while this many buffers are queued
    pub max_buffers: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            start_buffers: 2,
            max_buffers: 5,
        }
    }
}

impl Thresholds {
    /// Check the thresholds leave a usable dead band
    pub fn validate(&self) -> Result<()> {
        if self.start_buffers == 0 {
            return Err(HostError::InvalidConfig(
                "audio start threshold must be at least one buffer".into(),
            ));
        }
        if self.max_buffers < self.start_buffers {
            return Err(HostError::InvalidConfig(format!(
                "audio max threshold ({} buffers) is below the start threshold ({} buffers)",
                self.max_buffers, self.start_buffers
            )));
        }
        Ok(())
    }
}

/// Result of one drain cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The buffer was queued
    Queued {
        /// Queue depth before the enqueue
        before: u32,
        /// Queue depth after the enqueue
        after: u32,
        /// Playback was started by this drain
        started: bool,
    },
    /// The queue was at or above the max threshold; the buffer was dropped
    Dropped {
        /// Queue depth observed
        queued: u32,
    },
}

/// Tracks whether the device is playing and decides when to enqueue or start
#[derive(Debug, Clone)]
pub struct Hysteresis {
    ready: bool,
    start_bytes: u32,
    max_bytes: u32,
}

impl Hysteresis {
    /// Create a controller for a device with `buffer_size` byte buffers
    pub fn new(thresholds: Thresholds, buffer_size: u32) -> Result<Self> {
        thresholds.validate()?;
        let start_bytes = thresholds
            .start_buffers
            .checked_mul(buffer_size)
            .ok_or_else(|| HostError::InvalidConfig("audio start threshold overflows".into()))?;
        let max_bytes = thresholds
            .max_buffers
            .checked_mul(buffer_size)
            .ok_or_else(|| HostError::InvalidConfig("audio max threshold overflows".into()))?;

        debug!(
            "Audio thresholds: start={} bytes, max={} bytes",
            start_bytes, max_bytes
        );

        Ok(Self {
            ready: false,
            start_bytes,
            max_bytes,
        })
    }

    /// Whether the device is currently playing
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Queue depth at which playback starts
    pub fn start_bytes(&self) -> u32 {
        self.start_bytes
    }

    /// Queue depth at which new audio is dropped
    pub fn max_bytes(&self) -> u32 {
        self.max_bytes
    }

    /// Push one converted buffer into the device
    ///
    /// The buffer is queued only while the queue is below the max threshold.
    /// Playback starts the first time the queue reaches the start threshold
    /// after a reset.
    pub fn drain<D, H>(&mut self, device: &mut D, staged: &[u8], hooks: &mut H) -> DrainOutcome
    where
        D: AudioDevice + ?Sized,
        H: HostHooks + ?Sized,
    {
        let before = device.queued_bytes();
        if before >= self.max_bytes {
            trace!(
                "Audio queue full ({} >= {} bytes), dropping {} bytes",
                before,
                self.max_bytes,
                staged.len()
            );
            return DrainOutcome::Dropped { queued: before };
        }

        device.queue_bytes(staged);
        let after = before.saturating_add(staged.len() as u32);
        hooks.audio_add_buffer(before, after);

        let mut started = false;
        if !self.ready && after >= self.start_bytes {
            hooks.audio_buffer_ready(after);
            self.ready = true;
            device.set_paused(false);
            started = true;
            debug!("Audio playback started with {} bytes queued", after);
        }

        DrainOutcome::Queued {
            before,
            after,
            started,
        }
    }

    /// Stop playback and flush the queue
    ///
    /// Playback resumes only after the queue is refilled to the start threshold.
    pub fn reset<D>(&mut self, device: &mut D)
    where
        D: AudioDevice + ?Sized,
    {
        self.ready = false;
        device.clear_queue();
        device.set_paused(true);
        trace!("Audio queue reset");
    }
}
