//! Queue-style audio device contract

use crate::audio::{AudioSpec, AudioSpecDesired};
use crate::error::Result;

/// An opened audio output that plays bytes pushed into its queue
///
/// The device consumes the queue on its own schedule; the host only pushes,
/// queries depth, and gates playback. None of these calls may block on the
/// consumer.
pub trait AudioDevice {
    /// Negotiated parameters
    fn spec(&self) -> &AudioSpec;

    /// Append bytes to the playback queue
    fn queue_bytes(&mut self, data: &[u8]);

    /// Bytes currently waiting to be played
    fn queued_bytes(&self) -> u32;

    /// Drop everything waiting in the queue
    fn clear_queue(&mut self);

    /// Pause or resume consumption of the queue
    fn set_paused(&mut self, paused: bool);
}

/// Opens audio devices
pub trait AudioDriver {
    type Device: AudioDevice;

    /// Open a device as close to `wanted` as the backend allows
    ///
    /// Devices start paused.
    fn open(&mut self, wanted: &AudioSpecDesired) -> Result<Self::Device>;
}
