//! Host notification hooks
//!
//! Every method defaults to a no-op, so implementors only override what they
//! care about. Hooks observe; they never change control flow.

use tracing::{info, trace};

/// Observer for host events
pub trait HostHooks {
    /// A converted buffer was queued, growing the queue from `before` to `after` bytes
    fn audio_add_buffer(&mut self, _before: u32, _after: u32) {}

    /// The queue reached the start threshold and playback resumed
    fn audio_buffer_ready(&mut self, _queued: u32) {}

    /// The user asked to save emulator state
    fn write_state(&mut self) {}

    /// The user asked to load emulator state
    fn read_state(&mut self) {}
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl HostHooks for NoHooks {}

/// Hooks that log every notification
#[derive(Debug, Default, Clone)]
pub struct TracingHooks {
    /// Buffers queued so far
    pub buffers_added: u64,
    /// Times playback was (re)started
    pub ready_count: u64,
}

impl HostHooks for TracingHooks {
    fn audio_add_buffer(&mut self, before: u32, after: u32) {
        self.buffers_added += 1;
        trace!("Audio buffer added: {} -> {} bytes", before, after);
    }

    fn audio_buffer_ready(&mut self, queued: u32) {
        self.ready_count += 1;
        info!("Audio buffer ready with {} bytes queued", queued);
    }

    fn write_state(&mut self) {
        info!("Save state requested");
    }

    fn read_state(&mut self) {
        info!("Load state requested");
    }
}

impl<H: HostHooks + ?Sized> HostHooks for &mut H {
    fn audio_add_buffer(&mut self, before: u32, after: u32) {
        (**self).audio_add_buffer(before, after)
    }

    fn audio_buffer_ready(&mut self, queued: u32) {
        (**self).audio_buffer_ready(queued)
    }

    fn write_state(&mut self) {
        (**self).write_state()
    }

    fn read_state(&mut self) {
        (**self).read_state()
    }
}
