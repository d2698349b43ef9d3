//! In-process audio queue
//!
//! `SoftwareQueue` is the producer side handed to the host as an
//! [`AudioDevice`]. A [`QueueConsumer`] shares the same storage and is driven
//! by whatever actually plays the audio: a native stream callback, a pacing
//! thread, or a test.

use crate::audio::{AudioDevice, AudioDriver, AudioSpec, AudioSpecDesired, FRAME_SIZE};
use crate::error::{HostError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

#[derive(Debug)]
struct Shared {
    queue: Mutex<VecDeque<u8>>,
    paused: AtomicBool,
    played: AtomicU64,
    underruns: AtomicU64,
}

/// Producer side of an in-process audio queue
#[derive(Debug)]
pub struct SoftwareQueue {
    spec: AudioSpec,
    shared: Arc<Shared>,
}

impl SoftwareQueue {
    /// Create a paused, empty queue for `spec`
    pub fn new(spec: AudioSpec) -> Self {
        Self {
            spec,
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::with_capacity(spec.buffer_size as usize * 4)),
                paused: AtomicBool::new(true),
                played: AtomicU64::new(0),
                underruns: AtomicU64::new(0),
            }),
        }
    }

    /// Create a consumer sharing this queue
    pub fn consumer(&self) -> QueueConsumer {
        QueueConsumer {
            shared: self.shared.clone(),
        }
    }

    /// Whether consumption is paused
    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }
}

impl AudioDevice for SoftwareQueue {
    fn spec(&self) -> &AudioSpec {
        &self.spec
    }

    fn queue_bytes(&mut self, data: &[u8]) {
        self.shared.queue.lock().extend(data.iter().copied());
    }

    fn queued_bytes(&self) -> u32 {
        self.shared.queue.lock().len() as u32
    }

    fn clear_queue(&mut self) {
        self.shared.queue.lock().clear();
    }

    fn set_paused(&mut self, paused: bool) {
        self.shared.paused.store(paused, Ordering::Release);
    }
}

/// Consumer side of an in-process audio queue
///
/// Reads whole frames only, and nothing at all while the queue is paused.
#[derive(Clone)]
pub struct QueueConsumer {
    shared: Arc<Shared>,
}

impl QueueConsumer {
    /// Whether consumption is paused
    pub fn is_paused(&self) -> bool {
        self.shared.paused.load(Ordering::Acquire)
    }

    /// Pop u16 samples into `out`
    ///
    /// Returns the number of samples written; the caller fills the rest with
    /// silence.
    pub fn read_samples(&self, out: &mut [u16]) -> usize {
        if self.is_paused() {
            return 0;
        }

        let mut queue = self.shared.queue.lock();
        let bytes = whole_frames(queue.len().min(out.len() * 2));
        let samples = bytes / 2;
        for sample in out.iter_mut().take(samples) {
            // Both pops are in range: `bytes` never exceeds the queue length.
            let lo = queue.pop_front().unwrap_or(0);
            let hi = queue.pop_front().unwrap_or(0);
            *sample = u16::from_le_bytes([lo, hi]);
        }
        drop(queue);

        self.account(bytes, out.len() * 2);
        samples
    }

    /// Drop up to `bytes` from the front of the queue as if they were played
    ///
    /// Returns the number of bytes consumed.
    pub fn consume(&self, bytes: usize) -> usize {
        if self.is_paused() {
            return 0;
        }

        let mut queue = self.shared.queue.lock();
        let taken = whole_frames(queue.len().min(bytes));
        queue.drain(..taken);
        drop(queue);

        self.account(taken, bytes);
        taken
    }

    /// Total bytes played since the queue was created
    pub fn played_bytes(&self) -> u64 {
        self.shared.played.load(Ordering::Relaxed)
    }

    /// Number of reads that found fewer bytes than requested while playing
    pub fn underruns(&self) -> u64 {
        self.shared.underruns.load(Ordering::Relaxed)
    }

    fn account(&self, taken: usize, wanted: usize) {
        self.shared
            .played
            .fetch_add(taken as u64, Ordering::Relaxed);
        if whole_frames(wanted) > taken {
            self.shared.underruns.fetch_add(1, Ordering::Relaxed);
            trace!("Audio underrun: wanted {} bytes, had {}", wanted, taken);
        }
    }
}

fn whole_frames(bytes: usize) -> usize {
    bytes - bytes % FRAME_SIZE
}

fn negotiate(wanted: &AudioSpecDesired) -> Result<AudioSpec> {
    if wanted.sample_rate == 0 || wanted.frames == 0 {
        return Err(HostError::audio_device(format!(
            "cannot open device with {} Hz and {} frames",
            wanted.sample_rate, wanted.frames
        )));
    }
    AudioSpec::stereo_u16(wanted.sample_rate, wanted.device_samples()?)
}

/// Opens bare software queues; the caller drives the consumer
#[derive(Debug, Default)]
pub struct QueueDriver;

impl AudioDriver for QueueDriver {
    type Device = SoftwareQueue;

    fn open(&mut self, wanted: &AudioSpecDesired) -> Result<SoftwareQueue> {
        let spec = negotiate(wanted)?;
        debug!("Opened software audio queue: {}", spec);
        Ok(SoftwareQueue::new(spec))
    }
}

/// Opens software queues drained in real time by a background thread
///
/// Stands in for an audio device when no native output is wanted: the queue
/// empties at the negotiated byte rate while unpaused.
#[derive(Debug, Clone)]
pub struct PacedDriver {
    tick: Duration,
}

impl Default for PacedDriver {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(5),
        }
    }
}

impl PacedDriver {
    /// Create a driver whose playback thread wakes every `tick`
    pub fn with_tick(tick: Duration) -> Self {
        Self { tick }
    }
}

impl AudioDriver for PacedDriver {
    type Device = PacedQueue;

    fn open(&mut self, wanted: &AudioSpecDesired) -> Result<PacedQueue> {
        let spec = negotiate(wanted)?;
        let queue = SoftwareQueue::new(spec);
        let consumer = queue.consumer();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_stop = stop_flag.clone();
        let tick = self.tick;

        let handle = thread::Builder::new()
            .name("emuhost-audio".into())
            .spawn(move || playback_thread(consumer, spec, tick, thread_stop))?;

        info!("Opened paced audio queue: {}", spec);

        Ok(PacedQueue {
            queue,
            stop_flag,
            handle: Some(handle),
        })
    }
}

/// Software queue with its own real-time playback thread
pub struct PacedQueue {
    queue: SoftwareQueue,
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PacedQueue {
    /// Consumer for inspecting playback counters
    pub fn consumer(&self) -> QueueConsumer {
        self.queue.consumer()
    }
}

impl AudioDevice for PacedQueue {
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
        self.queue.set_paused(paused)
    }
}

impl Drop for PacedQueue {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Playback thread function
fn playback_thread(
    consumer: QueueConsumer,
    spec: AudioSpec,
    tick: Duration,
    stop_flag: Arc<AtomicBool>,
) {
    debug!("Audio playback thread started");

    let bytes_per_second = spec.bytes_per_second() as f64;
    let mut last = Instant::now();
    let mut owed = 0.0f64;

    while !stop_flag.load(Ordering::Relaxed) {
        thread::sleep(tick);

        let now = Instant::now();
        let elapsed = now.duration_since(last).as_secs_f64();
        last = now;

        if consumer.is_paused() {
            owed = 0.0;
            continue;
        }

        owed += elapsed * bytes_per_second;
        let due = whole_frames(owed as usize);
        if due > 0 {
            consumer.consume(due);
            owed -= due as f64;
        }
    }

    debug!("Audio playback thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wanted() -> AudioSpecDesired {
        AudioSpecDesired {
            sample_rate: 48_000,
            frames: 256,
        }
    }

    #[test]
    fn test_queue_starts_paused_and_empty() {
        let queue = QueueDriver.open(&wanted()).unwrap();
        assert!(queue.is_paused());
        assert_eq!(queue.queued_bytes(), 0);
        assert_eq!(queue.spec().buffer_size, 512 * 4);
    }

    #[test]
    fn test_open_rejects_empty_spec() {
        let err = QueueDriver
            .open(&AudioSpecDesired {
                sample_rate: 0,
                frames: 256,
            })
            .unwrap_err();
        assert!(err.is_audio_setup());
    }

    #[test]
    fn test_open_rejects_oversized_buffer() {
        let err = QueueDriver
            .open(&AudioSpecDesired {
                sample_rate: 44_100,
                frames: 600_000_000,
            })
            .unwrap_err();
        assert!(matches!(err, HostError::InvalidConfig(_)));
    }

    #[test]
    fn test_consumer_reads_nothing_while_paused() {
        let mut queue = QueueDriver.open(&wanted()).unwrap();
        let consumer = queue.consumer();
        queue.queue_bytes(&[0, 0x80, 0, 0x40]);

        let mut out = [0u16; 4];
        assert_eq!(consumer.read_samples(&mut out), 0);
        assert_eq!(consumer.underruns(), 0);

        queue.set_paused(false);
        assert_eq!(consumer.read_samples(&mut out), 2);
        assert_eq!(&out[..2], &[0x8000, 0x4000]);
        assert_eq!(consumer.underruns(), 1);
        assert_eq!(consumer.played_bytes(), 4);
        assert_eq!(queue.queued_bytes(), 0);
    }

    #[test]
    fn test_consume_whole_frames_only() {
        let mut queue = QueueDriver.open(&wanted()).unwrap();
        let consumer = queue.consumer();
        queue.queue_bytes(&[0u8; 10]);
        queue.set_paused(false);

        assert_eq!(consumer.consume(7), 4);
        assert_eq!(queue.queued_bytes(), 6);
    }

    #[test]
    fn test_clear_queue() {
        let mut queue = QueueDriver.open(&wanted()).unwrap();
        queue.queue_bytes(&[1u8; 64]);
        queue.clear_queue();
        assert_eq!(queue.queued_bytes(), 0);
    }

    #[test]
    fn test_paced_queue_drains_while_playing() {
        let mut driver = PacedDriver::with_tick(Duration::from_millis(2));
        let mut device = driver.open(&wanted()).unwrap();
        let one_second = device.spec().bytes_per_second() as usize;
        device.queue_bytes(&vec![0u8; one_second]);

        thread::sleep(Duration::from_millis(30));
        assert_eq!(device.queued_bytes() as usize, one_second);

        device.set_paused(false);
        thread::sleep(Duration::from_millis(60));
        let remaining = device.queued_bytes() as usize;
        assert!(remaining < one_second, "queue did not drain");
        assert!(remaining > 0, "queue drained too fast");
        assert!(device.consumer().played_bytes() > 0);
    }
}
