//! End-to-end pacing tests: tone emulator -> host -> software queue

use emuhost::audio::{QueueConsumer, QueueDriver, SoftwareQueue, Thresholds};
use emuhost::config::{HostConfig, HostInit};
use emuhost::emulator::Emulator;
use emuhost::hooks::HostHooks;
use emuhost::input::{InputEvent, Key};
use emuhost::tone::{ToneEmulator, SCREEN_HEIGHT, SCREEN_WIDTH};
use emuhost::video::HeadlessDisplay;
use emuhost::{Host, HostError};

#[derive(Default)]
struct Recorder {
    added: Vec<(u32, u32)>,
    ready: Vec<u32>,
    saves: u32,
    loads: u32,
}

impl HostHooks for Recorder {
    fn audio_add_buffer(&mut self, before: u32, after: u32) {
        self.added.push((before, after));
    }

    fn audio_buffer_ready(&mut self, queued: u32) {
        self.ready.push(queued);
    }

    fn write_state(&mut self) {
        self.saves += 1;
    }

    fn read_state(&mut self) {
        self.loads += 1;
    }
}

type TestHost = Host<ToneEmulator, SoftwareQueue, HeadlessDisplay, Recorder>;

const FRAMES: u32 = 512;

fn build() -> (TestHost, QueueConsumer) {
    let init = HostInit {
        audio_frames: FRAMES,
        ..HostInit::default()
    };
    let emulator = ToneEmulator::new(
        init.cycles_per_second,
        init.audio_frequency,
        FRAMES as usize,
        440.0,
    );
    let host = Host::new(
        init,
        emulator,
        &mut QueueDriver,
        HeadlessDisplay::default(),
        Recorder::default(),
    )
    .unwrap();
    let consumer = host.audio().device().consumer();
    (host, consumer)
}

#[test]
fn test_one_second_without_playback_hits_max_threshold() {
    let (mut host, _consumer) = build();
    let buffer = host.audio().spec().buffer_size;
    let (_, max) = host.audio().thresholds();

    for _ in 0..60 {
        host.run_ms(1000.0 / 60.0);
        assert!(host.audio().queued_bytes() <= max + buffer);
    }

    assert!(host.audio().is_ready());
    assert_eq!(host.hooks().ready.len(), 1);
    assert_eq!(host.display().uploads(), host.emulator().frames());
    assert_eq!(
        host.display().frame().len(),
        SCREEN_WIDTH * SCREEN_HEIGHT
    );
}

#[test]
fn test_ready_only_crosses_start_from_below() {
    let (mut host, _consumer) = build();
    let (start, _) = host.audio().thresholds();

    for _ in 0..30 {
        host.run_ms(1000.0 / 60.0);
    }

    let hooks = host.hooks();
    let ready = hooks.ready[0];
    assert!(ready >= start);
    let crossing = hooks
        .added
        .iter()
        .find(|&&(_, after)| after == ready)
        .unwrap();
    assert!(crossing.0 < start);
}

#[test]
fn test_steady_playback_stays_between_thresholds() {
    let (mut host, consumer) = build();
    let bytes_per_ms = host.audio().spec().bytes_per_second() as f64 / 1000.0;
    let (_, max) = host.audio().thresholds();
    let buffer = host.audio().spec().buffer_size;

    // Emulate a device draining in step with the emulator.
    for _ in 0..600 {
        let delta = 1000.0 / 60.0;
        host.run_ms(delta);
        consumer.consume((delta * bytes_per_ms) as usize);
        assert!(host.audio().queued_bytes() <= max + buffer);
    }

    assert!(host.audio().is_ready());
    assert_eq!(host.hooks().ready.len(), 1);
    assert!(consumer.played_bytes() > 0);
}

#[test]
fn test_pause_flushes_and_resume_reprimes() {
    let (mut host, _consumer) = build();
    for _ in 0..20 {
        host.run_ms(1000.0 / 60.0);
    }
    assert!(host.audio().is_ready());

    assert!(host.handle_input([InputEvent::KeyDown(Key::Space), InputEvent::KeyUp(Key::Space)]));
    assert!(host.config().paused);
    assert_eq!(host.audio().queued_bytes(), 0);
    assert!(host.audio().device().is_paused());

    let cycles = host.emulator().cycles();
    host.run_ms(1000.0);
    assert_eq!(host.emulator().cycles(), cycles);

    host.handle_input([InputEvent::KeyDown(Key::Space)]);
    assert!(!host.config().paused);
    assert!(!host.audio().is_ready());

    for _ in 0..20 {
        host.run_ms(1000.0 / 60.0);
    }
    assert!(host.audio().is_ready());
    assert_eq!(host.hooks().ready.len(), 2);
}

#[test]
fn test_step_from_keyboard() {
    let (mut host, _consumer) = build();
    host.set_config(HostConfig {
        paused: true,
        ..HostConfig::default()
    });

    host.handle_input([InputEvent::KeyDown(Key::N)]);
    let config = host.config();
    assert!(config.step);
    assert!(!config.paused);

    let frames = host.emulator().frames();
    host.run_ms(1000.0 / 30.0);
    assert!(host.emulator().frames() > frames);

    let config = host.config();
    assert!(config.paused);
    assert!(!config.step);
}

#[test]
fn test_state_hooks_and_quit() {
    let (mut host, _consumer) = build();
    let running = host.handle_input([
        InputEvent::KeyDown(Key::F6),
        InputEvent::KeyDown(Key::F9),
        InputEvent::KeyDown(Key::F9),
    ]);
    assert!(running);
    assert_eq!(host.hooks().saves, 1);
    assert_eq!(host.hooks().loads, 2);

    assert!(!host.handle_input([InputEvent::Quit]));
}

#[test]
fn test_muting_all_channels_is_silent() {
    let (mut host, consumer) = build();
    host.handle_input([
        InputEvent::KeyDown(Key::Num1),
        InputEvent::KeyDown(Key::Num2),
        InputEvent::KeyDown(Key::Num3),
        InputEvent::KeyDown(Key::Num4),
    ]);

    for _ in 0..10 {
        host.run_ms(1000.0 / 60.0);
    }
    assert!(host.audio().is_ready());

    let mut samples = vec![0u16; 1024];
    let read = consumer.read_samples(&mut samples);
    assert_eq!(read, samples.len());
    assert!(samples.iter().all(|&s| s == 0x8000));
}

#[test]
fn test_custom_thresholds() {
    let init = HostInit {
        audio_frames: FRAMES,
        thresholds: Thresholds {
            start_buffers: 1,
            max_buffers: 1,
        },
        ..HostInit::default()
    };
    let emulator = ToneEmulator::new(
        init.cycles_per_second,
        init.audio_frequency,
        FRAMES as usize,
        440.0,
    );
    let mut host = Host::new(
        init,
        emulator,
        &mut QueueDriver,
        HeadlessDisplay::default(),
        Recorder::default(),
    )
    .unwrap();
    let buffer = host.audio().spec().buffer_size;

    for _ in 0..60 {
        host.run_ms(1000.0 / 60.0);
        assert!(host.audio().queued_bytes() <= 2 * buffer);
    }
    assert!(host.audio().is_ready());
}

#[test]
fn test_oversized_audio_frames_fail_construction() {
    let init = HostInit {
        audio_frames: 600_000_000,
        ..HostInit::default()
    };
    let emulator = ToneEmulator::new(
        init.cycles_per_second,
        init.audio_frequency,
        init.audio_frames as usize,
        440.0,
    );
    let result = Host::new(
        init,
        emulator,
        &mut QueueDriver,
        HeadlessDisplay::default(),
        Recorder::default(),
    );
    assert!(matches!(result, Err(HostError::InvalidConfig(_))));
}

#[test]
fn test_window_is_scaled_frame() {
    let (host, _consumer) = build();
    let scale = host.init().render_scale;
    assert_eq!(
        host.display().window_size(),
        Some((SCREEN_WIDTH as u32 * scale, SCREEN_HEIGHT as u32 * scale))
    );
}
