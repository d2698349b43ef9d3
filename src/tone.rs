//! Test tone emulator
//!
//! A stand-in engine with the timing shape of a DMG: 70224-cycle frames at
//! 4.19 MHz, a 160x144 frame buffer, and u8 stereo audio produced in
//! fixed-size bursts. It scrolls a test pattern and plays a chord of four
//! square-wave voices, one per sound channel, mixed into both outputs. Muting
//! a channel silences its voice.

use crate::audio::{AudioBuffer, CHANNELS};
use crate::config::{HostConfig, SOUND_CHANNELS};
use crate::emulator::{Emulator, EmulatorEvent, JoypadButtons, JoypadCallback};

/// Frame buffer width
pub const SCREEN_WIDTH: usize = 160;

/// Frame buffer height
pub const SCREEN_HEIGHT: usize = 144;

/// Cycles per video frame
pub const CYCLES_PER_FRAME: u64 = 70_224;

const MIDPOINT: i16 = 0x80;
const VOICE_AMPLITUDE: i16 = 0x08;

/// Voice frequencies relative to the base tone: root, third, fifth, octave
const VOICE_RATIOS: [f64; SOUND_CHANNELS] = [1.0, 1.25, 1.5, 2.0];

/// Square wave and scrolling pattern generator
pub struct ToneEmulator {
    cycles_per_second: u64,
    sample_rate: u64,
    tone_hz: f64,
    buffer_frames: usize,
    cycles: u64,
    samples_made: u64,
    frames_made: u64,
    audio: Vec<u8>,
    audio_full: bool,
    frame: Vec<u32>,
    joypad: Option<JoypadCallback>,
    buttons: JoypadButtons,
    config: HostConfig,
}

impl ToneEmulator {
    /// Create a generator
    ///
    /// * `cycles_per_second` is the emulated clock.
    /// * `sample_rate` should match the audio device.
    /// * `buffer_frames` is how many stereo frames accumulate per audio event.
    pub fn new(cycles_per_second: u32, sample_rate: u32, buffer_frames: usize, tone_hz: f64) -> Self {
        let buffer_frames = buffer_frames.max(1);
        Self {
            cycles_per_second: u64::from(cycles_per_second.max(1)),
            sample_rate: u64::from(sample_rate.max(1)),
            tone_hz,
            buffer_frames,
            cycles: 0,
            samples_made: 0,
            frames_made: 0,
            audio: Vec::new(),
            audio_full: false,
            frame: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            joypad: None,
            buttons: JoypadButtons::default(),
            config: HostConfig::default(),
        }
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames_made
    }

    /// Stereo audio frames produced so far
    pub fn samples(&self) -> u64 {
        self.samples_made
    }

    /// Joypad state sampled at the last frame
    pub fn buttons(&self) -> JoypadButtons {
        self.buttons
    }

    fn next_sample_at(&self) -> u64 {
        let at = u128::from(self.samples_made + 1) * u128::from(self.cycles_per_second)
            / u128::from(self.sample_rate);
        at as u64
    }

    fn next_frame_at(&self) -> u64 {
        (self.frames_made + 1) * CYCLES_PER_FRAME
    }

    fn produce_sample(&mut self) -> bool {
        let t = self.samples_made as f64 / self.sample_rate as f64;
        let mut level = MIDPOINT;
        for (ratio, &muted) in VOICE_RATIOS.iter().zip(&self.config.disable_channel) {
            if muted {
                continue;
            }
            let phase = (t * self.tone_hz * ratio).fract();
            level += if phase < 0.5 {
                VOICE_AMPLITUDE
            } else {
                -VOICE_AMPLITUDE
            };
        }

        let sample = level.clamp(0, 0xff) as u8;
        self.audio.push(sample);
        self.audio.push(sample);
        self.samples_made += 1;

        self.audio.len() >= self.buffer_frames * CHANNELS as usize
    }

    fn render_frame(&mut self) {
        if let Some(joypad) = self.joypad.as_mut() {
            joypad(&mut self.buttons);
        }

        let scroll = self.frames_made as usize;
        let tint = if self.buttons.a { 0x00ff_0000 } else { 0 };
        for (y, row) in self.frame.chunks_exact_mut(SCREEN_WIDTH).enumerate() {
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = if self.config.disable_bg {
                    0xff00_0000
                } else {
                    let shade = (((x + scroll) ^ y) & 0xff) as u32;
                    0xff00_0000 | tint | (shade << 8) | shade
                };
            }
        }
        self.frames_made += 1;
    }
}

impl Emulator for ToneEmulator {
    const WIDTH: usize = SCREEN_WIDTH;
    const HEIGHT: usize = SCREEN_HEIGHT;

    fn run_until(&mut self, target: u64) -> EmulatorEvent {
        if self.audio_full {
            self.audio.clear();
            self.audio_full = false;
        }

        let mut event = EmulatorEvent::empty();
        while event.is_empty() {
            if self.cycles >= target {
                event |= EmulatorEvent::UNTIL_CYCLES;
                break;
            }

            let sample_at = self.next_sample_at();
            let frame_at = self.next_frame_at();
            self.cycles = sample_at.min(frame_at).min(target);

            if self.cycles == sample_at && self.produce_sample() {
                self.audio_full = true;
                event |= EmulatorEvent::AUDIO_BUFFER_FULL;
            }
            if self.cycles == frame_at {
                self.render_frame();
                event |= EmulatorEvent::NEW_FRAME;
            }
            if self.cycles >= target {
                event |= EmulatorEvent::UNTIL_CYCLES;
            }
        }
        event
    }

    fn cycles(&self) -> u64 {
        self.cycles
    }

    fn frame_buffer(&self) -> &[u32] {
        &self.frame
    }

    fn audio_buffer(&self) -> AudioBuffer<'_> {
        AudioBuffer::new(&self.audio)
    }

    fn set_joypad_callback(&mut self, callback: JoypadCallback) {
        self.joypad = Some(callback);
    }

    fn apply_config(&mut self, config: &HostConfig) {
        self.config = *config;
    }
}
