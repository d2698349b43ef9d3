//! Host context: run loop, audio drain, and config transitions

use crate::audio::{AudioDevice, AudioDriver, AudioSink, AudioSpecDesired, DrainOutcome};
use crate::clock::Clock;
use crate::config::{HostConfig, HostInit};
use crate::emulator::{Emulator, EmulatorEvent, JoypadButtons};
use crate::error::{HostError, Result};
use crate::hooks::HostHooks;
use crate::input::{InputEvent, JoypadMap, KeyBindings, KeyState, Request};
use crate::video::{refresh_period_ms, Display, SwapInterval};
use tracing::{debug, info, trace, warn};

/// What one `run_ms` call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Cycle target handed to the emulator
    pub target_cycles: u64,
    /// Frames uploaded
    pub frames: u32,
    /// Audio buffers queued
    pub audio_queued: u32,
    /// Audio buffers dropped because the queue was full
    pub audio_dropped: u32,
}

/// Owns the emulator and its outputs, and paces one against the others
pub struct Host<E, D, V, H>
where
    E: Emulator,
    D: AudioDevice,
    V: Display,
    H: HostHooks,
{
    init: HostInit,
    config: HostConfig,
    emulator: E,
    audio: AudioSink<D>,
    display: V,
    hooks: H,
    bindings: KeyBindings,
    keys: KeyState,
    clock: Clock,
}

impl<E, D, V, H> Host<E, D, V, H>
where
    E: Emulator,
    D: AudioDevice,
    V: Display,
    H: HostHooks,
{
    /// Open audio, wire the joypad, and build the host
    ///
    /// Either everything is set up or an error is returned; the emulator and
    /// display are dropped with the error.
    pub fn new<A>(
        init: HostInit,
        mut emulator: E,
        driver: &mut A,
        mut display: V,
        hooks: H,
    ) -> Result<Self>
    where
        A: AudioDriver<Device = D>,
    {
        if init.cycles_per_second == 0 {
            return Err(HostError::InvalidConfig(
                "cycles_per_second must be non-zero".into(),
            ));
        }
        if init.render_scale == 0 {
            return Err(HostError::InvalidConfig(
                "render_scale must be non-zero".into(),
            ));
        }
        if init.audio_frames == 0 || init.audio_frequency == 0 {
            return Err(HostError::InvalidConfig(format!(
                "audio needs a non-zero rate and buffer, got {} Hz / {} frames",
                init.audio_frequency, init.audio_frames
            )));
        }

        let wanted = AudioSpecDesired {
            sample_rate: init.audio_frequency,
            frames: init.audio_frames,
        };
        let audio = AudioSink::open(driver, &wanted, init.thresholds)?;

        let keys = KeyState::default();
        let joypad_keys = keys.clone();
        let joypad = JoypadMap::default();
        emulator.set_joypad_callback(Box::new(move |buttons: &mut JoypadButtons| {
            joypad.read(&joypad_keys, buttons)
        }));

        let config = HostConfig::default();
        emulator.apply_config(&config);

        display.set_window_size(
            scaled(E::WIDTH, init.render_scale),
            scaled(E::HEIGHT, init.render_scale),
        );

        info!(
            "Host initialized: {} cycles/s, {}x{} frame, audio {}",
            init.cycles_per_second,
            E::WIDTH,
            E::HEIGHT,
            audio.spec()
        );

        Ok(Self {
            init,
            config,
            emulator,
            audio,
            display,
            hooks,
            bindings: KeyBindings::default(),
            keys,
            clock: Clock::new(),
        })
    }

    /// Advance emulation by `delta_ms` of wall time
    ///
    /// Does nothing while paused. Returns once the emulator reports the cycle
    /// target reached, however many frame and audio events come first.
    pub fn run_ms(&mut self, delta_ms: f64) -> RunStats {
        let mut stats = RunStats::default();
        if self.config.paused {
            return stats;
        }

        let delta_ms = if delta_ms.is_finite() && delta_ms >= 0.0 {
            delta_ms
        } else {
            warn!("Ignoring invalid run delta {}ms", delta_ms);
            0.0
        };

        let delta_cycles = (delta_ms * self.init.cycles_per_second as f64 / 1000.0).floor() as u64;
        let until = self.emulator.cycles().saturating_add(delta_cycles);
        stats.target_cycles = until;

        loop {
            let event = self.emulator.run_until(until);
            if event.contains(EmulatorEvent::NEW_FRAME) {
                self.upload_video();
                stats.frames += 1;
            }
            if event.contains(EmulatorEvent::AUDIO_BUFFER_FULL) {
                match self.render_audio() {
                    DrainOutcome::Queued { .. } => stats.audio_queued += 1,
                    DrainOutcome::Dropped { .. } => stats.audio_dropped += 1,
                }
            }
            if event.contains(EmulatorEvent::UNTIL_CYCLES) {
                break;
            }
        }

        if self.config.step {
            let mut config = self.config;
            config.paused = true;
            config.step = false;
            self.set_config(config);
        }

        trace!(
            "Ran {:.3}ms to cycle {}: {} frames, {} audio buffers",
            delta_ms,
            until,
            stats.frames,
            stats.audio_queued + stats.audio_dropped
        );
        stats
    }

    /// Apply a new runtime config, firing side effects for changed fields
    pub fn set_config(&mut self, new_config: HostConfig) {
        let old = self.config;

        if old.no_sync != new_config.no_sync {
            debug!("Sync {}", if new_config.no_sync { "disabled" } else { "enabled" });
            self.display.set_swap_interval(if new_config.no_sync {
                SwapInterval::Immediate
            } else {
                SwapInterval::VSync
            });
            self.audio.reset();
        }

        if old.paused != new_config.paused {
            debug!("{}", if new_config.paused { "Paused" } else { "Resumed" });
            self.audio.reset();
        }

        if old.fullscreen != new_config.fullscreen {
            self.display.set_fullscreen(new_config.fullscreen);
        }

        if passthrough_changed(&old, &new_config) {
            self.emulator.apply_config(&new_config);
        }

        self.config = new_config;
    }

    /// Current runtime config
    pub fn config(&self) -> HostConfig {
        self.config
    }

    /// Handle one polling pass worth of input
    ///
    /// Config changes from all events are committed together. Returns `false`
    /// when the user asked to quit.
    pub fn handle_input<I>(&mut self, events: I) -> bool
    where
        I: IntoIterator<Item = InputEvent>,
    {
        let mut config = self.config;
        let mut requests = Vec::new();
        for event in events {
            self.keys.update(event);
            self.bindings.dispatch(event, &mut config, &mut requests);
        }

        let mut running = true;
        for request in requests {
            match request {
                Request::WriteState => self.hooks.write_state(),
                Request::ReadState => self.hooks.read_state(),
                Request::Quit => running = false,
            }
        }

        self.set_config(config);
        running
    }

    /// Milliseconds since the host was created
    pub fn time_ms(&self) -> f64 {
        self.clock.elapsed_ms()
    }

    /// Display refresh period, assuming 60 Hz when unknown
    pub fn monitor_refresh_ms(&self) -> f64 {
        refresh_period_ms(self.display.refresh_rate_hz())
    }

    /// Construction parameters
    pub fn init(&self) -> &HostInit {
        &self.init
    }

    /// Audio sink
    pub fn audio(&self) -> &AudioSink<D> {
        &self.audio
    }

    /// Emulator
    pub fn emulator(&self) -> &E {
        &self.emulator
    }

    /// Emulator, mutably
    pub fn emulator_mut(&mut self) -> &mut E {
        &mut self.emulator
    }

    /// Display
    pub fn display(&self) -> &V {
        &self.display
    }

    /// Hooks
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Key bindings, for remapping
    pub fn bindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.bindings
    }

    /// Keys currently held
    pub fn key_state(&self) -> &KeyState {
        &self.keys
    }

    fn upload_video(&mut self) {
        self.display
            .upload_frame(self.emulator.frame_buffer(), E::WIDTH, E::HEIGHT);
        self.display.present();
    }

    fn render_audio(&mut self) -> DrainOutcome {
        let buffer = self.emulator.audio_buffer();
        self.audio.render(buffer, &mut self.hooks)
    }
}

fn scaled(pixels: usize, scale: u32) -> u32 {
    u32::try_from(pixels)
        .unwrap_or(u32::MAX)
        .saturating_mul(scale)
}

fn passthrough_changed(old: &HostConfig, new: &HostConfig) -> bool {
    old.disable_channel != new.disable_channel
        || old.disable_bg != new.disable_bg
        || old.disable_window != new.disable_window
        || old.disable_obj != new.disable_obj
}
