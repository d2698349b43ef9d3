//! Host configuration: construction parameters, runtime toggles, settings file, CLI

mod args;
mod settings;

pub use args::{Args, Command};
pub use settings::{ConfigError, HostSettings};

use crate::audio::Thresholds;

/// Default output sample rate
pub const DEFAULT_AUDIO_FREQUENCY: u32 = 44_100;

/// Default number of audio frames requested per device buffer
pub const DEFAULT_AUDIO_FRAMES: u32 = 2048;

/// CPU clock of the reference handheld (DMG), in cycles per second
pub const DEFAULT_CYCLES_PER_SECOND: u32 = 4_194_304;

/// Default window scale factor
pub const DEFAULT_RENDER_SCALE: u32 = 4;

/// Number of sound channels that can be muted individually
pub const SOUND_CHANNELS: usize = 4;

/// Construction parameters, immutable once the host is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostInit {
    /// Requested output sample rate
    pub audio_frequency: u32,
    /// Requested audio frames per device buffer
    pub audio_frames: u32,
    /// Emulated clock rate used to turn wall time into a cycle budget
    pub cycles_per_second: u32,
    /// Window scale factor handed to the display backend
    pub render_scale: u32,
    /// Audio queue start/max thresholds
    pub thresholds: Thresholds,
}

impl Default for HostInit {
    fn default() -> Self {
        Self {
            audio_frequency: DEFAULT_AUDIO_FREQUENCY,
            audio_frames: DEFAULT_AUDIO_FRAMES,
            cycles_per_second: DEFAULT_CYCLES_PER_SECOND,
            render_scale: DEFAULT_RENDER_SCALE,
            thresholds: Thresholds::default(),
        }
    }
}

/// User-toggleable runtime state
///
/// Copied, never shared. The host compares each new value against the
/// previous one and only acts on fields that changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostConfig {
    /// Emulation is halted; audio is flushed
    pub paused: bool,
    /// Advance one pass, then pause again
    pub step: bool,
    /// Run without display vsync
    pub no_sync: bool,
    /// Fullscreen display
    pub fullscreen: bool,
    /// Per-channel sound mute
    pub disable_channel: [bool; SOUND_CHANNELS],
    /// Hide the background layer
    pub disable_bg: bool,
    /// Hide the window layer
    pub disable_window: bool,
    /// Hide sprites
    pub disable_obj: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let init = HostInit::default();
        assert_eq!(init.audio_frequency, 44_100);
        assert_eq!(init.cycles_per_second, 4_194_304);

        let config = HostConfig::default();
        assert!(!config.paused);
        assert!(!config.step);
        assert_eq!(config.disable_channel, [false; SOUND_CHANNELS]);
    }
}
