//! Emulation engine contract

use crate::audio::AudioBuffer;
use crate::config::HostConfig;
use bitflags::bitflags;

bitflags! {
    /// Reasons `Emulator::run_until` returned
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EmulatorEvent: u32 {
        /// A complete frame is in the frame buffer
        const NEW_FRAME = 1 << 0;
        /// The audio buffer is full and must be drained
        const AUDIO_BUFFER_FULL = 1 << 1;
        /// The requested cycle target was reached
        const UNTIL_CYCLES = 1 << 2;
    }
}

/// State of the eight joypad buttons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoypadButtons {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub a: bool,
    pub b: bool,
    pub start: bool,
    pub select: bool,
}

/// Called by the engine whenever it samples the joypad
pub type JoypadCallback = Box<dyn FnMut(&mut JoypadButtons) + Send>;

/// A cycle-stepped emulation engine
pub trait Emulator {
    /// Frame buffer width in pixels
    const WIDTH: usize;
    /// Frame buffer height in pixels
    const HEIGHT: usize;

    /// Run until `target` cycles have elapsed or an earlier event fires
    fn run_until(&mut self, target: u64) -> EmulatorEvent;

    /// Cycles elapsed since power on
    fn cycles(&self) -> u64;

    /// Last rendered frame, `WIDTH * HEIGHT` RGBA pixels
    fn frame_buffer(&self) -> &[u32];

    /// Audio accumulated since the last audio-buffer-full event
    fn audio_buffer(&self) -> AudioBuffer<'_>;

    /// Install the joypad query callback
    fn set_joypad_callback(&mut self, callback: JoypadCallback);

    /// Receive pass-through settings (channel mutes, layer toggles)
    fn apply_config(&mut self, _config: &HostConfig) {}
}
