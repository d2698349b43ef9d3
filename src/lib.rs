//! emuhost - real-time pacing host for cycle-stepped emulators
//!
//! Turns wall-clock time into emulator cycle budgets, moves emulator audio
//! into a device queue with start/max hysteresis, and applies user toggles
//! (pause, step, sync, fullscreen) on transitions only.

pub mod audio;
pub mod clock;
pub mod config;
pub mod emulator;
pub mod error;
pub mod hooks;
pub mod host;
pub mod input;
pub mod tone;
pub mod video;

pub use error::{HostError, Result};
pub use host::{Host, RunStats};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
