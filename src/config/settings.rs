//! Settings file support

use crate::audio::Thresholds;
use crate::config::{
    HostInit, DEFAULT_AUDIO_FRAMES, DEFAULT_AUDIO_FREQUENCY, DEFAULT_CYCLES_PER_SECOND,
    DEFAULT_RENDER_SCALE,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Host settings loaded from a TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// Requested output sample rate
    pub audio_frequency: u32,

    /// Requested audio frames per device buffer
    pub audio_frames: u32,

    /// Emulated clock rate in cycles per second
    pub cycles_per_second: u32,

    /// Window scale factor
    pub render_scale: u32,

    /// Playback starts once this many device buffers are queued
    pub audio_start_buffers: u32,

    /// New audio is dropped while this many device buffers are queued
    pub audio_max_buffers: u32,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log file path (empty = log to stderr)
    pub log_file: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        let thresholds = Thresholds::default();
        Self {
            audio_frequency: DEFAULT_AUDIO_FREQUENCY,
            audio_frames: DEFAULT_AUDIO_FRAMES,
            cycles_per_second: DEFAULT_CYCLES_PER_SECOND,
            render_scale: DEFAULT_RENDER_SCALE,
            audio_start_buffers: thresholds.start_buffers,
            audio_max_buffers: thresholds.max_buffers,
            log_level: "info".to_string(),
            log_file: String::new(),
        }
    }
}

impl HostSettings {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let settings = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Load settings from the default location, falling back to defaults
    ///
    /// The default location is `<config dir>/emuhost/config.toml`.
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::load(&path);
            }
            debug!("No settings file at {:?}, using defaults", path);
        }

        Ok(Self::default())
    }

    /// Default settings file path, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("emuhost").join("config.toml"))
    }

    /// Save settings to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_string_lossy().to_string(),
                source: e,
            })?;
        }

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Convert to construction parameters
    pub fn to_host_init(&self) -> HostInit {
        HostInit {
            audio_frequency: self.audio_frequency,
            audio_frames: self.audio_frames,
            cycles_per_second: self.cycles_per_second,
            render_scale: self.render_scale,
            thresholds: Thresholds {
                start_buffers: self.audio_start_buffers,
                max_buffers: self.audio_max_buffers,
            },
        }
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# emuhost configuration

# Output sample rate in Hz (default: 44100)
audio_frequency = 44100

# Audio frames per device buffer (default: 2048)
audio_frames = 2048

# Emulated clock rate in cycles per second (default: 4194304)
cycles_per_second = 4194304

# Window scale factor (default: 4)
render_scale = 4

# Playback starts once this many device buffers are queued (default: 2)
audio_start_buffers = 2

# New audio is dropped while this many device buffers are queued (default: 5)
audio_max_buffers = 5

# Log level: trace, debug, info, warn, error (default: info)
log_level = "info"

# Log file path (empty = log to stderr)
log_file = ""
"#
        .to_string()
    }
}

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error reading/writing config file
    #[error("Failed to access config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing TOML
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// Error serializing config
    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),
}
