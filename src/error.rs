//! Unified error types for emuhost

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for host operations
#[derive(Error, Debug)]
pub enum HostError {
    /// Audio device could not be opened or negotiated
    #[error("Audio device error: {message}")]
    AudioDevice { message: String },

    /// No audio output device is available
    #[error("No audio output device available")]
    NoAudioDevice,

    /// Negotiated audio format cannot be driven by the host
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be loaded or saved
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for host operations
pub type Result<T> = std::result::Result<T, HostError>;

impl HostError {
    /// Create an audio device error with context
    pub fn audio_device(message: impl Into<String>) -> Self {
        Self::AudioDevice {
            message: message.into(),
        }
    }

    /// Check if this error happened while setting up audio output
    pub fn is_audio_setup(&self) -> bool {
        matches!(
            self,
            HostError::AudioDevice { .. }
                | HostError::NoAudioDevice
                | HostError::UnsupportedFormat(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_setup_classification() {
        assert!(HostError::audio_device("open failed").is_audio_setup());
        assert!(HostError::NoAudioDevice.is_audio_setup());
        assert!(!HostError::InvalidConfig("bad".into()).is_audio_setup());
    }

    #[test]
    fn test_display_includes_message() {
        let err = HostError::audio_device("device busy");
        assert_eq!(err.to_string(), "Audio device error: device busy");
    }
}
