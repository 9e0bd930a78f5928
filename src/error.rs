use thiserror::Error;

/// Errors surfaced by the metering and tone engine.
///
/// Silence (`-inf` dB) is never an error; it is a normal reading.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Capture device could not be opened (not found, permission denied, unplugged)
    #[error("audio device '{device}' unavailable: {reason}")]
    DeviceUnavailable { device: String, reason: String },

    /// No usable output device for tone playback
    #[error("audio output unavailable: {0}")]
    OutputUnavailable(String),

    /// Frame source stopped supplying frames mid-session
    #[error("audio stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("failed to load config: {0}")]
    ConfigLoad(String),
}

impl AudioError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        AudioError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn device(device: Option<&str>, reason: impl ToString) -> Self {
        AudioError::DeviceUnavailable {
            device: device.unwrap_or("default").to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AudioError>;
