//! Error types for `agrisense-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown alert type: {0:?}")]
  UnknownAlertType(String),

  #[error("{field} must be between 0 and 100, got {value}")]
  OutOfRange { field: &'static str, value: u32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A failure reported by an external advisory provider (weather service,
/// language model).
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
  /// The provider is not configured (e.g. no API key).
  #[error("{provider} is unavailable: {reason}")]
  Unavailable {
    provider: &'static str,
    reason:   String,
  },

  #[error("{provider} request failed: {message}")]
  Transport {
    provider: &'static str,
    message:  String,
  },

  /// The provider answered with a non-success status.
  #[error("{message}")]
  Status {
    provider: &'static str,
    status:   u16,
    message:  String,
  },

  #[error("{provider} returned a malformed response: {message}")]
  Malformed {
    provider: &'static str,
    message:  String,
  },

  /// The provider answered successfully but produced no usable content.
  #[error("{provider} returned an empty response")]
  Empty { provider: &'static str },
}

/// A failure of speech capture or playback.
#[derive(Debug, Clone, Error)]
pub enum AudioError {
  #[error("audio device unavailable: {0}")]
  DeviceUnavailable(String),

  #[error("Could not understand audio")]
  Unintelligible,

  #[error("speech playback failed: {0}")]
  Playback(String),

  #[error("Error with speech recognition service: {0}")]
  Recognition(#[from] ProviderError),
}
