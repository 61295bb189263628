//! HTTP and process-backed implementations of the AgriSense provider traits.
//!
//! - [`GeminiClient`]: conversation, image diagnosis and transcription via
//!   the Gemini `generateContent` endpoint.
//! - [`WeatherClient`]: current conditions from OpenWeatherMap.
//! - [`CommandSynthesizer`]: text-to-speech through a local speech program
//!   such as `espeak`.
//! - [`SmtpMailer`]: weather alerts by e-mail.

mod gemini;
mod mail;
mod prompt;
mod voice;
mod weather;

pub use gemini::{GeminiClient, GeminiConfig};
pub use mail::{MailConfig, SmtpMailer};
pub use voice::CommandSynthesizer;
pub use weather::{WeatherClient, WeatherConfig};

use agrisense_core::ProviderError;

/// Map a transport-level `reqwest` failure for `provider`.
fn transport_error(provider: &'static str, e: reqwest::Error) -> ProviderError {
  let message = if e.is_timeout() { "request timed out".to_owned() } else { e.to_string() };
  ProviderError::Transport { provider, message }
}
