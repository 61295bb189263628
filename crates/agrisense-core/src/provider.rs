//! Capability traits for external advisory providers.
//!
//! Concrete clients live in `agrisense-providers`; tests substitute fakes.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{AudioError, ProviderError};

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Language the model should answer in.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Language {
  #[default]
  English,
  Malayalam,
  Hindi,
  Telugu,
}

/// Image formats accepted for diagnosis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
  Jpeg,
  Png,
}

impl ImageFormat {
  /// Map a `Content-Type` value to a supported format.
  pub fn from_mime(mime: &str) -> Option<Self> {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    match essence.to_ascii_lowercase().as_str() {
      "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
      "image/png" => Some(Self::Png),
      _ => None,
    }
  }

  pub fn mime(self) -> &'static str {
    match self {
      Self::Jpeg => "image/jpeg",
      Self::Png => "image/png",
    }
  }
}

/// An uploaded crop photo.
#[derive(Debug, Clone)]
pub struct ImageUpload {
  pub format: ImageFormat,
  pub bytes:  Vec<u8>,
}

/// A recorded utterance. Capture happens on the client; the server receives
/// the finished clip.
#[derive(Debug, Clone)]
pub struct AudioClip {
  pub mime:  String,
  pub bytes: Vec<u8>,
}

// ─── Outputs ─────────────────────────────────────────────────────────────────

/// Current conditions for a city; `Display` is the text shown to the user
/// and stored in the alert log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
  pub city:        String,
  pub description: String,
  /// Degrees Celsius.
  pub temperature: f64,
  /// Relative humidity, percent.
  pub humidity:    u8,
}

impl fmt::Display for WeatherSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Weather in {}: {}, Temp: {}°C, Humidity: {}%",
      self.city, self.description, self.temperature, self.humidity,
    )
  }
}

// ─── Traits ──────────────────────────────────────────────────────────────────

pub trait WeatherLookup: Send + Sync {
  fn current_weather<'a>(
    &'a self,
    city: &'a str,
  ) -> impl Future<Output = Result<WeatherSummary, ProviderError>> + Send + 'a;
}

/// A hosted generative model used for both conversation and image diagnosis.
pub trait GenerativeModel: Send + Sync {
  /// Free-form farming advice for `prompt`.
  fn advise<'a>(
    &'a self,
    prompt: &'a str,
    language: Language,
  ) -> impl Future<Output = Result<String, ProviderError>> + Send + 'a;

  /// Diagnose diseases, pests or other issues visible in `image`.
  fn diagnose_image<'a>(
    &'a self,
    image: &'a ImageUpload,
    language: Language,
  ) -> impl Future<Output = Result<String, ProviderError>> + Send + 'a;
}

pub trait SpeechToText: Send + Sync {
  /// Transcribe one utterance. An empty result is
  /// [`AudioError::Unintelligible`].
  fn transcribe<'a>(
    &'a self,
    clip: &'a AudioClip,
  ) -> impl Future<Output = Result<String, AudioError>> + Send + 'a;
}

/// Delivers alert notifications by e-mail.
pub trait AlertMailer: Send + Sync {
  fn send_alert<'a>(
    &'a self,
    subject: &'a str,
    body: &'a str,
  ) -> impl Future<Output = Result<(), ProviderError>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn weather_summary_text() {
    let summary = WeatherSummary {
      city:        "Mumbai".into(),
      description: "haze".into(),
      temperature: 29.5,
      humidity:    74,
    };
    assert_eq!(summary.to_string(), "Weather in Mumbai: haze, Temp: 29.5°C, Humidity: 74%");
  }

  #[test]
  fn image_format_from_mime() {
    assert_eq!(ImageFormat::from_mime("image/png"), Some(ImageFormat::Png));
    assert_eq!(ImageFormat::from_mime("IMAGE/JPEG; charset=binary"), Some(ImageFormat::Jpeg));
    assert_eq!(ImageFormat::from_mime("application/pdf"), None);
  }

  #[test]
  fn language_parses_case_insensitively() {
    assert_eq!(Language::from_str("hindi").unwrap(), Language::Hindi);
    assert_eq!(Language::default(), Language::English);
    assert_eq!(Language::Telugu.to_string(), "Telugu");
  }
}
