//! Server configuration: an optional TOML file layered under `AGRISENSE_*`
//! environment variables.
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 8501
//! store_path = "~/.local/share/agrisense/agrisense.db"
//!
//! [speech]
//! enabled = true
//! program = "espeak"
//! rate = 150
//!
//! # Optional; without it weather alerts are never e-mailed.
//! [smtp]
//! server = "smtp.gmail.com"
//! sender = "alerts@example.com"
//! password = "app-password"
//! recipient = "farmer@example.com"
//! ```
//!
//! API keys may live in the file, but the conventional `GEMINI_API_KEY` and
//! `OPENWEATHER_API_KEY` variables take precedence.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;

pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";
pub const OPENWEATHER_KEY_VAR: &str = "OPENWEATHER_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("{0} is not set; the assistant cannot start without it")]
  MissingSecret(&'static str),

  #[error("failed to load configuration: {0}")]
  Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  pub gemini_model:         String,
  pub gemini_api_key:       Option<String>,
  pub openweather_api_key:  Option<String>,
  pub gemini_timeout_secs:  u64,
  pub weather_timeout_secs: u64,
  pub speech:               SpeechConfig,
  pub smtp:                 Option<SmtpConfig>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "127.0.0.1".to_owned(),
      port:                 8501,
      store_path:           PathBuf::from("agrisense.db"),
      gemini_model:         "gemini-1.5-flash".to_owned(),
      gemini_api_key:       None,
      openweather_api_key:  None,
      gemini_timeout_secs:  60,
      weather_timeout_secs: 30,
      speech:               SpeechConfig::default(),
      smtp:                 None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
  pub enabled: bool,
  /// Speech program invoked as `<program> -s <rate> -- <text>`.
  pub program: String,
  /// Words per minute.
  pub rate:    u32,
}

impl Default for SpeechConfig {
  fn default() -> Self { Self { enabled: true, program: "espeak".to_owned(), rate: 150 } }
}

/// Relay for weather-alert e-mail, reached with STARTTLS.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
  pub server:       String,
  #[serde(default = "SmtpConfig::default_port")]
  pub port:         u16,
  /// Sender address, also the login.
  pub sender:       String,
  pub password:     String,
  pub recipient:    String,
  #[serde(default = "SmtpConfig::default_timeout_secs")]
  pub timeout_secs: u64,
}

impl SmtpConfig {
  fn default_port() -> u16 { 587 }

  fn default_timeout_secs() -> u64 { 30 }

  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

/// API keys after environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secrets {
  pub gemini_api_key:      String,
  /// `None` disables weather lookups.
  pub openweather_api_key: Option<String>,
}

impl ServerConfig {
  /// Read `path` (if it exists) and the `AGRISENSE_*` environment.
  ///
  /// Nested keys use a double underscore, e.g. `AGRISENSE_SPEECH__ENABLED`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("AGRISENSE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  /// Resolve API keys, preferring `lookup` (normally the process
  /// environment) over values from the file. Blank values count as unset.
  pub fn secrets(
    &self,
    lookup: impl Fn(&str) -> Option<String>,
  ) -> Result<Secrets, ConfigError> {
    let pick = |var: &str, fallback: &Option<String>| {
      lookup(var)
        .or_else(|| fallback.clone())
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
    };

    let gemini_api_key = pick(GEMINI_KEY_VAR, &self.gemini_api_key)
      .ok_or(ConfigError::MissingSecret(GEMINI_KEY_VAR))?;
    let openweather_api_key = pick(OPENWEATHER_KEY_VAR, &self.openweather_api_key);
    Ok(Secrets { gemini_api_key, openweather_api_key })
  }

  pub fn gemini_timeout(&self) -> Duration { Duration::from_secs(self.gemini_timeout_secs) }

  pub fn weather_timeout(&self) -> Duration { Duration::from_secs(self.weather_timeout_secs) }
}
