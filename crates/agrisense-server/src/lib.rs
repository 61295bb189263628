//! Wiring for the `agrisense` binary: configuration and the production
//! [`Backend`].

pub mod config;

use std::sync::Arc;

use agrisense_api::AppState;
use agrisense_core::{
  ProviderError,
  assistant::{Assistant, Backend},
  speech::{SpeechEngine, Synthesizer},
};
use agrisense_providers::{
  CommandSynthesizer, GeminiClient, GeminiConfig, MailConfig, SmtpMailer, WeatherClient,
  WeatherConfig,
};
use agrisense_store_sqlite::SqliteStore;

pub use config::{ConfigError, Secrets, ServerConfig};

/// SQLite history, Gemini for language and transcription, OpenWeatherMap,
/// SMTP alert mail and a local speech program.
pub struct ProdBackend;

impl Backend for ProdBackend {
  type Mailer = SmtpMailer;
  type Model = GeminiClient;
  type Store = SqliteStore;
  type Transcriber = GeminiClient;
  type Voice = CommandSynthesizer;
  type Weather = WeatherClient;
}

/// Build the shared handler state from an opened store.
pub fn build_state(
  config: &ServerConfig,
  secrets: Secrets,
  store: Arc<SqliteStore>,
) -> Result<AppState<ProdBackend>, ProviderError> {
  let gemini = GeminiClient::new(GeminiConfig {
    model: config.gemini_model.clone(),
    timeout: config.gemini_timeout(),
    ..GeminiConfig::new(secrets.gemini_api_key)
  })?;

  let mut assistant: Assistant<ProdBackend> = Assistant::new(store, gemini.clone(), gemini);
  match secrets.openweather_api_key {
    Some(key) => {
      let weather = WeatherClient::new(WeatherConfig {
        timeout: config.weather_timeout(),
        ..WeatherConfig::new(key)
      })?;
      assistant = assistant.with_weather(weather);
    }
    None => tracing::warn!("OPENWEATHER_API_KEY not set; weather lookups are disabled"),
  }
  if let Some(smtp) = &config.smtp {
    let mailer = SmtpMailer::new(MailConfig {
      server:    smtp.server.clone(),
      port:      smtp.port,
      sender:    smtp.sender.clone(),
      password:  smtp.password.clone(),
      recipient: smtp.recipient.clone(),
      timeout:   smtp.timeout(),
    })?;
    assistant = assistant.with_mailer(mailer);
  }

  let speech = config.speech.enabled.then(|| {
    SpeechEngine::new(CommandSynthesizer::new(config.speech.program.clone(), config.speech.rate))
  });
  if speech.is_none() {
    tracing::info!("text-to-speech disabled");
  }

  Ok(AppState::new(assistant, speech))
}

/// Stop the speech engine once the server is done with it, ending any
/// playback still running. Returns `false` if another handle was still
/// alive, in which case the engine is left to drop.
pub fn close_speech<V: Synthesizer>(speech: Option<Arc<SpeechEngine<V>>>) -> bool {
  let Some(speech) = speech else { return true };
  match Arc::try_unwrap(speech) {
    Ok(engine) => {
      engine.close();
      true
    }
    Err(_) => {
      tracing::warn!("speech engine still shared at shutdown; leaving it to drop");
      false
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::SmtpConfig;

  fn secrets(weather: Option<&str>) -> Secrets {
    Secrets {
      gemini_api_key:      "test-key".into(),
      openweather_api_key: weather.map(str::to_owned),
    }
  }

  #[tokio::test]
  async fn weather_follows_its_key() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let cfg = ServerConfig::default();

    let state = build_state(&cfg, secrets(None), Arc::clone(&store)).unwrap();
    assert!(!state.assistant.has_weather());

    let state = build_state(&cfg, secrets(Some("w")), store).unwrap();
    assert!(state.assistant.has_weather());
  }

  #[tokio::test]
  async fn speech_can_be_disabled() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let mut cfg = ServerConfig::default();
    assert!(build_state(&cfg, secrets(None), Arc::clone(&store)).unwrap().speech.is_some());

    cfg.speech.enabled = false;
    assert!(build_state(&cfg, secrets(None), store).unwrap().speech.is_none());
  }

  #[tokio::test]
  async fn mail_follows_the_smtp_section() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let mut cfg = ServerConfig::default();
    assert!(!build_state(&cfg, secrets(None), Arc::clone(&store)).unwrap().assistant.has_mailer());

    let smtp = SmtpConfig {
      server:       "smtp.example.com".into(),
      port:         587,
      sender:       "alerts@example.com".into(),
      password:     "pw".into(),
      recipient:    "farmer@example.com".into(),
      timeout_secs: 30,
    };
    cfg.smtp = Some(smtp.clone());
    assert!(build_state(&cfg, secrets(None), Arc::clone(&store)).unwrap().assistant.has_mailer());

    cfg.smtp = Some(SmtpConfig { recipient: "nobody".into(), ..smtp });
    assert!(build_state(&cfg, secrets(None), store).is_err());
  }

  #[tokio::test]
  async fn speech_is_closed_once_unshared() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let state = build_state(&ServerConfig::default(), secrets(None), store).unwrap();
    let speech = state.speech.clone();
    assert!(speech.is_some());

    assert!(!close_speech(state.speech.clone()));
    drop(state);
    assert!(close_speech(speech));
    assert!(close_speech::<CommandSynthesizer>(None));
  }
}
