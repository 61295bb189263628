//! Router test harness: an in-memory SQLite store plus scripted providers.

use std::sync::{Arc, Mutex};

use agrisense_core::{
  AudioError, ProviderError,
  assistant::{Assistant, Backend},
  provider::{
    AlertMailer, AudioClip, GenerativeModel, ImageUpload, Language, SpeechToText,
    WeatherLookup, WeatherSummary,
  },
  speech::{SpeechEngine, Synthesizer},
};
use agrisense_store_sqlite::SqliteStore;
use axum::{
  Router,
  body::Body,
  http::{Request, header},
  response::Response,
};
use serde::de::DeserializeOwned;
use tower::ServiceExt as _;

use crate::{AppState, app};

// ─── Fakes ────────────────────────────────────────────────────────────────────

pub struct EchoModel {
  fail: bool,
}

impl GenerativeModel for EchoModel {
  async fn advise(&self, prompt: &str, language: Language) -> Result<String, ProviderError> {
    if self.fail {
      return Err(ProviderError::Status {
        provider: "gemini",
        status:   503,
        message:  "model overloaded".into(),
      });
    }
    Ok(format!("advice in {language}: {prompt}"))
  }

  async fn diagnose_image(
    &self,
    image: &ImageUpload,
    language: Language,
  ) -> Result<String, ProviderError> {
    Ok(format!(
      "diagnosis of {} bytes of {} in {language}",
      image.bytes.len(),
      image.format.mime()
    ))
  }
}

/// Treats the clip bytes as the spoken text.
pub struct EchoEars;

impl SpeechToText for EchoEars {
  async fn transcribe(&self, clip: &AudioClip) -> Result<String, AudioError> {
    Ok(String::from_utf8_lossy(&clip.bytes).trim().to_owned())
  }
}

/// Knows only Mumbai.
pub struct MumbaiWeather;

impl WeatherLookup for MumbaiWeather {
  async fn current_weather(&self, city: &str) -> Result<WeatherSummary, ProviderError> {
    if city != "Mumbai" {
      return Err(ProviderError::Status {
        provider: "openweathermap",
        status:   404,
        message:  "City not found or API error.".into(),
      });
    }
    Ok(WeatherSummary {
      city:        city.to_owned(),
      description: "haze".into(),
      temperature: 30.0,
      humidity:    70,
    })
  }
}

/// Records what it was asked to say, or fails every time when `broken`.
pub struct RecordingVoice {
  spoken: Arc<Mutex<Vec<String>>>,
  broken: bool,
}

impl Synthesizer for RecordingVoice {
  fn in_loop(&self) -> bool { false }

  fn end_loop(&mut self) {}

  fn say(&mut self, text: &str) -> Result<(), AudioError> {
    if self.broken {
      return Err(AudioError::Playback("no audio output device".into()));
    }
    self.spoken.lock().unwrap().push(text.to_owned());
    Ok(())
  }
}

/// Never configured in router tests; the SMTP path has its own tests.
pub struct NoMailer;

impl AlertMailer for NoMailer {
  async fn send_alert(&self, _: &str, _: &str) -> Result<(), ProviderError> {
    unreachable!("no mailer is configured in router tests")
  }
}

pub struct TestBackend;

impl Backend for TestBackend {
  type Mailer = NoMailer;
  type Model = EchoModel;
  type Store = SqliteStore;
  type Transcriber = EchoEars;
  type Voice = RecordingVoice;
  type Weather = MumbaiWeather;
}

// ─── Harness ──────────────────────────────────────────────────────────────────

pub struct TestApp {
  router:    Router,
  pub store: Arc<SqliteStore>,
  spoken:    Arc<Mutex<Vec<String>>>,
}

/// How the speech engine behaves in a [`TestApp`].
#[derive(Clone, Copy, PartialEq)]
enum Speech {
  Working,
  Broken,
  Disabled,
}

impl TestApp {
  pub async fn new() -> Self { Self::build(false, true, Speech::Working).await }

  pub async fn with_failing_model() -> Self { Self::build(true, true, Speech::Working).await }

  pub async fn without_weather() -> Self { Self::build(false, false, Speech::Working).await }

  /// Every playback attempt fails.
  pub async fn with_broken_voice() -> Self { Self::build(false, true, Speech::Broken).await }

  pub async fn without_speech() -> Self { Self::build(false, true, Speech::Disabled).await }

  async fn build(fail_model: bool, weather: bool, speech: Speech) -> Self {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let mut assistant: Assistant<TestBackend> =
      Assistant::new(Arc::clone(&store), EchoModel { fail: fail_model }, EchoEars);
    if weather {
      assistant = assistant.with_weather(MumbaiWeather);
    }

    let spoken = Arc::new(Mutex::new(Vec::new()));
    let engine = (speech != Speech::Disabled).then(|| {
      SpeechEngine::new(RecordingVoice {
        spoken: Arc::clone(&spoken),
        broken: speech == Speech::Broken,
      })
    });
    let router = app(AppState::new(assistant, engine));
    Self { router, store, spoken }
  }

  pub fn spoken(&self) -> Vec<String> { self.spoken.lock().unwrap().clone() }

  async fn send(&self, req: Request<Body>) -> Response {
    self.router.clone().oneshot(req).await.unwrap()
  }

  pub async fn get(&self, uri: &str) -> Response {
    self.send(Request::get(uri).body(Body::empty()).unwrap()).await
  }

  pub async fn post_json(&self, uri: &str, json: &str) -> Response {
    let req = Request::post(uri)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(json.to_owned()))
      .unwrap();
    self.send(req).await
  }

  pub async fn post_bytes(&self, uri: &str, content_type: &str, bytes: &[u8]) -> Response {
    let req = Request::post(uri)
      .header(header::CONTENT_TYPE, content_type)
      .body(Body::from(bytes.to_vec()))
      .unwrap();
    self.send(req).await
  }
}

pub async fn json_body<T: DeserializeOwned>(resp: Response) -> T {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

pub async fn text_body(resp: Response) -> String {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  String::from_utf8(bytes.to_vec()).unwrap()
}
