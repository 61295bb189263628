//! Async client for the Gemini `generateContent` REST endpoint.

use std::time::Duration;

use agrisense_core::{
  AudioError, ProviderError,
  provider::{AudioClip, GenerativeModel, ImageUpload, Language, SpeechToText},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{prompt, transport_error};

const PROVIDER: &str = "gemini";

/// Connection settings for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
  pub api_key:  String,
  /// Model name, e.g. `gemini-1.5-flash`.
  pub model:    String,
  pub base_url: String,
  pub timeout:  Duration,
}

impl GeminiConfig {
  pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";
  pub const DEFAULT_MODEL: &'static str = "gemini-1.5-flash";

  pub fn new(api_key: impl Into<String>) -> Self {
    Self {
      api_key:  api_key.into(),
      model:    Self::DEFAULT_MODEL.to_owned(),
      base_url: Self::DEFAULT_BASE_URL.to_owned(),
      timeout:  Duration::from_secs(60),
    }
  }
}

/// Gemini client. Cheap to clone: the inner [`reqwest::Client`] is
/// `Arc`-based.
#[derive(Clone)]
pub struct GeminiClient {
  client: Client,
  config: GeminiConfig,
}

impl GeminiClient {
  pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .map_err(|e| transport_error(PROVIDER, e))?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!(
      "{}/v1beta/models/{}:generateContent",
      self.config.base_url.trim_end_matches('/'),
      self.config.model,
    )
  }

  /// `POST /v1beta/models/{model}:generateContent` with a single user turn.
  async fn generate(&self, parts: Vec<Part>) -> Result<String, ProviderError> {
    let body = GenerateRequest { contents: vec![Content { role: "user", parts }] };

    let resp = self
      .client
      .post(self.url())
      .header("x-goog-api-key", &self.config.api_key)
      .json(&body)
      .send()
      .await
      .map_err(|e| transport_error(PROVIDER, e))?;

    let status = resp.status();
    let raw = resp.text().await.map_err(|e| transport_error(PROVIDER, e))?;

    if !status.is_success() {
      tracing::warn!(%status, "gemini request rejected");
      return Err(ProviderError::Status {
        provider: PROVIDER,
        status:   status.as_u16(),
        message:  error_message(&raw).unwrap_or_else(|| format!("gemini returned {status}")),
      });
    }

    let parsed: GenerateResponse = serde_json::from_str(&raw).map_err(|e| {
      ProviderError::Malformed { provider: PROVIDER, message: e.to_string() }
    })?;
    parsed.text()
  }
}

impl GenerativeModel for GeminiClient {
  async fn advise(&self, question: &str, language: Language) -> Result<String, ProviderError> {
    let text = prompt::advice(question, language, Utc::now());
    self.generate(vec![Part::text(text)]).await
  }

  async fn diagnose_image(
    &self,
    image: &ImageUpload,
    language: Language,
  ) -> Result<String, ProviderError> {
    self
      .generate(vec![
        Part::text(prompt::diagnosis(language)),
        Part::inline(image.format.mime(), &image.bytes),
      ])
      .await
  }
}

impl SpeechToText for GeminiClient {
  async fn transcribe(&self, clip: &AudioClip) -> Result<String, AudioError> {
    let result = self
      .generate(vec![
        Part::text(prompt::TRANSCRIPTION.to_owned()),
        Part::inline(&clip.mime, &clip.bytes),
      ])
      .await;

    match result {
      Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_owned()),
      Ok(_) | Err(ProviderError::Empty { .. }) => Err(AudioError::Unintelligible),
      Err(e) => Err(AudioError::Recognition(e)),
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest {
  contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
  role:  &'static str,
  parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
  Text { text: String },
  Inline {
    #[serde(rename = "inlineData")]
    inline_data: Blob,
  },
}

impl Part {
  fn text(text: String) -> Self { Self::Text { text } }

  fn inline(mime: &str, bytes: &[u8]) -> Self {
    Self::Inline {
      inline_data: Blob { mime_type: mime.to_owned(), data: B64.encode(bytes) },
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
  mime_type: String,
  data:      String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
  text: Option<String>,
}

impl GenerateResponse {
  /// Concatenated text of the first candidate.
  fn text(self) -> Result<String, ProviderError> {
    let text: String = self
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
      .unwrap_or_default();

    if text.trim().is_empty() {
      Err(ProviderError::Empty { provider: PROVIDER })
    } else {
      Ok(text)
    }
  }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  message: String,
}

/// Pull `error.message` out of a Gemini error body.
fn error_message(raw: &str) -> Option<String> {
  serde_json::from_str::<ErrorEnvelope>(raw).ok().map(|e| e.error.message)
}
