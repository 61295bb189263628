//! HTTP surface for AgriSense: a JSON API plus the single-page UI.
//!
//! Every request is one render cycle against the shared [`Assistant`]. TLS
//! and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = agrisense_api::app(state).layer(TraceLayer::new_for_http());
//! ```

pub mod chat;
pub mod dashboard;
pub mod error;
pub mod page;
pub mod tools;

use std::{str::FromStr, sync::Arc};

use agrisense_core::{
  assistant::{Assistant, Backend, Exchange},
  notice::Notice,
  provider::Language,
  speech::SpeechEngine,
};
use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};

pub use error::ApiError;

/// Largest accepted upload (images, voice clips).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<B: Backend> {
  pub assistant: Arc<Assistant<B>>,
  /// `None` when speech output is disabled.
  pub speech:    Option<Arc<SpeechEngine<B::Voice>>>,
}

impl<B: Backend> AppState<B> {
  pub fn new(assistant: Assistant<B>, speech: Option<SpeechEngine<B::Voice>>) -> Self {
    Self { assistant: Arc::new(assistant), speech: speech.map(Arc::new) }
  }
}

impl<B: Backend> Clone for AppState<B> {
  fn clone(&self) -> Self {
    Self { assistant: Arc::clone(&self.assistant), speech: self.speech.clone() }
  }
}

// ─── Routers ──────────────────────────────────────────────────────────────────

/// The JSON API, meant to be nested under `/api`.
pub fn api_router<B: Backend>(state: AppState<B>) -> Router<()> {
  Router::new()
    // Chat
    .route("/chats", get(chat::list::<B>))
    .route("/chat", post(chat::ask::<B>))
    .route("/voice", post(chat::voice::<B>))
    .route("/image", post(chat::image::<B>))
    // Dashboard
    .route("/dashboard", get(dashboard::metrics::<B>))
    .route("/alerts", get(dashboard::alerts::<B>))
    // Tools
    .route("/weather", post(tools::weather::<B>))
    .route("/advice/crop", get(tools::crop))
    .route("/advice/soil", get(tools::soil))
    .route("/advice/market", get(tools::market))
    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
    .with_state(state)
}

/// The full application: the page and its form actions at the root, the
/// API under `/api`.
pub fn app<B: Backend>(state: AppState<B>) -> Router<()> {
  Router::new()
    .route("/", get(page::index::<B>))
    .route("/ask", post(page::ask::<B>))
    .route("/voice", post(page::voice::<B>))
    .route("/image", post(page::image::<B>))
    .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
    .with_state(state.clone())
    .nest("/api", api_router(state))
}

// ─── Shared helpers ───────────────────────────────────────────────────────────

/// Parse an optional language name; absent means English.
pub(crate) fn parse_language(raw: Option<&str>) -> Result<Language, ApiError> {
  match raw.map(str::trim).filter(|s| !s.is_empty()) {
    None => Ok(Language::default()),
    Some(name) => Language::from_str(name)
      .map_err(|_| ApiError::BadRequest(format!("unsupported language: {name:?}"))),
  }
}

/// Speak the reply of `exchange` if asked to, adding a notice when that did
/// not happen.
pub(crate) async fn speak_reply<B: Backend>(
  state: &AppState<B>,
  mut exchange: Exchange,
  requested: bool,
) -> Exchange {
  if !requested {
    return exchange;
  }
  if let Some(reply) = exchange.reply().map(str::to_owned)
    && let Some(notice) = speak(state, &reply).await
  {
    exchange.notices.push(notice);
  }
  exchange
}

/// Speak `text` on the shared engine, off the async runtime.
///
/// Returns a notice when playback was requested but did not happen.
async fn speak<B: Backend>(state: &AppState<B>, text: &str) -> Option<Notice> {
  let Some(engine) = state.speech.clone() else {
    return Some(Notice::info("Text-to-speech is disabled on this server."));
  };
  let text = text.to_owned();

  match tokio::task::spawn_blocking(move || engine.speak(&text)).await {
    Ok(Ok(())) => None,
    Ok(Err(e)) => {
      tracing::warn!(error = %e, "text-to-speech failed");
      Some(Notice::warning(format!("Text-to-speech error: {e}")))
    }
    Err(e) => {
      tracing::error!(error = %e, "text-to-speech task panicked");
      Some(Notice::warning(format!("Text-to-speech error: {e}")))
    }
  }
}

#[cfg(test)]
mod testing;
