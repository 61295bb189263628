//! Handlers for the conversation endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/chats` | Full history, oldest first |
//! | `POST` | `/chat` | Body: `{"message":"...","language":"Hindi","speak":true}` |
//! | `POST` | `/voice` | Raw audio body; `?language=...&speak=true` |
//! | `POST` | `/image` | Raw JPEG/PNG body; `?language=...&speak=true` |
//!
//! The three `POST` endpoints return an [`Exchange`]; provider failures show
//! up inside it as an errored turn, never as an error status.

use agrisense_core::{
  assistant::{Backend, Exchange},
  provider::{AudioClip, ImageFormat, ImageUpload},
  store::HistoryStore,
  turn::ChatTurn,
};
use axum::{
  Json,
  extract::{Query, State},
  http::{HeaderMap, header},
};
use bytes::Bytes;
use serde::Deserialize;

use crate::{AppState, error::ApiError, parse_language, speak_reply};

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /chats`
pub async fn list<B: Backend>(
  State(state): State<AppState<B>>,
) -> Result<Json<Vec<ChatTurn>>, ApiError> {
  let turns = state
    .assistant
    .store()
    .list_chat_turns()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(turns))
}

// ─── Text ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChatBody {
  pub message:  String,
  pub language: Option<String>,
  #[serde(default)]
  pub speak:    bool,
}

/// `POST /chat`
pub async fn ask<B: Backend>(
  State(state): State<AppState<B>>,
  Json(body): Json<ChatBody>,
) -> Result<Json<Exchange>, ApiError> {
  let language = parse_language(body.language.as_deref())?;
  if body.message.trim().is_empty() {
    return Err(ApiError::BadRequest("message must not be empty".to_owned()));
  }

  let exchange = state.assistant.ask(&body.message, language).await;
  Ok(Json(speak_reply(&state, exchange, body.speak).await))
}

// ─── Uploads ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
  pub language: Option<String>,
  #[serde(default)]
  pub speak:    bool,
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
  headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

/// A voice upload; the mime type defaults to WAV and loses any parameters.
pub(crate) fn audio_clip(headers: &HeaderMap, body: Bytes) -> Result<AudioClip, ApiError> {
  if body.is_empty() {
    return Err(ApiError::BadRequest("audio body is empty".to_owned()));
  }
  let mime = content_type(headers)
    .and_then(|m| m.split(';').next())
    .map(str::trim)
    .filter(|m| !m.is_empty())
    .unwrap_or("audio/wav");
  Ok(AudioClip { mime: mime.to_owned(), bytes: body.to_vec() })
}

/// An image upload; only JPEG and PNG are accepted.
pub(crate) fn image_upload(headers: &HeaderMap, body: Bytes) -> Result<ImageUpload, ApiError> {
  let format = content_type(headers)
    .and_then(ImageFormat::from_mime)
    .ok_or_else(|| ApiError::BadRequest("upload a JPEG or PNG image".to_owned()))?;
  if body.is_empty() {
    return Err(ApiError::BadRequest("image body is empty".to_owned()));
  }
  Ok(ImageUpload { format, bytes: body.to_vec() })
}

/// `POST /voice`: the body is one recorded utterance.
pub async fn voice<B: Backend>(
  State(state): State<AppState<B>>,
  Query(params): Query<UploadParams>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<Exchange>, ApiError> {
  let language = parse_language(params.language.as_deref())?;
  let clip = audio_clip(&headers, body)?;
  let exchange = state.assistant.ask_by_voice(&clip, language).await;
  Ok(Json(speak_reply(&state, exchange, params.speak).await))
}

/// `POST /image`: the body is a JPEG or PNG crop photo.
pub async fn image<B: Backend>(
  State(state): State<AppState<B>>,
  Query(params): Query<UploadParams>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<Exchange>, ApiError> {
  let language = parse_language(params.language.as_deref())?;
  let upload = image_upload(&headers, body)?;
  let exchange = state.assistant.diagnose(&upload, language).await;
  Ok(Json(speak_reply(&state, exchange, params.speak).await))
}
