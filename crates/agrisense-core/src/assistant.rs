//! The assistant: one render cycle per user action.
//!
//! Each operation runs sequentially: store writes for the user's input, then
//! at most one provider call, then the store write for the reply. Failures
//! never escape: provider errors become an errored reply turn (not
//! persisted), storage errors become warnings while the session keeps the
//! unsaved turn.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
  AudioError, ProviderError,
  alert::{AlertRecord, AlertType},
  notice::Notice,
  provider::{
    AlertMailer, AudioClip, GenerativeModel, ImageUpload, Language, SpeechToText,
    WeatherLookup, WeatherSummary,
  },
  session::{ConversationSession, SessionTurn, TurnOrigin},
  speech::Synthesizer,
  store::{DashboardMetrics, HistoryStore},
  turn::Role,
};

/// Content of the user turn recorded for an image upload.
pub const IMAGE_UPLOAD_TURN: &str = "Uploaded image for analysis";

pub const ALERT_SUBJECT: &str = "Weather Alert";

pub const EMAIL_NOT_CONFIGURED: &str =
  "Email not sent. Enable email alerts and configure the [smtp] settings.";

// ─── Backend bundle ──────────────────────────────────────────────────────────

/// The set of collaborator types an [`Assistant`] is built from.
pub trait Backend: Send + Sync + 'static {
  type Store: HistoryStore + 'static;
  type Weather: WeatherLookup + 'static;
  type Model: GenerativeModel + 'static;
  type Transcriber: SpeechToText + 'static;
  type Voice: Synthesizer;
  type Mailer: AlertMailer + 'static;
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// Everything a page render needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
  pub session: ConversationSession,
  pub metrics: DashboardMetrics,
  pub notices: Vec<Notice>,
}

/// Turns produced by one chat action, in display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Exchange {
  pub turns:   Vec<SessionTurn>,
  pub notices: Vec<Notice>,
}

impl Exchange {
  /// The assistant's reply, unless the provider failed.
  pub fn reply(&self) -> Option<&str> {
    self
      .turns
      .iter()
      .rev()
      .find(|t| t.role == Role::Assistant && t.origin != TurnOrigin::Errored)
      .map(|t| t.content.as_str())
  }
}

/// A successful weather lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherOutcome {
  pub summary: WeatherSummary,
  pub text:    String,
  /// The alert row, if the write succeeded.
  pub alert:   Option<AlertRecord>,
  pub notices: Vec<Notice>,
}

// ─── Assistant ───────────────────────────────────────────────────────────────

pub struct Assistant<B: Backend> {
  store:       Arc<B::Store>,
  weather:     Option<B::Weather>,
  model:       B::Model,
  transcriber: B::Transcriber,
  mailer:      Option<B::Mailer>,
}

impl<B: Backend> Assistant<B> {
  pub fn new(store: Arc<B::Store>, model: B::Model, transcriber: B::Transcriber) -> Self {
    Self { store, weather: None, model, transcriber, mailer: None }
  }

  /// Enable weather lookups. Without this they report "unavailable".
  pub fn with_weather(mut self, weather: B::Weather) -> Self {
    self.weather = Some(weather);
    self
  }

  /// Enable e-mailing of weather alerts.
  pub fn with_mailer(mut self, mailer: B::Mailer) -> Self {
    self.mailer = Some(mailer);
    self
  }

  pub fn store(&self) -> &Arc<B::Store> { &self.store }

  pub fn has_weather(&self) -> bool { self.weather.is_some() }

  pub fn has_mailer(&self) -> bool { self.mailer.is_some() }

  /// Load the session and dashboard counters for a page render.
  pub async fn render(&self) -> PageView { self.load_view().await.0 }

  /// The render that follows a chat action.
  ///
  /// Turns the store does not hold (errored replies, unsaved turns) are
  /// appended to the loaded session so they show up, along with every notice
  /// the action raised. If the history could not be read at all, the whole
  /// exchange is appended to the degraded session.
  pub async fn render_after(&self, exchange: Exchange) -> PageView {
    let (mut view, loaded) = self.load_view().await;
    for turn in exchange.turns {
      if !loaded || !turn.is_stored() {
        view.session.append_local(turn);
      }
    }
    view.notices.extend(exchange.notices);
    view
  }

  /// The page view, and whether the history loaded.
  async fn load_view(&self) -> (PageView, bool) {
    let mut notices = Vec::new();

    let (session, loaded) = match ConversationSession::load(self.store.as_ref()).await {
      Ok(session) => (session, true),
      Err(e) => {
        tracing::warn!(error = %e, "failed to load chat history");
        notices.push(Notice::warning(format!("Chat history unavailable: {e}")));
        (ConversationSession::degraded(), false)
      }
    };

    let metrics = match DashboardMetrics::load(self.store.as_ref()).await {
      Ok(metrics) => metrics,
      Err(e) => {
        tracing::warn!(error = %e, "failed to load dashboard metrics");
        notices.push(Notice::warning(format!("Dashboard unavailable: {e}")));
        DashboardMetrics::default()
      }
    };

    (PageView { session, metrics, notices }, loaded)
  }

  /// Ask the model a question typed by the user.
  pub async fn ask(&self, text: &str, language: Language) -> Exchange {
    let mut exchange = Exchange::default();
    let text = text.trim();
    if text.is_empty() {
      return exchange;
    }

    tracing::info!(%language, "chat question");
    let user = self.record(Role::User, text.to_owned(), &mut exchange.notices).await;
    exchange.turns.push(user);

    let reply = self.model.advise(text, language).await;
    self.record_reply(reply, "Error", &mut exchange).await;
    exchange
  }

  /// Transcribe a spoken question, then [`Assistant::ask`] it.
  pub async fn ask_by_voice(&self, clip: &AudioClip, language: Language) -> Exchange {
    match self.transcriber.transcribe(clip).await {
      Ok(text) if !text.trim().is_empty() => {
        let mut exchange = self.ask(&text, language).await;
        exchange.notices.insert(0, Notice::info(format!("Recognized: {}", text.trim())));
        exchange
      }
      Ok(_) => Self::voice_failure(AudioError::Unintelligible),
      Err(e) => Self::voice_failure(e),
    }
  }

  fn voice_failure(error: AudioError) -> Exchange {
    tracing::warn!(%error, "speech recognition failed");
    Exchange { turns: Vec::new(), notices: vec![Notice::error(error.to_string())] }
  }

  /// Diagnose an uploaded crop image.
  pub async fn diagnose(&self, image: &ImageUpload, language: Language) -> Exchange {
    let mut exchange = Exchange::default();

    tracing::info!(format = image.format.mime(), bytes = image.bytes.len(), "image diagnosis");
    let user = self
      .record(Role::User, IMAGE_UPLOAD_TURN.to_owned(), &mut exchange.notices)
      .await;
    exchange.turns.push(user);

    let reply = self.model.diagnose_image(image, language).await;
    self.record_reply(reply, "Error analyzing image", &mut exchange).await;
    exchange
  }

  /// Look up the weather for `city` and log it as an alert, e-mailing it
  /// too when `email` is set.
  ///
  /// The alert is only written after a successful lookup; on failure the
  /// alert log is untouched and the error is returned. The mail outcome is
  /// reported as a notice and never affects the alert row.
  pub async fn weather(&self, city: &str, email: bool) -> Result<WeatherOutcome, ProviderError> {
    let lookup = self.weather.as_ref().ok_or_else(|| ProviderError::Unavailable {
      provider: "weather",
      reason:   "no weather API key configured".to_owned(),
    })?;

    let summary = lookup.current_weather(city).await.inspect_err(|e| {
      tracing::warn!(%city, error = %e, "weather lookup failed");
    })?;

    let text = summary.to_string();
    let mut notices = Vec::new();
    let alert = match self.store.append_alert(AlertType::Weather, text.clone()).await {
      Ok(alert) => Some(alert),
      Err(e) => {
        tracing::warn!(error = %e, "failed to record weather alert");
        notices.push(Notice::warning(format!("Weather alert was not saved: {e}")));
        None
      }
    };
    if email {
      notices.push(self.mail_alert(&text).await);
    }

    Ok(WeatherOutcome { summary, text, alert, notices })
  }

  async fn mail_alert(&self, text: &str) -> Notice {
    let Some(mailer) = &self.mailer else {
      return Notice::warning(EMAIL_NOT_CONFIGURED);
    };
    match mailer.send_alert(ALERT_SUBJECT, text).await {
      Ok(()) => Notice::info("Weather alert emailed!"),
      Err(e) => {
        tracing::warn!(error = %e, "failed to e-mail weather alert");
        Notice::error(format!("Error sending email: {e}"))
      }
    }
  }

  // ── Helpers ──────────────────────────────────────────────────────────────

  async fn record(&self, role: Role, content: String, notices: &mut Vec<Notice>) -> SessionTurn {
    match self.store.append_chat_turn(role, content.clone()).await {
      Ok(turn) => turn.into(),
      Err(e) => {
        tracing::warn!(%role, error = %e, "failed to persist chat turn");
        let warning = format!("Message was not saved: {e}");
        notices.push(Notice::warning(warning.clone()));
        SessionTurn::unsaved(role, content, warning)
      }
    }
  }

  async fn record_reply(
    &self,
    reply: Result<String, ProviderError>,
    error_prefix: &str,
    exchange: &mut Exchange,
  ) {
    match reply {
      Ok(text) => {
        let turn = self.record(Role::Assistant, text, &mut exchange.notices).await;
        exchange.turns.push(turn);
      }
      Err(e) => {
        tracing::warn!(error = %e, "advisory provider failed");
        let message = format!("{error_prefix}: {e}");
        exchange.notices.push(Notice::error(message.clone()));
        exchange.turns.push(SessionTurn::errored(Role::Assistant, message));
      }
    }
  }
}
