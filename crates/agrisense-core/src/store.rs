//! The `HistoryStore` trait and the dashboard read model.
//!
//! The trait is implemented by storage backends (e.g.
//! `agrisense-store-sqlite`). The assistant and the HTTP layer depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  alert::{AlertRecord, AlertType},
  turn::{ChatTurn, Role},
};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the durable chat/alert log.
///
/// Both tables are append-only: there is no update or delete operation. The
/// `id` and `timestamp` of every record are assigned by the store.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait HistoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Append a chat turn and return the persisted record.
  fn append_chat_turn(
    &self,
    role: Role,
    content: String,
  ) -> impl Future<Output = Result<ChatTurn, Self::Error>> + Send + '_;

  /// Append an alert and return the persisted record.
  fn append_alert(
    &self,
    alert_type: AlertType,
    message: String,
  ) -> impl Future<Output = Result<AlertRecord, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Every chat turn, ordered by `timestamp` ascending with ties broken by
  /// `id`. Re-reads the whole table on every call.
  fn list_chat_turns(
    &self,
  ) -> impl Future<Output = Result<Vec<ChatTurn>, Self::Error>> + Send + '_;

  /// Every alert, in the same order as [`HistoryStore::list_chat_turns`].
  fn list_alerts(
    &self,
  ) -> impl Future<Output = Result<Vec<AlertRecord>, Self::Error>> + Send + '_;

  /// Number of turns with [`Role::Assistant`].
  fn count_assistant_turns(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn count_alerts(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Number of distinct calendar dates present in chat turn timestamps.
  ///
  /// This is shown as "Users Today" on the dashboard. It is a proxy: the
  /// store has no notion of users.
  fn count_distinct_chat_days(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

// ─── Dashboard ───────────────────────────────────────────────────────────────

/// Aggregate counters rendered on the farmer dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardMetrics {
  pub queries_solved: u64,
  pub weather_alerts: u64,
  pub active_days:    u64,
}

impl DashboardMetrics {
  /// Run the three counter queries against `store`.
  pub async fn load<S: HistoryStore>(store: &S) -> Result<Self, S::Error> {
    Ok(Self {
      queries_solved: store.count_assistant_turns().await?,
      weather_alerts: store.count_alerts().await?,
      active_days:    store.count_distinct_chat_days().await?,
    })
  }
}
