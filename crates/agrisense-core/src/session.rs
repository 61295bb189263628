//! The conversation session: the per-render view of the chat history.
//!
//! A session is rebuilt on every render from a full read of the store, then
//! appended to locally as new turns are produced so they show up without a
//! reload. There is no incremental sync and no pagination; a history of a few
//! thousand turns is the intended scale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  store::HistoryStore,
  turn::{ChatTurn, Role},
};

/// Where a rendered turn came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum TurnOrigin {
  /// Read from, or successfully written to, the store.
  Stored { id: i64, timestamp: DateTime<Utc> },
  /// Produced normally but the store write failed.
  Unsaved { warning: String },
  /// The provider failed; `content` holds the error text shown to the user.
  /// Never persisted.
  Errored,
}

/// A turn as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTurn {
  pub role:    Role,
  pub content: String,
  #[serde(flatten)]
  pub origin:  TurnOrigin,
}

impl SessionTurn {
  pub fn unsaved(role: Role, content: String, warning: impl Into<String>) -> Self {
    Self { role, content, origin: TurnOrigin::Unsaved { warning: warning.into() } }
  }

  pub fn errored(role: Role, content: String) -> Self {
    Self { role, content, origin: TurnOrigin::Errored }
  }

  pub fn is_stored(&self) -> bool { matches!(self.origin, TurnOrigin::Stored { .. }) }
}

impl From<ChatTurn> for SessionTurn {
  fn from(turn: ChatTurn) -> Self {
    Self {
      role:    turn.role,
      content: turn.content,
      origin:  TurnOrigin::Stored { id: turn.id, timestamp: turn.timestamp },
    }
  }
}

/// Ordered turns for the current render.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationSession {
  turns: Vec<SessionTurn>,
}

impl ConversationSession {
  /// Seed a session from one full read of the store.
  pub async fn load<S: HistoryStore>(store: &S) -> Result<Self, S::Error> {
    let turns = store.list_chat_turns().await?;
    Ok(Self { turns: turns.into_iter().map(SessionTurn::from).collect() })
  }

  /// An empty session for a render whose history read failed.
  pub fn degraded() -> Self { Self::default() }

  /// Append a turn so it renders without waiting for a reload.
  pub fn append_local(&mut self, turn: impl Into<SessionTurn>) {
    self.turns.push(turn.into());
  }

  pub fn turns(&self) -> &[SessionTurn] { &self.turns }

  pub fn len(&self) -> usize { self.turns.len() }

  pub fn is_empty(&self) -> bool { self.turns.is_empty() }

  pub fn into_turns(self) -> Vec<SessionTurn> { self.turns }
}
