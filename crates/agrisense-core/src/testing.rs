//! In-memory fakes shared by the unit tests in this crate.

use std::{
  collections::BTreeSet,
  sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use chrono::Utc;

use crate::{
  alert::{AlertRecord, AlertType},
  store::HistoryStore,
  turn::{ChatTurn, Role},
};

#[derive(Debug, thiserror::Error)]
#[error("disk full")]
pub struct DiskFull;

/// A [`HistoryStore`] over two vectors. `fail` makes every call error.
#[derive(Default)]
pub struct MemoryStore {
  chats:  Mutex<Vec<ChatTurn>>,
  alerts: Mutex<Vec<AlertRecord>>,
  fail:   AtomicBool,
}

impl MemoryStore {
  pub fn failing() -> Self {
    let store = Self::default();
    store.set_failing(true);
    store
  }

  pub fn set_failing(&self, fail: bool) { self.fail.store(fail, Ordering::SeqCst); }

  fn check(&self) -> Result<(), DiskFull> {
    if self.fail.load(Ordering::SeqCst) { Err(DiskFull) } else { Ok(()) }
  }
}

impl HistoryStore for MemoryStore {
  type Error = DiskFull;

  async fn append_chat_turn(&self, role: Role, content: String) -> Result<ChatTurn, DiskFull> {
    self.check()?;
    let mut chats = self.chats.lock().unwrap();
    let turn = ChatTurn {
      id: chats.len() as i64 + 1,
      role,
      content,
      timestamp: Utc::now(),
    };
    chats.push(turn.clone());
    Ok(turn)
  }

  async fn append_alert(
    &self,
    alert_type: AlertType,
    message: String,
  ) -> Result<AlertRecord, DiskFull> {
    self.check()?;
    let mut alerts = self.alerts.lock().unwrap();
    let alert = AlertRecord {
      id: alerts.len() as i64 + 1,
      alert_type,
      message,
      timestamp: Utc::now(),
    };
    alerts.push(alert.clone());
    Ok(alert)
  }

  async fn list_chat_turns(&self) -> Result<Vec<ChatTurn>, DiskFull> {
    self.check()?;
    Ok(self.chats.lock().unwrap().clone())
  }

  async fn list_alerts(&self) -> Result<Vec<AlertRecord>, DiskFull> {
    self.check()?;
    Ok(self.alerts.lock().unwrap().clone())
  }

  async fn count_assistant_turns(&self) -> Result<u64, DiskFull> {
    self.check()?;
    let chats = self.chats.lock().unwrap();
    Ok(chats.iter().filter(|t| t.role == Role::Assistant).count() as u64)
  }

  async fn count_alerts(&self) -> Result<u64, DiskFull> {
    self.check()?;
    Ok(self.alerts.lock().unwrap().len() as u64)
  }

  async fn count_distinct_chat_days(&self) -> Result<u64, DiskFull> {
    self.check()?;
    let chats = self.chats.lock().unwrap();
    let days: BTreeSet<_> = chats.iter().map(|t| t.timestamp.date_naive()).collect();
    Ok(days.len() as u64)
  }
}
