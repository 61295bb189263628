//! [`SqliteStore`]: the SQLite implementation of [`HistoryStore`].

use std::path::Path;

use agrisense_core::{
  alert::{AlertRecord, AlertType},
  store::HistoryStore,
  turn::{ChatTurn, Role},
};

use crate::{
  Error, Result,
  encode::{RawAlert, RawChatTurn, decode_dt},
  schema::{INDEXES, REQUIRED_COLUMNS, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The chat/alert log backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted. Every clone
/// talks to the same connection thread, so writes are serialised.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run [`SqliteStore::initialize`].
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.initialize().await?;
    tracing::debug!(path = %path.display(), "opened history store");
    Ok(store)
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.initialize().await?;
    Ok(store)
  }

  /// Create the tables if absent and verify their columns.
  ///
  /// Safe to call any number of times. A pre-existing table that lacks a
  /// required column yields [`Error::SchemaMismatch`].
  pub async fn initialize(&self) -> Result<()> {
    let present: Vec<Vec<String>> = self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
        let mut tables = Vec::with_capacity(REQUIRED_COLUMNS.len());
        for (table, _) in REQUIRED_COLUMNS {
          let names = stmt
            .query_map(rusqlite::params![table], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          tables.push(names);
        }
        Ok(tables)
      })
      .await?;

    for (&(table, required), names) in REQUIRED_COLUMNS.iter().zip(&present) {
      let missing: Vec<&'static str> = required
        .iter()
        .copied()
        .filter(|col| !names.iter().any(|n| n.eq_ignore_ascii_case(col)))
        .collect();
      if !missing.is_empty() {
        return Err(Error::SchemaMismatch { table, missing });
      }
    }

    self
      .conn
      .call(|conn| {
        conn.execute_batch(INDEXES)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Close the underlying connection. Other clones of this store stop
  /// working once it is closed.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn count(&self, sql: &'static str) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(sql, [], |row| row.get(0))?))
      .await?;
    Ok(u64::try_from(n).unwrap_or_default())
  }
}

// ─── HistoryStore impl ───────────────────────────────────────────────────────

impl HistoryStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn append_chat_turn(&self, role: Role, content: String) -> Result<ChatTurn> {
    let role_str = role.as_str();
    let message  = content.clone();

    let (id, timestamp): (i64, String) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO chats (message, role) VALUES (?1, ?2) RETURNING id, timestamp",
          rusqlite::params![message, role_str],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
      })
      .await?;

    Ok(ChatTurn { id, role, content, timestamp: decode_dt(&timestamp)? })
  }

  async fn append_alert(&self, alert_type: AlertType, message: String) -> Result<AlertRecord> {
    let type_str = alert_type.as_str();
    let text     = message.clone();

    let (id, timestamp): (i64, String) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO alerts (alert_type, message) VALUES (?1, ?2) RETURNING id, timestamp",
          rusqlite::params![type_str, text],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
      })
      .await?;

    Ok(AlertRecord { id, alert_type, message, timestamp: decode_dt(&timestamp)? })
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list_chat_turns(&self) -> Result<Vec<ChatTurn>> {
    let raws: Vec<RawChatTurn> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, message, role, timestamp
           FROM chats
           ORDER BY timestamp ASC, id ASC",
        )?;
        let rows = stmt
          .query_map([], RawChatTurn::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChatTurn::into_turn).collect()
  }

  async fn list_alerts(&self) -> Result<Vec<AlertRecord>> {
    let raws: Vec<RawAlert> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, alert_type, message, timestamp
           FROM alerts
           ORDER BY timestamp ASC, id ASC",
        )?;
        let rows = stmt
          .query_map([], RawAlert::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAlert::into_alert).collect()
  }

  async fn count_assistant_turns(&self) -> Result<u64> {
    // Matches the case/whitespace normalisation applied when decoding roles.
    self
      .count("SELECT COUNT(*) FROM chats WHERE lower(trim(role)) = 'assistant'")
      .await
  }

  async fn count_alerts(&self) -> Result<u64> {
    self.count("SELECT COUNT(*) FROM alerts").await
  }

  async fn count_distinct_chat_days(&self) -> Result<u64> {
    self.count("SELECT COUNT(DISTINCT DATE(timestamp)) FROM chats").await
  }
}
