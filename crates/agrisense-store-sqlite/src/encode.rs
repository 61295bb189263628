//! Decoding helpers between the plain-text SQLite columns and domain types.
//!
//! Timestamps are assigned by SQLite's `CURRENT_TIMESTAMP` default, which
//! yields UTC text of the form `YYYY-MM-DD HH:MM:SS`. RFC 3339 text is also
//! accepted for rows written by other tools.

use agrisense_core::{
  alert::{AlertRecord, AlertType},
  turn::{ChatTurn, Role},
};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{Error, Result};

const SQLITE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  if let Ok(naive) = NaiveDateTime::parse_from_str(s, SQLITE_DATETIME) {
    return Ok(naive.and_utc());
  }
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn required_dt(s: Option<String>) -> Result<DateTime<Utc>> {
  let s = s.ok_or_else(|| Error::DateParse("missing timestamp".to_owned()))?;
  decode_dt(&s)
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `chats` row as read from SQLite. Columns are nullable in the schema.
pub struct RawChatTurn {
  pub id:        i64,
  pub message:   Option<String>,
  pub role:      Option<String>,
  pub timestamp: Option<String>,
}

impl RawChatTurn {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      message:   row.get(1)?,
      role:      row.get(2)?,
      timestamp: row.get(3)?,
    })
  }

  pub fn into_turn(self) -> Result<ChatTurn> {
    Ok(ChatTurn {
      id:        self.id,
      role:      Role::parse(self.role.as_deref().unwrap_or_default())?,
      content:   self.message.unwrap_or_default(),
      timestamp: required_dt(self.timestamp)?,
    })
  }
}

/// An `alerts` row as read from SQLite.
pub struct RawAlert {
  pub id:         i64,
  pub alert_type: Option<String>,
  pub message:    Option<String>,
  pub timestamp:  Option<String>,
}

impl RawAlert {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      alert_type: row.get(1)?,
      message:    row.get(2)?,
      timestamp:  row.get(3)?,
    })
  }

  pub fn into_alert(self) -> Result<AlertRecord> {
    Ok(AlertRecord {
      id:         self.id,
      alert_type: AlertType::parse(self.alert_type.as_deref().unwrap_or_default())?,
      message:    self.message.unwrap_or_default(),
      timestamp:  required_dt(self.timestamp)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Datelike, Timelike};

  use super::*;

  #[test]
  fn decodes_sqlite_current_timestamp() {
    let dt = decode_dt("2025-09-15 16:10:05").unwrap();
    assert_eq!((dt.year(), dt.month(), dt.day()), (2025, 9, 15));
    assert_eq!((dt.hour(), dt.minute(), dt.second()), (16, 10, 5));
  }

  #[test]
  fn decodes_rfc3339() {
    let dt = decode_dt("2025-09-15T21:40:00+05:30").unwrap();
    assert_eq!(dt.hour(), 16);
  }

  #[test]
  fn rejects_garbage() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }

  #[test]
  fn unknown_role_is_rejected() {
    let raw = RawChatTurn {
      id:        1,
      message:   Some("hi".into()),
      role:      Some("system".into()),
      timestamp: Some("2025-09-15 16:10:05".into()),
    };
    assert!(matches!(
      raw.into_turn(),
      Err(Error::Core(agrisense_core::Error::UnknownRole(_)))
    ));
  }
}
