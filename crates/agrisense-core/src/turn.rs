//! Chat turns: one message exchanged in the conversation.
//!
//! A turn is written once and never updated. Ordering is by `timestamp`, with
//! ties broken by the store-assigned `id`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{Error, Result};

/// Who produced a turn. Stored as a lowercase string in the `role` column.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
  User,
  Assistant,
}

impl Role {
  pub fn as_str(self) -> &'static str { self.into() }

  /// Parse a stored role value. Surrounding whitespace and letter case are
  /// normalised; anything else outside the enum is rejected.
  pub fn parse(raw: &str) -> Result<Self> {
    Role::from_str(raw.trim()).map_err(|_| Error::UnknownRole(raw.to_owned()))
  }
}

/// A persisted chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
  pub id:        i64,
  pub role:      Role,
  pub content:   String,
  /// Store-assigned creation time; second resolution.
  pub timestamp: DateTime<Utc>,
}
