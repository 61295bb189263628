//! Alert records: append-only log of alert events (currently weather only).

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{Error, Result};

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
pub enum AlertType {
  Weather,
}

impl AlertType {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(raw: &str) -> Result<Self> {
    AlertType::from_str(raw.trim())
      .map_err(|_| Error::UnknownAlertType(raw.to_owned()))
  }
}

/// A persisted alert event. Never updated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
  pub id:         i64,
  pub alert_type: AlertType,
  pub message:    String,
  pub timestamp:  DateTime<Utc>,
}
