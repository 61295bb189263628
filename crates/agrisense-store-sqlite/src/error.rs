//! Error type for `agrisense-store-sqlite`: the storage error of the system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] agrisense_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A pre-existing table lacks columns this store needs.
  #[error("table {table:?} is missing columns: {}", missing.join(", "))]
  SchemaMismatch {
    table:   &'static str,
    missing: Vec<&'static str>,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
