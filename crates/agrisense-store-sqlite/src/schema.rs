//! SQL schema for the AgriSense SQLite store.
//!
//! The layout matches databases written by earlier AgriSense deployments, so
//! an existing `agrisense.db` opens without migration.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Both tables are strictly append-only.
-- No UPDATE or DELETE is ever issued against them.
CREATE TABLE IF NOT EXISTS chats (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    message   TEXT,
    role      TEXT,                                -- 'user' | 'assistant'
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP   -- UTC, 'YYYY-MM-DD HH:MM:SS'
);

CREATE TABLE IF NOT EXISTS alerts (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    alert_type TEXT,                               -- 'weather'
    message    TEXT,
    timestamp  DATETIME DEFAULT CURRENT_TIMESTAMP
);
";

/// Indexes; run only once the columns have been verified.
pub const INDEXES: &str = "
CREATE INDEX IF NOT EXISTS chats_timestamp_idx ON chats(timestamp, id);
";

/// Columns each table must carry; checked after [`SCHEMA`] runs so that a
/// pre-existing, incompatible table is reported instead of silently used.
pub const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
  ("chats", &["id", "message", "role", "timestamp"]),
  ("alerts", &["id", "alert_type", "message", "timestamp"]),
];
