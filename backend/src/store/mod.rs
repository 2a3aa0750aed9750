//! # Stores
//!
//! Typed access to the SQLite tables.
//!
//! ## Sub-modules:
//! - `templates`: receipt templates and the single-default invariant.
//! - `records`: tenants, the owner and generated receipts.

pub mod records;
pub mod templates;

pub use records::RecordStore;
pub use templates::TemplateStore;

use chrono::{SecondsFormat, Utc};

/// Timestamps are stored as RFC 3339 UTC strings with microseconds, which sort chronologically.
pub(crate) fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Wraps a JSON column decoding failure so it can be returned from a row mapper.
pub(crate) fn json_column_error(index: usize, err: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(err))
}
