//! Error type for `haven-store-sqlite`.
//!
//! Write failures are deliberately unclassified: constraint violations,
//! connectivity problems, and malformed rows all surface as [`Error::Database`]
//! after the transaction has rolled back.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
