//! Error types for `haven-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A report identifier that is empty or not a plain decimal number.
  #[error("invalid report id: {0:?}")]
  InvalidReportId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
