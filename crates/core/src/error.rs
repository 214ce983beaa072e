//! Error types

use thiserror::Error;

/// Errors raised while decoding or routing a dialog turn
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Intent with name {0} not supported")]
    UnknownIntent(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by a record store
///
/// A missing record on read is not an error (stores return `Option`).
/// `MissingRecord` is only raised by writes that target an absent key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Service-side hiccup (timeout, overload, unavailable replica). Safe to retry.
    #[error("Transient store error: {0}")]
    Transient(String),

    #[error("No record for account {0}")]
    MissingRecord(String),

    #[error("Store error: {0}")]
    Fatal(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}
