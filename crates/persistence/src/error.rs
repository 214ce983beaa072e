//! Persistence errors and their classification

use bank_dialog_core::StoreError;
use scylla::transport::errors::{DbError, NewSessionError, QueryError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Connection error: {0}")]
    Connection(String),

    /// Timeouts, overload and unavailable replicas
    #[error("Store temporarily unavailable: {0}")]
    Unavailable(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("No record for account {0}")]
    NotFound(String),
}

impl PersistenceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Connection(_))
    }
}

fn is_transient_query_error(err: &QueryError) -> bool {
    match err {
        QueryError::TimeoutError | QueryError::RequestTimeout(_) | QueryError::IoError(_) => true,
        QueryError::DbError(db_error, _) => matches!(
            db_error,
            DbError::Overloaded
                | DbError::IsBootstrapping
                | DbError::ServerError
                | DbError::Unavailable { .. }
                | DbError::ReadTimeout { .. }
                | DbError::WriteTimeout { .. }
        ),
        _ => false,
    }
}

impl From<QueryError> for PersistenceError {
    fn from(err: QueryError) -> Self {
        if is_transient_query_error(&err) {
            PersistenceError::Unavailable(err.to_string())
        } else {
            PersistenceError::Query(err.to_string())
        }
    }
}

impl From<NewSessionError> for PersistenceError {
    fn from(err: NewSessionError) -> Self {
        PersistenceError::Connection(err.to_string())
    }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound(account) => StoreError::MissingRecord(account),
            e if e.is_transient() => StoreError::Transient(e.to_string()),
            e => StoreError::Fatal(e.to_string()),
        }
    }
}
