//! Dialog validation and fulfillment core
//!
//! Features:
//! - Slot format validation
//! - Record lookup and cross-checks against the stored account
//! - Schema-driven state machine shared by every intent
//! - Intent actions (balance quote, debit card replacement)
//! - Dispatcher over the Lex V2 code-hook codec

pub mod actions;
pub mod dispatcher;
pub mod lookup;
pub mod machine;
pub mod response;
pub mod validator;

pub use actions::{format_currency, CardNumberSource, RandomCardNumbers};
pub use dispatcher::{DialogContext, Dispatcher};
pub use lookup::RecordLookup;
pub use machine::{DialogState, IntentMachine};
pub use validator::{
    is_valid_account_number, is_valid_account_type, is_valid_name, is_valid_pin, Validation,
};

use bank_dialog_core::{AccountField, StoreError};
use thiserror::Error;

/// Faults that end a turn without a dialog response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DialogError {
    #[error("Intent with name {0} not supported")]
    UnknownIntent(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transient store errors that outlasted the retry budget
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Record store error: {0}")]
    Store(String),

    #[error("Stored {field} does not match the value written (expected ...{expected}, found ...{found})")]
    WriteVerification {
        field: AccountField,
        expected: String,
        found: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl DialogError {
    /// Caused by the request rather than by this service
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownIntent(_) | Self::InvalidRequest(_))
    }
}

impl From<StoreError> for DialogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Transient(msg) => DialogError::StoreUnavailable(msg),
            other => DialogError::Store(other.to_string()),
        }
    }
}

impl From<bank_dialog_core::Error> for DialogError {
    fn from(err: bank_dialog_core::Error) -> Self {
        match err {
            bank_dialog_core::Error::UnknownIntent(name) => DialogError::UnknownIntent(name),
            bank_dialog_core::Error::InvalidRequest(msg)
            | bank_dialog_core::Error::Serialization(msg) => DialogError::InvalidRequest(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_conversion() {
        assert_eq!(
            DialogError::from(StoreError::Transient("timeout".into())),
            DialogError::StoreUnavailable("timeout".into())
        );
        assert!(matches!(
            DialogError::from(StoreError::Fatal("bad column".into())),
            DialogError::Store(_)
        ));
    }

    #[test]
    fn test_client_errors() {
        let err: DialogError = bank_dialog_core::Error::UnknownIntent("OrderPizza".into()).into();
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Intent with name OrderPizza not supported");
        assert!(!DialogError::StoreUnavailable("x".into()).is_client_error());
    }
}
