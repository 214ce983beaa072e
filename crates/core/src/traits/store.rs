//! Account record store trait
//!
//! The dialog core only ever talks to the record store through this trait.
//! Implementations live in the persistence crate (ScyllaDB, in-memory).

use async_trait::async_trait;

use crate::account::{AccountField, AccountRecord, FieldValue};
use crate::error::StoreError;

/// Result of a conditional single-field write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    /// The write went through; carries the value read back after it
    Applied(FieldValue),
    /// The stored value no longer matched the expected one; carries the
    /// value found instead
    Conflict(Option<FieldValue>),
}

/// Key-value store of account records, keyed by account number
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Load a record. `Ok(None)` when no record exists for the key.
    async fn get_item(&self, account_number: &str) -> Result<Option<AccountRecord>, StoreError>;

    /// Insert or replace a whole record.
    async fn put_item(&self, record: &AccountRecord) -> Result<(), StoreError>;

    /// Overwrite one attribute of an existing record and return the value
    /// now stored.
    async fn update_field(
        &self,
        account_number: &str,
        field: AccountField,
        value: &str,
    ) -> Result<FieldValue, StoreError>;

    /// Overwrite one attribute only if it still holds `expected`.
    async fn compare_and_set(
        &self,
        account_number: &str,
        field: AccountField,
        expected: &str,
        value: &str,
    ) -> Result<CasOutcome, StoreError>;

    /// Backend name for logs and readiness output
    fn backend_name(&self) -> &'static str;
}
