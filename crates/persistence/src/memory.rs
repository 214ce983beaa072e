//! In-memory account store
//!
//! Records live in a process-local map and are lost on restart. Used by
//! tests, local runs and the default development configuration.

use async_trait::async_trait;
use bank_dialog_core::{
    AccountField, AccountRecord, AccountStore, CasOutcome, FieldValue, StoreError,
};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
pub struct InMemoryAccountStore {
    records: RwLock<HashMap<String, AccountRecord>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = AccountRecord>) -> Self {
        let records = records
            .into_iter()
            .map(|r| (r.account_number.clone(), r))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

fn apply(record: &mut AccountRecord, field: AccountField, value: &str) -> Result<FieldValue, StoreError> {
    record.set_field(field, value).map_err(StoreError::Fatal)?;
    record.updated_at = Utc::now();
    record
        .field(field)
        .ok_or_else(|| StoreError::Fatal(format!("{} is empty after update", field)))
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get_item(&self, account_number: &str) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.records.read().get(account_number).cloned())
    }

    async fn put_item(&self, record: &AccountRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .insert(record.account_number.clone(), record.clone());
        Ok(())
    }

    async fn update_field(
        &self,
        account_number: &str,
        field: AccountField,
        value: &str,
    ) -> Result<FieldValue, StoreError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(account_number)
            .ok_or_else(|| StoreError::MissingRecord(account_number.to_string()))?;
        apply(record, field, value)
    }

    async fn compare_and_set(
        &self,
        account_number: &str,
        field: AccountField,
        expected: &str,
        value: &str,
    ) -> Result<CasOutcome, StoreError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(account_number)
            .ok_or_else(|| StoreError::MissingRecord(account_number.to_string()))?;

        let current = record.field(field);
        let still_expected = current.as_ref().map_or(false, |v| v.matches(expected));
        if !still_expected {
            return Ok(CasOutcome::Conflict(current));
        }

        apply(record, field, value).map(CasOutcome::Applied)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
