//! Record lookup adapter
//!
//! Thin layer over the account store. A record that does not exist is
//! `None`, never an error; only store faults come back as `Err`.

use bank_dialog_core::{AccountField, AccountRecord, AccountStore, FieldValue, StoreError};
use std::sync::Arc;

#[derive(Clone)]
pub struct RecordLookup {
    store: Arc<dyn AccountStore>,
}

impl RecordLookup {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Load the whole record once so a turn's cross-checks share one read
    pub async fn fetch(&self, account_number: &str) -> Result<Option<AccountRecord>, StoreError> {
        self.store.get_item(account_number).await
    }

    pub async fn get_field(
        &self,
        account_number: &str,
        field: AccountField,
    ) -> Result<Option<FieldValue>, StoreError> {
        Ok(self
            .fetch(account_number)
            .await?
            .and_then(|record| record.field(field)))
    }

    pub async fn exists(&self, account_number: &str) -> Result<bool, StoreError> {
        Ok(self.fetch(account_number).await?.is_some())
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bank_dialog_core::AccountType;
    use bank_dialog_persistence::InMemoryAccountStore;
    use rust_decimal::Decimal;

    fn lookup() -> RecordLookup {
        let record = AccountRecord {
            account_number: "462604245119".into(),
            card_number: "100200300400".into(),
            pin: "1234".into(),
            account_type: AccountType::Savings,
            balance: Decimal::new(50, 0),
            first_name: "Maria".into(),
            last_name: "Doe".into(),
            email: None,
            street_address: "1 Main St".into(),
            city: "Albany".into(),
            state: "NY".into(),
            zipcode: "12207".into(),
            updated_at: chrono::Utc::now(),
        };
        RecordLookup::new(Arc::new(InMemoryAccountStore::with_records([record])))
    }

    #[tokio::test]
    async fn test_exists() {
        let lookup = lookup();
        assert!(lookup.exists("462604245119").await.unwrap());
        assert!(!lookup.exists("000000000000").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_field() {
        let lookup = lookup();
        let pin = lookup
            .get_field("462604245119", AccountField::Pin)
            .await
            .unwrap();
        assert!(pin.unwrap().matches("1234"));

        assert_eq!(
            lookup
                .get_field("462604245119", AccountField::Email)
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            lookup
                .get_field("000000000000", AccountField::Pin)
                .await
                .unwrap(),
            None
        );
    }
}
