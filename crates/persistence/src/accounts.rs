//! Account records in ScyllaDB
//!
//! Expected table layout (provisioned out-of-band):
//!
//! ```cql
//! CREATE TABLE bank.accounts (
//!     account_number TEXT PRIMARY KEY,
//!     card_number TEXT,
//!     pin TEXT,
//!     account_type TEXT,
//!     balance_cents BIGINT,
//!     first_name TEXT,
//!     last_name TEXT,
//!     email TEXT,
//!     street_address TEXT,
//!     city TEXT,
//!     state TEXT,
//!     zipcode TEXT,
//!     updated_at TIMESTAMP
//! )
//! ```
//!
//! Single-field writes use lightweight transactions so that an update never
//! creates a row and a compare-and-set is atomic per account.

use async_trait::async_trait;
use bank_dialog_core::{
    AccountField, AccountRecord, AccountStore, AccountType, CasOutcome, FieldValue, StoreError,
};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use scylla::frame::response::result::{CqlValue, Row};
use scylla::frame::value::CqlTimestamp;
use scylla::QueryResult;

use crate::{PersistenceError, ScyllaClient};

const SELECT_COLUMNS: &str = "account_number, card_number, pin, account_type, balance_cents, \
     first_name, last_name, email, street_address, city, state, zipcode, updated_at";

/// Typed value bound to a single column write
enum ColumnValue {
    Text(String),
    BigInt(i64),
}

fn column_name(field: AccountField) -> &'static str {
    match field {
        AccountField::Balance => "balance_cents",
        other => other.as_str(),
    }
}

fn to_cents(amount: Decimal) -> Result<i64, PersistenceError> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| PersistenceError::InvalidData(format!("balance out of range: {}", amount)))
}

fn column_value(field: AccountField, value: &str) -> Result<ColumnValue, PersistenceError> {
    match field {
        AccountField::Balance => {
            let amount = value
                .parse::<Decimal>()
                .map_err(|e| PersistenceError::InvalidData(format!("balance {}: {}", value, e)))?;
            Ok(ColumnValue::BigInt(to_cents(amount)?))
        },
        AccountField::AccountType => AccountType::from_utterance(value)
            .map(|t| ColumnValue::Text(t.as_str().to_string()))
            .ok_or_else(|| PersistenceError::InvalidData(format!("account type {}", value))),
        _ => Ok(ColumnValue::Text(value.to_string())),
    }
}

/// Read the `[applied]` flag of a lightweight transaction result
fn lwt_applied(result: QueryResult) -> Result<bool, PersistenceError> {
    let row = result
        .rows
        .and_then(|rows| rows.into_iter().next())
        .ok_or_else(|| PersistenceError::InvalidData("conditional update returned no rows".into()))?;

    match row.columns.first() {
        Some(Some(CqlValue::Boolean(applied))) => Ok(*applied),
        _ => Err(PersistenceError::InvalidData(
            "conditional update result has no [applied] column".into(),
        )),
    }
}

/// ScyllaDB implementation of the account store
#[derive(Clone)]
pub struct ScyllaAccountStore {
    client: ScyllaClient,
}

impl ScyllaAccountStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    async fn load(&self, account_number: &str) -> Result<Option<AccountRecord>, PersistenceError> {
        let query = format!(
            "SELECT {} FROM {} WHERE account_number = ?",
            SELECT_COLUMNS,
            self.client.table()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (account_number,))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                return Ok(Some(row_to_record(row)?));
            }
        }

        Ok(None)
    }

    async fn insert(&self, record: &AccountRecord) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {} ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            self.client.table(),
            SELECT_COLUMNS
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (
                    &record.account_number,
                    &record.card_number,
                    &record.pin,
                    record.account_type.as_str(),
                    to_cents(record.balance)?,
                    &record.first_name,
                    &record.last_name,
                    &record.email,
                    &record.street_address,
                    &record.city,
                    &record.state,
                    &record.zipcode,
                    CqlTimestamp(record.updated_at.timestamp_millis()),
                ),
            )
            .await?;

        tracing::debug!(account = %mask(&record.account_number), "Account record written");
        Ok(())
    }

    /// Conditional single-column write. `condition` is appended after `IF`
    /// and may bind one extra text parameter.
    async fn conditional_update(
        &self,
        account_number: &str,
        field: AccountField,
        value: &str,
        condition: &str,
        condition_value: Option<&str>,
    ) -> Result<bool, PersistenceError> {
        if !field.is_mutable() {
            return Err(PersistenceError::InvalidData(format!(
                "{} cannot be updated",
                field
            )));
        }

        let query = format!(
            "UPDATE {} SET {} = ?, updated_at = ? WHERE account_number = ? IF {}",
            self.client.table(),
            column_name(field),
            condition
        );
        let now = CqlTimestamp(Utc::now().timestamp_millis());
        let session = self.client.session();

        let result = match (column_value(field, value)?, condition_value) {
            (ColumnValue::Text(v), None) => {
                session
                    .query_unpaged(query, (v, now, account_number))
                    .await?
            },
            (ColumnValue::Text(v), Some(c)) => {
                session
                    .query_unpaged(query, (v, now, account_number, c))
                    .await?
            },
            (ColumnValue::BigInt(v), None) => {
                session
                    .query_unpaged(query, (v, now, account_number))
                    .await?
            },
            (ColumnValue::BigInt(v), Some(c)) => {
                let expected = match column_value(field, c)? {
                    ColumnValue::BigInt(cents) => cents,
                    ColumnValue::Text(_) => {
                        return Err(PersistenceError::InvalidData(format!(
                            "expected value for {} is not numeric",
                            field
                        )))
                    },
                };
                session
                    .query_unpaged(query, (v, now, account_number, expected))
                    .await?
            },
        };

        lwt_applied(result)
    }

    /// Read one field back after a write
    async fn read_back(
        &self,
        account_number: &str,
        field: AccountField,
    ) -> Result<Option<FieldValue>, PersistenceError> {
        let record = self
            .load(account_number)
            .await?
            .ok_or_else(|| PersistenceError::NotFound(account_number.to_string()))?;
        Ok(record.field(field))
    }
}

#[async_trait]
impl AccountStore for ScyllaAccountStore {
    async fn get_item(&self, account_number: &str) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.load(account_number).await?)
    }

    async fn put_item(&self, record: &AccountRecord) -> Result<(), StoreError> {
        Ok(self.insert(record).await?)
    }

    async fn update_field(
        &self,
        account_number: &str,
        field: AccountField,
        value: &str,
    ) -> Result<FieldValue, StoreError> {
        let applied = self
            .conditional_update(account_number, field, value, "EXISTS", None)
            .await?;
        if !applied {
            return Err(StoreError::MissingRecord(account_number.to_string()));
        }

        tracing::info!(account = %mask(account_number), field = %field, "Account field updated");

        self.read_back(account_number, field)
            .await?
            .ok_or_else(|| StoreError::Fatal(format!("{} is empty after update", field)))
    }

    async fn compare_and_set(
        &self,
        account_number: &str,
        field: AccountField,
        expected: &str,
        value: &str,
    ) -> Result<CasOutcome, StoreError> {
        let condition = format!("{} = ?", column_name(field));
        let applied = self
            .conditional_update(account_number, field, value, &condition, Some(expected))
            .await?;

        let current = self.read_back(account_number, field).await?;
        if applied {
            tracing::info!(account = %mask(account_number), field = %field, "Conditional update applied");
            current
                .map(CasOutcome::Applied)
                .ok_or_else(|| StoreError::Fatal(format!("{} is empty after update", field)))
        } else {
            tracing::warn!(account = %mask(account_number), field = %field, "Conditional update lost a race");
            Ok(CasOutcome::Conflict(current))
        }
    }

    fn backend_name(&self) -> &'static str {
        "scylla"
    }
}

fn row_to_record(row: Row) -> Result<AccountRecord, PersistenceError> {
    let (
        account_number,
        card_number,
        pin,
        account_type,
        balance_cents,
        first_name,
        last_name,
        email,
        street_address,
        city,
        state,
        zipcode,
        updated_at,
    ): (
        String,
        String,
        String,
        String,
        i64,
        String,
        String,
        Option<String>,
        String,
        String,
        String,
        String,
        CqlTimestamp,
    ) = row
        .into_typed()
        .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

    let account_type = AccountType::from_utterance(&account_type).ok_or_else(|| {
        PersistenceError::InvalidData(format!("unknown account type {}", account_type))
    })?;

    Ok(AccountRecord {
        account_number,
        card_number,
        pin,
        account_type,
        balance: Decimal::new(balance_cents, 2),
        first_name,
        last_name,
        email,
        street_address,
        city,
        state,
        zipcode,
        updated_at: DateTime::from_timestamp_millis(updated_at.0).unwrap_or_else(Utc::now),
    })
}

/// Last four digits only, for logs
pub(crate) fn mask(account_number: &str) -> String {
    let tail: String = account_number
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cents_conversion() {
        assert_eq!(to_cents(Decimal::new(123400, 2)).unwrap(), 123400);
        assert_eq!(to_cents(Decimal::new(-105, 1)).unwrap(), -1050);
        // Half a cent rounds away from zero, as spoken amounts do
        assert_eq!(to_cents(Decimal::new(125, 3)).unwrap(), 13);
        assert_eq!(to_cents(Decimal::new(-125, 3)).unwrap(), -13);
        assert_eq!(to_cents(Decimal::new(1005, 4)).unwrap(), 10);
    }

    #[test]
    fn test_column_values() {
        assert!(matches!(
            column_value(AccountField::Balance, "12.5").unwrap(),
            ColumnValue::BigInt(1250)
        ));
        assert!(matches!(
            column_value(AccountField::AccountType, "Checkings").unwrap(),
            ColumnValue::Text(ref t) if t == "checking"
        ));
        assert!(column_value(AccountField::Balance, "n/a").is_err());
        assert_eq!(column_name(AccountField::Balance), "balance_cents");
        assert_eq!(column_name(AccountField::CardNumber), "card_number");
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask("462604245119"), "****5119");
        assert_eq!(mask("12"), "****12");
    }
}
