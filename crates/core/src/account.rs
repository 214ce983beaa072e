//! Account record model
//!
//! Records are created out-of-band and keyed by their 12-digit account
//! number, which never changes. Every other field is addressable through
//! [`AccountField`] so stores and the dialog core can read and write single
//! attributes without knowing the record layout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of deposit account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Checking,
    Savings,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
        }
    }

    /// Parse a spoken or typed account type.
    ///
    /// Case-insensitive, and tolerant of the plural/singular slips callers
    /// commonly make ("checkings", "saving"). No trimming is applied.
    pub fn from_utterance(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "checking" | "checkings" => Some(Self::Checking),
            "savings" | "saving" => Some(Self::Savings),
            _ => None,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addressable attribute of an [`AccountRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountField {
    AccountNumber,
    CardNumber,
    Pin,
    AccountType,
    Balance,
    FirstName,
    LastName,
    Email,
    StreetAddress,
    City,
    State,
    Zipcode,
}

impl AccountField {
    pub const ALL: [AccountField; 12] = [
        Self::AccountNumber,
        Self::CardNumber,
        Self::Pin,
        Self::AccountType,
        Self::Balance,
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::StreetAddress,
        Self::City,
        Self::State,
        Self::Zipcode,
    ];

    /// Column / attribute name used by stores
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccountNumber => "account_number",
            Self::CardNumber => "card_number",
            Self::Pin => "pin",
            Self::AccountType => "account_type",
            Self::Balance => "balance",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Email => "email",
            Self::StreetAddress => "street_address",
            Self::City => "city",
            Self::State => "state",
            Self::Zipcode => "zipcode",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }

    /// Human wording used in caller-facing messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::AccountNumber => "account number",
            Self::CardNumber => "debit card number",
            Self::Pin => "pin number",
            Self::AccountType => "account type",
            Self::Balance => "balance",
            Self::FirstName => "first name",
            Self::LastName => "last name",
            Self::Email => "email address",
            Self::StreetAddress => "street address",
            Self::City => "city",
            Self::State => "state",
            Self::Zipcode => "zip code",
        }
    }

    /// The account number is the record key and is never rewritten.
    pub fn is_mutable(&self) -> bool {
        !matches!(self, Self::AccountNumber)
    }

    /// Whether values compare exactly (digit strings, amounts) rather than
    /// case-insensitively.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::AccountNumber | Self::CardNumber | Self::Pin | Self::Balance | Self::Zipcode
        )
    }
}

impl fmt::Display for AccountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single stored attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Free text, compared case-insensitively
    Text(String),
    /// Numeric identifier kept as a digit string, compared exactly
    Digits(String),
    /// Monetary amount, compared exactly
    Amount(Decimal),
}

impl FieldValue {
    /// Compare a caller-supplied value against the stored one.
    pub fn matches(&self, supplied: &str) -> bool {
        match self {
            FieldValue::Text(stored) => stored.to_lowercase() == supplied.to_lowercase(),
            FieldValue::Digits(stored) => stored == supplied,
            FieldValue::Amount(stored) => supplied
                .parse::<Decimal>()
                .map(|v| v == *stored)
                .unwrap_or(false),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) | FieldValue::Digits(s) => f.write_str(s),
            FieldValue::Amount(d) => write!(f, "{}", d),
        }
    }
}

/// Persisted bank account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_number: String,
    /// Debit card number, rotated when a card is replaced
    pub card_number: String,
    pub pin: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub updated_at: DateTime<Utc>,
}

impl AccountRecord {
    /// Read a single attribute. `None` only for unset optional attributes.
    pub fn field(&self, field: AccountField) -> Option<FieldValue> {
        let value = match field {
            AccountField::AccountNumber => FieldValue::Digits(self.account_number.clone()),
            AccountField::CardNumber => FieldValue::Digits(self.card_number.clone()),
            AccountField::Pin => FieldValue::Digits(self.pin.clone()),
            AccountField::AccountType => FieldValue::Text(self.account_type.as_str().to_string()),
            AccountField::Balance => FieldValue::Amount(self.balance),
            AccountField::FirstName => FieldValue::Text(self.first_name.clone()),
            AccountField::LastName => FieldValue::Text(self.last_name.clone()),
            AccountField::Email => FieldValue::Text(self.email.clone()?),
            AccountField::StreetAddress => FieldValue::Text(self.street_address.clone()),
            AccountField::City => FieldValue::Text(self.city.clone()),
            AccountField::State => FieldValue::Text(self.state.clone()),
            AccountField::Zipcode => FieldValue::Digits(self.zipcode.clone()),
        };
        Some(value)
    }

    /// Overwrite a single attribute from its textual form.
    ///
    /// Rejects writes to the account number and values that do not parse
    /// for typed attributes. `updated_at` is left to the caller.
    pub fn set_field(&mut self, field: AccountField, value: &str) -> Result<(), String> {
        match field {
            AccountField::AccountNumber => {
                return Err("account number is immutable".to_string());
            },
            AccountField::CardNumber => self.card_number = value.to_string(),
            AccountField::Pin => self.pin = value.to_string(),
            AccountField::AccountType => {
                self.account_type = AccountType::from_utterance(value)
                    .ok_or_else(|| format!("invalid account type: {}", value))?;
            },
            AccountField::Balance => {
                self.balance = value
                    .parse::<Decimal>()
                    .map_err(|e| format!("invalid balance {}: {}", value, e))?;
            },
            AccountField::FirstName => self.first_name = value.to_string(),
            AccountField::LastName => self.last_name = value.to_string(),
            AccountField::Email => self.email = Some(value.to_string()),
            AccountField::StreetAddress => self.street_address = value.to_string(),
            AccountField::City => self.city = value.to_string(),
            AccountField::State => self.state = value.to_string(),
            AccountField::Zipcode => self.zipcode = value.to_string(),
        }
        Ok(())
    }

    /// Postal address on file, single line
    pub fn mailing_address(&self) -> String {
        format!(
            "{}, {}, {} {}",
            self.street_address, self.city, self.state, self.zipcode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> AccountRecord {
        AccountRecord {
            account_number: "462604245119".into(),
            card_number: "100200300400".into(),
            pin: "1234".into(),
            account_type: AccountType::Checking,
            balance: Decimal::new(123400, 2),
            first_name: "Maria".into(),
            last_name: "Doe".into(),
            email: Some("maria.doe@gmail.com".into()),
            street_address: "90 Fickleberry Street Apt. 1A".into(),
            city: "New York".into(),
            state: "NY".into(),
            zipcode: "10043".into(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_account_type_misspellings() {
        assert_eq!(AccountType::from_utterance("Checking"), Some(AccountType::Checking));
        assert_eq!(AccountType::from_utterance("CHECKINGS"), Some(AccountType::Checking));
        assert_eq!(AccountType::from_utterance("saving"), Some(AccountType::Savings));
        assert_eq!(AccountType::from_utterance("credit"), None);
        assert_eq!(AccountType::from_utterance(" savings"), None);
    }

    #[test]
    fn test_field_matching() {
        let rec = record();
        assert!(rec.field(AccountField::FirstName).unwrap().matches("MARIA"));
        assert!(rec.field(AccountField::Pin).unwrap().matches("1234"));
        assert!(!rec.field(AccountField::Pin).unwrap().matches("01234"));
        assert!(rec.field(AccountField::Balance).unwrap().matches("1234.00"));
        assert!(!rec.field(AccountField::Balance).unwrap().matches("abc"));
    }

    #[test]
    fn test_missing_email_is_none() {
        let mut rec = record();
        rec.email = None;
        assert_eq!(rec.field(AccountField::Email), None);
    }

    #[test]
    fn test_set_field() {
        let mut rec = record();
        rec.set_field(AccountField::CardNumber, "999988887777").unwrap();
        assert_eq!(rec.card_number, "999988887777");

        rec.set_field(AccountField::Balance, "-10.50").unwrap();
        assert_eq!(rec.balance, Decimal::new(-1050, 2));

        assert!(rec.set_field(AccountField::AccountNumber, "000000000000").is_err());
        assert!(rec.set_field(AccountField::Balance, "lots").is_err());
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in AccountField::ALL {
            assert_eq!(AccountField::from_name(field.as_str()), Some(field));
        }
        assert_eq!(AccountField::from_name("ssn"), None);
    }

    #[test]
    fn test_mailing_address() {
        assert_eq!(
            record().mailing_address(),
            "90 Fickleberry Street Apt. 1A, New York, NY 10043"
        );
    }
}
