//! Slot format validation
//!
//! Pure checks on captured values. Nothing here touches the record store;
//! cross-checks against stored data happen at fulfillment.

use bank_dialog_config::SlotSpec;
use bank_dialog_core::{AccountType, SlotKind};

/// Outcome of validating one slot value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid { slot: String, message: String },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Exactly four ASCII digits
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == 4 && all_digits(pin)
}

/// Exactly twelve ASCII digits
pub fn is_valid_account_number(account_number: &str) -> bool {
    account_number.len() == 12 && all_digits(account_number)
}

pub fn is_valid_account_type(account_type: &str) -> bool {
    AccountType::from_utterance(account_type).is_some()
}

/// Non-empty and alphabetic only
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(char::is_alphabetic)
}

pub fn is_valid(kind: SlotKind, value: &str) -> bool {
    match kind {
        SlotKind::Name => is_valid_name(value),
        SlotKind::Pin => is_valid_pin(value),
        SlotKind::AccountNumber => is_valid_account_number(value),
        SlotKind::AccountType => is_valid_account_type(value),
    }
}

pub fn validate_slot(spec: &SlotSpec, value: &str) -> Validation {
    if is_valid(spec.kind, value) {
        Validation::Valid
    } else {
        Validation::Invalid {
            slot: spec.name.clone(),
            message: spec.invalid_message.clone(),
        }
    }
}

/// Canonical form used when comparing against the stored record
pub fn normalize(kind: SlotKind, value: &str) -> String {
    match kind {
        SlotKind::AccountType => AccountType::from_utterance(value)
            .map(|t| t.as_str().to_string())
            .unwrap_or_else(|| value.to_string()),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bank_dialog_config::IntentsConfig;
    use bank_dialog_core::IntentName;

    #[test]
    fn test_pin() {
        assert!(is_valid_pin("1234"));
        assert!(is_valid_pin("0000"));
        assert!(!is_valid_pin(""));
        assert!(!is_valid_pin("123"));
        assert!(!is_valid_pin("12345"));
        assert!(!is_valid_pin("12a4"));
        assert!(!is_valid_pin("-123"));
        // Non-ASCII digits do not count
        assert!(!is_valid_pin("١٢٣٤"));
    }

    #[test]
    fn test_account_number() {
        assert!(is_valid_account_number("462604245119"));
        assert!(!is_valid_account_number("12345"));
        assert!(!is_valid_account_number("4626042451190"));
        assert!(!is_valid_account_number("46260424511x"));
        assert!(!is_valid_account_number(" 62604245119"));
    }

    #[test]
    fn test_account_type() {
        for t in ["checking", "Checkings", "SAVINGS", "saving"] {
            assert!(is_valid_account_type(t), "{}", t);
        }
        for t in ["", "credit", "check", "savingss"] {
            assert!(!is_valid_account_type(t), "{}", t);
        }
    }

    #[test]
    fn test_name() {
        assert!(is_valid_name("Maria"));
        assert!(is_valid_name("José"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Mary Ann"));
        assert!(!is_valid_name("R2D2"));
        assert!(!is_valid_name("O'Neil"));
    }

    #[test]
    fn test_validate_slot_uses_schema_message() {
        let intents = IntentsConfig::default();
        let schema = intents.get(IntentName::CheckBalance).unwrap();
        let spec = schema.slot("accountNumber").unwrap();

        assert_eq!(validate_slot(spec, "462604245119"), Validation::Valid);
        assert_eq!(
            validate_slot(spec, "12345"),
            Validation::Invalid {
                slot: "accountNumber".into(),
                message: "Sorry I did not understand. Please enter your twelve digit account number."
                    .into(),
            }
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(SlotKind::AccountType, "Checkings"), "checking");
        assert_eq!(normalize(SlotKind::AccountType, "saving"), "savings");
        assert_eq!(normalize(SlotKind::Pin, "1234"), "1234");
    }
}
