//! Intent schemas
//!
//! Each intent is described by an ordered slot list. The order is the order
//! in which slots are validated and therefore the order in which problems
//! are reported back to the caller, one at a time.
//!
//! # Example
//!
//! ```yaml
//! intents:
//!   - intent: CheckBalance
//!     slots:
//!       - name: accountNumber
//!         kind: account_number
//!         lookup: account_number
//!         prompt: Please enter your twelve digit account number.
//!         invalid_message: Sorry I did not understand. Please enter your twelve digit account number.
//! ```

use bank_dialog_core::{AccountField, IntentName, SlotKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::ConfigError;

/// One slot of an intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSpec {
    /// Slot name as configured in the dialog engine (e.g. "accountNumber")
    pub name: String,
    pub kind: SlotKind,
    /// Wording used when naming this slot to the caller
    #[serde(default)]
    pub label: Option<String>,
    /// Record attribute the value must match at fulfillment. For the
    /// account number slot this is an existence check.
    #[serde(default)]
    pub lookup: Option<AccountField>,
    #[serde(default = "default_true")]
    pub required: bool,
    /// Prompt used when the slot is missing
    pub prompt: String,
    /// Prompt used when the captured value is malformed
    pub invalid_message: String,
}

fn default_true() -> bool {
    true
}

impl SlotSpec {
    pub fn label(&self) -> &str {
        if let Some(label) = &self.label {
            return label;
        }
        if let Some(field) = self.lookup {
            return field.display_name();
        }
        match self.kind {
            SlotKind::Name => "name",
            SlotKind::Pin => "pin number",
            SlotKind::AccountNumber => "account number",
            SlotKind::AccountType => "account type",
        }
    }
}

/// Yes/no confirmation asked before fulfillment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationSpec {
    pub prompt: String,
    /// Closing message when the caller declines
    pub cancelled_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentSchema {
    pub intent: IntentName,
    #[serde(default)]
    pub slots: Vec<SlotSpec>,
    #[serde(default)]
    pub confirmation: Option<ConfirmationSpec>,
    /// Check account existence while slots are still being collected
    #[serde(default)]
    pub verify_during_dialog: bool,
}

impl IntentSchema {
    pub fn slot(&self, name: &str) -> Option<&SlotSpec> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// The slot holding the account number, if the intent has one
    pub fn account_slot(&self) -> Option<&SlotSpec> {
        self.slots
            .iter()
            .find(|s| s.kind == SlotKind::AccountNumber)
    }

    pub fn required_slots(&self) -> impl Iterator<Item = &SlotSpec> {
        self.slots.iter().filter(|s| s.required)
    }
}

/// All intent schemas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentsConfig {
    pub intents: Vec<IntentSchema>,
}

impl IntentsConfig {
    /// Load schemas from a YAML file and validate them
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let config: IntentsConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        tracing::info!(
            path = %path.display(),
            intents = config.intents.len(),
            "Loaded intent schemas"
        );
        Ok(config)
    }

    /// Load from `path` when given, otherwise use the built-in schemas
    pub fn load_or_default(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn get(&self, intent: IntentName) -> Option<&IntentSchema> {
        self.intents.iter().find(|s| s.intent == intent)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for intent in IntentName::ALL {
            let count = self.intents.iter().filter(|s| s.intent == intent).count();
            if count != 1 {
                return Err(ConfigError::InvalidValue {
                    field: format!("intents.{}", intent),
                    message: format!("Expected exactly one schema, found {}", count),
                });
            }
        }

        for schema in &self.intents {
            let mut seen = HashSet::new();
            for slot in &schema.slots {
                if !seen.insert(slot.name.as_str()) {
                    return Err(ConfigError::InvalidValue {
                        field: format!("intents.{}.slots", schema.intent),
                        message: format!("Duplicate slot name {}", slot.name),
                    });
                }
            }

            let account_slots = schema
                .slots
                .iter()
                .filter(|s| s.kind == SlotKind::AccountNumber)
                .count();
            if account_slots > 1 {
                return Err(ConfigError::InvalidValue {
                    field: format!("intents.{}.slots", schema.intent),
                    message: "At most one account number slot is allowed".to_string(),
                });
            }

            let needs_record = schema.slots.iter().any(|s| s.lookup.is_some())
                || schema.verify_during_dialog
                || schema.intent == IntentName::CheckBalance
                || schema.intent == IntentName::ReplaceCard;
            if needs_record && account_slots == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("intents.{}.slots", schema.intent),
                    message: "Record lookups require an account number slot".to_string(),
                });
            }
        }

        Ok(())
    }
}

fn slot(
    name: &str,
    kind: SlotKind,
    lookup: Option<AccountField>,
    prompt: &str,
    invalid_message: &str,
) -> SlotSpec {
    SlotSpec {
        name: name.to_string(),
        kind,
        label: None,
        lookup,
        required: true,
        prompt: prompt.to_string(),
        invalid_message: invalid_message.to_string(),
    }
}

fn account_type_slot() -> SlotSpec {
    slot(
        "accountType",
        SlotKind::AccountType,
        Some(AccountField::AccountType),
        "Would you like to get the account balance for your checking or savings account?",
        "Sorry I did not understand. Would you like to get the account balance for your \
         checking or savings account?",
    )
}

fn account_number_slot() -> SlotSpec {
    slot(
        "accountNumber",
        SlotKind::AccountNumber,
        Some(AccountField::AccountNumber),
        "Please enter your twelve digit account number.",
        "Sorry I did not understand. Please enter your twelve digit account number.",
    )
}

fn pin_slot() -> SlotSpec {
    slot(
        "pin",
        SlotKind::Pin,
        Some(AccountField::Pin),
        "Please enter your four digit pin number.",
        "Sorry I did not understand. Please enter your four digit pin number.",
    )
}

impl Default for IntentsConfig {
    fn default() -> Self {
        let check_balance = IntentSchema {
            intent: IntentName::CheckBalance,
            slots: vec![account_type_slot(), account_number_slot(), pin_slot()],
            confirmation: None,
            verify_during_dialog: false,
        };

        let replace_card = IntentSchema {
            intent: IntentName::ReplaceCard,
            slots: vec![
                account_number_slot(),
                slot(
                    "firstName",
                    SlotKind::Name,
                    Some(AccountField::FirstName),
                    "Please tell me your first name.",
                    "I did not recognize that, please enter your first name.",
                ),
                slot(
                    "lastName",
                    SlotKind::Name,
                    Some(AccountField::LastName),
                    "Please tell me your last name.",
                    "I did not recognize that, please enter your last name.",
                ),
                pin_slot(),
            ],
            confirmation: Some(ConfirmationSpec {
                prompt: "Your current debit card will be cancelled and a new card will be \
                         mailed to the address on file. Would you like to continue?"
                    .to_string(),
                cancelled_message: "Okay, your debit card has not been replaced. Thank you \
                                    for calling."
                    .to_string(),
            }),
            verify_during_dialog: false,
        };

        let mut followup_type = account_type_slot();
        followup_type.required = false;
        followup_type.lookup = None;
        let followup = IntentSchema {
            intent: IntentName::FollowupCheckBalance,
            slots: vec![followup_type],
            confirmation: None,
            verify_during_dialog: false,
        };

        Self {
            intents: vec![check_balance, replace_card, followup],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = IntentsConfig::default();
        assert!(config.validate().is_ok());

        let check = config.get(IntentName::CheckBalance).unwrap();
        let order: Vec<&str> = check.slots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec!["accountType", "accountNumber", "pin"]);
        assert_eq!(check.account_slot().unwrap().name, "accountNumber");

        let replace = config.get(IntentName::ReplaceCard).unwrap();
        assert!(replace.confirmation.is_some());
        assert_eq!(replace.slot("firstName").unwrap().label(), "first name");
        assert_eq!(replace.slot("pin").unwrap().label(), "pin number");
    }

    #[test]
    fn test_shipped_yaml_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/intents.yaml");
        let loaded = IntentsConfig::load(path).unwrap();
        assert_eq!(loaded, IntentsConfig::default());
    }

    #[test]
    fn test_missing_intent_rejected() {
        let mut config = IntentsConfig::default();
        config
            .intents
            .retain(|s| s.intent != IntentName::FollowupCheckBalance);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_slot_rejected() {
        let mut config = IntentsConfig::default();
        let pin = pin_slot();
        config.intents[0].slots.push(pin);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lookup_without_account_slot_rejected() {
        let mut config = IntentsConfig::default();
        config.intents[0]
            .slots
            .retain(|s| s.kind != SlotKind::AccountNumber);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = IntentsConfig::load("/nonexistent/intents.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_label_override() {
        let mut spec = pin_slot();
        spec.label = Some("security code".into());
        assert_eq!(spec.label(), "security code");
        spec.label = None;
        spec.lookup = None;
        assert_eq!(spec.label(), "pin number");
    }
}
