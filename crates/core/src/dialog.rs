//! Dialog turn types
//!
//! A turn arrives as a [`DialogRequest`] and leaves as exactly one
//! [`DialogResponse`] variant. Both are built fresh per invocation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque key-value bag the dialog engine carries between turns
pub type SessionAttributes = HashMap<String, String>;

/// Slot name to captured value; `None` for slots not yet filled
pub type Slots = HashMap<String, Option<SlotValue>>;

/// Supported intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentName {
    CheckBalance,
    ReplaceCard,
    FollowupCheckBalance,
}

impl IntentName {
    pub const ALL: [IntentName; 3] = [
        Self::CheckBalance,
        Self::ReplaceCard,
        Self::FollowupCheckBalance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckBalance => "CheckBalance",
            Self::ReplaceCard => "ReplaceCard",
            Self::FollowupCheckBalance => "FollowupCheckBalance",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.as_str() == name)
    }
}

impl fmt::Display for IntentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which code hook invoked us
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvocationStage {
    /// Called on every user input while slots are being collected
    #[serde(rename = "DialogCodeHook")]
    DialogValidation,
    /// Called once all required slots are filled
    #[serde(rename = "FulfillmentCodeHook")]
    Fulfillment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfirmationState {
    #[default]
    None,
    Confirmed,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    Text,
    Speech,
    #[serde(rename = "DTMF")]
    Dtmf,
}

/// Validation family of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Name,
    Pin,
    AccountNumber,
    AccountType,
}

/// A captured slot value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotValue {
    /// What the user actually said or typed
    pub original_value: String,
    /// The engine's resolution of it, when it produced one
    pub interpreted_value: Option<String>,
}

impl SlotValue {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            original_value: value.clone(),
            interpreted_value: Some(value),
        }
    }

    /// Interpreted value, falling back to the original utterance
    pub fn value(&self) -> &str {
        self.interpreted_value
            .as_deref()
            .unwrap_or(&self.original_value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentState {
    Fulfilled,
    Failed,
}

impl FulfillmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fulfilled => "Fulfilled",
            Self::Failed => "Failed",
        }
    }
}

/// Plain-text message played or shown to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
}

impl Message {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// One conversational turn, as handed to the dialog core
#[derive(Debug, Clone)]
pub struct DialogRequest {
    pub intent: IntentName,
    pub stage: InvocationStage,
    pub slots: Slots,
    pub session_attributes: SessionAttributes,
    pub confirmation_state: ConfirmationState,
    pub session_id: Option<String>,
    pub input_transcript: Option<String>,
    pub input_mode: Option<InputMode>,
}

impl DialogRequest {
    pub fn new(intent: IntentName, stage: InvocationStage) -> Self {
        Self {
            intent,
            stage,
            slots: Slots::new(),
            session_attributes: SessionAttributes::new(),
            confirmation_state: ConfirmationState::None,
            session_id: None,
            input_transcript: None,
            input_mode: None,
        }
    }

    /// Builder-style slot fill, mostly for tests and local tooling
    pub fn with_slot(mut self, name: &str, value: &str) -> Self {
        self.slots
            .insert(name.to_string(), Some(SlotValue::new(value)));
        self
    }

    pub fn with_confirmation(mut self, state: ConfirmationState) -> Self {
        self.confirmation_state = state;
        self
    }

    pub fn with_session_attribute(mut self, key: &str, value: &str) -> Self {
        self.session_attributes
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Captured value of a slot, if the slot is present and filled
    pub fn slot_value(&self, name: &str) -> Option<&str> {
        self.slots
            .get(name)
            .and_then(|slot| slot.as_ref())
            .map(SlotValue::value)
    }
}

/// Dialog-control instruction returned to the dialog engine
#[derive(Debug, Clone, PartialEq)]
pub enum DialogResponse {
    /// Re-prompt the caller for one slot
    ElicitSlot {
        session_attributes: SessionAttributes,
        intent: IntentName,
        slots: Slots,
        slot_to_elicit: String,
        message: Message,
    },
    /// Let the engine pick the next step from its own configuration
    Delegate {
        session_attributes: SessionAttributes,
        intent: IntentName,
        slots: Slots,
    },
    /// Ask the caller a yes/no question about the whole intent
    ConfirmIntent {
        session_attributes: SessionAttributes,
        intent: IntentName,
        slots: Slots,
        message: Message,
    },
    /// End the conversation with an outcome
    Close {
        session_attributes: SessionAttributes,
        intent: IntentName,
        fulfillment_state: FulfillmentState,
        message: Message,
    },
}

impl DialogResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            DialogResponse::ElicitSlot { .. } => "ElicitSlot",
            DialogResponse::Delegate { .. } => "Delegate",
            DialogResponse::ConfirmIntent { .. } => "ConfirmIntent",
            DialogResponse::Close { .. } => "Close",
        }
    }

    pub fn intent(&self) -> IntentName {
        match self {
            DialogResponse::ElicitSlot { intent, .. }
            | DialogResponse::Delegate { intent, .. }
            | DialogResponse::ConfirmIntent { intent, .. }
            | DialogResponse::Close { intent, .. } => *intent,
        }
    }

    pub fn message(&self) -> Option<&Message> {
        match self {
            DialogResponse::ElicitSlot { message, .. }
            | DialogResponse::ConfirmIntent { message, .. }
            | DialogResponse::Close { message, .. } => Some(message),
            DialogResponse::Delegate { .. } => None,
        }
    }

    pub fn session_attributes(&self) -> &SessionAttributes {
        match self {
            DialogResponse::ElicitSlot {
                session_attributes, ..
            }
            | DialogResponse::Delegate {
                session_attributes, ..
            }
            | DialogResponse::ConfirmIntent {
                session_attributes, ..
            }
            | DialogResponse::Close {
                session_attributes, ..
            } => session_attributes,
        }
    }

    /// Outcome label used for logging and metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            DialogResponse::Close {
                fulfillment_state, ..
            } => fulfillment_state.as_str(),
            other => other.kind(),
        }
    }
}
