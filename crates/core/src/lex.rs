//! Amazon Lex V2 code-hook wire format
//!
//! Decodes the code-hook event into a [`DialogRequest`] and encodes a
//! [`DialogResponse`] into the response document Lex expects. Only the
//! fields the dialog core reads or writes are modelled; everything else in
//! the event is ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::dialog::{
    ConfirmationState, DialogRequest, DialogResponse, InputMode, IntentName, InvocationStage,
    Message, SessionAttributes, SlotValue, Slots,
};
use crate::error::{Error, Result};

/// Inbound code-hook event
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexEvent {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub input_transcript: Option<String>,
    #[serde(default)]
    pub input_mode: Option<InputMode>,
    pub invocation_source: InvocationStage,
    #[serde(default)]
    pub bot: Option<LexBot>,
    pub session_state: LexSessionState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LexBot {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexSessionState {
    #[serde(default)]
    pub session_attributes: Option<SessionAttributes>,
    pub intent: LexIntent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexIntent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<HashMap<String, Option<LexSlot>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_state: Option<ConfirmationState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(default)]
    pub value: Option<LexSlotValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexSlotValue {
    #[serde(default)]
    pub original_value: Option<String>,
    #[serde(default)]
    pub interpreted_value: Option<String>,
    #[serde(default)]
    pub resolved_values: Vec<String>,
}

impl LexEvent {
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::InvalidRequest(e.to_string()))
    }

    pub fn bot_name(&self) -> Option<&str> {
        self.bot.as_ref().map(|b| b.name.as_str())
    }
}

impl TryFrom<LexEvent> for DialogRequest {
    type Error = Error;

    /// Unknown intent names are rejected here, before any dialog logic runs.
    fn try_from(event: LexEvent) -> Result<Self> {
        let intent_name = event.session_state.intent.name.as_str();
        let intent = IntentName::from_name(intent_name)
            .ok_or_else(|| Error::UnknownIntent(intent_name.to_string()))?;

        let slots: Slots = event
            .session_state
            .intent
            .slots
            .unwrap_or_default()
            .into_iter()
            .map(|(name, slot)| (name, slot.and_then(LexSlot::into_slot_value)))
            .collect();

        Ok(DialogRequest {
            intent,
            stage: event.invocation_source,
            slots,
            session_attributes: event.session_state.session_attributes.unwrap_or_default(),
            confirmation_state: event
                .session_state
                .intent
                .confirmation_state
                .unwrap_or_default(),
            session_id: event.session_id,
            input_transcript: event.input_transcript,
            input_mode: event.input_mode,
        })
    }
}

impl LexSlot {
    fn into_slot_value(self) -> Option<SlotValue> {
        let value = self.value?;
        let original = value
            .original_value
            .or_else(|| value.interpreted_value.clone())?;
        Some(SlotValue {
            original_value: original,
            interpreted_value: value.interpreted_value,
        })
    }

    fn from_slot_value(slot: &SlotValue) -> Self {
        LexSlot {
            shape: Some("Scalar".to_string()),
            value: Some(LexSlotValue {
                original_value: Some(slot.original_value.clone()),
                interpreted_value: slot.interpreted_value.clone(),
                resolved_values: slot.interpreted_value.iter().cloned().collect(),
            }),
        }
    }
}

/// Outbound response document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexResponse {
    pub session_state: LexResponseState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<LexMessage>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexResponseState {
    pub session_attributes: SessionAttributes,
    pub dialog_action: LexDialogAction,
    pub intent: LexIntent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexDialogAction {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_to_elicit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexMessage {
    pub content_type: String,
    pub content: String,
}

impl From<&Message> for LexMessage {
    fn from(message: &Message) -> Self {
        LexMessage {
            content_type: "PlainText".to_string(),
            content: message.content.clone(),
        }
    }
}

fn encode_slots(slots: &Slots) -> HashMap<String, Option<LexSlot>> {
    slots
        .iter()
        .map(|(name, slot)| (name.clone(), slot.as_ref().map(LexSlot::from_slot_value)))
        .collect()
}

impl From<&DialogResponse> for LexResponse {
    fn from(response: &DialogResponse) -> Self {
        let action = |action_type: &str, slot_to_elicit: Option<&String>| LexDialogAction {
            action_type: action_type.to_string(),
            slot_to_elicit: slot_to_elicit.cloned(),
        };

        match response {
            DialogResponse::ElicitSlot {
                session_attributes,
                intent,
                slots,
                slot_to_elicit,
                message,
            } => LexResponse {
                session_state: LexResponseState {
                    session_attributes: session_attributes.clone(),
                    dialog_action: action("ElicitSlot", Some(slot_to_elicit)),
                    intent: LexIntent {
                        name: intent.as_str().to_string(),
                        slots: Some(encode_slots(slots)),
                        confirmation_state: None,
                        state: Some("InProgress".to_string()),
                    },
                },
                messages: Some(vec![message.into()]),
            },
            DialogResponse::Delegate {
                session_attributes,
                intent,
                slots,
            } => LexResponse {
                session_state: LexResponseState {
                    session_attributes: session_attributes.clone(),
                    dialog_action: action("Delegate", None),
                    intent: LexIntent {
                        name: intent.as_str().to_string(),
                        slots: Some(encode_slots(slots)),
                        confirmation_state: None,
                        state: None,
                    },
                },
                messages: None,
            },
            DialogResponse::ConfirmIntent {
                session_attributes,
                intent,
                slots,
                message,
            } => LexResponse {
                session_state: LexResponseState {
                    session_attributes: session_attributes.clone(),
                    dialog_action: action("ConfirmIntent", None),
                    intent: LexIntent {
                        name: intent.as_str().to_string(),
                        slots: Some(encode_slots(slots)),
                        confirmation_state: Some(ConfirmationState::None),
                        state: Some("InProgress".to_string()),
                    },
                },
                messages: Some(vec![message.into()]),
            },
            DialogResponse::Close {
                session_attributes,
                intent,
                fulfillment_state,
                message,
            } => LexResponse {
                session_state: LexResponseState {
                    session_attributes: session_attributes.clone(),
                    dialog_action: action("Close", None),
                    intent: LexIntent {
                        name: intent.as_str().to_string(),
                        slots: None,
                        confirmation_state: None,
                        state: Some(fulfillment_state.as_str().to_string()),
                    },
                },
                messages: Some(vec![message.into()]),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::FulfillmentState;
    use serde_json::json;

    fn event(intent: &str, source: &str) -> serde_json::Value {
        json!({
            "sessionId": "abc-123",
            "inputTranscript": "four six two six",
            "inputMode": "DTMF",
            "invocationSource": source,
            "bot": { "name": "BankBot" },
            "sessionState": {
                "sessionAttributes": { "caller": "+15550100" },
                "intent": {
                    "name": intent,
                    "confirmationState": "None",
                    "state": "InProgress",
                    "slots": {
                        "accountNumber": {
                            "shape": "Scalar",
                            "value": {
                                "originalValue": "462604245119",
                                "interpretedValue": "462604245119",
                                "resolvedValues": ["462604245119"]
                            }
                        },
                        "pin": null,
                        "accountType": { "value": { "originalValue": "Checkings" } }
                    }
                }
            }
        })
    }

    #[test]
    fn test_decode_event() {
        let body = serde_json::to_vec(&event("CheckBalance", "DialogCodeHook")).unwrap();
        let event = LexEvent::from_json(&body).unwrap();
        assert_eq!(event.bot_name(), Some("BankBot"));

        let request = DialogRequest::try_from(event).unwrap();
        assert_eq!(request.intent, IntentName::CheckBalance);
        assert_eq!(request.stage, InvocationStage::DialogValidation);
        assert_eq!(request.input_mode, Some(InputMode::Dtmf));
        assert_eq!(request.slot_value("accountNumber"), Some("462604245119"));
        assert_eq!(request.slot_value("accountType"), Some("Checkings"));
        assert_eq!(request.slot_value("pin"), None);
        assert!(request.slots.contains_key("pin"));
        assert_eq!(
            request.session_attributes.get("caller").map(String::as_str),
            Some("+15550100")
        );
    }

    #[test]
    fn test_decode_rejects_unknown_intent() {
        let body = serde_json::to_vec(&event("OrderPizza", "FulfillmentCodeHook")).unwrap();
        let event = LexEvent::from_json(&body).unwrap();
        let err = DialogRequest::try_from(event).unwrap_err();
        assert_eq!(err, Error::UnknownIntent("OrderPizza".into()));
    }

    #[test]
    fn test_decode_rejects_malformed_body() {
        let err = LexEvent::from_json(b"{\"sessionState\": 1}").unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn test_null_session_attributes() {
        let mut raw = event("ReplaceCard", "FulfillmentCodeHook");
        raw["sessionState"]["sessionAttributes"] = serde_json::Value::Null;
        let event: LexEvent = serde_json::from_value(raw).unwrap();
        let request = DialogRequest::try_from(event).unwrap();
        assert!(request.session_attributes.is_empty());
        assert_eq!(request.stage, InvocationStage::Fulfillment);
    }

    #[test]
    fn test_encode_elicit_slot() {
        let mut slots = Slots::new();
        slots.insert("accountNumber".into(), None);
        slots.insert("pin".into(), Some(SlotValue::new("1234")));
        let response = DialogResponse::ElicitSlot {
            session_attributes: SessionAttributes::new(),
            intent: IntentName::CheckBalance,
            slots,
            slot_to_elicit: "accountNumber".into(),
            message: Message::plain("Please enter your twelve digit account number."),
        };

        let json = serde_json::to_value(LexResponse::from(&response)).unwrap();
        assert_eq!(json["sessionState"]["dialogAction"]["type"], "ElicitSlot");
        assert_eq!(json["sessionState"]["dialogAction"]["slotToElicit"], "accountNumber");
        assert_eq!(json["sessionState"]["intent"]["state"], "InProgress");
        assert!(json["sessionState"]["intent"]["slots"]["accountNumber"].is_null());
        assert_eq!(
            json["sessionState"]["intent"]["slots"]["pin"]["value"]["interpretedValue"],
            "1234"
        );
        assert_eq!(json["messages"][0]["contentType"], "PlainText");
    }

    #[test]
    fn test_encode_close_and_delegate() {
        let close = DialogResponse::Close {
            session_attributes: SessionAttributes::new(),
            intent: IntentName::ReplaceCard,
            fulfillment_state: FulfillmentState::Fulfilled,
            message: Message::plain("done"),
        };
        let json = serde_json::to_value(LexResponse::from(&close)).unwrap();
        assert_eq!(json["sessionState"]["dialogAction"]["type"], "Close");
        assert_eq!(json["sessionState"]["intent"]["state"], "Fulfilled");
        assert_eq!(json["sessionState"]["intent"]["name"], "ReplaceCard");
        assert!(json["sessionState"]["dialogAction"].get("slotToElicit").is_none());

        let delegate = DialogResponse::Delegate {
            session_attributes: SessionAttributes::new(),
            intent: IntentName::CheckBalance,
            slots: Slots::new(),
        };
        let json = serde_json::to_value(LexResponse::from(&delegate)).unwrap();
        assert_eq!(json["sessionState"]["dialogAction"]["type"], "Delegate");
        assert!(json.get("messages").is_none());
    }
}
