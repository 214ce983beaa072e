//! Response builders
//!
//! Every builder starts from the incoming request so the session attributes
//! and intent are carried through unchanged.

use bank_dialog_core::{DialogRequest, DialogResponse, FulfillmentState, Message};

/// Re-prompt for `slot`. The slot's current value is cleared so the engine
/// does not keep the rejected input.
pub fn elicit_slot(request: &DialogRequest, slot: &str, message: impl Into<String>) -> DialogResponse {
    let mut slots = request.slots.clone();
    slots.insert(slot.to_string(), None);

    DialogResponse::ElicitSlot {
        session_attributes: request.session_attributes.clone(),
        intent: request.intent,
        slots,
        slot_to_elicit: slot.to_string(),
        message: Message::plain(message),
    }
}

pub fn delegate(request: &DialogRequest) -> DialogResponse {
    DialogResponse::Delegate {
        session_attributes: request.session_attributes.clone(),
        intent: request.intent,
        slots: request.slots.clone(),
    }
}

pub fn confirm_intent(request: &DialogRequest, message: impl Into<String>) -> DialogResponse {
    DialogResponse::ConfirmIntent {
        session_attributes: request.session_attributes.clone(),
        intent: request.intent,
        slots: request.slots.clone(),
        message: Message::plain(message),
    }
}

pub fn close(
    request: &DialogRequest,
    fulfillment_state: FulfillmentState,
    message: impl Into<String>,
) -> DialogResponse {
    DialogResponse::Close {
        session_attributes: request.session_attributes.clone(),
        intent: request.intent,
        fulfillment_state,
        message: Message::plain(message),
    }
}

pub fn fulfilled(request: &DialogRequest, message: impl Into<String>) -> DialogResponse {
    close(request, FulfillmentState::Fulfilled, message)
}

pub fn failed(request: &DialogRequest, message: impl Into<String>) -> DialogResponse {
    close(request, FulfillmentState::Failed, message)
}
