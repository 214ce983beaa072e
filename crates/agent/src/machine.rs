//! Per-intent dialog state machine
//!
//! One machine interprets every [`IntentSchema`]:
//!
//! ```text
//! AwaitingSlots -> Validating -> Delegated | ReElicit | AwaitingConfirmation
//!                             -> Fulfilling -> Fulfilled | Failed
//! ```
//!
//! Problems are reported one at a time, in slot declaration order.

use bank_dialog_config::{IntentSchema, SlotSpec};
use bank_dialog_core::{
    AccountField, AccountRecord, ConfirmationState, DialogRequest, DialogResponse,
    FulfillmentState, IntentName, InvocationStage, SlotKind,
};

use crate::actions;
use crate::dispatcher::DialogContext;
use crate::response;
use crate::validator::{self, Validation};
use crate::DialogError;

/// Where a turn sits in the dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogState {
    AwaitingSlots,
    Validating,
    Delegated,
    ReElicit,
    AwaitingConfirmation,
    Fulfilling,
    Fulfilled,
    Failed,
}

impl DialogState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingSlots => "awaiting_slots",
            Self::Validating => "validating",
            Self::Delegated => "delegated",
            Self::ReElicit => "re_elicit",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Fulfilling => "fulfilling",
            Self::Fulfilled => "fulfilled",
            Self::Failed => "failed",
        }
    }

    /// State the dialog is left in by `response`
    pub fn after(response: &DialogResponse) -> Self {
        match response {
            DialogResponse::ElicitSlot { .. } => Self::ReElicit,
            DialogResponse::Delegate { .. } => Self::Delegated,
            DialogResponse::ConfirmIntent { .. } => Self::AwaitingConfirmation,
            DialogResponse::Close {
                fulfillment_state: FulfillmentState::Fulfilled,
                ..
            } => Self::Fulfilled,
            DialogResponse::Close {
                fulfillment_state: FulfillmentState::Failed,
                ..
            } => Self::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Fulfilled | Self::Failed)
    }
}

fn not_in_records(spec: &SlotSpec, value: &str) -> String {
    format!(
        "Sorry! The {} {} does not exist in our database.",
        spec.label(),
        value
    )
}

pub struct IntentMachine<'a> {
    schema: &'a IntentSchema,
    context: &'a DialogContext,
}

impl<'a> IntentMachine<'a> {
    pub fn new(schema: &'a IntentSchema, context: &'a DialogContext) -> Self {
        Self { schema, context }
    }

    pub async fn run(&self, request: &DialogRequest) -> Result<DialogResponse, DialogError> {
        let entry = match request.stage {
            InvocationStage::DialogValidation => DialogState::Validating,
            InvocationStage::Fulfillment => DialogState::Fulfilling,
        };

        tracing::debug!(
            intent = %request.intent,
            state = entry.as_str(),
            slots = %self.loggable_slots(request),
            "Running dialog state machine"
        );

        let response = match request.stage {
            InvocationStage::DialogValidation => self.validate_turn(request).await?,
            InvocationStage::Fulfillment => self.fulfill_turn(request).await?,
        };

        tracing::debug!(
            intent = %request.intent,
            from = entry.as_str(),
            to = DialogState::after(&response).as_str(),
            "Dialog state transition"
        );

        Ok(response)
    }

    /// Slot values for logs, with PINs masked
    fn loggable_slots(&self, request: &DialogRequest) -> String {
        self.schema
            .slots
            .iter()
            .map(|spec| {
                let value = match request.slot_value(&spec.name) {
                    None => "-".to_string(),
                    Some(_) if spec.kind == SlotKind::Pin => "****".to_string(),
                    Some(v) => v.to_string(),
                };
                format!("{}={}", spec.name, value)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// First present slot with a malformed value
    fn first_invalid(&self, request: &DialogRequest) -> Option<DialogResponse> {
        self.schema.slots.iter().find_map(|spec| {
            let value = request.slot_value(&spec.name)?;
            match validator::validate_slot(spec, value) {
                Validation::Valid => None,
                Validation::Invalid { slot, message } => {
                    tracing::info!(intent = %request.intent, slot = %slot, "Slot value rejected");
                    Some(response::elicit_slot(request, &slot, message))
                },
            }
        })
    }

    fn first_missing(&self, request: &DialogRequest) -> Option<&'a SlotSpec> {
        self.schema
            .required_slots()
            .find(|spec| request.slot_value(&spec.name).is_none())
    }

    async fn validate_turn(&self, request: &DialogRequest) -> Result<DialogResponse, DialogError> {
        if let Some(response) = self.first_invalid(request) {
            return Ok(response);
        }

        if self.schema.verify_during_dialog {
            if let Some(response) = self.verify_against_record(request).await? {
                return Ok(response);
            }
        }

        if let Some(confirmation) = &self.schema.confirmation {
            match request.confirmation_state {
                ConfirmationState::Denied => {
                    return Ok(response::failed(request, &confirmation.cancelled_message));
                },
                ConfirmationState::None if self.first_missing(request).is_none() => {
                    return Ok(response::confirm_intent(request, &confirmation.prompt));
                },
                _ => {},
            }
        }

        Ok(response::delegate(request))
    }

    async fn fulfill_turn(&self, request: &DialogRequest) -> Result<DialogResponse, DialogError> {
        if let Some(response) = self.first_invalid(request) {
            return Ok(response);
        }

        if let Some(spec) = self.first_missing(request) {
            return Ok(response::elicit_slot(request, &spec.name, &spec.prompt));
        }

        if let Some(confirmation) = &self.schema.confirmation {
            if request.confirmation_state == ConfirmationState::Denied {
                return Ok(response::failed(request, &confirmation.cancelled_message));
            }
        }

        let account_spec = match self.schema.account_slot() {
            Some(spec) => spec,
            None => return self.fulfill_without_record(request),
        };
        let account_number = match request.slot_value(&account_spec.name) {
            Some(value) => value,
            None => {
                return Ok(response::elicit_slot(
                    request,
                    &account_spec.name,
                    &account_spec.prompt,
                ))
            },
        };

        let record = match self.context.lookup.fetch(account_number).await? {
            Some(record) => record,
            None => {
                tracing::info!(intent = %request.intent, "No record for supplied account number");
                return Ok(response::failed(
                    request,
                    not_in_records(account_spec, account_number),
                ));
            },
        };

        if let Some(response) = self.cross_check(request, &record) {
            return Ok(response);
        }

        self.fulfill_with_record(request, &record).await
    }

    /// Early record checks while slots are still being collected: the
    /// account must exist and every other collected slot must match it.
    async fn verify_against_record(
        &self,
        request: &DialogRequest,
    ) -> Result<Option<DialogResponse>, DialogError> {
        let spec = match self.schema.account_slot() {
            Some(spec) => spec,
            None => return Ok(None),
        };
        let account_number = match request.slot_value(&spec.name) {
            Some(value) => value,
            None => return Ok(None),
        };

        let record = match self.context.lookup.fetch(account_number).await? {
            Some(record) => record,
            None => {
                let message = format!(
                    "Sorry but the {} {} does not exist in our database. {}",
                    spec.label(),
                    account_number,
                    spec.prompt
                );
                return Ok(Some(response::elicit_slot(request, &spec.name, message)));
            },
        };

        Ok(self.first_mismatch(request, &record).map(|(spec, value)| {
            let message = format!(
                "Sorry but the {} {} is incorrect. {}",
                spec.label(),
                value,
                spec.prompt
            );
            response::elicit_slot(request, &spec.name, message)
        }))
    }

    /// First collected slot, in declaration order, whose value disagrees with
    /// the record field it names. The account number itself is skipped.
    fn first_mismatch<'r>(
        &self,
        request: &'r DialogRequest,
        record: &AccountRecord,
    ) -> Option<(&'a SlotSpec, &'r str)> {
        let schema: &'a IntentSchema = self.schema;
        for spec in &schema.slots {
            let field = match spec.lookup {
                Some(AccountField::AccountNumber) | None => continue,
                Some(field) => field,
            };
            let value = match request.slot_value(&spec.name) {
                Some(value) => value,
                None => continue,
            };

            let supplied = validator::normalize(spec.kind, value);
            let matches = record
                .field(field)
                .map_or(false, |stored| stored.matches(&supplied));
            if !matches {
                tracing::info!(
                    intent = %request.intent,
                    slot = %spec.name,
                    field = %field,
                    "Slot does not match stored record"
                );
                return Some((spec, value));
            }
        }
        None
    }

    /// Compare every slot that names a record field against the record
    fn cross_check(&self, request: &DialogRequest, record: &AccountRecord) -> Option<DialogResponse> {
        self.first_mismatch(request, record)
            .map(|(spec, value)| response::failed(request, not_in_records(spec, value)))
    }

    async fn fulfill_with_record(
        &self,
        request: &DialogRequest,
        record: &AccountRecord,
    ) -> Result<DialogResponse, DialogError> {
        match self.schema.intent {
            IntentName::CheckBalance => Ok(actions::check_balance(
                request,
                record,
                &self.context.bank_name,
            )),
            IntentName::ReplaceCard => {
                actions::replace_card(
                    self.context.lookup.store().as_ref(),
                    self.context.card_numbers.as_ref(),
                    request,
                    record,
                )
                .await
            },
            IntentName::FollowupCheckBalance => Ok(response::fulfilled(
                request,
                actions::followup_message(&self.context.bank_name),
            )),
        }
    }

    fn fulfill_without_record(&self, request: &DialogRequest) -> Result<DialogResponse, DialogError> {
        match self.schema.intent {
            IntentName::FollowupCheckBalance => Ok(response::fulfilled(
                request,
                actions::followup_message(&self.context.bank_name),
            )),
            intent @ (IntentName::CheckBalance | IntentName::ReplaceCard) => Err(
                DialogError::Configuration(format!("{} has no account number slot", intent)),
            ),
        }
    }
}
