//! Intent dispatch
//!
//! [`DialogContext`] is built once at startup and shared by every turn.

use bank_dialog_config::IntentsConfig;
use bank_dialog_core::{AccountStore, DialogRequest, DialogResponse, LexEvent};
use std::sync::Arc;
use std::time::Instant;

use crate::actions::{CardNumberSource, RandomCardNumbers};
use crate::lookup::RecordLookup;
use crate::machine::IntentMachine;
use crate::DialogError;

/// Everything a turn needs besides the request itself
#[derive(Clone)]
pub struct DialogContext {
    pub lookup: RecordLookup,
    pub intents: Arc<IntentsConfig>,
    /// Spoken in closing messages
    pub bank_name: String,
    pub card_numbers: Arc<dyn CardNumberSource>,
}

impl DialogContext {
    pub fn new(
        store: Arc<dyn AccountStore>,
        intents: IntentsConfig,
        bank_name: impl Into<String>,
    ) -> Self {
        Self {
            lookup: RecordLookup::new(store),
            intents: Arc::new(intents),
            bank_name: bank_name.into(),
            card_numbers: Arc::new(RandomCardNumbers),
        }
    }

    pub fn with_card_numbers(mut self, source: Arc<dyn CardNumberSource>) -> Self {
        self.card_numbers = source;
        self
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        self.lookup.store()
    }
}

/// Routes each turn to the state machine of its intent
#[derive(Clone)]
pub struct Dispatcher {
    context: DialogContext,
}

impl Dispatcher {
    pub fn new(context: DialogContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &DialogContext {
        &self.context
    }

    pub async fn handle(&self, request: &DialogRequest) -> Result<DialogResponse, DialogError> {
        let schema = self
            .context
            .intents
            .get(request.intent)
            .ok_or_else(|| DialogError::UnknownIntent(request.intent.to_string()))?;

        tracing::info!(
            intent = %request.intent,
            stage = ?request.stage,
            confirmation = ?request.confirmation_state,
            session_id = request.session_id.as_deref().unwrap_or("-"),
            input_mode = ?request.input_mode,
            "Dialog turn received"
        );

        let start = Instant::now();
        let result = IntentMachine::new(schema, &self.context).run(request).await;

        match &result {
            Ok(response) => tracing::info!(
                intent = %request.intent,
                action = response.kind(),
                outcome = response.outcome(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Dialog turn completed"
            ),
            Err(e) => tracing::error!(
                intent = %request.intent,
                error = %e,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Dialog turn failed"
            ),
        }

        result
    }

    /// Decode and handle one Lex code-hook event. The caller encodes the
    /// response with `LexResponse::from`.
    pub async fn handle_event(&self, event: LexEvent) -> Result<DialogResponse, DialogError> {
        if let Some(bot) = event.bot_name() {
            tracing::debug!(bot, "Code-hook event");
        }
        let request = DialogRequest::try_from(event)?;
        self.handle(&request).await
    }

    pub async fn handle_json(&self, body: &[u8]) -> Result<DialogResponse, DialogError> {
        let event = LexEvent::from_json(body)?;
        self.handle_event(event).await
    }
}
