//! Core types for the bank dialog fulfillment backend
//!
//! This crate provides the types shared by every other crate:
//! - Account record model and field addressing
//! - Dialog turn request/response sum types
//! - Lex V2 code-hook wire codec
//! - Record store trait
//! - Error types

pub mod account;
pub mod dialog;
pub mod error;
pub mod lex;
pub mod traits;

pub use account::{AccountField, AccountRecord, AccountType, FieldValue};
pub use dialog::{
    ConfirmationState, DialogRequest, DialogResponse, FulfillmentState, InputMode, IntentName,
    InvocationStage, Message, SessionAttributes, SlotKind, SlotValue, Slots,
};
pub use error::{Error, Result, StoreError};
pub use lex::{LexEvent, LexResponse};
pub use traits::{AccountStore, CasOutcome};
