//! Pluggable backend traits

pub mod store;

pub use store::{AccountStore, CasOutcome};
