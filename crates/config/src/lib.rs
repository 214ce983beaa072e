//! Configuration management for the bank dialog backend
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (BANK_DIALOG_ prefix, `__` separator)
//!
//! Intent schemas (slot order, validation messages, record cross-checks)
//! are loaded separately from `config/intents.yaml` or fall back to the
//! built-in defaults in [`IntentsConfig::default`].

pub mod intents;
pub mod settings;

pub use intents::{ConfirmationSpec, IntentSchema, IntentsConfig, SlotSpec};
pub use settings::{
    load_settings, load_settings_from, DialogConfig, ObservabilityConfig, PersistenceConfig, RetryConfig,
    RuntimeEnvironment, ServerConfig, Settings, StoreBackend,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
