//! Bank Dialog Server
//!
//! HTTP host for the dialog core: one code-hook event in, one response out.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use self::metrics::{init_metrics, record_error, record_turn};
pub use state::{build_store, AppState};

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bank_dialog_agent::DialogError;
use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Intent with name {0} not supported")]
    UnknownIntent(String),

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::UnknownIntent(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used for the error counter
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::UnknownIntent(_) => "unknown_intent",
            ServerError::StoreUnavailable(_) => "store_unavailable",
            ServerError::Internal(_) => "internal",
            ServerError::Config(_) => "config",
        }
    }
}

impl From<DialogError> for ServerError {
    fn from(err: DialogError) -> Self {
        match err {
            DialogError::InvalidRequest(msg) => ServerError::InvalidRequest(msg),
            DialogError::UnknownIntent(name) => ServerError::UnknownIntent(name),
            DialogError::StoreUnavailable(msg) => ServerError::StoreUnavailable(msg),
            e @ (DialogError::Store(_) | DialogError::WriteVerification { .. }) => {
                ServerError::Internal(e.to_string())
            },
            DialogError::Configuration(msg) => ServerError::Config(msg),
        }
    }
}

impl From<bank_dialog_core::Error> for ServerError {
    fn from(err: bank_dialog_core::Error) -> Self {
        DialogError::from(err).into()
    }
}

impl From<bank_dialog_config::ConfigError> for ServerError {
    fn from(err: bank_dialog_config::ConfigError) -> Self {
        ServerError::Config(err.to_string())
    }
}

impl From<bank_dialog_persistence::PersistenceError> for ServerError {
    fn from(err: bank_dialog_persistence::PersistenceError) -> Self {
        if err.is_transient() {
            ServerError::StoreUnavailable(err.to_string())
        } else {
            ServerError::Internal(err.to_string())
        }
    }
}

impl From<ServerError> for StatusCode {
    fn from(err: ServerError) -> Self {
        err.status()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bank_dialog_core::AccountField;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (DialogError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (DialogError::UnknownIntent("OrderPizza".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (DialogError::StoreUnavailable("timeout".into()), StatusCode::SERVICE_UNAVAILABLE),
            (
                DialogError::WriteVerification {
                    field: AccountField::CardNumber,
                    expected: "7777".into(),
                    found: "0000".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(StatusCode::from(ServerError::from(err)), status);
        }
    }
}
