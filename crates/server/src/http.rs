//! HTTP Endpoints
//!
//! REST API for the dialog engine's code hook plus health checks and metrics.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::time::{Duration, Instant};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use bank_dialog_core::LexResponse;

use crate::metrics::{metrics_handler, record_error, record_turn};
use crate::{AppState, ServerError};

/// Key looked up by the readiness check; never a real account
const READINESS_CHECK_KEY: &str = "000000000000";

pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.timeout_seconds);

    Router::new()
        // Lex V2 code hook
        .route("/api/dialog", post(dialog_turn))
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle one code-hook invocation
async fn dialog_turn(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LexResponse>, ServerError> {
    let start = Instant::now();

    let result = state.dispatcher.handle_json(&body).await.map(|response| {
        record_turn(response.intent().as_str(), response.outcome(), start.elapsed());
        LexResponse::from(&response)
    });

    match result {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            let e = ServerError::from(e);
            record_error(e.kind());
            tracing::warn!(error = %e, status = %e.status(), "Dialog turn rejected");
            Err(e)
        },
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Ready when the record store answers a lookup
async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let backend = state.store().backend_name();
    let lookup = &state.dispatcher.context().lookup;

    let lookup_result = tokio::time::timeout(Duration::from_secs(2), lookup.exists(READINESS_CHECK_KEY)).await;
    let (ready, status) = match lookup_result {
        Ok(Ok(_)) => (true, "ok"),
        Ok(Err(e)) => {
            tracing::warn!(backend, error = %e, "Readiness check failed");
            (false, "error")
        },
        Err(_) => (false, "timeout"),
    };

    let code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(serde_json::json!({
            "ready": ready,
            "store": { "backend": backend, "status": status },
        })),
    )
}
