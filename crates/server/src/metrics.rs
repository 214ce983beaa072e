//! Prometheus metrics

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

use crate::{AppState, ServerError};

/// Install the global Prometheus recorder
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Config(format!("metrics recorder: {}", e)))?;

    metrics::describe_counter!("dialog_turns_total", "Dialog turns handled, by intent and outcome");
    metrics::describe_histogram!(
        "dialog_turn_latency_seconds",
        metrics::Unit::Seconds,
        "Time spent handling one dialog turn"
    );
    metrics::describe_counter!("store_retries_total", "Store calls retried after a transient error");
    metrics::describe_counter!("dialog_errors_total", "Dialog turns that ended without a response");

    Ok(handle)
}

pub fn record_turn(intent: &str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "dialog_turns_total",
        "intent" => intent.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("dialog_turn_latency_seconds", "intent" => intent.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_error(kind: &'static str) {
    metrics::counter!("dialog_errors_total", "kind" => kind).increment(1);
}

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            "metrics disabled\n".to_string(),
        ),
    }
}
