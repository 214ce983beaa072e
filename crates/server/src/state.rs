//! Application State
//!
//! Shared state across all handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use bank_dialog_agent::{DialogContext, Dispatcher};
use bank_dialog_config::{IntentsConfig, Settings, StoreBackend};
use bank_dialog_core::AccountStore;
use bank_dialog_persistence::{
    InMemoryAccountStore, RetryPolicy, RetryingStore, ScyllaConfig,
};

use crate::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub dispatcher: Arc<Dispatcher>,
    /// `None` when metrics are disabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Settings, dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Wire store, schemas and dispatcher from settings
    pub async fn from_settings(config: Settings) -> Result<Self, ServerError> {
        let store = build_store(&config).await?;
        let intents = IntentsConfig::load_or_default(config.dialog.intents_path.as_deref())?;
        let context = DialogContext::new(store, intents, config.dialog.bank_name.clone());
        Ok(Self::new(config, Dispatcher::new(context)))
    }

    pub fn store(&self) -> &Arc<dyn AccountStore> {
        self.dispatcher.context().store()
    }
}

/// Build the configured record store, wrapped in the retry policy
pub async fn build_store(config: &Settings) -> Result<Arc<dyn AccountStore>, ServerError> {
    let inner: Arc<dyn AccountStore> = match config.persistence.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory record store; records are not persisted");
            Arc::new(InMemoryAccountStore::new())
        },
        StoreBackend::Scylla => {
            let scylla_config = ScyllaConfig {
                hosts: config.persistence.scylla_hosts.clone(),
                keyspace: config.persistence.keyspace.clone(),
                table: config.persistence.table.clone(),
            };
            let store = bank_dialog_persistence::init(scylla_config).await?;
            tracing::info!(
                hosts = ?config.persistence.scylla_hosts,
                keyspace = %config.persistence.keyspace,
                table = %config.persistence.table,
                "ScyllaDB account store initialized"
            );
            Arc::new(store)
        },
    };

    let retry = &config.retry;
    let policy = RetryPolicy::new(retry.max_attempts, retry.base_delay_ms, retry.max_delay_ms);
    tracing::info!(
        backend = inner.backend_name(),
        max_attempts = policy.max_attempts,
        "Record store ready"
    );

    Ok(Arc::new(RetryingStore::new(inner, policy)))
}
