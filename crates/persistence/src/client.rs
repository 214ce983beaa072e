//! ScyllaDB client and connection management

use crate::error::PersistenceError;
use scylla::{Session, SessionBuilder};
use std::sync::Arc;

/// ScyllaDB configuration
#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub hosts: Vec<String>,
    pub keyspace: String,
    pub table: String,
}

/// ScyllaDB client wrapper
///
/// The keyspace and table are provisioned out-of-band; the client only
/// connects.
#[derive(Clone)]
pub struct ScyllaClient {
    session: Arc<Session>,
    config: ScyllaConfig,
}

impl ScyllaClient {
    pub async fn connect(config: ScyllaConfig) -> Result<Self, PersistenceError> {
        tracing::info!(
            hosts = ?config.hosts,
            keyspace = %config.keyspace,
            table = %config.table,
            "Connecting to ScyllaDB"
        );

        let session = SessionBuilder::new()
            .known_nodes(&config.hosts)
            .build()
            .await?;

        Ok(Self {
            session: Arc::new(session),
            config,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fully qualified table name (`keyspace.table`)
    pub fn table(&self) -> String {
        format!("{}.{}", self.config.keyspace, self.config.table)
    }
}
