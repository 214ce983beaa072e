//! Account record stores for the bank dialog backend
//!
//! Provides:
//! - ScyllaDB account store (lightweight transactions for single-field writes)
//! - In-memory account store
//! - Bounded exponential backoff decorator for transient store errors

pub mod accounts;
pub mod client;
pub mod error;
pub mod memory;
pub mod retry;

pub use accounts::ScyllaAccountStore;
pub use client::{ScyllaClient, ScyllaConfig};
pub use error::PersistenceError;
pub use memory::InMemoryAccountStore;
pub use retry::{retry_with_backoff, RetryPolicy, RetryingStore};

/// Connect to ScyllaDB and build the account store
///
/// The keyspace and table must already exist.
pub async fn init(config: ScyllaConfig) -> Result<ScyllaAccountStore, PersistenceError> {
    let client = ScyllaClient::connect(config).await?;
    Ok(ScyllaAccountStore::new(client))
}
