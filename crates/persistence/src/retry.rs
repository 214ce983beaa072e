//! Bounded exponential backoff around store calls
//!
//! Only [`StoreError::Transient`] is retried. Missing records and fatal
//! errors are returned on the first occurrence.

use async_trait::async_trait;
use bank_dialog_core::{
    AccountField, AccountRecord, AccountStore, CasOutcome, FieldValue, StoreError,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// Single attempt, no sleeping
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based): base * 2^(attempt-1), capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exp)
            .min(self.max_delay)
    }
}

/// Run `op` until it succeeds, fails non-transiently, or attempts run out
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut op: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    operation,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient store error, retrying"
                );
                metrics::counter!("store_retries_total", "operation" => operation).increment(1);
                tokio::time::sleep(delay).await;
                attempt += 1;
            },
            Err(e) => {
                if e.is_transient() {
                    tracing::error!(operation, attempts = attempt, error = %e, "Store retries exhausted");
                }
                return Err(e);
            },
            Ok(value) => return Ok(value),
        }
    }
}

/// Decorator applying a [`RetryPolicy`] to every call of the wrapped store
pub struct RetryingStore {
    inner: Arc<dyn AccountStore>,
    policy: RetryPolicy,
}

impl RetryingStore {
    pub fn new(inner: Arc<dyn AccountStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl AccountStore for RetryingStore {
    async fn get_item(&self, account_number: &str) -> Result<Option<AccountRecord>, StoreError> {
        retry_with_backoff(&self.policy, "get_item", || self.inner.get_item(account_number)).await
    }

    async fn put_item(&self, record: &AccountRecord) -> Result<(), StoreError> {
        retry_with_backoff(&self.policy, "put_item", || self.inner.put_item(record)).await
    }

    async fn update_field(
        &self,
        account_number: &str,
        field: AccountField,
        value: &str,
    ) -> Result<FieldValue, StoreError> {
        retry_with_backoff(&self.policy, "update_field", || {
            self.inner.update_field(account_number, field, value)
        })
        .await
    }

    async fn compare_and_set(
        &self,
        account_number: &str,
        field: AccountField,
        expected: &str,
        value: &str,
    ) -> Result<CasOutcome, StoreError> {
        retry_with_backoff(&self.policy, "compare_and_set", || {
            self.inner
                .compare_and_set(account_number, field, expected, value)
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls with the given error
    struct FlakyStore {
        failures: u32,
        error: StoreError,
        calls: AtomicU32,
    }

    impl FlakyStore {
        fn new(failures: u32, error: StoreError) -> Self {
            Self {
                failures,
                error,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn tick(&self) -> Result<(), StoreError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(self.error.clone())
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl AccountStore for FlakyStore {
        async fn get_item(&self, _: &str) -> Result<Option<AccountRecord>, StoreError> {
            self.tick().map(|_| None)
        }

        async fn put_item(&self, _: &AccountRecord) -> Result<(), StoreError> {
            self.tick()
        }

        async fn update_field(
            &self,
            _: &str,
            _: AccountField,
            value: &str,
        ) -> Result<FieldValue, StoreError> {
            self.tick().map(|_| FieldValue::Digits(value.to_string()))
        }

        async fn compare_and_set(
            &self,
            _: &str,
            _: AccountField,
            _: &str,
            value: &str,
        ) -> Result<CasOutcome, StoreError> {
            self.tick()
                .map(|_| CasOutcome::Applied(FieldValue::Digits(value.to_string())))
        }

        fn backend_name(&self) -> &'static str {
            "flaky"
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, 1, 1)
    }

    #[test]
    fn test_delay_is_exponential_and_capped() {
        let policy = RetryPolicy::new(5, 50, 300);
        assert_eq!(policy.delay_for(1), Duration::from_millis(50));
        assert_eq!(policy.delay_for(2), Duration::from_millis(100));
        assert_eq!(policy.delay_for(3), Duration::from_millis(200));
        assert_eq!(policy.delay_for(4), Duration::from_millis(300));
        assert_eq!(policy.delay_for(40), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let flaky = Arc::new(FlakyStore::new(2, StoreError::Transient("timeout".into())));
        let store = RetryingStore::new(flaky.clone(), fast_policy(3));

        assert_eq!(store.get_item("462604245119").await, Ok(None));
        assert_eq!(flaky.calls(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let flaky = Arc::new(FlakyStore::new(10, StoreError::Transient("overloaded".into())));
        let store = RetryingStore::new(flaky.clone(), fast_policy(3));

        let err = store
            .update_field("462604245119", AccountField::Pin, "4321")
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(flaky.calls(), 3);
    }

    #[tokio::test]
    async fn test_fatal_errors_are_not_retried() {
        let flaky = Arc::new(FlakyStore::new(10, StoreError::Fatal("bad column".into())));
        let store = RetryingStore::new(flaky.clone(), fast_policy(5));

        assert!(store.get_item("462604245119").await.is_err());
        assert_eq!(flaky.calls(), 1);

        let missing = Arc::new(FlakyStore::new(
            10,
            StoreError::MissingRecord("462604245119".into()),
        ));
        let store = RetryingStore::new(missing.clone(), fast_policy(5));
        assert!(store.get_item("462604245119").await.is_err());
        assert_eq!(missing.calls(), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_policy() {
        let flaky = Arc::new(FlakyStore::new(1, StoreError::Transient("timeout".into())));
        let store = RetryingStore::new(flaky.clone(), RetryPolicy::none());

        assert!(store.get_item("462604245119").await.is_err());
        assert_eq!(flaky.calls(), 1);
        assert_eq!(store.backend_name(), "flaky");
    }
}
