use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use leaselock::error::LockError;
use leaselock::store::LockStore;

/// Record for a held lock.
#[derive(Debug, Clone)]
struct LockRecord {
    token: String,
    expires_at: Instant,
}

impl LockRecord {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory [`LockStore`] backed by a [`DashMap`].
///
/// Expiry is lazy: a stale record is evicted on the next acquire attempt
/// for the same resource, and the compare operations treat it as absent.
#[derive(Debug, Clone, Default)]
pub struct MemoryLockStore {
    records: Arc<DashMap<String, LockRecord>>,
}

impl MemoryLockStore {
    /// Create an empty in-memory lock store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn set_if_absent(
        &self,
        resource: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, LockError> {
        // Evict a stale record lazily before trying to insert.
        self.records.remove_if(resource, |_, rec| rec.is_expired());

        match self.records.entry(resource.to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(LockRecord {
                    token: token.to_owned(),
                    expires_at: Instant::now() + ttl,
                });
                Ok(true)
            }
        }
    }

    async fn compare_and_delete(&self, resource: &str, token: &str) -> Result<bool, LockError> {
        let removed = self
            .records
            .remove_if(resource, |_, rec| !rec.is_expired() && rec.token == token);
        Ok(removed.is_some())
    }

    async fn compare_and_expire(
        &self,
        resource: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, LockError> {
        let Some(mut rec) = self.records.get_mut(resource) else {
            return Ok(false);
        };
        if rec.is_expired() || rec.token != token {
            return Ok(false);
        }
        rec.expires_at = Instant::now() + ttl;
        Ok(true)
    }

    async fn current_holder(&self, resource: &str) -> Result<Option<String>, LockError> {
        let holder = self
            .records
            .get(resource)
            .filter(|rec| !rec.is_expired())
            .map(|rec| rec.token.clone());
        Ok(holder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaselock::{LockManager, RetryPolicy};

    fn manager() -> LockManager {
        LockManager::new(Arc::new(MemoryLockStore::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn lock_conformance() {
        leaselock::testing::run_lock_conformance_tests(&manager())
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test(start_paused = true)]
    async fn lease_expiry_frees_the_resource() {
        let store = MemoryLockStore::new();
        assert!(
            store
                .set_if_absent("jobs", "t1", Duration::from_secs(1))
                .await
                .unwrap()
        );

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(
            store
                .set_if_absent("jobs", "t2", Duration::from_secs(1))
                .await
                .unwrap(),
            "expired record should not block a new acquire"
        );
        assert_eq!(
            store.current_holder("jobs").await.unwrap().as_deref(),
            Some("t2")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn expired_record_cannot_be_released_or_extended() {
        let store = MemoryLockStore::new();
        store
            .set_if_absent("jobs", "t1", Duration::from_millis(100))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(!store.compare_and_delete("jobs", "t1").await.unwrap());
        assert!(
            !store
                .compare_and_expire("jobs", "t1", Duration::from_secs(1))
                .await
                .unwrap()
        );
        assert!(store.current_holder("jobs").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn extend_pushes_the_expiry_out() {
        let store = MemoryLockStore::new();
        store
            .set_if_absent("jobs", "t1", Duration::from_secs(1))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(
            store
                .compare_and_expire("jobs", "t1", Duration::from_secs(1))
                .await
                .unwrap()
        );

        // Past the original expiry but within the extended lease.
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(
            store.current_holder("jobs").await.unwrap().as_deref(),
            Some("t1")
        );

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(store.current_holder("jobs").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_retry_wins_after_release() {
        let manager = manager();
        let guard = manager
            .try_acquire("contended", Duration::from_secs(10))
            .await
            .unwrap()
            .unwrap();

        let waiter = {
            let manager = manager.clone();
            tokio::spawn(async move {
                manager
                    .acquire(
                        "contended",
                        Duration::from_secs(10),
                        RetryPolicy {
                            attempts: 10,
                            backoff: Duration::from_millis(50),
                        },
                    )
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(guard.release().await.unwrap());

        let won = waiter
            .await
            .unwrap()
            .expect("waiter should win once the lock is released");
        assert!(won.release().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn with_lock_runs_closure_and_releases() {
        let manager = manager();
        let out = manager
            .with_lock("batch", Duration::from_secs(5), || async { 42 })
            .await
            .unwrap();
        assert_eq!(out, Some(42));
        assert!(
            manager.holder("batch").await.unwrap().is_none(),
            "lock should be released after the closure returns"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn with_lock_releases_even_when_closure_fails() {
        let manager = manager();
        let out: Option<Result<(), &str>> = manager
            .with_lock("batch", Duration::from_secs(5), || async {
                Err("business failure")
            })
            .await
            .unwrap();
        assert_eq!(out, Some(Err("business failure")));
        assert!(
            manager.holder("batch").await.unwrap().is_none(),
            "lock should be released on the failure path too"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn with_lock_is_busy_while_held() {
        let manager = manager();
        let guard = manager
            .try_acquire("batch", Duration::from_secs(5))
            .await
            .unwrap()
            .unwrap();

        let out = manager
            .with_lock("batch", Duration::from_secs(5), || async { 42 })
            .await
            .unwrap();
        assert_eq!(out, None, "closure should not run while the lock is held");

        guard.release().await.unwrap();
    }
}
