use std::time::Duration;

use async_trait::async_trait;

use crate::error::LockError;

/// Boundary trait for the external key-value store backing the lock.
///
/// Every method must execute as a single atomic unit on the store side.
/// In particular [`compare_and_delete`](Self::compare_and_delete) must
/// never be a get followed by a delete issued from the client: that opens
/// a window where another caller acquires the lock between the two round
/// trips and is then incorrectly evicted.
///
/// Backends render `resource` into their own keyspace (prefixing etc.);
/// callers deal only in logical resource names.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Atomically write `token` under `resource` with the given TTL, only
    /// if no record exists. Returns `true` if the record was created.
    async fn set_if_absent(
        &self,
        resource: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, LockError>;

    /// Atomically delete the record for `resource` only if its current
    /// value equals `token`. Returns `true` if the record was deleted.
    async fn compare_and_delete(&self, resource: &str, token: &str) -> Result<bool, LockError>;

    /// Atomically reset the TTL for `resource` only if its current value
    /// equals `token`. Returns `true` if the lease was extended.
    async fn compare_and_expire(
        &self,
        resource: &str,
        token: &str,
        ttl: Duration,
    ) -> Result<bool, LockError>;

    /// Token currently stored for `resource`, if any. Diagnostics only;
    /// never part of the atomic acquire or release paths.
    async fn current_holder(&self, resource: &str) -> Result<Option<String>, LockError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify object safety.
    fn _assert_dyn_lock_store(_: &dyn LockStore) {}
}
