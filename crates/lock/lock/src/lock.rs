use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::LockError;
use crate::store::LockStore;

/// Bounded retry policy for [`LockManager::acquire`].
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total acquire attempts, including the first. Clamped to at least 1.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

/// Front end for lease-based mutual exclusion over a shared [`LockStore`].
///
/// The manager owns nothing but a handle to the store; all coordination
/// state lives in the store itself. Cloning is cheap and clones contend
/// with each other exactly like separate processes would.
#[derive(Clone)]
pub struct LockManager {
    store: Arc<dyn LockStore>,
}

impl LockManager {
    /// Create a manager over an explicitly constructed store handle.
    pub fn new(store: Arc<dyn LockStore>) -> Self {
        Self { store }
    }

    fn validate_resource(resource: &str) -> Result<(), LockError> {
        if resource.is_empty() {
            return Err(LockError::InvalidArgument(
                "resource name is empty".to_string(),
            ));
        }
        Ok(())
    }

    fn validate(resource: &str, lease: Duration) -> Result<(), LockError> {
        Self::validate_resource(resource)?;
        if lease.is_zero() {
            return Err(LockError::InvalidArgument(format!(
                "lease for {resource} must be positive"
            )));
        }
        Ok(())
    }

    /// Single acquisition attempt: one atomic set-if-absent round trip.
    ///
    /// Returns `Ok(None)` when the lock is currently held by another
    /// token. A fresh owner token is generated per attempt; the returned
    /// guard carries it.
    pub async fn try_acquire(
        &self,
        resource: &str,
        lease: Duration,
    ) -> Result<Option<LockGuard>, LockError> {
        Self::validate(resource, lease)?;

        let token = Uuid::new_v4().to_string();
        let acquired = self.store.set_if_absent(resource, &token, lease).await?;

        if acquired {
            debug!(resource, ?lease, "lock acquired");
            Ok(Some(LockGuard {
                store: Arc::clone(&self.store),
                resource: resource.to_owned(),
                token,
            }))
        } else {
            debug!(resource, "lock busy");
            Ok(None)
        }
    }

    /// Acquire with bounded retry and fixed backoff.
    ///
    /// Exhausting the policy while the lock stays contended returns
    /// [`LockError::RetriesExhausted`], distinct from the fail-fast
    /// `Ok(None)` of [`try_acquire`](Self::try_acquire).
    pub async fn acquire(
        &self,
        resource: &str,
        lease: Duration,
        retry: RetryPolicy,
    ) -> Result<LockGuard, LockError> {
        Self::validate(resource, lease)?;

        let attempts = retry.attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(guard) = self.try_acquire(resource, lease).await? {
                return Ok(guard);
            }
            if attempt < attempts {
                tokio::time::sleep(retry.backoff).await;
            }
        }

        Err(LockError::RetriesExhausted {
            resource: resource.to_owned(),
            attempts,
        })
    }

    /// Safe release by resource and token: one atomic compare-and-delete.
    ///
    /// `Ok(false)` means the record was already gone, or is held by a
    /// different token after a lease expiry and re-acquisition. Either way
    /// nothing was deleted; this is an expected outcome, not a fault.
    pub async fn release(&self, resource: &str, token: &str) -> Result<bool, LockError> {
        Self::validate_resource(resource)?;

        let released = self.store.compare_and_delete(resource, token).await?;
        debug!(resource, released, "lock release");
        Ok(released)
    }

    /// Token currently holding `resource`, if any. Diagnostics only; the
    /// answer can be stale by the time the caller looks at it.
    pub async fn holder(&self, resource: &str) -> Result<Option<String>, LockError> {
        Self::validate_resource(resource)?;
        self.store.current_holder(resource).await
    }

    /// Run `f` under the lock, releasing on the way out no matter what the
    /// closure produced. Returns `Ok(None)` without running `f` when the
    /// lock is busy.
    ///
    /// A failed or lapsed release after `f` completes is logged and the
    /// closure's output is still returned; lease expiry is the safety net
    /// that reclaims the record. A panic inside `f` skips the explicit
    /// release and falls back to the same safety net.
    pub async fn with_lock<F, Fut, T>(
        &self,
        resource: &str,
        lease: Duration,
        f: F,
    ) -> Result<Option<T>, LockError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let Some(guard) = self.try_acquire(resource, lease).await? else {
            return Ok(None);
        };

        let out = f().await;

        match guard.release().await {
            Ok(true) => {}
            Ok(false) => warn!(
                resource,
                "lock no longer held at release; critical section may have outlived its lease"
            ),
            Err(e) => warn!(
                resource,
                error = %e,
                "lock release failed; lease expiry will reclaim the record"
            ),
        }

        Ok(Some(out))
    }
}

impl fmt::Debug for LockManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockManager").finish_non_exhaustive()
    }
}

/// Proof of ownership of an acquired lock.
///
/// Dropping the guard without calling [`release`](Self::release) is safe;
/// the record expires once its lease elapses. Explicit release is
/// preferred for prompt handover to the next contender.
pub struct LockGuard {
    store: Arc<dyn LockStore>,
    resource: String,
    token: String,
}

impl LockGuard {
    /// Logical resource this guard protects.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Opaque token proving ownership. Needed for a raw
    /// [`LockManager::release`] when the guard itself is not in scope at
    /// release time.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Reset the lease to `lease` from now.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Expired`] if the lock is no longer held by
    /// this guard's token.
    pub async fn extend(&self, lease: Duration) -> Result<(), LockError> {
        if lease.is_zero() {
            return Err(LockError::InvalidArgument(format!(
                "lease for {} must be positive",
                self.resource
            )));
        }

        let extended = self
            .store
            .compare_and_expire(&self.resource, &self.token, lease)
            .await?;

        if extended {
            Ok(())
        } else {
            Err(LockError::Expired(format!(
                "lock {} is no longer held by this token",
                self.resource
            )))
        }
    }

    /// Release the lock. Returns `false` when the record had already
    /// expired or been re-acquired by another caller; calling this twice
    /// via raw release yields `true` then `false`.
    pub async fn release(self) -> Result<bool, LockError> {
        let released = self
            .store
            .compare_and_delete(&self.resource, &self.token)
            .await?;
        debug!(resource = %self.resource, released, "lock release");
        Ok(released)
    }

    /// Whether this guard's token still holds the lock. Diagnostics only.
    pub async fn is_held(&self) -> Result<bool, LockError> {
        let holder = self.store.current_holder(&self.resource).await?;
        Ok(holder.as_deref() == Some(self.token.as_str()))
    }
}

impl fmt::Debug for LockGuard {
    // Token deliberately omitted: it must stay unguessable to other callers.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}
