//! Lease-based mutual exclusion over a shared key-value store.
//!
//! The lock itself holds no local coordination state: every acquire and
//! release is a round trip to an external store, so the same logical
//! resource can be contended from any number of threads, processes, or
//! hosts. Safety rests on two atomic store primitives:
//!
//! - **set-if-absent with TTL** for acquisition, which closes the window
//!   between existence check and write;
//! - **compare-and-delete** for release, which only removes a record whose
//!   value still equals the releasing caller's token.
//!
//! Each successful acquisition carries an unguessable owner token. The TTL
//! (the *lease*) bounds how long a crashed holder can keep a resource
//! locked; the store reclaims the record on its own once the lease elapses.
//!
//! Contention is an expected outcome, not a fault: a busy lock surfaces as
//! `Ok(None)` from [`LockManager::try_acquire`] and a release of a lock no
//! longer held surfaces as `Ok(false)`. There is no fairness or FIFO
//! ordering among contenders, and the lock is not reentrant.
//!
//! Store backends implement the [`LockStore`] trait; see the
//! `leaselock-redis` and `leaselock-memory` crates.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use leaselock::{LockManager, RetryPolicy};
//! use leaselock_memory::MemoryLockStore;
//!
//! let manager = LockManager::new(Arc::new(MemoryLockStore::new()));
//!
//! if let Some(guard) = manager.try_acquire("order-42", Duration::from_secs(30)).await? {
//!     // critical section...
//!     guard.release().await?;
//! }
//! ```

pub mod error;
pub mod lock;
pub mod store;
pub mod testing;

pub use error::LockError;
pub use lock::{LockGuard, LockManager, RetryPolicy};
pub use store::LockStore;
