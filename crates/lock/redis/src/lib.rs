//! Redis lock store backend for `leaselock`.
//!
//! Acquisition is the `SET key token NX PX ttl` pattern; release and
//! lease extension are two-line Lua scripts that compare the stored
//! token before mutating. Every atomic primitive is a single script
//! invocation, so no check-then-mutate sequence ever spans two round
//! trips from the client.
//!
//! # Consistency
//!
//! Mutual exclusion is strong against a single Redis instance. Under
//! Sentinel or Cluster, replication is asynchronous: a failover right
//! after an acquire can promote a replica that never saw the lock
//! record, letting a second caller in. Use this backend where occasional
//! duplicate execution is tolerable, or point it at a standalone
//! instance.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use leaselock::LockManager;
//! use leaselock_redis::{RedisConfig, RedisLockStore};
//!
//! let store = RedisLockStore::new(&RedisConfig::new("redis://localhost:6379"))?;
//! let manager = LockManager::new(Arc::new(store));
//! let guard = manager.try_acquire("order-42", Duration::from_secs(30)).await?;
//! ```

mod config;
mod scripts;
mod store;

pub use config::RedisConfig;
pub use store::RedisLockStore;
