//! In-memory lock store backend for `leaselock`.
//!
//! Coordinates nothing across processes; intended for tests and
//! single-process deployments. Lease expiry uses the tokio clock, so
//! tests can drive it under paused time.

mod store;

pub use store::MemoryLockStore;
