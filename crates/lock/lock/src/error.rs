use thiserror::Error;

/// Errors from distributed lock operations.
///
/// Contention outcomes are deliberately not represented here: a busy lock
/// is `Ok(None)` from a single acquire attempt and releasing a lock no
/// longer held is `Ok(false)`. Both are expected results of correct
/// concurrent usage.
#[derive(Debug, Error)]
pub enum LockError {
    /// Caller bug: empty resource name or non-positive lease. Retrying
    /// will not help.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The store could not be reached. Transient; the caller decides
    /// whether to retry.
    #[error("connection error: {0}")]
    Connection(String),

    /// The store rejected or failed a command.
    #[error("backend error: {0}")]
    Backend(String),

    /// The lease could not be extended because the lock is no longer held
    /// by this token.
    #[error("lock expired: {0}")]
    Expired(String),

    /// Bounded retry on acquire ran out of attempts while the lock stayed
    /// contended.
    #[error("lock {resource} still contended after {attempts} attempts")]
    RetriesExhausted { resource: String, attempts: u32 },
}
