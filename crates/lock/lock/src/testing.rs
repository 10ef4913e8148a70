use std::time::Duration;

use crate::error::LockError;
use crate::lock::LockManager;

/// Run the full lock conformance test suite against a manager.
///
/// Call this from a backend's test module with a manager built over a
/// fresh store (or a store with a unique key prefix). The expiry test
/// holds a sub-second lease and sleeps past it, so the whole suite runs
/// in well under a second of wall-clock time per backend.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_lock_conformance_tests(manager: &LockManager) -> Result<(), LockError> {
    test_acquire_release_round_trip(manager).await?;
    test_mutual_exclusion(manager).await?;
    test_wrong_token_release_is_a_noop(manager).await?;
    test_idempotent_release(manager).await?;
    test_holder_diagnostics(manager).await?;
    test_lease_expiry_recovery(manager).await?;
    test_contender_handoff(manager).await?;
    Ok(())
}

const LEASE: Duration = Duration::from_secs(10);

async fn test_acquire_release_round_trip(manager: &LockManager) -> Result<(), LockError> {
    let guard = manager.try_acquire("conf-round-trip", LEASE).await?;
    let guard = guard.expect("should acquire uncontested lock");
    assert!(guard.release().await?, "release of held lock should succeed");

    let again = manager.try_acquire("conf-round-trip", LEASE).await?;
    let again = again.expect("resource should be free immediately after release");
    again.release().await?;
    Ok(())
}

async fn test_mutual_exclusion(manager: &LockManager) -> Result<(), LockError> {
    let held = manager
        .try_acquire("conf-mutex", LEASE)
        .await?
        .expect("first acquire should succeed");

    let second = manager.try_acquire("conf-mutex", LEASE).await?;
    assert!(
        second.is_none(),
        "second acquire should be busy while the lock is held"
    );

    held.release().await?;
    Ok(())
}

async fn test_wrong_token_release_is_a_noop(manager: &LockManager) -> Result<(), LockError> {
    let guard = manager
        .try_acquire("conf-wrong-token", LEASE)
        .await?
        .expect("should acquire lock");

    let released = manager.release("conf-wrong-token", "not-the-token").await?;
    assert!(!released, "release with a wrong token should return false");
    assert!(
        guard.is_held().await?,
        "record should be untouched after a wrong-token release"
    );

    assert!(guard.release().await?, "real holder should still release");
    Ok(())
}

async fn test_idempotent_release(manager: &LockManager) -> Result<(), LockError> {
    let guard = manager
        .try_acquire("conf-idempotent", LEASE)
        .await?
        .expect("should acquire lock");
    let token = guard.token().to_owned();

    assert!(guard.release().await?, "first release should return true");
    let second = manager.release("conf-idempotent", &token).await?;
    assert!(!second, "second release should return false, not error");
    Ok(())
}

async fn test_holder_diagnostics(manager: &LockManager) -> Result<(), LockError> {
    assert!(
        manager.holder("conf-holder").await?.is_none(),
        "free lock should report no holder"
    );

    let guard = manager
        .try_acquire("conf-holder", LEASE)
        .await?
        .expect("should acquire lock");
    let holder = manager.holder("conf-holder").await?;
    assert_eq!(
        holder.as_deref(),
        Some(guard.token()),
        "holder should report the guard's token"
    );

    guard.release().await?;
    assert!(
        manager.holder("conf-holder").await?.is_none(),
        "released lock should report no holder"
    );
    Ok(())
}

async fn test_lease_expiry_recovery(manager: &LockManager) -> Result<(), LockError> {
    let abandoned = manager
        .try_acquire("conf-expiry", Duration::from_millis(250))
        .await?
        .expect("should acquire lock");
    // Simulate a holder crash: drop without releasing.
    drop(abandoned);

    tokio::time::sleep(Duration::from_millis(400)).await;

    let recovered = manager
        .try_acquire("conf-expiry", LEASE)
        .await?
        .expect("a different caller should acquire after the lease elapses");
    recovered.release().await?;
    Ok(())
}

/// The two-contender scenario: A wins, B is busy, A releases, B wins with
/// a fresh token.
async fn test_contender_handoff(manager: &LockManager) -> Result<(), LockError> {
    let a = manager
        .try_acquire("conf-order-42", Duration::from_secs(30))
        .await?
        .expect("contender A should acquire first");
    let token_a = a.token().to_owned();

    let b_first = manager
        .try_acquire("conf-order-42", Duration::from_secs(30))
        .await?;
    assert!(b_first.is_none(), "contender B should see busy while A holds");

    assert!(a.release().await?, "A's release should succeed");

    let b = manager
        .try_acquire("conf-order-42", Duration::from_secs(30))
        .await?
        .expect("contender B should acquire after A releases");
    assert_ne!(
        b.token(),
        token_a,
        "B's acquisition should carry a fresh token"
    );
    b.release().await?;
    Ok(())
}
