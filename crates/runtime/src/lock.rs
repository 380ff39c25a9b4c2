//! Distributed per-key mutual exclusion.
//!
//! Commands for one aggregate must serialize their full read-decide-write
//! cycle across process instances; the repository's optimistic-version
//! check is the backstop, this lock is the primary mechanism. Ownership is
//! carried by an explicit [`LockToken`] minted at acquisition — release
//! never relies on task or thread identity, because suspension may resume
//! the holder on a different worker.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};
use tokio::time::{Instant, timeout_at};
use uuid::Uuid;

use crate::retry::RetryPolicy;

/// Default bound on a single acquisition wait.
pub const DEFAULT_ACQUIRE_WAIT: Duration = Duration::from_secs(10);

/// Proof of lock ownership, required to release.
#[derive(Debug)]
pub struct LockToken {
    key: String,
    owner: Uuid,
}

impl LockToken {
    /// Mints a token for `key`. Called by lock providers at acquisition.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            owner: Uuid::new_v4(),
        }
    }

    /// The locked key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The ownership id minted at acquisition.
    pub fn owner(&self) -> Uuid {
        self.owner
    }
}

/// Errors raised by lock providers.
#[derive(Debug, Error)]
pub enum LockError {
    /// The bounded wait elapsed without the lock becoming free.
    #[error("timed out after {waited:?} waiting for lock {key}")]
    Timeout { key: String, waited: Duration },

    /// Every acquisition attempt timed out; the whole call fails.
    #[error("gave up acquiring lock {key} after {attempts} attempts")]
    Exhausted { key: String, attempts: usize },

    /// The presented token does not own the lock.
    #[error("lock {key} is not held by this token")]
    NotHeld { key: String },
}

/// Named mutual-exclusion locks with bounded acquisition.
#[async_trait]
pub trait LockProvider: Send + Sync {
    /// Acquires the lock for `key`, waiting at most `wait`.
    async fn acquire(&self, key: &str, wait: Duration) -> Result<LockToken, LockError>;

    /// Releases a held lock. Fails with [`LockError::NotHeld`] if the
    /// token does not own it.
    async fn release(&self, token: LockToken) -> Result<(), LockError>;
}

/// Acquires `key` with retries on timeout, backing off per `policy`.
pub async fn acquire_with_retry<P>(
    provider: &P,
    key: &str,
    wait: Duration,
    policy: &RetryPolicy,
) -> Result<LockToken, LockError>
where
    P: LockProvider + ?Sized,
{
    let mut attempt = 0;
    loop {
        match provider.acquire(key, wait).await {
            Ok(token) => return Ok(token),
            Err(LockError::Timeout { .. }) if attempt < policy.max_retries => {
                let delay = policy.delay_for_attempt(attempt);
                tracing::debug!(key, attempt, ?delay, "lock busy, backing off");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(LockError::Timeout { .. }) => {
                metrics::counter!("lock_acquisitions_exhausted").increment(1);
                return Err(LockError::Exhausted {
                    key: key.to_string(),
                    attempts: attempt + 1,
                });
            }
            Err(other) => return Err(other),
        }
    }
}

/// Runs `op` while holding the lock for `key`, using the default wait and
/// retry schedule. The lock is released on every exit path of `op`.
pub async fn with_lock<P, T, E, F, Fut>(provider: &P, key: &str, op: F) -> Result<T, E>
where
    P: LockProvider + ?Sized,
    E: From<LockError>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    with_lock_using(
        provider,
        key,
        DEFAULT_ACQUIRE_WAIT,
        &RetryPolicy::lock_default(),
        op,
    )
    .await
}

/// [`with_lock`] with an explicit wait bound and retry schedule.
pub async fn with_lock_using<P, T, E, F, Fut>(
    provider: &P,
    key: &str,
    wait: Duration,
    policy: &RetryPolicy,
    op: F,
) -> Result<T, E>
where
    P: LockProvider + ?Sized,
    E: From<LockError>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let token = acquire_with_retry(provider, key, wait, policy)
        .await
        .map_err(E::from)?;

    let result = op().await;

    if let Err(error) = provider.release(token).await {
        tracing::warn!(key, %error, "failed to release lock");
    }

    result
}

/// In-memory lock provider for testing and single-process wiring.
///
/// One owner id per key; contended acquires park on a [`Notify`] woken by
/// every release.
#[derive(Clone, Default)]
pub struct InMemoryLockProvider {
    owners: Arc<Mutex<HashMap<String, Uuid>>>,
    released: Arc<Notify>,
}

impl InMemoryLockProvider {
    /// Creates a new provider with no held locks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key is currently locked.
    pub async fn is_locked(&self, key: &str) -> bool {
        self.owners.lock().await.contains_key(key)
    }
}

#[async_trait]
impl LockProvider for InMemoryLockProvider {
    async fn acquire(&self, key: &str, wait: Duration) -> Result<LockToken, LockError> {
        let deadline = Instant::now() + wait;
        loop {
            // Register for release wakeups before checking so a release
            // between the check and the await is not missed.
            let notified = self.released.notified();

            {
                let mut owners = self.owners.lock().await;
                if !owners.contains_key(key) {
                    let token = LockToken::new(key);
                    owners.insert(key.to_string(), token.owner());
                    return Ok(token);
                }
            }

            if timeout_at(deadline, notified).await.is_err() {
                return Err(LockError::Timeout {
                    key: key.to_string(),
                    waited: wait,
                });
            }
        }
    }

    async fn release(&self, token: LockToken) -> Result<(), LockError> {
        let mut owners = self.owners.lock().await;
        match owners.get(token.key()) {
            Some(owner) if *owner == token.owner() => {
                owners.remove(token.key());
                drop(owners);
                self.released.notify_waiters();
                Ok(())
            }
            _ => Err(LockError::NotHeld {
                key: token.key().to_string(),
            }),
        }
    }
}
