use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::log::EventLog;
use crate::repository::{Persisted, Repository, Staged, validate_staged};
use crate::{AggregateId, Result, StoreError, Version};

/// In-memory repository implementation for testing and local wiring.
///
/// Stores the latest state per aggregate and publishes each successful
/// upsert's pending events to the configured stream of an [`EventLog`].
/// The write lock is held across publication so entries of one aggregate
/// reach the stream in version order.
#[derive(Clone)]
pub struct InMemoryRepository<A> {
    stream: String,
    states: Arc<RwLock<HashMap<AggregateId, A>>>,
    log: Arc<dyn EventLog>,
}

impl<A> InMemoryRepository<A> {
    /// Creates a repository publishing to `stream` on the given log.
    pub fn new(stream: impl Into<String>, log: Arc<dyn EventLog>) -> Self {
        Self {
            stream: stream.into(),
            states: Arc::new(RwLock::new(HashMap::new())),
            log,
        }
    }

    /// Returns the name of the outbound stream.
    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Returns the number of persisted aggregates.
    pub async fn count(&self) -> usize {
        self.states.read().await.len()
    }
}

#[async_trait]
impl<A> Repository<A> for InMemoryRepository<A>
where
    A: Persisted + 'static,
{
    async fn find_by_id(&self, id: &AggregateId) -> Result<Option<A>> {
        Ok(self.states.read().await.get(id).cloned())
    }

    async fn upsert(&self, staged: Staged<A>) -> Result<A> {
        validate_staged(&staged)?;
        let id = staged
            .state
            .aggregate_id()
            .ok_or(StoreError::MissingAggregateId)?
            .clone();

        let mut states = self.states.write().await;

        let stored_version = states
            .get(&id)
            .map(|state| state.version())
            .unwrap_or(Version::initial());

        let expected = staged.base_version();
        if stored_version != expected {
            metrics::counter!("repository_conflicts_total").increment(1);
            return Err(StoreError::ConcurrencyConflict {
                aggregate_id: id,
                expected,
                actual: stored_version,
            });
        }

        states.insert(id.clone(), staged.state.clone());

        // Publish while still holding the write guard: a competing upsert
        // for the same aggregate cannot interleave its events.
        for envelope in staged.pending {
            self.log.append(&self.stream, envelope).await?;
        }

        tracing::debug!(aggregate_id = %id, version = %staged.state.version(), "aggregate persisted");
        Ok(staged.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_log::InMemoryEventLog;
    use crate::{EventEnvelope, Version};

    #[derive(Debug, Clone, Default)]
    struct Wallet {
        id: Option<AggregateId>,
        cents: i64,
        version: Version,
    }

    impl Persisted for Wallet {
        fn aggregate_id(&self) -> Option<&AggregateId> {
            self.id.as_ref()
        }

        fn version(&self) -> Version {
            self.version
        }
    }

    fn envelope(id: &AggregateId, version: Version) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(id.clone())
            .aggregate_type("Wallet")
            .event_type("Credited")
            .version(version)
            .payload_raw(serde_json::json!({"cents": 100}))
            .build()
    }

    fn repo() -> (InMemoryRepository<Wallet>, Arc<InMemoryEventLog>) {
        let log = Arc::new(InMemoryEventLog::new());
        (InMemoryRepository::new("wallet-events", log.clone()), log)
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_unknown() {
        let (repo, _) = repo();
        let found = repo.find_by_id(&AggregateId::new()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn upsert_persists_and_publishes() {
        let (repo, log) = repo();
        let id = AggregateId::new();

        let wallet = Wallet {
            id: Some(id.clone()),
            cents: 100,
            version: Version::first(),
        };
        let staged = Staged::new(wallet, vec![envelope(&id, Version::first())]);

        let persisted = repo.upsert(staged).await.unwrap();
        assert_eq!(persisted.version(), Version::first());

        let found = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.cents, 100);
        assert_eq!(log.len("wallet-events").await, 1);
    }

    #[tokio::test]
    async fn upsert_detects_stale_base_version() {
        let (repo, _) = repo();
        let id = AggregateId::new();

        let staged = Staged::new(
            Wallet {
                id: Some(id.clone()),
                cents: 100,
                version: Version::first(),
            },
            vec![envelope(&id, Version::first())],
        );
        repo.upsert(staged).await.unwrap();

        // Same base version again: the writer read version 0 that no longer
        // matches the stored version 1.
        let stale = Staged::new(
            Wallet {
                id: Some(id.clone()),
                cents: 200,
                version: Version::first(),
            },
            vec![envelope(&id, Version::first())],
        );
        let result = repo.upsert(stale).await;
        assert!(matches!(
            result,
            Err(StoreError::ConcurrencyConflict { .. })
        ));

        let found = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.cents, 100);
    }

    #[tokio::test]
    async fn concurrent_upserts_same_base_version_single_winner() {
        let (repo, log) = repo();
        let id = AggregateId::new();

        let staged_a = Staged::new(
            Wallet {
                id: Some(id.clone()),
                cents: 100,
                version: Version::first(),
            },
            vec![envelope(&id, Version::first())],
        );
        let staged_b = Staged::new(
            Wallet {
                id: Some(id.clone()),
                cents: 200,
                version: Version::first(),
            },
            vec![envelope(&id, Version::first())],
        );

        let (a, b) = tokio::join!(repo.upsert(staged_a), repo.upsert(staged_b));

        assert_eq!(
            a.is_ok() as u8 + b.is_ok() as u8,
            1,
            "exactly one upsert must win"
        );
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(
            loser,
            Err(StoreError::ConcurrencyConflict { .. })
        ));
        assert_eq!(log.len("wallet-events").await, 1);
    }

    #[tokio::test]
    async fn sequential_upserts_advance_version() {
        let (repo, log) = repo();
        let id = AggregateId::new();

        repo.upsert(Staged::new(
            Wallet {
                id: Some(id.clone()),
                cents: 100,
                version: Version::first(),
            },
            vec![envelope(&id, Version::first())],
        ))
        .await
        .unwrap();

        repo.upsert(Staged::new(
            Wallet {
                id: Some(id.clone()),
                cents: 300,
                version: Version::new(3),
            },
            vec![envelope(&id, Version::new(2)), envelope(&id, Version::new(3))],
        ))
        .await
        .unwrap();

        let found = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.version(), Version::new(3));
        assert_eq!(log.len("wallet-events").await, 3);
    }
}
