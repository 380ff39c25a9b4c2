//! Command execution infrastructure.
//!
//! Every command runs the same cycle: take the per-aggregate lock, load
//! the current state, run the pure command method, fold the produced
//! events, and persist with the repository's optimistic-version guard.
//! The lock is the primary serialization mechanism across instances; the
//! version check is defense in depth for any gap between lock scope and
//! the actual write.

use std::sync::Arc;

use common::AggregateId;
use runtime::{LockProvider, with_lock};
use store::{EventEnvelope, Repository, Staged, Version};

use crate::aggregate::{Aggregate, DomainEvent};
use crate::error::DomainError;

/// Trait for commands that can be executed against an aggregate.
///
/// Commands represent an intention to perform an action. They may be
/// rejected if the aggregate's current state doesn't allow the action.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> &AggregateId;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandOutcome<A: Aggregate> {
    /// The persisted aggregate after applying the new events.
    pub aggregate: A,

    /// The events that were generated and published.
    pub events: Vec<A::Event>,

    /// The version of the aggregate after the command.
    pub new_version: Version,
}

/// Runs commands against one aggregate type.
pub struct CommandExecutor<A> {
    repository: Arc<dyn Repository<A>>,
    locks: Arc<dyn LockProvider>,
}

impl<A> CommandExecutor<A>
where
    A: Aggregate + 'static,
    DomainError: From<A::Error>,
{
    /// Creates a new executor over the given repository and lock provider.
    pub fn new(repository: Arc<dyn Repository<A>>, locks: Arc<dyn LockProvider>) -> Self {
        Self { repository, locks }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &Arc<dyn Repository<A>> {
        &self.repository
    }

    /// Loads an aggregate, falling back to the default (empty) state if it
    /// has never been persisted.
    pub async fn load(&self, aggregate_id: &AggregateId) -> Result<A, DomainError> {
        Ok(self
            .repository
            .find_by_id(aggregate_id)
            .await?
            .unwrap_or_default())
    }

    /// Loads an aggregate, returning None if it doesn't exist.
    pub async fn load_existing(&self, aggregate_id: &AggregateId) -> Result<Option<A>, DomainError> {
        Ok(self.repository.find_by_id(aggregate_id).await?)
    }

    /// Executes a command under the aggregate's lock and persists the
    /// resulting events.
    ///
    /// The command function receives the current state and returns either
    /// the events to apply or a business-rule rejection. A rejection leaves
    /// the aggregate untouched and publishes nothing.
    pub async fn execute<F>(
        &self,
        aggregate_id: &AggregateId,
        command_fn: F,
    ) -> Result<CommandOutcome<A>, DomainError>
    where
        F: FnOnce(&A) -> Result<Vec<A::Event>, A::Error> + Send,
    {
        let lock_key = format!("{}:{}", A::aggregate_type(), aggregate_id);

        with_lock(self.locks.as_ref(), &lock_key, || async move {
            let current = self.load(aggregate_id).await?;
            let events = command_fn(&current).map_err(DomainError::from)?;

            if events.is_empty() {
                return Ok(CommandOutcome {
                    new_version: current.version(),
                    aggregate: current,
                    events,
                });
            }

            let mut next = current;
            let mut pending = Vec::with_capacity(events.len());
            for event in &events {
                next.apply(event.clone());
                pending.push(
                    EventEnvelope::builder()
                        .aggregate_id(aggregate_id.clone())
                        .aggregate_type(A::aggregate_type())
                        .event_type(event.event_type())
                        .version(next.version())
                        .payload(event)?
                        .build(),
                );
            }

            let persisted = self.repository.upsert(Staged::new(next, pending)).await?;

            Ok(CommandOutcome {
                new_version: persisted.version(),
                aggregate: persisted,
                events,
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runtime::InMemoryLockProvider;
    use serde::{Deserialize, Serialize};
    use store::{InMemoryEventLog, InMemoryRepository, Persisted};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum TallyEvent {
        Started { id: AggregateId },
        Bumped { by: i64 },
    }

    impl DomainEvent for TallyEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TallyEvent::Started { .. } => "TallyStarted",
                TallyEvent::Bumped { .. } => "TallyBumped",
            }
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Tally {
        id: Option<AggregateId>,
        total: i64,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    enum TallyError {
        #[error("bump must be positive")]
        NonPositiveBump,
    }

    impl From<TallyError> for DomainError {
        fn from(e: TallyError) -> Self {
            DomainError::Serialization(serde_json::Error::io(std::io::Error::other(
                e.to_string(),
            )))
        }
    }

    impl Persisted for Tally {
        fn aggregate_id(&self) -> Option<&AggregateId> {
            self.id.as_ref()
        }

        fn version(&self) -> Version {
            self.version
        }
    }

    impl Aggregate for Tally {
        type Event = TallyEvent;
        type Error = TallyError;

        fn aggregate_type() -> &'static str {
            "Tally"
        }

        fn apply(&mut self, event: Self::Event) {
            match event {
                TallyEvent::Started { id } => self.id = Some(id),
                TallyEvent::Bumped { by } => self.total += by,
            }
            self.version = self.version.next();
        }
    }

    fn executor() -> CommandExecutor<Tally> {
        let log = Arc::new(InMemoryEventLog::new());
        let repository = Arc::new(InMemoryRepository::new("tally-events", log));
        CommandExecutor::new(repository, Arc::new(InMemoryLockProvider::new()))
    }

    #[tokio::test]
    async fn execute_creates_and_persists() {
        let executor = executor();
        let id = AggregateId::new();

        let outcome = executor
            .execute(&id, |_| {
                Ok(vec![TallyEvent::Started { id: AggregateId::new() }])
            })
            .await
            .unwrap();

        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.new_version, Version::first());
    }

    #[tokio::test]
    async fn execute_folds_multiple_events() {
        let executor = executor();
        let id = AggregateId::new();

        let start = id.clone();
        executor
            .execute(&id, move |_| {
                Ok(vec![
                    TallyEvent::Started { id: start },
                    TallyEvent::Bumped { by: 2 },
                    TallyEvent::Bumped { by: 3 },
                ])
            })
            .await
            .unwrap();

        let tally = executor.load_existing(&id).await.unwrap().unwrap();
        assert_eq!(tally.total, 5);
        assert_eq!(tally.version, Version::new(3));
    }

    #[tokio::test]
    async fn rejected_command_persists_nothing() {
        let executor = executor();
        let id = AggregateId::new();

        let result = executor
            .execute(&id, |_| Err::<Vec<TallyEvent>, _>(TallyError::NonPositiveBump))
            .await;
        assert!(result.is_err());
        assert!(executor.load_existing(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_event_list_is_a_no_op() {
        let executor = executor();
        let id = AggregateId::new();

        let outcome = executor.execute(&id, |_| Ok(vec![])).await.unwrap();
        assert!(outcome.events.is_empty());
        assert_eq!(outcome.new_version, Version::initial());
        assert!(executor.load_existing(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_commands_on_one_aggregate_serialize() {
        let executor = Arc::new(executor());
        let id = AggregateId::new();

        let start = id.clone();
        executor
            .execute(&id, move |_| Ok(vec![TallyEvent::Started { id: start }]))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let executor = executor.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                executor
                    .execute(&id, |_| Ok(vec![TallyEvent::Bumped { by: 1 }]))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let tally = executor.load_existing(&id).await.unwrap().unwrap();
        assert_eq!(tally.total, 8);
        assert_eq!(tally.version, Version::new(9));
    }
}
