use async_trait::async_trait;

use crate::{AggregateId, EventEnvelope, Result, StoreError, Version};

/// The minimal view of an aggregate the repository needs: identity and
/// the current (folded) version.
pub trait Persisted: Clone + Send + Sync {
    /// Returns the aggregate's identifier, or None before the first event.
    fn aggregate_id(&self) -> Option<&AggregateId>;

    /// Returns the aggregate's current version.
    fn version(&self) -> Version;
}

/// An aggregate state paired with the events that produced it but are not
/// yet durable.
///
/// Pending events exist only between command execution and a successful
/// upsert; they are never stored state. `upsert` consumes the value, so a
/// persisted snapshot can never be re-submitted with stale pending events.
#[derive(Debug)]
pub struct Staged<A> {
    /// The aggregate state after folding the pending events.
    pub state: A,

    /// Events applied by the command but not yet persisted or published.
    pub pending: Vec<EventEnvelope>,
}

impl<A: Persisted> Staged<A> {
    /// Pairs a folded state with its newly-applied events.
    pub fn new(state: A, pending: Vec<EventEnvelope>) -> Self {
        Self { state, pending }
    }

    /// The version the caller last read: the folded version minus the
    /// number of pending events. This is the value the conditional write
    /// is keyed on.
    pub fn base_version(&self) -> Version {
        self.state.version().minus(self.pending.len())
    }
}

/// Validates a staged snapshot before the conditional write.
///
/// All pending envelopes must target the staged aggregate and carry
/// sequential versions ending at the staged state's version.
pub fn validate_staged<A: Persisted>(staged: &Staged<A>) -> Result<()> {
    let id = staged
        .state
        .aggregate_id()
        .ok_or(StoreError::MissingAggregateId)?;

    if staged.pending.is_empty() {
        return Err(StoreError::InvalidPending(
            "staged snapshot has no pending events".to_string(),
        ));
    }

    let mut expected = staged.base_version();
    for envelope in &staged.pending {
        if &envelope.aggregate_id != id {
            return Err(StoreError::InvalidPending(format!(
                "pending event targets aggregate {}, staged state is {}",
                envelope.aggregate_id, id
            )));
        }
        expected = expected.next();
        if envelope.version != expected {
            return Err(StoreError::InvalidPending(format!(
                "pending event versions must be sequential: expected {}, got {}",
                expected, envelope.version
            )));
        }
    }

    Ok(())
}

/// Current-state storage for one aggregate type.
///
/// `upsert` performs a conditional write keyed on [`Staged::base_version`]:
/// it fails with [`StoreError::ConcurrencyConflict`] if the stored version
/// differs, and on success publishes the pending events to the aggregate's
/// outbound stream exactly once. No two concurrent upserts against the same
/// base version may both succeed.
#[async_trait]
pub trait Repository<A: Persisted>: Send + Sync {
    /// Loads the current state of an aggregate, or None if it has never
    /// been persisted.
    async fn find_by_id(&self, id: &AggregateId) -> Result<Option<A>>;

    /// Conditionally writes the staged state and publishes its pending
    /// events. Returns the persisted state.
    async fn upsert(&self, staged: Staged<A>) -> Result<A>;
}
