//! Core aggregate and domain event traits.

use serde::{Serialize, de::DeserializeOwned};
use store::Persisted;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and named in past tense.
pub trait DomainEvent:
    Serialize + DeserializeOwned + Send + Sync + Clone + std::fmt::Debug
{
    /// Returns the event type name.
    ///
    /// Used for envelope tagging and stream filtering.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates whose state changes only by folding events.
///
/// Command methods live on the concrete types and are pure: current state
/// in, `Result<Vec<Event>, Error>` out, with no mutation. The fold
/// ([`apply`](Aggregate::apply)) is total and deterministic, and bumps the
/// version by exactly 1 per event — never per command — so a replayed
/// stream and a live session always land on the same version.
pub trait Aggregate: Persisted + Default {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this aggregate's commands can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name.
    ///
    /// Used for envelope tagging and lock key namespacing.
    fn aggregate_type() -> &'static str;

    /// Applies an event, updating state and incrementing the version.
    ///
    /// Must be pure and total: the same state and event always produce the
    /// same new state, and events — being facts — never fail to apply.
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Rebuilds an aggregate by folding its full event history over the
    /// default (empty) seed.
    ///
    /// Implementations may validate the stream shape (e.g. requiring a
    /// creation event first) before folding.
    fn rebuild_from_events(
        events: impl IntoIterator<Item = Self::Event>,
    ) -> Result<Self, Self::Error> {
        let mut aggregate = Self::default();
        aggregate.apply_events(events);
        Ok(aggregate)
    }
}
