use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{EventEnvelope, Result};

/// Position of an entry within one stream. Monotonic, starting at 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntryId(u64);

impl EntryId {
    /// Creates an entry id from a raw sequence number.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw sequence number.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One delivered log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Position of the entry in its stream.
    pub id: EntryId,

    /// The published event.
    pub envelope: EventEnvelope,

    /// How many times this entry has been delivered to the group,
    /// including this delivery. Greater than 1 means redelivery.
    pub delivery_count: u32,
}

/// A durable, appendable log keyed by stream name, consumed through named
/// consumer groups.
///
/// Delivery semantics are at-least-once: an entry read through
/// [`read_group`](EventLog::read_group) stays on the group's pending list
/// until it is acknowledged, and unacknowledged entries are redelivered via
/// [`read_pending`](EventLog::read_pending) — including after a consumer
/// restart. Entries of one stream are delivered to a group in append order.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Appends an envelope to the stream and returns its position.
    async fn append(&self, stream: &str, envelope: EventEnvelope) -> Result<EntryId>;

    /// Delivers up to `max` entries the group has not seen yet, blocking up
    /// to `block` when the stream is caught up. Delivered entries are added
    /// to the group's pending list.
    async fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        max: usize,
        block: Duration,
    ) -> Result<Vec<LogEntry>>;

    /// Redelivers up to `max` unacknowledged entries of the group, in
    /// append order, bumping their delivery counts.
    async fn read_pending(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        max: usize,
    ) -> Result<Vec<LogEntry>>;

    /// Acknowledges an entry, removing it from the group's pending list.
    /// Acknowledging an entry that is not pending is a no-op.
    async fn ack(&self, stream: &str, group: &str, id: EntryId) -> Result<()>;
}
