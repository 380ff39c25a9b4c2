use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::{Instant, timeout_at};

use crate::log::{EntryId, EventLog, LogEntry};
use crate::{EventEnvelope, Result, StoreError};

#[derive(Debug, Clone)]
struct PendingEntry {
    consumer: String,
    delivery_count: u32,
}

#[derive(Debug, Default)]
struct GroupState {
    /// Index into the stream's entries of the next entry this group has
    /// not been delivered.
    cursor: usize,

    /// Delivered-but-unacknowledged entries, keyed by raw entry id.
    pending: BTreeMap<u64, PendingEntry>,
}

#[derive(Debug, Default)]
struct StreamState {
    entries: Vec<EventEnvelope>,
    groups: HashMap<String, GroupState>,
}

/// In-memory event log implementation for testing and local wiring.
///
/// Streams and consumer groups are created lazily on first use. Blocking
/// reads park on a [`Notify`] woken by every append.
#[derive(Clone, Default)]
pub struct InMemoryEventLog {
    streams: Arc<Mutex<HashMap<String, StreamState>>>,
    appended: Arc<Notify>,
}

impl InMemoryEventLog {
    /// Creates a new empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries appended to a stream.
    pub async fn len(&self, stream: &str) -> usize {
        self.streams
            .lock()
            .await
            .get(stream)
            .map(|s| s.entries.len())
            .unwrap_or(0)
    }

    /// Returns true if the stream has no entries.
    pub async fn is_empty(&self, stream: &str) -> bool {
        self.len(stream).await == 0
    }

    /// Returns a copy of every envelope appended to a stream, in order.
    pub async fn entries(&self, stream: &str) -> Vec<EventEnvelope> {
        self.streams
            .lock()
            .await
            .get(stream)
            .map(|s| s.entries.clone())
            .unwrap_or_default()
    }

    /// Returns how many entries a group has been delivered but not acked.
    pub async fn pending_count(&self, stream: &str, group: &str) -> usize {
        self.streams
            .lock()
            .await
            .get(stream)
            .and_then(|s| s.groups.get(group))
            .map(|g| g.pending.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, stream: &str, envelope: EventEnvelope) -> Result<EntryId> {
        let mut streams = self.streams.lock().await;
        let state = streams.entry(stream.to_string()).or_default();
        state.entries.push(envelope);
        let id = EntryId::new(state.entries.len() as u64);
        drop(streams);
        self.appended.notify_waiters();
        Ok(id)
    }

    async fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        max: usize,
        block: Duration,
    ) -> Result<Vec<LogEntry>> {
        let deadline = Instant::now() + block;
        loop {
            // Register for wakeups before checking, so an append between the
            // check and the await is not missed.
            let notified = self.appended.notified();

            {
                let mut streams = self.streams.lock().await;
                let StreamState { entries, groups } =
                    streams.entry(stream.to_string()).or_default();
                let group_state = groups.entry(group.to_string()).or_default();

                if group_state.cursor < entries.len() {
                    let start = group_state.cursor;
                    let end = (start + max).min(entries.len());
                    let mut delivered = Vec::with_capacity(end - start);
                    for (index, envelope) in entries.iter().enumerate().take(end).skip(start) {
                        let id = index as u64 + 1;
                        group_state.pending.insert(
                            id,
                            PendingEntry {
                                consumer: consumer.to_string(),
                                delivery_count: 1,
                            },
                        );
                        delivered.push(LogEntry {
                            id: EntryId::new(id),
                            envelope: envelope.clone(),
                            delivery_count: 1,
                        });
                    }
                    group_state.cursor = end;
                    return Ok(delivered);
                }
            }

            if timeout_at(deadline, notified).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn read_pending(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        max: usize,
    ) -> Result<Vec<LogEntry>> {
        let mut streams = self.streams.lock().await;
        let Some(StreamState { entries, groups }) = streams.get_mut(stream) else {
            return Ok(Vec::new());
        };
        let Some(group_state) = groups.get_mut(group) else {
            return Ok(Vec::new());
        };

        let mut redelivered = Vec::new();
        for (&id, pending) in group_state.pending.iter_mut().take(max) {
            pending.delivery_count += 1;
            pending.consumer = consumer.to_string();
            redelivered.push(LogEntry {
                id: EntryId::new(id),
                envelope: entries[(id - 1) as usize].clone(),
                delivery_count: pending.delivery_count,
            });
        }
        Ok(redelivered)
    }

    async fn ack(&self, stream: &str, group: &str, id: EntryId) -> Result<()> {
        let mut streams = self.streams.lock().await;
        let state = streams
            .get_mut(stream)
            .ok_or_else(|| StoreError::UnknownStream(stream.to_string()))?;
        let group_state = state.groups.get_mut(group).ok_or_else(|| {
            StoreError::UnknownGroup {
                stream: stream.to_string(),
                group: group.to_string(),
            }
        })?;
        group_state.pending.remove(&id.as_u64());
        Ok(())
    }
}
