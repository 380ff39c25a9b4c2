//! Reliable at-least-once stream listener.
//!
//! One background task per (stream, consumer) pair polls an [`EventLog`]
//! through a named consumer group, deserializes each entry into the
//! declared event type, optionally serializes handling per aggregate id
//! with a [`LockProvider`], delivers into a bounded in-process channel,
//! and acknowledges the entry only after a successful delivery. A crash
//! between delivery and acknowledgment causes redelivery on restart, so
//! downstream command handling must tolerate duplicates.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use store::{EntryId, EventEnvelope, EventLog, LogEntry};

use crate::lock::{LockProvider, acquire_with_retry};
use crate::retry::RetryPolicy;

/// Configuration for one stream listener.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Stream to consume.
    pub stream: String,

    /// Consumer group name (shared cursor and pending list).
    pub group: String,

    /// This member's name within the group.
    pub consumer: String,

    /// Maximum entries claimed per poll.
    pub batch_size: usize,

    /// How long one poll blocks waiting for new entries.
    pub poll_block: Duration,

    /// Bound on delivering one entry into the destination channel.
    /// Exceeding it is fatal for this listener.
    pub delivery_timeout: Duration,

    /// Pause before retrying after a non-fatal entry failure.
    pub error_pause: Duration,

    /// Bound on one lock acquisition wait when aggregate locking is on.
    pub lock_wait: Duration,
}

impl ListenerConfig {
    /// Creates a configuration with default timing.
    pub fn new(
        stream: impl Into<String>,
        group: impl Into<String>,
        consumer: impl Into<String>,
    ) -> Self {
        Self {
            stream: stream.into(),
            group: group.into(),
            consumer: consumer.into(),
            batch_size: 16,
            poll_block: Duration::from_secs(2),
            delivery_timeout: Duration::from_secs(1),
            error_pause: Duration::from_secs(1),
            lock_wait: Duration::from_secs(10),
        }
    }
}

/// One consumed entry, deserialized and paired with its envelope.
#[derive(Debug)]
pub struct Delivery<E> {
    /// Position of the entry in its stream.
    pub entry_id: EntryId,

    /// The full envelope (aggregate id, metadata, raw payload).
    pub envelope: EventEnvelope,

    /// The deserialized event.
    pub event: E,
}

/// Handle to a running listener task.
pub struct ListenerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Signals shutdown and waits for the task to finish. In-flight
    /// unacknowledged entries are left pending for redelivery.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }

    /// Returns true once the listener task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

enum EntryOutcome {
    Delivered,
    /// Non-fatal: pause, leave the entry pending, retry it next poll.
    Retry,
    /// Fatal: stop this listener's poll loop.
    Fatal,
}

/// Spawns a listener task for one (stream, consumer) pair, delivering the
/// declared event type as-is.
///
/// When `locks` is set, handling of each entry is serialized on the
/// aggregate id carried in its envelope. Entries whose delivery into
/// `destination` exceeds the configured timeout are forwarded to `errors`
/// and stop the listener.
pub fn spawn_listener<E>(
    log: Arc<dyn EventLog>,
    locks: Option<Arc<dyn LockProvider>>,
    config: ListenerConfig,
    destination: mpsc::Sender<Delivery<E>>,
    errors: mpsc::Sender<EventEnvelope>,
) -> ListenerHandle
where
    E: DeserializeOwned + Send + 'static,
{
    spawn_listener_mapped(log, locks, config, destination, errors, |event: E| event)
}

/// [`spawn_listener`] with a remap from the wire event type `E` to the
/// internal type `D` applied between deserialization and delivery.
pub fn spawn_listener_mapped<E, D, M>(
    log: Arc<dyn EventLog>,
    locks: Option<Arc<dyn LockProvider>>,
    config: ListenerConfig,
    destination: mpsc::Sender<Delivery<D>>,
    errors: mpsc::Sender<EventEnvelope>,
    map: M,
) -> ListenerHandle
where
    E: DeserializeOwned + Send + 'static,
    D: Send + 'static,
    M: Fn(E) -> D + Send + Sync + 'static,
{
    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(run_loop(
        log,
        locks,
        config,
        destination,
        errors,
        map,
        shutdown_rx,
    ));
    ListenerHandle { shutdown, task }
}

async fn run_loop<E, D, M>(
    log: Arc<dyn EventLog>,
    locks: Option<Arc<dyn LockProvider>>,
    config: ListenerConfig,
    destination: mpsc::Sender<Delivery<D>>,
    errors: mpsc::Sender<EventEnvelope>,
    map: M,
    mut shutdown: watch::Receiver<bool>,
) where
    E: DeserializeOwned + Send + 'static,
    D: Send + 'static,
    M: Fn(E) -> D + Send + Sync + 'static,
{
    tracing::info!(
        stream = %config.stream,
        group = %config.group,
        consumer = %config.consumer,
        "stream listener started"
    );

    'poll: loop {
        if *shutdown.borrow() {
            break;
        }

        // Unacknowledged entries first: redelivery after a crash, restart,
        // or a paused retry.
        let pending = match log
            .read_pending(&config.stream, &config.group, &config.consumer, config.batch_size)
            .await
        {
            Ok(pending) => pending,
            Err(error) => {
                tracing::error!(stream = %config.stream, %error, "failed to read pending entries");
                tokio::time::sleep(config.error_pause).await;
                continue;
            }
        };

        let batch = if pending.is_empty() {
            tokio::select! {
                _ = shutdown.changed() => break,
                read = log.read_group(
                    &config.stream,
                    &config.group,
                    &config.consumer,
                    config.batch_size,
                    config.poll_block,
                ) => match read {
                    Ok(batch) => batch,
                    Err(error) => {
                        tracing::error!(stream = %config.stream, %error, "failed to read stream");
                        tokio::time::sleep(config.error_pause).await;
                        continue;
                    }
                },
            }
        } else {
            metrics::counter!("stream_entries_redelivered").increment(pending.len() as u64);
            pending
        };

        for entry in batch {
            if *shutdown.borrow() {
                break 'poll;
            }

            let entry_id = entry.id;
            match handle_entry(&*log, locks.as_deref(), &config, &destination, &errors, &map, entry)
                .await
            {
                EntryOutcome::Delivered => {}
                EntryOutcome::Retry => {
                    // Do not advance past the failing entry; it stays on the
                    // pending list and is claimed again next iteration.
                    tokio::time::sleep(config.error_pause).await;
                    continue 'poll;
                }
                EntryOutcome::Fatal => {
                    tracing::error!(
                        stream = %config.stream,
                        entry_id = %entry_id,
                        "fatal delivery failure, stopping listener"
                    );
                    break 'poll;
                }
            }
        }
    }

    tracing::info!(stream = %config.stream, consumer = %config.consumer, "stream listener stopped");
}

async fn handle_entry<E, D, M>(
    log: &dyn EventLog,
    locks: Option<&dyn LockProvider>,
    config: &ListenerConfig,
    destination: &mpsc::Sender<Delivery<D>>,
    errors: &mpsc::Sender<EventEnvelope>,
    map: &M,
    entry: LogEntry,
) -> EntryOutcome
where
    E: DeserializeOwned + Send + 'static,
    D: Send + 'static,
    M: Fn(E) -> D + Send + Sync + 'static,
{
    let event: D = match serde_json::from_value::<E>(entry.envelope.payload.clone()) {
        Ok(event) => map(event),
        Err(error) => {
            // No dead-letter path exists: a permanently bad entry keeps the
            // stream blocked and is retried after each pause.
            tracing::warn!(
                entry_id = %entry.id,
                event_type = %entry.envelope.event_type,
                %error,
                "failed to deserialize entry, will retry"
            );
            metrics::counter!("stream_entries_undecodable").increment(1);
            return EntryOutcome::Retry;
        }
    };

    let token = match locks {
        Some(provider) => {
            let key = format!(
                "{}:{}",
                entry.envelope.aggregate_type, entry.envelope.aggregate_id
            );
            match acquire_with_retry(provider, &key, config.lock_wait, &RetryPolicy::lock_default())
                .await
            {
                Ok(token) => Some(token),
                Err(error) => {
                    tracing::warn!(entry_id = %entry.id, %error, "lock acquisition failed, will retry");
                    return EntryOutcome::Retry;
                }
            }
        }
        None => None,
    };

    let outcome = deliver_and_ack(log, config, destination, errors, entry, event).await;

    if let (Some(provider), Some(token)) = (locks, token)
        && let Err(error) = provider.release(token).await
    {
        tracing::warn!(%error, "failed to release entry lock");
    }

    outcome
}

async fn deliver_and_ack<E>(
    log: &dyn EventLog,
    config: &ListenerConfig,
    destination: &mpsc::Sender<Delivery<E>>,
    errors: &mpsc::Sender<EventEnvelope>,
    entry: LogEntry,
    event: E,
) -> EntryOutcome
where
    E: Send + 'static,
{
    let entry_id = entry.id;
    let delivery = Delivery {
        entry_id,
        envelope: entry.envelope,
        event,
    };

    match destination.send_timeout(delivery, config.delivery_timeout).await {
        Ok(()) => {}
        Err(SendTimeoutError::Timeout(delivery)) => {
            tracing::error!(
                entry_id = %entry_id,
                timeout = ?config.delivery_timeout,
                "delivery timed out, routing entry to error destination"
            );
            metrics::counter!("stream_delivery_timeouts").increment(1);
            if errors.send(delivery.envelope).await.is_err() {
                tracing::error!("error destination closed");
            }
            return EntryOutcome::Fatal;
        }
        Err(SendTimeoutError::Closed(_)) => {
            tracing::error!(entry_id = %entry_id, "destination channel closed");
            return EntryOutcome::Fatal;
        }
    }

    // Acknowledge only after the entry has been handed off. A crash right
    // here redelivers the entry — at-least-once, never lost.
    match log.ack(&config.stream, &config.group, entry_id).await {
        Ok(()) => {
            metrics::counter!("stream_entries_acked").increment(1);
            EntryOutcome::Delivered
        }
        Err(error) => {
            tracing::warn!(entry_id = %entry_id, %error, "ack failed, entry may be redelivered");
            EntryOutcome::Delivered
        }
    }
}
