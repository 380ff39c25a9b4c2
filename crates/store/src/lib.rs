//! Persistence and transport ports for the transfer system.
//!
//! Two contracts live here:
//! - [`Repository`] — current-state storage per aggregate with an
//!   optimistic-concurrency guard; a successful write publishes the staged
//!   events to the aggregate's outbound stream exactly once.
//! - [`EventLog`] — a durable, appendable log with named consumer groups,
//!   pending-entry tracking, and explicit acknowledgment.
//!
//! In-memory adapters of both are provided for tests and local wiring.

pub mod envelope;
pub mod error;
pub mod log;
pub mod memory;
pub mod memory_log;
pub mod repository;

pub use common::AggregateId;
pub use envelope::{EventEnvelope, EventEnvelopeBuilder, EventId, Version};
pub use error::{Result, StoreError};
pub use log::{EntryId, EventLog, LogEntry};
pub use memory::InMemoryRepository;
pub use memory_log::InMemoryEventLog;
pub use repository::{Persisted, Repository, Staged};
