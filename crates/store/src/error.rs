use thiserror::Error;

use crate::{AggregateId, Version};

/// Errors that can occur in the repository or event-log ports.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A concurrency conflict occurred on upsert: the stored version did
    /// not match the version the caller last read. Retryable — reload and
    /// reapply the command.
    #[error(
        "concurrency conflict for aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    /// The staged snapshot carried no aggregate id.
    #[error("staged state has no aggregate id")]
    MissingAggregateId,

    /// The staged pending events failed validation.
    #[error("invalid pending events: {0}")]
    InvalidPending(String),

    /// The named stream does not exist.
    #[error("unknown stream: {0}")]
    UnknownStream(String),

    /// The named consumer group does not exist on the stream.
    #[error("unknown consumer group {group} on stream {stream}")]
    UnknownGroup { stream: String, group: String },

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
