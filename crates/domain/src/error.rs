//! Domain error types.

use runtime::LockError;
use store::StoreError;
use thiserror::Error;

use crate::account::AccountError;
use crate::transaction::TransactionError;

/// Errors that can occur during domain operations.
///
/// Aggregate errors are business-rule rejections raised synchronously
/// before any state change; store and lock errors come from the
/// infrastructure underneath the command cycle.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A command was rejected by the account aggregate.
    #[error("account error: {0}")]
    Account(#[from] AccountError),

    /// A command was rejected by the transaction aggregate.
    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    /// The repository or event log failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The per-aggregate lock could not be acquired or released.
    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// True when the caller should reload the aggregate and reapply the
    /// command: another writer won the optimistic-version race.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::Store(StoreError::ConcurrencyConflict { .. })
        )
    }
}
