//! Transaction state machine.

use serde::{Deserialize, Serialize};

/// The status of a bank transaction in its lifecycle.
///
/// Status transitions:
/// ```text
/// Initialized ──► Created ──► Finished
///                    │
///                    └──────► Failed
/// ```
///
/// Created loops on itself while the withdraw and deposit confirmations
/// arrive in any order; Finished and Failed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TransactionStatus {
    /// Empty seed state before the creation event is folded.
    #[default]
    Initialized,

    /// Transfer is in progress, collecting confirmations.
    Created,

    /// Both sides confirmed; the transfer completed (terminal).
    Finished,

    /// The transfer was cancelled and compensated (terminal).
    Failed,
}

impl TransactionStatus {
    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Finished | TransactionStatus::Failed)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Initialized => "Initialized",
            TransactionStatus::Created => "Created",
            TransactionStatus::Finished => "Finished",
            TransactionStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
