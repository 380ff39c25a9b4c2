//! Bank-transaction aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;
mod status;

pub use aggregate::Transaction;
pub use commands::{
    CancelBankTransaction, CreateBankTransaction, FinishBankTransaction, ValidateMoneyDeposit,
    ValidateMoneyWithdraw,
};
pub use events::{
    DepositRolledBackData, TransactionCreatedData, TransactionEvent, TransactionFailedData,
    TransactionFinishedData, TransactionMoneyDepositedData, TransactionMoneyWithdrawnData,
    TransactionRolledBackData, WithdrawRolledBackData,
};
pub use service::TransactionService;
pub use status::TransactionStatus;

use common::{AggregateId, Money};
use thiserror::Error;

/// Errors that can occur during transaction operations.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Transaction is already created.
    #[error("transaction already created")]
    AlreadyCreated,

    /// The transaction does not exist yet.
    #[error("transaction has not been created")]
    NotCreated,

    /// A transfer needs two distinct accounts.
    #[error("cannot transfer from account {account_id} to itself")]
    SameAccount { account_id: AggregateId },

    /// Transfer amounts must be positive.
    #[error("transfer amount must be positive, got {amount}")]
    InvalidAmount { amount: Money },

    /// The transaction is in a state that accepts no such transition.
    #[error("transaction is {status} and accepts no further changes")]
    Closed { status: TransactionStatus },

    /// The confirming account is not the expected side of the transfer.
    #[error("expected confirmation from account {expected}, got {actual}")]
    AccountMismatch {
        expected: AggregateId,
        actual: AggregateId,
    },

    /// Finishing requires both sides to have confirmed.
    #[error(
        "cannot finish before both confirmations: withdrawn={money_withdrawn}, deposited={money_deposited}"
    )]
    NotConfirmed {
        money_withdrawn: bool,
        money_deposited: bool,
    },

    /// A replayed event stream must begin with the creation event.
    #[error("transaction event stream must start with the Created event")]
    ReplayMissingCreated,
}
