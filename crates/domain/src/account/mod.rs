//! Account aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod service;

pub use aggregate::Account;
pub use commands::{
    CreateAccount, DepositFromTransfer, DepositMoney, FinishTransaction, WithdrawForTransfer,
    WithdrawMoney,
};
pub use events::{
    AccountCreatedData, AccountEvent, MoneyDepositedData, MoneyWithdrawnData,
    TransactionFinishedData, TransferDepositStartedData, TransferWithdrawalStartedData,
};
pub use service::AccountService;

use common::{AggregateId, Money};
use thiserror::Error;

/// Errors that can occur during account operations.
///
/// Invalid-input rejections (`NegativeInitialBalance`, `InvalidAmount`) and
/// state conflicts (everything else) are both raised synchronously, before
/// any state change.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Account is already created.
    #[error("account already created")]
    AlreadyCreated,

    /// The account does not exist yet.
    #[error("account has not been created")]
    NotCreated,

    /// Opening balance must not be negative.
    #[error("initial balance must not be negative, got {balance}")]
    NegativeInitialBalance { balance: Money },

    /// Deposit and withdrawal amounts must be positive.
    #[error("amount must be positive, got {amount}")]
    InvalidAmount { amount: Money },

    /// The balance does not cover the requested amount.
    #[error("insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Money, requested: Money },

    /// The transfer is already in progress on this account.
    #[error("transfer {transaction_id} is already open on this account")]
    TransferAlreadyOpen { transaction_id: AggregateId },

    /// The transfer has already completed on this account.
    #[error("transfer {transaction_id} has already finished on this account")]
    TransferAlreadyFinished { transaction_id: AggregateId },

    /// No open transfer with this id exists on this account.
    #[error("transfer {transaction_id} is not open on this account")]
    TransferNotOpen { transaction_id: AggregateId },
}
