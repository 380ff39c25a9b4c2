//! Domain layer for the transfer system.
//!
//! This crate provides the core domain abstractions:
//! - [`Aggregate`] and [`DomainEvent`] traits for event-folded entities
//! - [`CommandExecutor`] running each command under a per-aggregate lock
//!   with an optimistic-concurrency write as the backstop
//! - The [`account`] aggregate owning balances and transfer bookkeeping
//! - The [`transaction`] aggregate coordinating one transfer saga

pub mod account;
pub mod aggregate;
pub mod error;
pub mod executor;
pub mod transaction;

pub use aggregate::{Aggregate, DomainEvent};
pub use error::DomainError;
pub use executor::{Command, CommandExecutor, CommandOutcome};

pub use account::{
    Account, AccountError, AccountEvent, AccountService, CreateAccount, DepositFromTransfer,
    DepositMoney, FinishTransaction, WithdrawForTransfer, WithdrawMoney,
};
pub use transaction::{
    CancelBankTransaction, CreateBankTransaction, FinishBankTransaction, Transaction,
    TransactionError, TransactionEvent, TransactionService, TransactionStatus,
    ValidateMoneyDeposit, ValidateMoneyWithdraw,
};
