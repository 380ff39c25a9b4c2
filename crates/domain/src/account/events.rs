//! Account domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, Email, Money};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

/// Events that can occur on an account aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AccountEvent {
    /// Account was created with an opening balance.
    AccountCreated(AccountCreatedData),

    /// Money was deposited directly.
    MoneyDeposited(MoneyDepositedData),

    /// Money was withdrawn directly.
    MoneyWithdrawn(MoneyWithdrawnData),

    /// A transfer debited this account and opened a transaction on it.
    TransferWithdrawalStarted(TransferWithdrawalStartedData),

    /// A transfer credited this account and opened a transaction on it.
    TransferDepositStarted(TransferDepositStartedData),

    /// An open transaction on this account completed.
    TransactionFinished(TransactionFinishedData),
}

impl DomainEvent for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::AccountCreated(_) => "AccountCreated",
            AccountEvent::MoneyDeposited(_) => "MoneyDeposited",
            AccountEvent::MoneyWithdrawn(_) => "MoneyWithdrawn",
            AccountEvent::TransferWithdrawalStarted(_) => "TransferWithdrawalStarted",
            AccountEvent::TransferDepositStarted(_) => "TransferDepositStarted",
            AccountEvent::TransactionFinished(_) => "TransactionFinished",
        }
    }
}

/// Data for AccountCreated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCreatedData {
    /// The unique account ID.
    pub account_id: AggregateId,

    /// The owner's email address.
    pub email: Email,

    /// Opening balance.
    pub initial_balance: Money,

    /// When the account was created.
    pub occurred_at: DateTime<Utc>,
}

/// Data for MoneyDeposited event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyDepositedData {
    /// Amount credited.
    pub amount: Money,

    /// When the deposit happened.
    pub occurred_at: DateTime<Utc>,
}

/// Data for MoneyWithdrawn event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyWithdrawnData {
    /// Amount debited.
    pub amount: Money,

    /// When the withdrawal happened.
    pub occurred_at: DateTime<Utc>,
}

/// Data for TransferWithdrawalStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferWithdrawalStartedData {
    /// The transaction driving the transfer.
    pub transaction_id: AggregateId,

    /// Amount debited pending transfer completion.
    pub amount: Money,

    /// When the withdrawal side started.
    pub occurred_at: DateTime<Utc>,
}

/// Data for TransferDepositStarted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferDepositStartedData {
    /// The transaction driving the transfer.
    pub transaction_id: AggregateId,

    /// Amount credited pending transfer completion.
    pub amount: Money,

    /// When the deposit side started.
    pub occurred_at: DateTime<Utc>,
}

/// Data for TransactionFinished event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFinishedData {
    /// The completed transaction.
    pub transaction_id: AggregateId,

    /// When the transaction finished on this account.
    pub occurred_at: DateTime<Utc>,
}

// Convenience constructors for events
impl AccountEvent {
    /// Creates an AccountCreated event.
    pub fn account_created(account_id: AggregateId, email: Email, initial_balance: Money) -> Self {
        AccountEvent::AccountCreated(AccountCreatedData {
            account_id,
            email,
            initial_balance,
            occurred_at: Utc::now(),
        })
    }

    /// Creates a MoneyDeposited event.
    pub fn money_deposited(amount: Money) -> Self {
        AccountEvent::MoneyDeposited(MoneyDepositedData {
            amount,
            occurred_at: Utc::now(),
        })
    }

    /// Creates a MoneyWithdrawn event.
    pub fn money_withdrawn(amount: Money) -> Self {
        AccountEvent::MoneyWithdrawn(MoneyWithdrawnData {
            amount,
            occurred_at: Utc::now(),
        })
    }

    /// Creates a TransferWithdrawalStarted event.
    pub fn transfer_withdrawal_started(transaction_id: AggregateId, amount: Money) -> Self {
        AccountEvent::TransferWithdrawalStarted(TransferWithdrawalStartedData {
            transaction_id,
            amount,
            occurred_at: Utc::now(),
        })
    }

    /// Creates a TransferDepositStarted event.
    pub fn transfer_deposit_started(transaction_id: AggregateId, amount: Money) -> Self {
        AccountEvent::TransferDepositStarted(TransferDepositStartedData {
            transaction_id,
            amount,
            occurred_at: Utc::now(),
        })
    }

    /// Creates a TransactionFinished event.
    pub fn transaction_finished(transaction_id: AggregateId) -> Self {
        AccountEvent::TransactionFinished(TransactionFinishedData {
            transaction_id,
            occurred_at: Utc::now(),
        })
    }

    /// When this event occurred.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AccountEvent::AccountCreated(data) => data.occurred_at,
            AccountEvent::MoneyDeposited(data) => data.occurred_at,
            AccountEvent::MoneyWithdrawn(data) => data.occurred_at,
            AccountEvent::TransferWithdrawalStarted(data) => data.occurred_at,
            AccountEvent::TransferDepositStarted(data) => data.occurred_at,
            AccountEvent::TransactionFinished(data) => data.occurred_at,
        }
    }
}
