//! Transaction domain events.

use chrono::{DateTime, Utc};
use common::{AggregateId, CorrelationId, Money};
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

/// Events that can occur on a bank-transaction aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TransactionEvent {
    /// Transaction was created between two accounts.
    Created(TransactionCreatedData),

    /// The source account confirmed its withdrawal.
    MoneyWithdrawn(TransactionMoneyWithdrawnData),

    /// The destination account confirmed its deposit.
    MoneyDeposited(TransactionMoneyDepositedData),

    /// Both sides confirmed; the transfer completed.
    Finished(TransactionFinishedData),

    /// The transfer failed.
    Failed(TransactionFailedData),

    /// The transfer was rolled back; compensation is complete.
    RolledBack(TransactionRolledBackData),

    /// Compensation for a confirmed withdrawal.
    WithdrawRolledBack(WithdrawRolledBackData),

    /// Compensation for a confirmed deposit.
    DepositRolledBack(DepositRolledBackData),
}

impl DomainEvent for TransactionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TransactionEvent::Created(_) => "TransactionCreated",
            TransactionEvent::MoneyWithdrawn(_) => "TransactionMoneyWithdrawn",
            TransactionEvent::MoneyDeposited(_) => "TransactionMoneyDeposited",
            TransactionEvent::Finished(_) => "TransactionFinished",
            TransactionEvent::Failed(_) => "TransactionFailed",
            TransactionEvent::RolledBack(_) => "TransactionRolledBack",
            TransactionEvent::WithdrawRolledBack(_) => "WithdrawRolledBack",
            TransactionEvent::DepositRolledBack(_) => "DepositRolledBack",
        }
    }
}

/// Data for Created event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCreatedData {
    /// The unique transaction ID.
    pub transaction_id: AggregateId,

    /// Correlation id threading this saga.
    pub correlation_id: CorrelationId,

    /// The account money moves out of.
    pub from_account: AggregateId,

    /// The account money moves into.
    pub to_account: AggregateId,

    /// Amount being transferred.
    pub amount: Money,

    /// When the transaction was created.
    pub occurred_at: DateTime<Utc>,
}

/// Data for MoneyWithdrawn event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionMoneyWithdrawnData {
    /// The source account that confirmed.
    pub account_id: AggregateId,

    /// When the confirmation arrived.
    pub occurred_at: DateTime<Utc>,
}

/// Data for MoneyDeposited event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionMoneyDepositedData {
    /// The destination account that confirmed.
    pub account_id: AggregateId,

    /// When the confirmation arrived.
    pub occurred_at: DateTime<Utc>,
}

/// Data for Finished event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFinishedData {
    /// The account money moved out of.
    pub from_account: AggregateId,

    /// The account money moved into.
    pub to_account: AggregateId,

    /// When the transfer completed.
    pub occurred_at: DateTime<Utc>,
}

/// Data for Failed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFailedData {
    /// Why the transfer failed.
    pub reason: String,

    /// When the failure was recorded.
    pub occurred_at: DateTime<Utc>,
}

/// Data for RolledBack event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRolledBackData {
    /// The account money moved out of.
    pub from_account: AggregateId,

    /// The account money moved into.
    pub to_account: AggregateId,

    /// Amount that was being transferred.
    pub amount: Money,

    /// When the rollback completed.
    pub occurred_at: DateTime<Utc>,
}

/// Data for WithdrawRolledBack event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRolledBackData {
    /// When the withdrawal compensation was recorded.
    pub occurred_at: DateTime<Utc>,
}

/// Data for DepositRolledBack event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositRolledBackData {
    /// When the deposit compensation was recorded.
    pub occurred_at: DateTime<Utc>,
}

// Convenience constructors for events
impl TransactionEvent {
    /// Creates a Created event.
    pub fn created(
        transaction_id: AggregateId,
        correlation_id: CorrelationId,
        from_account: AggregateId,
        to_account: AggregateId,
        amount: Money,
    ) -> Self {
        TransactionEvent::Created(TransactionCreatedData {
            transaction_id,
            correlation_id,
            from_account,
            to_account,
            amount,
            occurred_at: Utc::now(),
        })
    }

    /// Creates a MoneyWithdrawn event.
    pub fn money_withdrawn(account_id: AggregateId) -> Self {
        TransactionEvent::MoneyWithdrawn(TransactionMoneyWithdrawnData {
            account_id,
            occurred_at: Utc::now(),
        })
    }

    /// Creates a MoneyDeposited event.
    pub fn money_deposited(account_id: AggregateId) -> Self {
        TransactionEvent::MoneyDeposited(TransactionMoneyDepositedData {
            account_id,
            occurred_at: Utc::now(),
        })
    }

    /// Creates a Finished event.
    pub fn finished(from_account: AggregateId, to_account: AggregateId) -> Self {
        TransactionEvent::Finished(TransactionFinishedData {
            from_account,
            to_account,
            occurred_at: Utc::now(),
        })
    }

    /// Creates a Failed event.
    pub fn failed(reason: impl Into<String>) -> Self {
        TransactionEvent::Failed(TransactionFailedData {
            reason: reason.into(),
            occurred_at: Utc::now(),
        })
    }

    /// Creates a RolledBack event.
    pub fn rolled_back(
        from_account: AggregateId,
        to_account: AggregateId,
        amount: Money,
    ) -> Self {
        TransactionEvent::RolledBack(TransactionRolledBackData {
            from_account,
            to_account,
            amount,
            occurred_at: Utc::now(),
        })
    }

    /// Creates a WithdrawRolledBack event.
    pub fn withdraw_rolled_back() -> Self {
        TransactionEvent::WithdrawRolledBack(WithdrawRolledBackData {
            occurred_at: Utc::now(),
        })
    }

    /// Creates a DepositRolledBack event.
    pub fn deposit_rolled_back() -> Self {
        TransactionEvent::DepositRolledBack(DepositRolledBackData {
            occurred_at: Utc::now(),
        })
    }

    /// When this event occurred.
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            TransactionEvent::Created(data) => data.occurred_at,
            TransactionEvent::MoneyWithdrawn(data) => data.occurred_at,
            TransactionEvent::MoneyDeposited(data) => data.occurred_at,
            TransactionEvent::Finished(data) => data.occurred_at,
            TransactionEvent::Failed(data) => data.occurred_at,
            TransactionEvent::RolledBack(data) => data.occurred_at,
            TransactionEvent::WithdrawRolledBack(data) => data.occurred_at,
            TransactionEvent::DepositRolledBack(data) => data.occurred_at,
        }
    }
}
