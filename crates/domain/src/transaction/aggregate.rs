//! Bank-transaction aggregate implementation.

use chrono::{DateTime, Utc};
use common::{AggregateId, CorrelationId, Money};
use serde::{Deserialize, Serialize};
use store::{Persisted, Version};

use crate::aggregate::Aggregate;

use super::{TransactionError, TransactionEvent, TransactionStatus};

/// Bank-transaction aggregate root: the coordinator of one money transfer.
///
/// References the two accounts by id only — accounts are owned and mutated
/// exclusively by the account side. The transaction tracks which of the
/// two confirmations (withdraw on the source, deposit on the destination)
/// have arrived; when the second one lands, it completes in a single
/// `Finished` event rather than recording a redundant confirmation first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction identifier.
    id: Option<AggregateId>,

    /// Correlation id threading this saga.
    correlation_id: Option<CorrelationId>,

    /// The account money moves out of.
    from_account: Option<AggregateId>,

    /// The account money moves into.
    to_account: Option<AggregateId>,

    /// Amount being transferred.
    amount: Money,

    /// The source account confirmed its withdrawal.
    money_withdrawn: bool,

    /// The destination account confirmed its deposit.
    money_deposited: bool,

    /// Current lifecycle status.
    status: TransactionStatus,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// When the transaction was created.
    created_at: Option<DateTime<Utc>>,

    /// When the transaction last changed.
    updated_at: Option<DateTime<Utc>>,
}

impl Persisted for Transaction {
    fn aggregate_id(&self) -> Option<&AggregateId> {
        self.id.as_ref()
    }

    fn version(&self) -> Version {
        self.version
    }
}

impl Aggregate for Transaction {
    type Event = TransactionEvent;
    type Error = TransactionError;

    fn aggregate_type() -> &'static str {
        "BankTransaction"
    }

    fn apply(&mut self, event: Self::Event) {
        self.updated_at = Some(event.occurred_at());
        match event {
            TransactionEvent::Created(data) => {
                self.id = Some(data.transaction_id);
                self.correlation_id = Some(data.correlation_id);
                self.from_account = Some(data.from_account);
                self.to_account = Some(data.to_account);
                self.amount = data.amount;
                self.status = TransactionStatus::Created;
                self.created_at = Some(data.occurred_at);
            }
            TransactionEvent::MoneyWithdrawn(_) => {
                self.money_withdrawn = true;
            }
            TransactionEvent::MoneyDeposited(_) => {
                self.money_deposited = true;
            }
            TransactionEvent::Finished(_) => {
                self.money_withdrawn = true;
                self.money_deposited = true;
                self.status = TransactionStatus::Finished;
            }
            TransactionEvent::Failed(_) => {
                self.status = TransactionStatus::Failed;
            }
            TransactionEvent::RolledBack(_) => {
                self.status = TransactionStatus::Failed;
            }
            TransactionEvent::WithdrawRolledBack(_) => {
                self.money_withdrawn = false;
            }
            TransactionEvent::DepositRolledBack(_) => {
                self.money_deposited = false;
            }
        }
        self.version = self.version.next();
    }

    fn rebuild_from_events(
        events: impl IntoIterator<Item = Self::Event>,
    ) -> Result<Self, Self::Error> {
        let mut events = events.into_iter();
        let Some(first) = events.next() else {
            return Err(TransactionError::ReplayMissingCreated);
        };
        if !matches!(first, TransactionEvent::Created(_)) {
            return Err(TransactionError::ReplayMissingCreated);
        }

        let mut transaction = Self::default();
        transaction.apply(first);
        for event in events {
            transaction.apply(event);
        }
        Ok(transaction)
    }
}

// Query methods
impl Transaction {
    /// Returns the transaction ID.
    pub fn id(&self) -> Option<&AggregateId> {
        self.id.as_ref()
    }

    /// Returns the correlation id.
    pub fn correlation_id(&self) -> Option<&CorrelationId> {
        self.correlation_id.as_ref()
    }

    /// Returns the source account.
    pub fn from_account(&self) -> Option<&AggregateId> {
        self.from_account.as_ref()
    }

    /// Returns the destination account.
    pub fn to_account(&self) -> Option<&AggregateId> {
        self.to_account.as_ref()
    }

    /// Returns the transfer amount.
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Returns true once the source account confirmed its withdrawal.
    pub fn money_withdrawn(&self) -> bool {
        self.money_withdrawn
    }

    /// Returns true once the destination account confirmed its deposit.
    pub fn money_deposited(&self) -> bool {
        self.money_deposited
    }

    /// Returns the current status.
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// When the transaction was created.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// When the transaction last changed.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn participants(&self) -> Result<(&AggregateId, &AggregateId), TransactionError> {
        match (&self.from_account, &self.to_account) {
            (Some(from), Some(to)) => Ok((from, to)),
            _ => Err(TransactionError::NotCreated),
        }
    }

    fn ensure_active(&self) -> Result<(), TransactionError> {
        if self.status.is_terminal() {
            return Err(TransactionError::Closed {
                status: self.status,
            });
        }
        Ok(())
    }
}

// Command methods (pure: state in, events out)
impl Transaction {
    /// Creates the transaction between two distinct accounts.
    ///
    /// The fold of the emitted event moves the status straight from
    /// Initialized to Created.
    pub fn create(
        &self,
        transaction_id: AggregateId,
        correlation_id: CorrelationId,
        from_account: AggregateId,
        to_account: AggregateId,
        amount: Money,
    ) -> Result<Vec<TransactionEvent>, TransactionError> {
        if self.id.is_some() {
            return Err(TransactionError::AlreadyCreated);
        }
        if from_account == to_account {
            return Err(TransactionError::SameAccount {
                account_id: from_account,
            });
        }
        if !amount.is_positive() {
            return Err(TransactionError::InvalidAmount { amount });
        }

        Ok(vec![TransactionEvent::created(
            transaction_id,
            correlation_id,
            from_account,
            to_account,
            amount,
        )])
    }

    /// Records the source account's withdrawal confirmation.
    ///
    /// If the deposit was already confirmed, the transfer is complete: a
    /// single `Finished` event is emitted instead of a redundant
    /// `MoneyWithdrawn` followed by `Finished`.
    pub fn validate_money_withdraw(
        &self,
        account_id: &AggregateId,
    ) -> Result<Vec<TransactionEvent>, TransactionError> {
        let (from, to) = self.participants()?;
        self.ensure_active()?;
        if account_id != from {
            return Err(TransactionError::AccountMismatch {
                expected: from.clone(),
                actual: account_id.clone(),
            });
        }

        if self.money_deposited {
            Ok(vec![TransactionEvent::finished(from.clone(), to.clone())])
        } else {
            Ok(vec![TransactionEvent::money_withdrawn(account_id.clone())])
        }
    }

    /// Records the destination account's deposit confirmation, with the
    /// symmetric collapse-to-`Finished` when the withdrawal already
    /// confirmed. A deposit confirmation arriving first is accepted.
    pub fn validate_money_deposit(
        &self,
        account_id: &AggregateId,
    ) -> Result<Vec<TransactionEvent>, TransactionError> {
        let (from, to) = self.participants()?;
        self.ensure_active()?;
        if account_id != to {
            return Err(TransactionError::AccountMismatch {
                expected: to.clone(),
                actual: account_id.clone(),
            });
        }

        if self.money_withdrawn {
            Ok(vec![TransactionEvent::finished(from.clone(), to.clone())])
        } else {
            Ok(vec![TransactionEvent::money_deposited(account_id.clone())])
        }
    }

    /// Completes the transfer once both sides have confirmed.
    pub fn finish(&self) -> Result<Vec<TransactionEvent>, TransactionError> {
        let (from, to) = self.participants()?;
        if self.status == TransactionStatus::Failed {
            return Err(TransactionError::Closed {
                status: self.status,
            });
        }
        if !(self.money_withdrawn && self.money_deposited) {
            return Err(TransactionError::NotConfirmed {
                money_withdrawn: self.money_withdrawn,
                money_deposited: self.money_deposited,
            });
        }

        Ok(vec![TransactionEvent::finished(from.clone(), to.clone())])
    }

    /// Cancels the transfer, compensating only what has actually happened.
    ///
    /// Emits, in this fixed order: `DepositRolledBack` if the deposit
    /// confirmed, `WithdrawRolledBack` if the withdrawal confirmed, and
    /// always `RolledBack` last. One cancel can therefore raise the
    /// version by up to 3.
    pub fn cancel(&self, amount: Money) -> Result<Vec<TransactionEvent>, TransactionError> {
        let (from, to) = self.participants()?;
        if self.status == TransactionStatus::Finished {
            return Err(TransactionError::Closed {
                status: self.status,
            });
        }

        let mut events = Vec::with_capacity(3);
        if self.money_deposited {
            events.push(TransactionEvent::deposit_rolled_back());
        }
        if self.money_withdrawn {
            events.push(TransactionEvent::withdraw_rolled_back());
        }
        events.push(TransactionEvent::rolled_back(
            from.clone(),
            to.clone(),
            amount,
        ));
        Ok(events)
    }
}
