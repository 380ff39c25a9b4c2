//! Account aggregate implementation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::{AggregateId, Email, Money};
use serde::{Deserialize, Serialize};
use store::{Persisted, Version};

use crate::aggregate::Aggregate;

use super::{AccountError, AccountEvent};

/// Account aggregate root.
///
/// Owns a non-negative balance and the bookkeeping of transfers touching
/// it: a transaction id sits in the opened set from the moment a transfer
/// debits or credits this account until the transfer completes, at which
/// point it moves to the finished set. The two sets are always disjoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account identifier.
    id: Option<AggregateId>,

    /// Owner's email address.
    email: Option<Email>,

    /// Current balance, never negative.
    balance: Money,

    /// Transfers currently in progress on this account.
    opened_transactions: HashSet<AggregateId>,

    /// Transfers that have completed on this account.
    finished_transactions: HashSet<AggregateId>,

    /// Current version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    /// When the account was created.
    created_at: Option<DateTime<Utc>>,

    /// When the account last changed.
    updated_at: Option<DateTime<Utc>>,
}

impl Persisted for Account {
    fn aggregate_id(&self) -> Option<&AggregateId> {
        self.id.as_ref()
    }

    fn version(&self) -> Version {
        self.version
    }
}

impl Aggregate for Account {
    type Event = AccountEvent;
    type Error = AccountError;

    fn aggregate_type() -> &'static str {
        "Account"
    }

    fn apply(&mut self, event: Self::Event) {
        self.updated_at = Some(event.occurred_at());
        match event {
            AccountEvent::AccountCreated(data) => {
                self.id = Some(data.account_id);
                self.email = Some(data.email);
                self.balance = data.initial_balance;
                self.created_at = Some(data.occurred_at);
            }
            AccountEvent::MoneyDeposited(data) => {
                self.balance += data.amount;
            }
            AccountEvent::MoneyWithdrawn(data) => {
                self.balance -= data.amount;
            }
            AccountEvent::TransferWithdrawalStarted(data) => {
                self.opened_transactions.insert(data.transaction_id);
                self.balance -= data.amount;
            }
            AccountEvent::TransferDepositStarted(data) => {
                self.opened_transactions.insert(data.transaction_id);
                self.balance += data.amount;
            }
            AccountEvent::TransactionFinished(data) => {
                self.opened_transactions.remove(&data.transaction_id);
                self.finished_transactions.insert(data.transaction_id);
            }
        }
        self.version = self.version.next();
    }
}

// Query methods
impl Account {
    /// Returns the account ID.
    pub fn id(&self) -> Option<&AggregateId> {
        self.id.as_ref()
    }

    /// Returns the owner's email.
    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    /// Returns the current balance.
    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Returns the transfers currently in progress on this account.
    pub fn opened_transactions(&self) -> &HashSet<AggregateId> {
        &self.opened_transactions
    }

    /// Returns the transfers that have completed on this account.
    pub fn finished_transactions(&self) -> &HashSet<AggregateId> {
        &self.finished_transactions
    }

    /// When the account was created.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// When the account last changed.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn ensure_created(&self) -> Result<(), AccountError> {
        if self.id.is_none() {
            return Err(AccountError::NotCreated);
        }
        Ok(())
    }
}

// Command methods (pure: state in, events out)
impl Account {
    /// Creates the account with an opening balance.
    pub fn create(
        &self,
        account_id: AggregateId,
        email: Email,
        initial_balance: Money,
    ) -> Result<Vec<AccountEvent>, AccountError> {
        if self.id.is_some() {
            return Err(AccountError::AlreadyCreated);
        }
        if initial_balance.is_negative() {
            return Err(AccountError::NegativeInitialBalance {
                balance: initial_balance,
            });
        }

        Ok(vec![AccountEvent::account_created(
            account_id,
            email,
            initial_balance,
        )])
    }

    /// Deposits money directly into the account.
    pub fn deposit(&self, amount: Money) -> Result<Vec<AccountEvent>, AccountError> {
        self.ensure_created()?;
        if !amount.is_positive() {
            return Err(AccountError::InvalidAmount { amount });
        }

        Ok(vec![AccountEvent::money_deposited(amount)])
    }

    /// Withdraws money directly from the account.
    pub fn withdraw(&self, amount: Money) -> Result<Vec<AccountEvent>, AccountError> {
        self.ensure_created()?;
        if !amount.is_positive() {
            return Err(AccountError::InvalidAmount { amount });
        }
        if amount > self.balance {
            return Err(AccountError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }

        Ok(vec![AccountEvent::money_withdrawn(amount)])
    }

    /// Debits the account for an outgoing transfer and opens the
    /// transaction on it.
    pub fn withdraw_for_transfer(
        &self,
        transaction_id: AggregateId,
        amount: Money,
    ) -> Result<Vec<AccountEvent>, AccountError> {
        self.ensure_created()?;
        if self.balance < amount {
            return Err(AccountError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }
        self.ensure_transfer_unknown(&transaction_id)?;

        Ok(vec![AccountEvent::transfer_withdrawal_started(
            transaction_id,
            amount,
        )])
    }

    /// Credits the account for an incoming transfer and opens the
    /// transaction on it.
    pub fn deposit_from_transfer(
        &self,
        transaction_id: AggregateId,
        amount: Money,
    ) -> Result<Vec<AccountEvent>, AccountError> {
        self.ensure_created()?;
        self.ensure_transfer_unknown(&transaction_id)?;

        Ok(vec![AccountEvent::transfer_deposit_started(
            transaction_id,
            amount,
        )])
    }

    /// Marks an open transfer as finished on this account.
    pub fn finish_transaction(
        &self,
        transaction_id: AggregateId,
    ) -> Result<Vec<AccountEvent>, AccountError> {
        self.ensure_created()?;
        if !self.opened_transactions.contains(&transaction_id) {
            return Err(AccountError::TransferNotOpen { transaction_id });
        }

        Ok(vec![AccountEvent::transaction_finished(transaction_id)])
    }

    fn ensure_transfer_unknown(&self, transaction_id: &AggregateId) -> Result<(), AccountError> {
        if self.opened_transactions.contains(transaction_id) {
            return Err(AccountError::TransferAlreadyOpen {
                transaction_id: transaction_id.clone(),
            });
        }
        if self.finished_transactions.contains(transaction_id) {
            return Err(AccountError::TransferAlreadyFinished {
                transaction_id: transaction_id.clone(),
            });
        }
        Ok(())
    }
}
