//! Account commands.

use common::{AggregateId, Email, Money};

use crate::executor::Command;

use super::Account;

/// Command to create a new account.
#[derive(Debug, Clone)]
pub struct CreateAccount {
    /// The account ID to create.
    pub account_id: AggregateId,

    /// The owner's email address.
    pub email: Email,

    /// Opening balance.
    pub initial_balance: Money,
}

impl CreateAccount {
    /// Creates a new CreateAccount command.
    pub fn new(account_id: AggregateId, email: Email, initial_balance: Money) -> Self {
        Self {
            account_id,
            email,
            initial_balance,
        }
    }

    /// Creates a new CreateAccount command with a generated account ID.
    pub fn for_owner(email: Email, initial_balance: Money) -> Self {
        Self::new(AggregateId::new(), email, initial_balance)
    }
}

impl Command for CreateAccount {
    type Aggregate = Account;

    fn aggregate_id(&self) -> &AggregateId {
        &self.account_id
    }
}

/// Command to deposit money directly into an account.
#[derive(Debug, Clone)]
pub struct DepositMoney {
    /// The target account.
    pub account_id: AggregateId,

    /// Amount to credit.
    pub amount: Money,
}

impl DepositMoney {
    /// Creates a new DepositMoney command.
    pub fn new(account_id: AggregateId, amount: Money) -> Self {
        Self { account_id, amount }
    }
}

impl Command for DepositMoney {
    type Aggregate = Account;

    fn aggregate_id(&self) -> &AggregateId {
        &self.account_id
    }
}

/// Command to withdraw money directly from an account.
#[derive(Debug, Clone)]
pub struct WithdrawMoney {
    /// The target account.
    pub account_id: AggregateId,

    /// Amount to debit.
    pub amount: Money,
}

impl WithdrawMoney {
    /// Creates a new WithdrawMoney command.
    pub fn new(account_id: AggregateId, amount: Money) -> Self {
        Self { account_id, amount }
    }
}

impl Command for WithdrawMoney {
    type Aggregate = Account;

    fn aggregate_id(&self) -> &AggregateId {
        &self.account_id
    }
}

/// Command to debit an account for an outgoing transfer.
#[derive(Debug, Clone)]
pub struct WithdrawForTransfer {
    /// The account being debited.
    pub account_id: AggregateId,

    /// The transaction driving the transfer.
    pub transaction_id: AggregateId,

    /// Amount to debit.
    pub amount: Money,
}

impl WithdrawForTransfer {
    /// Creates a new WithdrawForTransfer command.
    pub fn new(account_id: AggregateId, transaction_id: AggregateId, amount: Money) -> Self {
        Self {
            account_id,
            transaction_id,
            amount,
        }
    }
}

impl Command for WithdrawForTransfer {
    type Aggregate = Account;

    fn aggregate_id(&self) -> &AggregateId {
        &self.account_id
    }
}

/// Command to credit an account for an incoming transfer.
#[derive(Debug, Clone)]
pub struct DepositFromTransfer {
    /// The account being credited.
    pub account_id: AggregateId,

    /// The transaction driving the transfer.
    pub transaction_id: AggregateId,

    /// Amount to credit.
    pub amount: Money,
}

impl DepositFromTransfer {
    /// Creates a new DepositFromTransfer command.
    pub fn new(account_id: AggregateId, transaction_id: AggregateId, amount: Money) -> Self {
        Self {
            account_id,
            transaction_id,
            amount,
        }
    }
}

impl Command for DepositFromTransfer {
    type Aggregate = Account;

    fn aggregate_id(&self) -> &AggregateId {
        &self.account_id
    }
}

/// Command to mark an open transfer as finished on an account.
#[derive(Debug, Clone)]
pub struct FinishTransaction {
    /// The account holding the open transfer.
    pub account_id: AggregateId,

    /// The completed transaction.
    pub transaction_id: AggregateId,
}

impl FinishTransaction {
    /// Creates a new FinishTransaction command.
    pub fn new(account_id: AggregateId, transaction_id: AggregateId) -> Self {
        Self {
            account_id,
            transaction_id,
        }
    }
}

impl Command for FinishTransaction {
    type Aggregate = Account;

    fn aggregate_id(&self) -> &AggregateId {
        &self.account_id
    }
}
