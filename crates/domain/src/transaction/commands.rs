//! Transaction commands.

use common::{AggregateId, CorrelationId, Money};

use crate::executor::Command;

use super::Transaction;

/// Command to create a new bank transaction between two accounts.
#[derive(Debug, Clone)]
pub struct CreateBankTransaction {
    /// The transaction ID to create.
    pub transaction_id: AggregateId,

    /// Correlation id threading this saga.
    pub correlation_id: CorrelationId,

    /// The account money moves out of.
    pub from_account: AggregateId,

    /// The account money moves into.
    pub to_account: AggregateId,

    /// Amount to transfer.
    pub amount: Money,
}

impl CreateBankTransaction {
    /// Creates a new CreateBankTransaction command with a generated
    /// transaction ID.
    pub fn new(
        correlation_id: CorrelationId,
        from_account: AggregateId,
        to_account: AggregateId,
        amount: Money,
    ) -> Self {
        Self {
            transaction_id: AggregateId::new(),
            correlation_id,
            from_account,
            to_account,
            amount,
        }
    }
}

impl Command for CreateBankTransaction {
    type Aggregate = Transaction;

    fn aggregate_id(&self) -> &AggregateId {
        &self.transaction_id
    }
}

/// Command recording the source account's withdrawal confirmation.
#[derive(Debug, Clone)]
pub struct ValidateMoneyWithdraw {
    /// The transaction being confirmed.
    pub transaction_id: AggregateId,

    /// The account that performed the withdrawal.
    pub account_id: AggregateId,

    /// Correlation id, when the caller knows it. The choreography path
    /// confirms from the event stream and recovers it from state instead.
    pub correlation_id: Option<CorrelationId>,
}

impl ValidateMoneyWithdraw {
    /// Creates a new ValidateMoneyWithdraw command.
    pub fn new(transaction_id: AggregateId, account_id: AggregateId) -> Self {
        Self {
            transaction_id,
            account_id,
            correlation_id: None,
        }
    }

    /// Attaches a known correlation id.
    pub fn with_correlation(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

impl Command for ValidateMoneyWithdraw {
    type Aggregate = Transaction;

    fn aggregate_id(&self) -> &AggregateId {
        &self.transaction_id
    }
}

/// Command recording the destination account's deposit confirmation.
#[derive(Debug, Clone)]
pub struct ValidateMoneyDeposit {
    /// The transaction being confirmed.
    pub transaction_id: AggregateId,

    /// The account that received the deposit.
    pub account_id: AggregateId,

    /// Correlation id, when the caller knows it.
    pub correlation_id: Option<CorrelationId>,
}

impl ValidateMoneyDeposit {
    /// Creates a new ValidateMoneyDeposit command.
    pub fn new(transaction_id: AggregateId, account_id: AggregateId) -> Self {
        Self {
            transaction_id,
            account_id,
            correlation_id: None,
        }
    }

    /// Attaches a known correlation id.
    pub fn with_correlation(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

impl Command for ValidateMoneyDeposit {
    type Aggregate = Transaction;

    fn aggregate_id(&self) -> &AggregateId {
        &self.transaction_id
    }
}

/// Command to complete a fully-confirmed transfer.
#[derive(Debug, Clone)]
pub struct FinishBankTransaction {
    /// The transaction to finish.
    pub transaction_id: AggregateId,

    /// Correlation id threading this saga.
    pub correlation_id: CorrelationId,

    /// The account money moved out of.
    pub from_account: AggregateId,

    /// The account money moved into.
    pub to_account: AggregateId,
}

impl FinishBankTransaction {
    /// Creates a new FinishBankTransaction command.
    pub fn new(
        transaction_id: AggregateId,
        correlation_id: CorrelationId,
        from_account: AggregateId,
        to_account: AggregateId,
    ) -> Self {
        Self {
            transaction_id,
            correlation_id,
            from_account,
            to_account,
        }
    }
}

impl Command for FinishBankTransaction {
    type Aggregate = Transaction;

    fn aggregate_id(&self) -> &AggregateId {
        &self.transaction_id
    }
}

/// Command to cancel a transfer and compensate its progress.
#[derive(Debug, Clone)]
pub struct CancelBankTransaction {
    /// The transaction to cancel.
    pub transaction_id: AggregateId,

    /// Correlation id threading this saga.
    pub correlation_id: CorrelationId,

    /// The account money was moving out of.
    pub from_account: AggregateId,

    /// The account money was moving into.
    pub to_account: AggregateId,

    /// Amount that was being transferred.
    pub amount: Money,
}

impl CancelBankTransaction {
    /// Creates a new CancelBankTransaction command.
    pub fn new(
        transaction_id: AggregateId,
        correlation_id: CorrelationId,
        from_account: AggregateId,
        to_account: AggregateId,
        amount: Money,
    ) -> Self {
        Self {
            transaction_id,
            correlation_id,
            from_account,
            to_account,
            amount,
        }
    }
}

impl Command for CancelBankTransaction {
    type Aggregate = Transaction;

    fn aggregate_id(&self) -> &AggregateId {
        &self.transaction_id
    }
}
