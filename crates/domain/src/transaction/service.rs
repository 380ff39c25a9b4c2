//! Transaction service providing the command surface for transfers.

use std::sync::Arc;

use common::AggregateId;
use runtime::LockProvider;
use store::Repository;

use crate::error::DomainError;
use crate::executor::{CommandExecutor, CommandOutcome};

use super::{
    CancelBankTransaction, CreateBankTransaction, FinishBankTransaction, Transaction,
    ValidateMoneyDeposit, ValidateMoneyWithdraw,
};

/// Service for managing bank transactions.
///
/// Confirmations arrive from the choreography over an at-least-once
/// stream, so every method here may see the same command twice; the
/// aggregate's flag checks and terminal-status rejections make the
/// duplicates observable to the caller without corrupting state.
pub struct TransactionService {
    executor: CommandExecutor<Transaction>,
}

impl TransactionService {
    /// Creates a new transaction service.
    pub fn new(
        repository: Arc<dyn Repository<Transaction>>,
        locks: Arc<dyn LockProvider>,
    ) -> Self {
        Self {
            executor: CommandExecutor::new(repository, locks),
        }
    }

    /// Creates a new bank transaction.
    #[tracing::instrument(skip(self), fields(correlation_id = %cmd.correlation_id))]
    pub async fn create_transaction(
        &self,
        cmd: CreateBankTransaction,
    ) -> Result<CommandOutcome<Transaction>, DomainError> {
        metrics::counter!("transaction_commands_total").increment(1);
        let CreateBankTransaction {
            transaction_id,
            correlation_id,
            from_account,
            to_account,
            amount,
        } = cmd;
        let id = transaction_id.clone();

        self.executor
            .execute(&id, move |transaction| {
                transaction.create(transaction_id, correlation_id, from_account, to_account, amount)
            })
            .await
    }

    /// Records the source account's withdrawal confirmation.
    #[tracing::instrument(skip(self))]
    pub async fn validate_money_withdraw(
        &self,
        cmd: ValidateMoneyWithdraw,
    ) -> Result<CommandOutcome<Transaction>, DomainError> {
        metrics::counter!("transaction_commands_total").increment(1);
        self.executor
            .execute(&cmd.transaction_id, |transaction| {
                transaction.validate_money_withdraw(&cmd.account_id)
            })
            .await
    }

    /// Records the destination account's deposit confirmation.
    #[tracing::instrument(skip(self))]
    pub async fn validate_money_deposit(
        &self,
        cmd: ValidateMoneyDeposit,
    ) -> Result<CommandOutcome<Transaction>, DomainError> {
        metrics::counter!("transaction_commands_total").increment(1);
        self.executor
            .execute(&cmd.transaction_id, |transaction| {
                transaction.validate_money_deposit(&cmd.account_id)
            })
            .await
    }

    /// Completes a fully-confirmed transfer.
    #[tracing::instrument(skip(self), fields(correlation_id = %cmd.correlation_id))]
    pub async fn finish_transaction(
        &self,
        cmd: FinishBankTransaction,
    ) -> Result<CommandOutcome<Transaction>, DomainError> {
        metrics::counter!("transaction_commands_total").increment(1);
        self.executor
            .execute(&cmd.transaction_id, |transaction| transaction.finish())
            .await
    }

    /// Cancels a transfer, compensating its progress.
    #[tracing::instrument(skip(self), fields(correlation_id = %cmd.correlation_id))]
    pub async fn cancel_transaction(
        &self,
        cmd: CancelBankTransaction,
    ) -> Result<CommandOutcome<Transaction>, DomainError> {
        metrics::counter!("transaction_commands_total").increment(1);
        self.executor
            .execute(&cmd.transaction_id, |transaction| {
                transaction.cancel(cmd.amount)
            })
            .await
    }

    /// Loads a transaction by ID, or None if it doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_transaction(
        &self,
        transaction_id: &AggregateId,
    ) -> Result<Option<Transaction>, DomainError> {
        self.executor.load_existing(transaction_id).await
    }
}
