//! Account service providing the command surface for accounts.

use std::sync::Arc;

use common::AggregateId;
use runtime::LockProvider;
use store::Repository;

use crate::error::DomainError;
use crate::executor::{CommandExecutor, CommandOutcome};

use super::{
    Account, CreateAccount, DepositFromTransfer, DepositMoney, FinishTransaction,
    WithdrawForTransfer, WithdrawMoney,
};

/// Service for managing accounts.
///
/// Every command runs the locked read-decide-write cycle of
/// [`CommandExecutor`]; business-rule rejections leave the account
/// untouched and publish nothing.
pub struct AccountService {
    executor: CommandExecutor<Account>,
}

impl AccountService {
    /// Creates a new account service.
    pub fn new(repository: Arc<dyn Repository<Account>>, locks: Arc<dyn LockProvider>) -> Self {
        Self {
            executor: CommandExecutor::new(repository, locks),
        }
    }

    /// Creates a new account.
    #[tracing::instrument(skip(self))]
    pub async fn create_account(
        &self,
        cmd: CreateAccount,
    ) -> Result<CommandOutcome<Account>, DomainError> {
        metrics::counter!("account_commands_total").increment(1);
        let CreateAccount {
            account_id,
            email,
            initial_balance,
        } = cmd;
        let id = account_id.clone();

        self.executor
            .execute(&id, move |account| {
                account.create(account_id, email, initial_balance)
            })
            .await
    }

    /// Deposits money into an account.
    #[tracing::instrument(skip(self))]
    pub async fn deposit_money(
        &self,
        cmd: DepositMoney,
    ) -> Result<CommandOutcome<Account>, DomainError> {
        metrics::counter!("account_commands_total").increment(1);
        self.executor
            .execute(&cmd.account_id, |account| account.deposit(cmd.amount))
            .await
    }

    /// Withdraws money from an account.
    #[tracing::instrument(skip(self))]
    pub async fn withdraw_money(
        &self,
        cmd: WithdrawMoney,
    ) -> Result<CommandOutcome<Account>, DomainError> {
        metrics::counter!("account_commands_total").increment(1);
        self.executor
            .execute(&cmd.account_id, |account| account.withdraw(cmd.amount))
            .await
    }

    /// Debits an account for an outgoing transfer.
    #[tracing::instrument(skip(self))]
    pub async fn withdraw_for_transfer(
        &self,
        cmd: WithdrawForTransfer,
    ) -> Result<CommandOutcome<Account>, DomainError> {
        metrics::counter!("account_commands_total").increment(1);
        let transaction_id = cmd.transaction_id.clone();
        self.executor
            .execute(&cmd.account_id, move |account| {
                account.withdraw_for_transfer(transaction_id, cmd.amount)
            })
            .await
    }

    /// Credits an account for an incoming transfer.
    #[tracing::instrument(skip(self))]
    pub async fn deposit_from_transfer(
        &self,
        cmd: DepositFromTransfer,
    ) -> Result<CommandOutcome<Account>, DomainError> {
        metrics::counter!("account_commands_total").increment(1);
        let transaction_id = cmd.transaction_id.clone();
        self.executor
            .execute(&cmd.account_id, move |account| {
                account.deposit_from_transfer(transaction_id, cmd.amount)
            })
            .await
    }

    /// Marks an open transfer as finished on an account.
    #[tracing::instrument(skip(self))]
    pub async fn finish_transaction(
        &self,
        cmd: FinishTransaction,
    ) -> Result<CommandOutcome<Account>, DomainError> {
        metrics::counter!("account_commands_total").increment(1);
        let transaction_id = cmd.transaction_id.clone();
        self.executor
            .execute(&cmd.account_id, move |account| {
                account.finish_transaction(transaction_id)
            })
            .await
    }

    /// Loads an account by ID, or None if it doesn't exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_account(
        &self,
        account_id: &AggregateId,
    ) -> Result<Option<Account>, DomainError> {
        self.executor.load_existing(account_id).await
    }
}
