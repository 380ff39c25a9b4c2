//! Driver consuming account-event deliveries and dispatching the mapped
//! transaction commands.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use domain::{
    AccountEvent, DomainError, FinishBankTransaction, TransactionService, ValidateMoneyDeposit,
    ValidateMoneyWithdraw,
};
use runtime::Delivery;

use crate::translator::{SagaReaction, react};

/// Consumes account events delivered by the stream listener and closes the
/// saga loop through the transaction service.
///
/// The stream is at-least-once, so business-rule rejections here are
/// expected operation, not failures: a redelivered confirmation lands on a
/// terminal transaction, a finish notification may arrive before the
/// transaction is visible. Such commands are logged and dropped;
/// infrastructure errors are logged at error level and dropped likewise,
/// leaving redelivery to the stream.
pub struct TransferChoreography {
    transactions: Arc<TransactionService>,
    deliveries: mpsc::Receiver<Delivery<AccountEvent>>,
}

impl TransferChoreography {
    /// Creates a new choreography driver.
    pub fn new(
        transactions: Arc<TransactionService>,
        deliveries: mpsc::Receiver<Delivery<AccountEvent>>,
    ) -> Self {
        Self {
            transactions,
            deliveries,
        }
    }

    /// Spawns the driver as a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until the delivery channel closes.
    pub async fn run(mut self) {
        tracing::info!("transfer choreography started");
        while let Some(delivery) = self.deliveries.recv().await {
            self.handle(delivery).await;
        }
        tracing::info!("transfer choreography stopped, delivery channel closed");
    }

    async fn handle(&self, delivery: Delivery<AccountEvent>) {
        let account_id = delivery.envelope.aggregate_id.clone();
        let Some(reaction) = react(&account_id, &delivery.event) else {
            return;
        };

        metrics::counter!("saga_reactions_total").increment(1);
        tracing::debug!(%account_id, ?reaction, "reacting to account event");

        match reaction {
            SagaReaction::ValidateWithdraw {
                transaction_id,
                account_id,
            } => {
                let result = self
                    .transactions
                    .validate_money_withdraw(ValidateMoneyWithdraw::new(
                        transaction_id.clone(),
                        account_id,
                    ))
                    .await;
                Self::settle("validate_money_withdraw", &transaction_id, result);
            }
            SagaReaction::ValidateDeposit {
                transaction_id,
                account_id,
            } => {
                let result = self
                    .transactions
                    .validate_money_deposit(ValidateMoneyDeposit::new(
                        transaction_id.clone(),
                        account_id,
                    ))
                    .await;
                Self::settle("validate_money_deposit", &transaction_id, result);
            }
            SagaReaction::Finish { transaction_id } => {
                self.finish(transaction_id).await;
            }
        }
    }

    /// Looks the transaction up to recover correlation and participants,
    /// then dispatches the finish command. A missing transaction — not yet
    /// visible, a duplicate, or stale — is dropped with a warning.
    async fn finish(&self, transaction_id: common::AggregateId) {
        match self.transactions.get_transaction(&transaction_id).await {
            Ok(Some(transaction)) => {
                let (Some(correlation_id), Some(from), Some(to)) = (
                    transaction.correlation_id(),
                    transaction.from_account(),
                    transaction.to_account(),
                ) else {
                    tracing::warn!(%transaction_id, "transaction has no participants yet, dropping finish notification");
                    return;
                };

                let result = self
                    .transactions
                    .finish_transaction(FinishBankTransaction::new(
                        transaction_id.clone(),
                        correlation_id.clone(),
                        from.clone(),
                        to.clone(),
                    ))
                    .await;
                Self::settle("finish_transaction", &transaction_id, result);
            }
            Ok(None) => {
                tracing::warn!(%transaction_id, "transaction not visible yet, dropping finish notification");
            }
            Err(error) => {
                tracing::error!(%transaction_id, %error, "transaction lookup failed");
            }
        }
    }

    fn settle<T>(command: &str, transaction_id: &common::AggregateId, result: Result<T, DomainError>) {
        match result {
            Ok(_) => {
                tracing::debug!(%transaction_id, command, "saga command applied");
            }
            Err(DomainError::Transaction(rejection)) => {
                // Duplicate or out-of-order delivery hitting a business
                // rule; the transaction state is already where it should be.
                tracing::warn!(%transaction_id, command, %rejection, "saga command rejected, dropping");
                metrics::counter!("saga_commands_dropped").increment(1);
            }
            Err(error) => {
                tracing::error!(%transaction_id, command, %error, "saga command failed");
            }
        }
    }
}
