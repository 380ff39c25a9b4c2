//! Composition root for the transfer service.
//!
//! Wires the in-memory adapters, both domain services, the account-event
//! listener, and the choreography driver into a running substrate. An
//! inbound transport (HTTP, gRPC, a message consumer) plugs into
//! [`AppContext::accounts`] and [`AppContext::transactions`].

pub mod config;

use std::sync::Arc;

use domain::{AccountEvent, AccountService, TransactionService};
use runtime::{
    Delivery, InMemoryLockProvider, ListenerConfig, ListenerHandle, LockProvider, spawn_listener,
};
use saga::TransferChoreography;
use store::{EventEnvelope, EventLog, InMemoryEventLog, InMemoryRepository};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use config::Config;

/// The wired application: services plus the running background tasks.
pub struct AppContext {
    /// Command surface for accounts.
    pub accounts: Arc<AccountService>,

    /// Command surface for transactions.
    pub transactions: Arc<TransactionService>,

    /// The shared event log (in-memory adapter).
    pub log: Arc<InMemoryEventLog>,

    /// Handle to the account-event listener.
    pub listener: ListenerHandle,

    /// Handle to the choreography driver task.
    pub choreography: JoinHandle<()>,

    /// Entries whose delivery failed fatally end up here.
    pub failed_deliveries: mpsc::Receiver<EventEnvelope>,
}

impl AppContext {
    /// Stops the background tasks. Unacknowledged stream entries stay
    /// claimable for the next start.
    pub async fn shutdown(self) {
        self.listener.stop().await;
        // The listener owned the only sender feeding the choreography, so
        // its channel drains and closes now.
        let _ = self.choreography.await;
    }
}

/// Wires services, listener, and choreography over in-memory adapters.
pub fn wire(config: &Config) -> AppContext {
    let log = Arc::new(InMemoryEventLog::new());
    let locks = Arc::new(InMemoryLockProvider::new());

    let accounts = Arc::new(AccountService::new(
        Arc::new(InMemoryRepository::new(
            config.account_stream.clone(),
            log.clone(),
        )),
        locks.clone(),
    ));
    let transactions = Arc::new(TransactionService::new(
        Arc::new(InMemoryRepository::new(
            config.transaction_stream.clone(),
            log.clone(),
        )),
        locks.clone(),
    ));

    let (delivery_tx, delivery_rx) = mpsc::channel::<Delivery<AccountEvent>>(256);
    let (error_tx, failed_deliveries) = mpsc::channel(64);

    let listener = spawn_listener(
        log.clone() as Arc<dyn EventLog>,
        Some(locks as Arc<dyn LockProvider>),
        ListenerConfig::new(
            config.account_stream.clone(),
            config.consumer_group.clone(),
            config.consumer_name.clone(),
        ),
        delivery_tx,
        error_tx,
    );

    let choreography = TransferChoreography::new(transactions.clone(), delivery_rx).spawn();

    AppContext {
        accounts,
        transactions,
        log,
        listener,
        choreography,
        failed_deliveries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{CorrelationId, Email, Money};
    use domain::{
        CreateAccount, CreateBankTransaction, DepositFromTransfer, TransactionStatus,
        WithdrawForTransfer,
    };
    use std::time::Duration;

    #[tokio::test]
    async fn wired_context_runs_a_transfer_end_to_end() {
        let context = wire(&Config::default());

        let create_from = CreateAccount::for_owner(
            Email::parse("alice@example.com").unwrap(),
            Money::from_cents(5_000),
        );
        let from = create_from.account_id.clone();
        context.accounts.create_account(create_from).await.unwrap();

        let create_to = CreateAccount::for_owner(
            Email::parse("bob@example.com").unwrap(),
            Money::from_cents(0),
        );
        let to = create_to.account_id.clone();
        context.accounts.create_account(create_to).await.unwrap();

        let create_txn = CreateBankTransaction::new(
            CorrelationId::new(),
            from.clone(),
            to.clone(),
            Money::from_cents(1_000),
        );
        let transaction_id = create_txn.transaction_id.clone();
        context
            .transactions
            .create_transaction(create_txn)
            .await
            .unwrap();

        context
            .accounts
            .withdraw_for_transfer(WithdrawForTransfer::new(
                from,
                transaction_id.clone(),
                Money::from_cents(1_000),
            ))
            .await
            .unwrap();
        context
            .accounts
            .deposit_from_transfer(DepositFromTransfer::new(
                to,
                transaction_id.clone(),
                Money::from_cents(1_000),
            ))
            .await
            .unwrap();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        let mut finished = false;
        while tokio::time::Instant::now() < deadline {
            let transaction = context
                .transactions
                .get_transaction(&transaction_id)
                .await
                .unwrap();
            if transaction.map(|t| t.status() == TransactionStatus::Finished) == Some(true) {
                finished = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(finished, "the wired choreography must finish the transfer");

        context.shutdown().await;
    }
}
