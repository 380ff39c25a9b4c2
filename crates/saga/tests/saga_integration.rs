//! End-to-end choreography tests: account commands publish events, the
//! stream listener delivers them, and the saga drives the transaction to
//! its terminal state.

use std::sync::Arc;
use std::time::Duration;

use common::{AggregateId, CorrelationId, Email, Money};
use domain::{
    AccountEvent, AccountService, CreateAccount, CreateBankTransaction, DepositFromTransfer,
    FinishTransaction, TransactionService, TransactionStatus, WithdrawForTransfer,
};
use runtime::{Delivery, InMemoryLockProvider, ListenerConfig, LockProvider, spawn_listener};
use saga::TransferChoreography;
use store::{EventLog, InMemoryEventLog, InMemoryRepository};
use tokio::sync::mpsc;

const ACCOUNT_STREAM: &str = "account-events";
const TRANSACTION_STREAM: &str = "transaction-events";

struct Rig {
    accounts: AccountService,
    transactions: Arc<TransactionService>,
    log: Arc<InMemoryEventLog>,
    listener: runtime::ListenerHandle,
}

async fn rig() -> Rig {
    let log = Arc::new(InMemoryEventLog::new());
    let locks = Arc::new(InMemoryLockProvider::new());

    let accounts = AccountService::new(
        Arc::new(InMemoryRepository::new(ACCOUNT_STREAM, log.clone())),
        locks.clone(),
    );
    let transactions = Arc::new(TransactionService::new(
        Arc::new(InMemoryRepository::new(TRANSACTION_STREAM, log.clone())),
        locks.clone(),
    ));

    let mut config = ListenerConfig::new(ACCOUNT_STREAM, "transaction-choreography", "worker-1");
    config.poll_block = Duration::from_millis(50);
    config.error_pause = Duration::from_millis(10);

    let (delivery_tx, delivery_rx) = mpsc::channel::<Delivery<AccountEvent>>(64);
    let (error_tx, _error_rx) = mpsc::channel(16);
    let listener = spawn_listener(
        log.clone() as Arc<dyn EventLog>,
        Some(locks as Arc<dyn LockProvider>),
        config,
        delivery_tx,
        error_tx,
    );

    TransferChoreography::new(transactions.clone(), delivery_rx).spawn();

    Rig {
        accounts,
        transactions,
        log,
        listener,
    }
}

async fn open_account(rig: &Rig, email: &str, cents: i64) -> AggregateId {
    let cmd = CreateAccount::for_owner(Email::parse(email).unwrap(), Money::from_cents(cents));
    let id = cmd.account_id.clone();
    rig.accounts.create_account(cmd).await.unwrap();
    id
}

async fn eventually(deadline: Duration, mut check: impl AsyncFnMut() -> bool) -> bool {
    let end = tokio::time::Instant::now() + deadline;
    while tokio::time::Instant::now() < end {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn choreographed_transfer_reaches_finished_with_one_finished_event() {
    let rig = rig().await;
    let from = open_account(&rig, "alice@example.com", 10_000).await;
    let to = open_account(&rig, "bob@example.com", 0).await;

    let create = CreateBankTransaction::new(
        CorrelationId::new(),
        from.clone(),
        to.clone(),
        Money::from_cents(2_500),
    );
    let transaction_id = create.transaction_id.clone();
    rig.transactions.create_transaction(create).await.unwrap();

    // Move the money on both accounts; the choreography confirms both
    // sides on the transaction from the published events.
    rig.accounts
        .withdraw_for_transfer(WithdrawForTransfer::new(
            from.clone(),
            transaction_id.clone(),
            Money::from_cents(2_500),
        ))
        .await
        .unwrap();
    rig.accounts
        .deposit_from_transfer(DepositFromTransfer::new(
            to.clone(),
            transaction_id.clone(),
            Money::from_cents(2_500),
        ))
        .await
        .unwrap();

    let transactions = rig.transactions.clone();
    let txn = transaction_id.clone();
    assert!(
        eventually(Duration::from_secs(5), async || {
            transactions
                .get_transaction(&txn)
                .await
                .unwrap()
                .map(|t| t.status() == TransactionStatus::Finished)
                .unwrap_or(false)
        })
        .await,
        "transaction must reach Finished through the choreography"
    );

    let finished_events = rig
        .log
        .entries(TRANSACTION_STREAM)
        .await
        .into_iter()
        .filter(|e| e.event_type == "TransactionFinished")
        .count();
    assert_eq!(
        finished_events, 1,
        "the second confirmation collapses into a single Finished event"
    );

    // All account events must end up acknowledged.
    assert!(
        eventually(Duration::from_secs(2), async || {
            rig.log
                .pending_count(ACCOUNT_STREAM, "transaction-choreography")
                .await
                == 0
        })
        .await
    );

    rig.listener.stop().await;
}

#[tokio::test]
async fn closing_the_books_dispatches_finish_notifications() {
    let rig = rig().await;
    let from = open_account(&rig, "alice@example.com", 10_000).await;
    let to = open_account(&rig, "bob@example.com", 0).await;

    let create = CreateBankTransaction::new(
        CorrelationId::new(),
        from.clone(),
        to.clone(),
        Money::from_cents(1_000),
    );
    let transaction_id = create.transaction_id.clone();
    rig.transactions.create_transaction(create).await.unwrap();

    rig.accounts
        .withdraw_for_transfer(WithdrawForTransfer::new(
            from.clone(),
            transaction_id.clone(),
            Money::from_cents(1_000),
        ))
        .await
        .unwrap();
    rig.accounts
        .deposit_from_transfer(DepositFromTransfer::new(
            to.clone(),
            transaction_id.clone(),
            Money::from_cents(1_000),
        ))
        .await
        .unwrap();

    let transactions = rig.transactions.clone();
    let txn = transaction_id.clone();
    assert!(
        eventually(Duration::from_secs(5), async || {
            transactions
                .get_transaction(&txn)
                .await
                .unwrap()
                .map(|t| t.status() == TransactionStatus::Finished)
                .unwrap_or(false)
        })
        .await
    );

    // API side closes the books; the resulting account events loop back as
    // finish notifications on an already-finished transaction and must not
    // disturb it.
    rig.accounts
        .finish_transaction(FinishTransaction::new(from.clone(), transaction_id.clone()))
        .await
        .unwrap();
    rig.accounts
        .finish_transaction(FinishTransaction::new(to.clone(), transaction_id.clone()))
        .await
        .unwrap();

    assert!(
        eventually(Duration::from_secs(2), async || {
            rig.log
                .pending_count(ACCOUNT_STREAM, "transaction-choreography")
                .await
                == 0
        })
        .await
    );

    let transaction = rig
        .transactions
        .get_transaction(&transaction_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(transaction.status(), TransactionStatus::Finished);
    assert!(transaction.money_withdrawn());
    assert!(transaction.money_deposited());

    rig.listener.stop().await;
}

#[tokio::test]
async fn confirmation_for_unknown_transaction_is_dropped() {
    let rig = rig().await;
    let from = open_account(&rig, "alice@example.com", 10_000).await;

    // The account debits itself for a transaction nobody created. The
    // choreography's command is rejected and dropped; the stream keeps
    // flowing.
    let ghost = AggregateId::from_string("txn-ghost");
    rig.accounts
        .withdraw_for_transfer(WithdrawForTransfer::new(
            from.clone(),
            ghost.clone(),
            Money::from_cents(100),
        ))
        .await
        .unwrap();
    rig.accounts
        .finish_transaction(FinishTransaction::new(from.clone(), ghost.clone()))
        .await
        .unwrap();

    assert!(
        eventually(Duration::from_secs(2), async || {
            rig.log
                .pending_count(ACCOUNT_STREAM, "transaction-choreography")
                .await
                == 0
        })
        .await,
        "dropped commands must still acknowledge their entries"
    );

    assert!(
        rig.transactions
            .get_transaction(&ghost)
            .await
            .unwrap()
            .is_none(),
        "no transaction may appear out of thin air"
    );

    rig.listener.stop().await;
}
