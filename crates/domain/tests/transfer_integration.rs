//! Integration tests driving a full transfer through both services.

use std::sync::Arc;

use common::{AggregateId, CorrelationId, Email, Money};
use domain::{
    AccountService, CreateAccount, CreateBankTransaction, DepositFromTransfer, FinishTransaction,
    TransactionService, TransactionStatus, ValidateMoneyDeposit, ValidateMoneyWithdraw,
    WithdrawForTransfer,
};
use runtime::InMemoryLockProvider;
use store::{InMemoryEventLog, InMemoryRepository, Persisted};

struct TestRig {
    accounts: AccountService,
    transactions: TransactionService,
    log: Arc<InMemoryEventLog>,
}

fn rig() -> TestRig {
    let log = Arc::new(InMemoryEventLog::new());
    let locks = Arc::new(InMemoryLockProvider::new());
    let accounts = AccountService::new(
        Arc::new(InMemoryRepository::new("account-events", log.clone())),
        locks.clone(),
    );
    let transactions = TransactionService::new(
        Arc::new(InMemoryRepository::new("transaction-events", log.clone())),
        locks,
    );
    TestRig {
        accounts,
        transactions,
        log,
    }
}

async fn open_account(rig: &TestRig, email: &str, cents: i64) -> AggregateId {
    let cmd = CreateAccount::for_owner(Email::parse(email).unwrap(), Money::from_cents(cents));
    let id = cmd.account_id.clone();
    rig.accounts.create_account(cmd).await.unwrap();
    id
}

#[tokio::test]
async fn full_transfer_settles_both_accounts_and_finishes_the_transaction() {
    let rig = rig();
    let from = open_account(&rig, "alice@example.com", 10_000).await;
    let to = open_account(&rig, "bob@example.com", 500).await;

    // API side: create the transaction and move the money on both accounts.
    let create = CreateBankTransaction::new(
        CorrelationId::new(),
        from.clone(),
        to.clone(),
        Money::from_cents(2_500),
    );
    let transaction_id = create.transaction_id.clone();
    rig.transactions.create_transaction(create).await.unwrap();

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

    // Saga side: both confirmations land on the transaction.
    rig.transactions
        .validate_money_withdraw(ValidateMoneyWithdraw::new(
            transaction_id.clone(),
            from.clone(),
        ))
        .await
        .unwrap();
    let outcome = rig
        .transactions
        .validate_money_deposit(ValidateMoneyDeposit::new(transaction_id.clone(), to.clone()))
        .await
        .unwrap();
    assert_eq!(outcome.aggregate.status(), TransactionStatus::Finished);

    // Close the books on both accounts.
    rig.accounts
        .finish_transaction(FinishTransaction::new(from.clone(), transaction_id.clone()))
        .await
        .unwrap();
    rig.accounts
        .finish_transaction(FinishTransaction::new(to.clone(), transaction_id.clone()))
        .await
        .unwrap();

    let source = rig.accounts.get_account(&from).await.unwrap().unwrap();
    let destination = rig.accounts.get_account(&to).await.unwrap().unwrap();

    assert_eq!(source.balance().cents(), 7_500);
    assert_eq!(destination.balance().cents(), 3_000);
    assert!(source.opened_transactions().is_empty());
    assert!(destination.opened_transactions().is_empty());
    assert!(source.finished_transactions().contains(&transaction_id));
    assert!(destination.finished_transactions().contains(&transaction_id));
}

#[tokio::test]
async fn transaction_events_reach_the_stream_in_saga_order() {
    let rig = rig();
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
    rig.transactions
        .validate_money_withdraw(ValidateMoneyWithdraw::new(transaction_id.clone(), from))
        .await
        .unwrap();
    rig.transactions
        .validate_money_deposit(ValidateMoneyDeposit::new(transaction_id, to))
        .await
        .unwrap();

    let types: Vec<_> = rig
        .log
        .entries("transaction-events")
        .await
        .into_iter()
        .map(|e| e.event_type)
        .collect();
    assert_eq!(
        types,
        vec![
            "TransactionCreated",
            "TransactionMoneyWithdrawn",
            "TransactionFinished"
        ]
    );
}

#[tokio::test]
async fn concurrent_deposits_on_one_account_all_apply() {
    let rig = Arc::new(rig());
    let account_id = open_account(&rig, "alice@example.com", 0).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let rig = rig.clone();
        let account_id = account_id.clone();
        handles.push(tokio::spawn(async move {
            rig.accounts
                .deposit_money(domain::DepositMoney::new(account_id, Money::from_cents(100)))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let account = rig.accounts.get_account(&account_id).await.unwrap().unwrap();
    assert_eq!(account.balance().cents(), 1_000);
    assert_eq!(account.version().as_i64(), 11);
}

#[tokio::test]
async fn overdrawing_transfer_leaves_everything_untouched() {
    let rig = rig();
    let from = open_account(&rig, "alice@example.com", 100).await;

    let result = rig
        .accounts
        .withdraw_for_transfer(WithdrawForTransfer::new(
            from.clone(),
            AggregateId::from_string("txn-1"),
            Money::from_cents(5_000),
        ))
        .await;
    assert!(result.is_err());

    let account = rig.accounts.get_account(&from).await.unwrap().unwrap();
    assert_eq!(account.balance().cents(), 100);
    assert!(account.opened_transactions().is_empty());
    // Only the creation event was ever published.
    assert_eq!(rig.log.len("account-events").await, 1);
}
