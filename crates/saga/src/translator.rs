//! Pure mapping from account events to transaction commands.

use common::AggregateId;
use domain::AccountEvent;

/// A transaction command the saga derives from one account event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaReaction {
    /// The source account debited itself: confirm the withdrawal.
    ValidateWithdraw {
        transaction_id: AggregateId,
        account_id: AggregateId,
    },

    /// The destination account credited itself: confirm the deposit.
    ValidateDeposit {
        transaction_id: AggregateId,
        account_id: AggregateId,
    },

    /// An account closed its side of the transfer: finish the transaction.
    /// The driver must look the transaction up to recover its correlation
    /// id and participants.
    Finish { transaction_id: AggregateId },
}

/// Maps one account event to the transaction command it triggers, if any.
///
/// `account_id` is the aggregate the event was published under (the
/// stream's partition key). Plain deposits and withdrawals concern no
/// transfer and map to nothing; rollback acknowledgements from the
/// account side are likewise consumed without producing a command — the
/// compensation loop is not wired back yet.
pub fn react(account_id: &AggregateId, event: &AccountEvent) -> Option<SagaReaction> {
    match event {
        AccountEvent::TransferWithdrawalStarted(data) => Some(SagaReaction::ValidateWithdraw {
            transaction_id: data.transaction_id.clone(),
            account_id: account_id.clone(),
        }),
        AccountEvent::TransferDepositStarted(data) => Some(SagaReaction::ValidateDeposit {
            transaction_id: data.transaction_id.clone(),
            account_id: account_id.clone(),
        }),
        AccountEvent::TransactionFinished(data) => Some(SagaReaction::Finish {
            transaction_id: data.transaction_id.clone(),
        }),
        AccountEvent::AccountCreated(_)
        | AccountEvent::MoneyDeposited(_)
        | AccountEvent::MoneyWithdrawn(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Email, Money};

    fn ids() -> (AggregateId, AggregateId) {
        (
            AggregateId::from_string("account-a"),
            AggregateId::from_string("txn-1"),
        )
    }

    #[test]
    fn withdrawal_started_maps_to_validate_withdraw() {
        let (account, txn) = ids();
        let event = AccountEvent::transfer_withdrawal_started(txn.clone(), Money::from_cents(100));

        assert_eq!(
            react(&account, &event),
            Some(SagaReaction::ValidateWithdraw {
                transaction_id: txn,
                account_id: account,
            })
        );
    }

    #[test]
    fn deposit_started_maps_to_validate_deposit() {
        let (account, txn) = ids();
        let event = AccountEvent::transfer_deposit_started(txn.clone(), Money::from_cents(100));

        assert_eq!(
            react(&account, &event),
            Some(SagaReaction::ValidateDeposit {
                transaction_id: txn,
                account_id: account,
            })
        );
    }

    #[test]
    fn transaction_finished_maps_to_finish() {
        let (account, txn) = ids();
        let event = AccountEvent::transaction_finished(txn.clone());

        assert_eq!(
            react(&account, &event),
            Some(SagaReaction::Finish {
                transaction_id: txn
            })
        );
    }

    #[test]
    fn unrelated_account_events_map_to_nothing() {
        let (account, _) = ids();

        let created = AccountEvent::account_created(
            account.clone(),
            Email::parse("alice@example.com").unwrap(),
            Money::from_cents(100),
        );
        assert_eq!(react(&account, &created), None);

        let deposited = AccountEvent::money_deposited(Money::from_cents(100));
        assert_eq!(react(&account, &deposited), None);

        let withdrawn = AccountEvent::money_withdrawn(Money::from_cents(100));
        assert_eq!(react(&account, &withdrawn), None);
    }
}
