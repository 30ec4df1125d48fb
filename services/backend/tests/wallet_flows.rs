//! Engine-level tests for the wallet operation flows
//!
//! Runs the WalletEngine over the in-memory store, which shares semantics
//! with the Redis implementation.

use std::sync::Arc;

use backend::config::Config;
use backend::domain::{
    AccountStatus, AdjustBalanceRequest, BetOutcome, BetStatus, CreateTransactionRequest,
    GameType, PlaceBetRequest, SettleBetRequest, SyncAccountRequest, TransactionStatus,
    TransactionType, TransferKind,
};
use backend::errors::AppError;
use backend::repository::{DebitPolicy, MemoryWalletStore, WalletStore};
use backend::services::WalletEngine;
use serde_json::Value;
use shared::Amount;

fn engine() -> (WalletEngine, Arc<MemoryWalletStore>) {
    let store = Arc::new(MemoryWalletStore::new());
    let engine = WalletEngine::new(store.clone(), Arc::new(Config::for_tests()));
    (engine, store)
}

fn amount(minor: u64) -> Amount {
    Amount::new(minor).expect("valid amount")
}

fn bet_request(account_id: &str, minor: u64) -> PlaceBetRequest {
    PlaceBetRequest {
        account_id: account_id.to_string(),
        game_id: Some("game-1".to_string()),
        game_type: GameType::Slots,
        amount: amount(minor),
        details: Value::Null,
        profile: None,
    }
}

fn deposit_request(account_id: &str, minor: u64) -> CreateTransactionRequest {
    CreateTransactionRequest {
        account_id: account_id.to_string(),
        tx_type: TransferKind::Deposit,
        amount: amount(minor),
        requires_approval: false,
        description: None,
        metadata: Value::Null,
        profile: None,
    }
}

fn withdrawal_request(
    account_id: &str,
    minor: u64,
    requires_approval: bool,
) -> CreateTransactionRequest {
    CreateTransactionRequest {
        account_id: account_id.to_string(),
        tx_type: TransferKind::Withdrawal,
        amount: amount(minor),
        requires_approval,
        description: None,
        metadata: Value::Null,
        profile: None,
    }
}

async fn fund(engine: &WalletEngine, account_id: &str, minor: u64) {
    engine
        .record_transaction(deposit_request(account_id, minor))
        .await
        .expect("deposit failed");
}

#[tokio::test]
async fn strict_bet_debits_balance_and_writes_ledger_entry() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 500).await;

    let response = engine
        .place_bet(bet_request("user-1", 200), DebitPolicy::Strict)
        .await
        .expect("bet rejected");

    assert_eq!(response.new_balance, 300);
    assert_eq!(response.bet.status, BetStatus::Pending);
    assert_eq!(response.bet.amount, 200);
    assert_eq!(response.bet.debited, 200);
    assert_eq!(response.transaction.tx_type, TransactionType::Bet);
    assert_eq!(response.transaction.amount, -200);
    assert_eq!(response.transaction.status, TransactionStatus::Completed);

    let balance = engine.balance("user-1").await.unwrap();
    assert_eq!(balance.balance, 300);
    assert_eq!(balance.stats.total_wagered, 200);
}

#[tokio::test]
async fn strict_bet_rejects_insufficient_balance() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 100).await;

    let result = engine
        .place_bet(bet_request("user-1", 200), DebitPolicy::Strict)
        .await;

    assert!(matches!(
        result,
        Err(AppError::InsufficientFunds {
            required: 200,
            available: 100
        })
    ));

    // Nothing was written: balance intact, no bet recorded.
    let balance = engine.balance("user-1").await.unwrap();
    assert_eq!(balance.balance, 100);
    let bets = engine.bets("user-1", 1, 10).await.unwrap();
    assert!(bets.bets.is_empty());
}

#[tokio::test]
async fn settling_won_credits_payout_once() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 500).await;
    let placed = engine
        .place_bet(bet_request("user-1", 200), DebitPolicy::Strict)
        .await
        .unwrap();

    let settled = engine
        .settle_bet(
            placed.bet.bet_id,
            SettleBetRequest {
                account_id: "user-1".to_string(),
                outcome: BetOutcome::Won,
                payout: Some(amount(600)),
            },
        )
        .await
        .expect("settlement rejected");

    assert_eq!(settled.new_balance, 900);
    assert_eq!(settled.bet.status, BetStatus::Won);
    assert_eq!(settled.bet.payout, 600);
    let entry = settled.transaction.expect("win entry missing");
    assert_eq!(entry.tx_type, TransactionType::Win);
    assert_eq!(entry.amount, 600);

    let balance = engine.balance("user-1").await.unwrap();
    assert_eq!(balance.stats.total_won, 600);
}

#[tokio::test]
async fn second_settlement_fails_and_leaves_balance_alone() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 500).await;
    let placed = engine
        .place_bet(bet_request("user-1", 200), DebitPolicy::Strict)
        .await
        .unwrap();
    let bet_id = placed.bet.bet_id;

    engine
        .settle_bet(
            bet_id,
            SettleBetRequest {
                account_id: "user-1".to_string(),
                outcome: BetOutcome::Won,
                payout: Some(amount(600)),
            },
        )
        .await
        .unwrap();

    for outcome in [BetOutcome::Won, BetOutcome::Lost] {
        let result = engine
            .settle_bet(
                bet_id,
                SettleBetRequest {
                    account_id: "user-1".to_string(),
                    outcome,
                    payout: if outcome == BetOutcome::Won {
                        Some(amount(600))
                    } else {
                        None
                    },
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::BetAlreadySettled(id)) if id == bet_id));
    }

    let balance = engine.balance("user-1").await.unwrap();
    assert_eq!(balance.balance, 900);
}

#[tokio::test]
async fn settling_lost_changes_only_the_bet() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 500).await;
    let placed = engine
        .place_bet(bet_request("user-1", 200), DebitPolicy::Strict)
        .await
        .unwrap();

    let settled = engine
        .settle_bet(
            placed.bet.bet_id,
            SettleBetRequest {
                account_id: "user-1".to_string(),
                outcome: BetOutcome::Lost,
                payout: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(settled.bet.status, BetStatus::Lost);
    assert_eq!(settled.bet.payout, 0);
    assert!(settled.transaction.is_none());
    assert_eq!(settled.new_balance, 300);
}

#[tokio::test]
async fn cancelling_refunds_the_recorded_debit() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 500).await;
    let placed = engine
        .place_bet(bet_request("user-1", 200), DebitPolicy::Strict)
        .await
        .unwrap();

    let settled = engine
        .settle_bet(
            placed.bet.bet_id,
            SettleBetRequest {
                account_id: "user-1".to_string(),
                outcome: BetOutcome::Cancelled,
                payout: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(settled.bet.status, BetStatus::Cancelled);
    assert_eq!(settled.new_balance, 500);
    let entry = settled.transaction.expect("refund entry missing");
    assert_eq!(entry.tx_type, TransactionType::Refund);
    assert_eq!(entry.amount, 200);
}

#[tokio::test]
async fn casino_bet_caps_deduction_at_available_balance() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 50).await;

    let response = engine
        .place_bet(bet_request("user-1", 200), DebitPolicy::Capped)
        .await
        .expect("capped bet must not block");

    // Balance floors at zero; the ledger records what actually left the
    // wallet, the requested stake survives on the bet and in metadata.
    assert_eq!(response.new_balance, 0);
    assert_eq!(response.bet.status, BetStatus::Pending);
    assert_eq!(response.bet.amount, 200);
    assert_eq!(response.bet.debited, 50);
    assert_eq!(response.transaction.amount, -50);
    assert_eq!(response.transaction.metadata["bet_amount"], 200);

    // The full requested stake still counts as wagered.
    let balance = engine.balance("user-1").await.unwrap();
    assert_eq!(balance.stats.total_wagered, 200);
}

#[tokio::test]
async fn cancelled_capped_bet_refunds_only_what_was_debited() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 50).await;
    let placed = engine
        .place_bet(bet_request("user-1", 200), DebitPolicy::Capped)
        .await
        .unwrap();

    let settled = engine
        .settle_bet(
            placed.bet.bet_id,
            SettleBetRequest {
                account_id: "user-1".to_string(),
                outcome: BetOutcome::Cancelled,
                payout: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(settled.new_balance, 50);
    assert_eq!(settled.transaction.unwrap().amount, 50);
}

#[tokio::test]
async fn immediate_withdrawal_checks_balance() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 300).await;

    let result = engine
        .record_transaction(withdrawal_request("user-1", 1_000, false))
        .await;
    assert!(matches!(result, Err(AppError::InsufficientFunds { .. })));

    let ok = engine
        .record_transaction(withdrawal_request("user-1", 200, false))
        .await
        .unwrap();
    assert_eq!(ok.new_balance, 100);
    assert_eq!(ok.transaction.amount, -200);
    assert_eq!(ok.transaction.status, TransactionStatus::Completed);

    let balance = engine.balance("user-1").await.unwrap();
    assert_eq!(balance.stats.total_withdrawn, 200);
}

#[tokio::test]
async fn pending_withdrawal_holds_balance_until_approval() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 2_000).await;

    let held = engine
        .record_transaction(withdrawal_request("user-1", 1_000, true))
        .await
        .unwrap();
    assert_eq!(held.transaction.status, TransactionStatus::Pending);
    assert_eq!(held.transaction.amount, -1_000);
    assert_eq!(held.new_balance, 2_000);

    let queue = engine
        .pending_transactions(TransferKind::Withdrawal)
        .await
        .unwrap();
    assert_eq!(queue.len(), 1);

    let approved = engine
        .approve_transaction(held.transaction.transaction_id)
        .await
        .unwrap();
    assert_eq!(approved.new_balance, 1_000);
    assert_eq!(approved.transaction.status, TransactionStatus::Completed);
    assert!(approved.transaction.completed_at.is_some());

    let balance = engine.balance("user-1").await.unwrap();
    assert_eq!(balance.balance, 1_000);
    assert_eq!(balance.stats.total_withdrawn, 1_000);
    assert!(engine
        .pending_transactions(TransferKind::Withdrawal)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn rejecting_pending_withdrawal_leaves_balance_unchanged() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 2_000).await;

    let held = engine
        .record_transaction(withdrawal_request("user-1", 1_000, true))
        .await
        .unwrap();

    let rejected = engine
        .reject_transaction(held.transaction.transaction_id)
        .await
        .unwrap();
    assert_eq!(rejected.transaction.status, TransactionStatus::Failed);
    assert_eq!(rejected.new_balance, 2_000);

    let balance = engine.balance("user-1").await.unwrap();
    assert_eq!(balance.balance, 2_000);
    assert_eq!(balance.stats.total_withdrawn, 0);
}

#[tokio::test]
async fn approval_revalidates_against_current_balance() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 2_000).await;

    let held = engine
        .record_transaction(withdrawal_request("user-1", 1_000, true))
        .await
        .unwrap();

    // Balance drops below the requested amount before the admin acts.
    engine
        .record_transaction(withdrawal_request("user-1", 1_500, false))
        .await
        .unwrap();

    let result = engine
        .approve_transaction(held.transaction.transaction_id)
        .await;
    assert!(matches!(
        result,
        Err(AppError::InsufficientFunds {
            required: 1_000,
            available: 500
        })
    ));

    // The entry stays pending for manual resolution, never clamped.
    let entry = engine
        .pending_transactions(TransferKind::Withdrawal)
        .await
        .unwrap();
    assert_eq!(entry.len(), 1);
    assert_eq!(entry[0].status, TransactionStatus::Pending);

    // Funding the account again makes the same approval succeed.
    fund(&engine, "user-1", 600).await;
    let approved = engine
        .approve_transaction(held.transaction.transaction_id)
        .await
        .unwrap();
    assert_eq!(approved.new_balance, 100);
}

#[tokio::test]
async fn resolved_transactions_cannot_be_resolved_again() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 500).await;

    let held = engine
        .record_transaction(CreateTransactionRequest {
            requires_approval: true,
            ..deposit_request("user-1", 300)
        })
        .await
        .unwrap();
    let id = held.transaction.transaction_id;

    engine.approve_transaction(id).await.unwrap();

    let again = engine.approve_transaction(id).await;
    assert!(matches!(
        again,
        Err(AppError::TransactionAlreadyProcessed(tid)) if tid == id
    ));
    let reject = engine.reject_transaction(id).await;
    assert!(matches!(
        reject,
        Err(AppError::TransactionAlreadyProcessed(tid)) if tid == id
    ));

    // The completed deposit applied exactly once.
    let balance = engine.balance("user-1").await.unwrap();
    assert_eq!(balance.balance, 800);
}

#[tokio::test]
async fn resolving_a_completed_bet_entry_is_invalid() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 500).await;
    let placed = engine
        .place_bet(bet_request("user-1", 200), DebitPolicy::Strict)
        .await
        .unwrap();

    let result = engine
        .approve_transaction(placed.transaction.transaction_id)
        .await;
    // A bet entry is completed, so the pending-status guard fires first.
    assert!(matches!(
        result,
        Err(AppError::TransactionAlreadyProcessed(_))
    ));
}

#[tokio::test]
async fn adjustment_books_bonus_or_fee() {
    let (engine, _) = engine();

    let bonus = engine
        .adjust_balance(AdjustBalanceRequest {
            account_id: "user-1".to_string(),
            amount: 500,
            reason: Some("Goodwill credit".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(bonus.old_balance, 0);
    assert_eq!(bonus.new_balance, 500);
    assert_eq!(bonus.transaction.tx_type, TransactionType::Bonus);

    // A fee larger than the balance floors at zero and records the delta
    // actually applied.
    let fee = engine
        .adjust_balance(AdjustBalanceRequest {
            account_id: "user-1".to_string(),
            amount: -2_000,
            reason: None,
        })
        .await
        .unwrap();
    assert_eq!(fee.old_balance, 500);
    assert_eq!(fee.new_balance, 0);
    assert_eq!(fee.adjustment, -500);
    assert_eq!(fee.transaction.tx_type, TransactionType::Fee);
    assert_eq!(fee.transaction.amount, -500);

    let zero = engine
        .adjust_balance(AdjustBalanceRequest {
            account_id: "user-1".to_string(),
            amount: 0,
            reason: None,
        })
        .await;
    assert!(matches!(zero, Err(AppError::InvalidInput(_))));
}

#[tokio::test]
async fn account_creation_is_idempotent() {
    let (engine, _) = engine();

    engine.balance("user-1").await.unwrap();
    engine.balance("user-1").await.unwrap();
    fund(&engine, "user-1", 100).await;

    let accounts = engine.list_accounts().await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].email, "user_user-1@example.com");
    assert_eq!(accounts[0].status, AccountStatus::Active);
}

#[tokio::test]
async fn balance_lookup_falls_back_to_email() {
    let (engine, _) = engine();
    engine
        .sync_account(SyncAccountRequest {
            account_id: "user-1".to_string(),
            email: Some("ada@customer.test".to_string()),
            first_name: None,
            last_name: None,
        })
        .await
        .unwrap();
    fund(&engine, "user-1", 250).await;

    let by_email = engine.balance("ada@customer.test").await.unwrap();
    assert_eq!(by_email.account_id, "user-1");
    assert_eq!(by_email.balance, 250);

    // The fallback resolved the existing account instead of minting one
    // keyed by the email string.
    assert_eq!(engine.list_accounts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn placeholder_email_is_backfilled_from_profile() {
    let (engine, _) = engine();
    engine.balance("user-1").await.unwrap();
    fund(&engine, "user-1", 500).await;

    let request = PlaceBetRequest {
        profile: Some(backend::domain::ProfileDetails {
            email: Some("real@customer.test".to_string()),
            first_name: Some("Ada".to_string()),
            last_name: None,
        }),
        ..bet_request("user-1", 200)
    };
    engine.place_bet(request, DebitPolicy::Strict).await.unwrap();

    let accounts = engine.list_accounts().await.unwrap();
    assert_eq!(accounts[0].email, "real@customer.test");
    assert_eq!(accounts[0].first_name, "Ada");
}

#[tokio::test]
async fn suspended_accounts_cannot_transact() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 500).await;

    engine
        .set_account_status("user-1", AccountStatus::Suspended)
        .await
        .unwrap();

    let bet = engine
        .place_bet(bet_request("user-1", 100), DebitPolicy::Strict)
        .await;
    assert!(matches!(bet, Err(AppError::AccountSuspended(_, _))));

    let deposit = engine
        .record_transaction(deposit_request("user-1", 100))
        .await;
    assert!(matches!(deposit, Err(AppError::AccountSuspended(_, _))));

    let withdrawal = engine
        .record_transaction(withdrawal_request("user-1", 100, true))
        .await;
    assert!(matches!(withdrawal, Err(AppError::AccountSuspended(_, _))));

    // Reads still work.
    let balance = engine.balance("user-1").await.unwrap();
    assert_eq!(balance.balance, 500);
}

#[tokio::test]
async fn ledger_references_are_unique() {
    let (_, store) = engine();
    store
        .get_or_create_account(backend::repository::AccountSeed::bare(
            "user-1",
            shared::Currency::Inr,
        ))
        .await
        .unwrap();

    let entry = |id: uuid::Uuid| backend::repository::NewLedgerEntry {
        transaction_id: id,
        account_id: "user-1".to_string(),
        tx_type: TransactionType::Deposit,
        amount: 100,
        description: "Deposit request".to_string(),
        reference: "DEP_fixed".to_string(),
        game_id: None,
        game_type: None,
        bet_id: None,
        metadata: Value::Null,
    };

    store
        .apply_entry(
            entry(uuid::Uuid::new_v4()),
            backend::repository::BalanceEffect::Credit(backend::repository::Aggregate::Deposited),
        )
        .await
        .unwrap();

    let second = store
        .apply_entry(
            entry(uuid::Uuid::new_v4()),
            backend::repository::BalanceEffect::Credit(backend::repository::Aggregate::Deposited),
        )
        .await;
    assert!(matches!(second, Err(AppError::DuplicateReference(_))));

    // The duplicate applied nothing.
    let account = store.find_account("user-1").await.unwrap().unwrap();
    assert_eq!(account.balance, 100);
}

#[tokio::test]
async fn listings_are_newest_first_with_totals() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 1_000).await;
    for _ in 0..4 {
        engine
            .place_bet(bet_request("user-1", 100), DebitPolicy::Strict)
            .await
            .unwrap();
    }

    // 1 deposit + 4 bet entries
    let page = engine.transactions("user-1", 1, 2).await.unwrap();
    assert_eq!(page.transactions.len(), 2);
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.pages, 3);
    assert_eq!(page.transactions[0].tx_type, TransactionType::Bet);

    let last = engine.transactions("user-1", 3, 2).await.unwrap();
    assert_eq!(last.transactions.len(), 1);
    assert_eq!(last.transactions[0].tx_type, TransactionType::Deposit);

    let bets = engine.bets("user-1", 1, 10).await.unwrap();
    assert_eq!(bets.pagination.total, 4);
}

#[tokio::test]
async fn game_stats_aggregate_by_game_type() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 1_000).await;

    let won = engine
        .place_bet(bet_request("user-1", 100), DebitPolicy::Strict)
        .await
        .unwrap();
    engine
        .settle_bet(
            won.bet.bet_id,
            SettleBetRequest {
                account_id: "user-1".to_string(),
                outcome: BetOutcome::Won,
                payout: Some(amount(250)),
            },
        )
        .await
        .unwrap();

    let lost = engine
        .place_bet(bet_request("user-1", 150), DebitPolicy::Strict)
        .await
        .unwrap();
    engine
        .settle_bet(
            lost.bet.bet_id,
            SettleBetRequest {
                account_id: "user-1".to_string(),
                outcome: BetOutcome::Lost,
                payout: None,
            },
        )
        .await
        .unwrap();

    // A blackjack bet must not leak into the slots stats.
    engine
        .place_bet(
            PlaceBetRequest {
                game_type: GameType::Blackjack,
                ..bet_request("user-1", 100)
            },
            DebitPolicy::Strict,
        )
        .await
        .unwrap();

    let stats = engine.game_stats("user-1", GameType::Slots).await.unwrap();
    assert_eq!(stats.total_bets, 2);
    assert_eq!(stats.total_won, 1);
    assert_eq!(stats.total_lost, 1);
    assert_eq!(stats.total_amount, 250);
    assert_eq!(stats.total_payout, 250);
}

#[tokio::test]
async fn settling_someone_elses_bet_reads_as_not_found() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 500).await;
    let placed = engine
        .place_bet(bet_request("user-1", 200), DebitPolicy::Strict)
        .await
        .unwrap();

    let result = engine
        .settle_bet(
            placed.bet.bet_id,
            SettleBetRequest {
                account_id: "user-2".to_string(),
                outcome: BetOutcome::Won,
                payout: Some(amount(600)),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::BetNotFound(_))));
}

#[tokio::test]
async fn bet_limits_are_enforced() {
    let (engine, _) = engine();
    fund(&engine, "user-1", 1_000_000_000).await;

    let too_small = engine
        .place_bet(bet_request("user-1", 1), DebitPolicy::Strict)
        .await;
    assert!(matches!(too_small, Err(AppError::InvalidInput(_))));

    let too_large = engine
        .place_bet(
            bet_request("user-1", shared::MAX_BET_MINOR + 1),
            DebitPolicy::Strict,
        )
        .await;
    assert!(matches!(too_large, Err(AppError::InvalidInput(_))));
}
