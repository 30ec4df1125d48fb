//! Wallet Operation Engine
//!
//! The single authority for balance-affecting state changes. Validates
//! preconditions, resolves (or creates) the account, selects the debit
//! policy, and hands the storage layer one atomic unit per operation: the
//! balance mutation plus its paired ledger write.
//!
//! Two bet-placement policies exist on purpose and must not be merged:
//! the strict path rejects wagers the balance cannot cover, the capped
//! casino path floors the balance at zero and lets gameplay continue.
//! Strict is the authoritative policy; the capped entry point exists only
//! for the casino integration.

use std::sync::Arc;

use serde_json::json;
use shared::{reference, validate_account_id, Amount};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{
    Account, AdjustBalanceRequest, AdjustBalanceResponse, AggregateStats, BalanceResponse, Bet,
    BetOutcome, BetsPage, CreateTransactionRequest, GameStats, GameType, LedgerEntry, Pagination,
    PlaceBetRequest, PlaceBetResponse, ProfileDetails, SettleBetRequest, SettleBetResponse,
    SyncAccountRequest, TransactionResponse, TransactionType, TransactionsPage, TransferKind,
};
use crate::errors::{AppError, Result};
use crate::repository::{
    AccountSeed, Aggregate, ApprovalDecision, BalanceEffect, BetPlacement, BetSettlement,
    DebitPolicy, NewLedgerEntry, ProfilePatch, WalletStore,
};

#[derive(Clone)]
pub struct WalletEngine {
    store: Arc<dyn WalletStore>,
    config: Arc<Config>,
}

fn is_placeholder_email(email: &str) -> bool {
    email == "user@example.com" || email.ends_with(&format!("@{}", shared::PLACEHOLDER_EMAIL_DOMAIN))
}

impl WalletEngine {
    pub fn new(store: Arc<dyn WalletStore>, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    /// Resolve an account, creating it on first contact. When the caller
    /// supplies a real email and the stored one is a placeholder, the
    /// profile is backfilled.
    async fn resolve_account(
        &self,
        account_id: &str,
        profile: Option<&ProfileDetails>,
    ) -> Result<Account> {
        validate_account_id(account_id)?;

        let account = match self.store.find_account(account_id).await? {
            Some(account) => account,
            None => {
                // Some callers key balance lookups by email instead of the
                // opaque id; fall back before creating a fresh account.
                if account_id.contains('@') {
                    if let Some(account) = self.store.find_account_by_email(account_id).await? {
                        return Ok(account);
                    }
                }
                let seed = AccountSeed {
                    account_id: account_id.to_string(),
                    email: profile.and_then(|p| p.email.clone()),
                    first_name: profile.and_then(|p| p.first_name.clone()),
                    last_name: profile.and_then(|p| p.last_name.clone()),
                    currency: self.config.wallet.default_currency,
                };
                self.store.get_or_create_account(seed).await?
            }
        };

        if let Some(profile) = profile {
            if let Some(email) = &profile.email {
                if is_placeholder_email(&account.email) && !is_placeholder_email(email) {
                    tracing::info!(
                        account_id = %account_id,
                        "Backfilling placeholder email"
                    );
                    let patch = ProfilePatch {
                        email: Some(email.clone()),
                        first_name: profile.first_name.clone(),
                        last_name: profile.last_name.clone(),
                    };
                    return self.store.update_profile(account_id, patch).await;
                }
            }
        }

        Ok(account)
    }

    fn check_bet_limits(&self, amount: Amount) -> Result<()> {
        let minor = amount.as_u64();
        if minor < self.config.betting.min_bet_minor || minor > self.config.betting.max_bet_minor {
            return Err(AppError::invalid_input(format!(
                "Bet amount {} outside allowed range {}..={}",
                minor, self.config.betting.min_bet_minor, self.config.betting.max_bet_minor
            )));
        }
        Ok(())
    }

    /// Place a wager. `policy` selects between the strict path (rejects on
    /// insufficient balance) and the capped casino path (debit floored at
    /// zero, gameplay never blocked).
    pub async fn place_bet(
        &self,
        req: PlaceBetRequest,
        policy: DebitPolicy,
    ) -> Result<PlaceBetResponse> {
        self.check_bet_limits(req.amount)?;
        self.resolve_account(&req.account_id, req.profile.as_ref())
            .await?;

        let bet_id = Uuid::new_v4();
        let amount = req.amount.as_i64();
        let placement = BetPlacement {
            bet_id,
            transaction_id: Uuid::new_v4(),
            account_id: req.account_id.clone(),
            game_id: req.game_id.clone(),
            game_type: req.game_type,
            amount,
            policy,
            details: req.details.clone(),
            description: format!("{} - Bet placed", req.game_type),
            reference: reference::bet(bet_id),
            metadata: json!({
                "game_id": req.game_id,
                "game_type": req.game_type,
                "bet_amount": amount,
                "details": req.details,
            }),
        };

        let receipt = self.store.place_bet(placement).await?;
        Ok(PlaceBetResponse {
            bet: receipt.bet,
            transaction: receipt.entry,
            new_balance: receipt.new_balance,
        })
    }

    /// Settle a pending bet exactly once. Won credits the payout, lost
    /// changes nothing but the bet, cancelled refunds the recorded debit.
    pub async fn settle_bet(&self, bet_id: Uuid, req: SettleBetRequest) -> Result<SettleBetResponse> {
        validate_account_id(&req.account_id)?;

        let payout = req.payout.map(|p| p.as_i64()).unwrap_or(0);
        if req.outcome != BetOutcome::Won && payout > 0 {
            return Err(AppError::invalid_input(
                "Payout is only valid for a won outcome",
            ));
        }

        // Read for the description only; the settlement script re-verifies
        // ownership and the pending status.
        let bet = self
            .store
            .find_bet(bet_id)
            .await?
            .filter(|b| b.account_id == req.account_id)
            .ok_or(AppError::BetNotFound(bet_id))?;

        let (reference, description) = match req.outcome {
            BetOutcome::Won => (
                reference::win(bet_id),
                format!("{} - Win", bet.game_type),
            ),
            BetOutcome::Lost => (reference::win(bet_id), String::new()),
            BetOutcome::Cancelled => (
                reference::refund(bet_id),
                format!("{} - Bet refunded", bet.game_type),
            ),
        };

        let settlement = BetSettlement {
            bet_id,
            account_id: req.account_id.clone(),
            transaction_id: Uuid::new_v4(),
            outcome: req.outcome,
            payout,
            description,
            reference,
            metadata: json!({
                "bet_amount": bet.amount,
                "payout": payout,
                "profit": payout - bet.amount,
            }),
        };

        let receipt = self.store.settle_bet(settlement).await?;
        Ok(SettleBetResponse {
            bet: receipt.bet,
            transaction: receipt.entry,
            new_balance: receipt.new_balance,
        })
    }

    /// Record a deposit or withdrawal. With `requires_approval` the entry
    /// is written pending and the balance is untouched until an admin
    /// resolves it; otherwise the effect applies immediately.
    pub async fn record_transaction(
        &self,
        req: CreateTransactionRequest,
    ) -> Result<TransactionResponse> {
        self.resolve_account(&req.account_id, req.profile.as_ref())
            .await?;

        let transaction_id = Uuid::new_v4();
        let amount = req.amount.as_i64();
        let (signed, reference, effect) = match req.tx_type {
            TransferKind::Deposit => (
                amount,
                reference::deposit(transaction_id),
                BalanceEffect::Credit(Aggregate::Deposited),
            ),
            TransferKind::Withdrawal => (
                -amount,
                reference::withdrawal(transaction_id),
                BalanceEffect::Debit {
                    policy: DebitPolicy::Strict,
                    aggregate: Aggregate::Withdrawn,
                },
            ),
        };
        let effect = if req.requires_approval {
            BalanceEffect::Hold
        } else {
            effect
        };

        let description = req.description.clone().unwrap_or_else(|| match req.tx_type {
            TransferKind::Deposit => "Deposit request".to_string(),
            TransferKind::Withdrawal => "Withdrawal request".to_string(),
        });

        let entry = NewLedgerEntry {
            transaction_id,
            account_id: req.account_id.clone(),
            tx_type: req.tx_type.as_transaction_type(),
            amount: signed,
            description,
            reference,
            game_id: None,
            game_type: None,
            bet_id: None,
            metadata: req.metadata.clone(),
        };

        let receipt = self.store.apply_entry(entry, effect).await?;
        Ok(TransactionResponse {
            transaction: receipt.entry,
            new_balance: receipt.new_balance,
        })
    }

    pub async fn approve_transaction(&self, transaction_id: Uuid) -> Result<TransactionResponse> {
        let receipt = self
            .store
            .resolve_entry(transaction_id, ApprovalDecision::Approve)
            .await?;
        Ok(TransactionResponse {
            transaction: receipt.entry,
            new_balance: receipt.new_balance,
        })
    }

    pub async fn reject_transaction(&self, transaction_id: Uuid) -> Result<TransactionResponse> {
        let receipt = self
            .store
            .resolve_entry(transaction_id, ApprovalDecision::Reject)
            .await?;
        Ok(TransactionResponse {
            transaction: receipt.entry,
            new_balance: receipt.new_balance,
        })
    }

    /// Unconditional operator adjustment: positive books a bonus, negative
    /// a fee. A negative delta larger than the balance floors it at zero
    /// and the entry records the delta actually applied.
    pub async fn adjust_balance(&self, req: AdjustBalanceRequest) -> Result<AdjustBalanceResponse> {
        if req.amount == 0 {
            return Err(AppError::invalid_input("Adjustment amount must be non-zero"));
        }
        Amount::new(req.amount.unsigned_abs())?;

        let account = self.resolve_account(&req.account_id, None).await?;
        let old_balance = account.balance;

        let transaction_id = Uuid::new_v4();
        let (tx_type, effect) = if req.amount > 0 {
            (TransactionType::Bonus, BalanceEffect::Credit(Aggregate::None))
        } else {
            (
                TransactionType::Fee,
                BalanceEffect::Debit {
                    policy: DebitPolicy::Capped,
                    aggregate: Aggregate::None,
                },
            )
        };

        let entry = NewLedgerEntry {
            transaction_id,
            account_id: req.account_id.clone(),
            tx_type,
            amount: req.amount,
            description: req
                .reason
                .clone()
                .unwrap_or_else(|| "Balance adjustment".to_string()),
            reference: reference::adjustment(transaction_id),
            game_id: None,
            game_type: None,
            bet_id: None,
            metadata: json!({ "reason": req.reason, "admin_adjustment": true }),
        };

        let receipt = self.store.apply_entry(entry, effect).await?;
        Ok(AdjustBalanceResponse {
            old_balance,
            new_balance: receipt.new_balance,
            adjustment: receipt.entry.amount,
            transaction: receipt.entry,
        })
    }

    /// Balance plus lifetime aggregates; creates the account on first
    /// contact, like every other wallet entry point.
    pub async fn balance(&self, account_id: &str) -> Result<BalanceResponse> {
        let account = self.resolve_account(account_id, None).await?;
        Ok(BalanceResponse {
            account_id: account.account_id.clone(),
            balance: account.balance,
            currency: account.currency,
            stats: AggregateStats::from(&account),
        })
    }

    /// Identity-provider sync: create the account or patch its profile.
    pub async fn sync_account(&self, req: SyncAccountRequest) -> Result<Account> {
        validate_account_id(&req.account_id)?;

        if self.store.find_account(&req.account_id).await?.is_some() {
            let patch = ProfilePatch {
                email: req.email.clone(),
                first_name: req.first_name.clone(),
                last_name: req.last_name.clone(),
            };
            if patch.is_empty() {
                return self
                    .store
                    .find_account(&req.account_id)
                    .await?
                    .ok_or_else(|| AppError::AccountNotFound(req.account_id.clone()));
            }
            return self.store.update_profile(&req.account_id, patch).await;
        }

        let seed = AccountSeed {
            account_id: req.account_id.clone(),
            email: req.email.clone(),
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            currency: self.config.wallet.default_currency,
        };
        self.store.get_or_create_account(seed).await
    }

    pub async fn transactions(
        &self,
        account_id: &str,
        page: i64,
        limit: i64,
    ) -> Result<TransactionsPage> {
        validate_account_id(account_id)?;
        let (page, limit) = clamp_page(page, limit);
        let result = self
            .store
            .entries_for_account(account_id, limit, (page - 1) * limit)
            .await?;
        Ok(TransactionsPage {
            transactions: result.items,
            pagination: Pagination::new(page, limit, result.total),
        })
    }

    pub async fn bets(&self, account_id: &str, page: i64, limit: i64) -> Result<BetsPage> {
        validate_account_id(account_id)?;
        let (page, limit) = clamp_page(page, limit);
        let result = self
            .store
            .bets_for_account(account_id, limit, (page - 1) * limit)
            .await?;
        Ok(BetsPage {
            bets: result.items,
            pagination: Pagination::new(page, limit, result.total),
        })
    }

    pub async fn game_stats(&self, account_id: &str, game_type: GameType) -> Result<GameStats> {
        validate_account_id(account_id)?;
        self.store.game_stats(account_id, game_type).await
    }

    pub async fn find_bet(&self, bet_id: Uuid) -> Result<Option<Bet>> {
        self.store.find_bet(bet_id).await
    }

    /// Admin approval queue
    pub async fn pending_transactions(&self, kind: TransferKind) -> Result<Vec<LedgerEntry>> {
        self.store
            .pending_entries(kind.as_transaction_type())
            .await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.store.list_accounts().await
    }

    /// Operator action: suspend, close or reactivate an account
    pub async fn set_account_status(
        &self,
        account_id: &str,
        status: crate::domain::AccountStatus,
    ) -> Result<Account> {
        validate_account_id(account_id)?;
        self.store.set_account_status(account_id, status).await
    }

    pub async fn list_transactions(&self) -> Result<Vec<LedgerEntry>> {
        self.store.list_entries().await
    }

    pub async fn ping_store(&self) -> Result<()> {
        self.store.ping().await
    }
}

fn clamp_page(page: i64, limit: i64) -> (i64, i64) {
    let page = page.max(1);
    let limit = limit.clamp(1, shared::MAX_PAGE_SIZE);
    (page, limit)
}
