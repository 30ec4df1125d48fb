//! In-memory WalletStore implementation
//!
//! Serializes every operation behind a single mutex, which trivially gives
//! the balance-plus-ledger atomicity the trait demands. Used as the test
//! double for engine and router tests; semantics mirror the Redis store.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use shared::{Currency, PLACEHOLDER_EMAIL_DOMAIN};
use uuid::Uuid;

use crate::domain::{
    Account, AccountStatus, Bet, BetOutcome, BetStatus, GameStats, GameType, LedgerEntry,
    TransactionStatus, TransactionType,
};
use crate::errors::{AppError, Result};

use super::{
    AccountSeed, ApprovalDecision, Aggregate, BalanceEffect, BetPlacement, BetSettlement,
    DebitPolicy, EntryReceipt, NewLedgerEntry, Page, PlacementReceipt, ProfilePatch,
    SettlementReceipt, WalletStore,
};

#[derive(Default)]
struct Inner {
    accounts: HashMap<String, Account>,
    account_order: Vec<String>,
    entries: HashMap<Uuid, LedgerEntry>,
    entry_order: Vec<Uuid>,
    references: HashSet<String>,
    bets: HashMap<Uuid, Bet>,
    bet_order: Vec<Uuid>,
}

pub struct MemoryWalletStore {
    inner: Mutex<Inner>,
}

impl MemoryWalletStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }
}

impl Default for MemoryWalletStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_aggregate(account: &mut Account, aggregate: Aggregate, magnitude: i64) {
    match aggregate {
        Aggregate::Deposited => account.total_deposited += magnitude,
        Aggregate::Withdrawn => account.total_withdrawn += magnitude,
        Aggregate::Wagered => account.total_wagered += magnitude,
        Aggregate::Won => account.total_won += magnitude,
        Aggregate::None => {}
    }
}

fn require_active(account: &Account) -> Result<()> {
    if account.status != AccountStatus::Active {
        return Err(AppError::AccountSuspended(
            account.account_id.clone(),
            account.status,
        ));
    }
    Ok(())
}

fn claim_reference(inner: &mut Inner, reference: &str) -> Result<()> {
    if !inner.references.insert(reference.to_string()) {
        return Err(AppError::DuplicateReference(reference.to_string()));
    }
    Ok(())
}

fn insert_entry(inner: &mut Inner, entry: LedgerEntry) {
    inner.entry_order.push(entry.transaction_id);
    inner.entries.insert(entry.transaction_id, entry);
}

fn build_entry(
    new: &NewLedgerEntry,
    amount: i64,
    currency: Currency,
    status: TransactionStatus,
) -> LedgerEntry {
    let now = Utc::now();
    LedgerEntry {
        transaction_id: new.transaction_id,
        account_id: new.account_id.clone(),
        tx_type: new.tx_type,
        amount,
        currency,
        status,
        description: new.description.clone(),
        reference: new.reference.clone(),
        game_id: new.game_id.clone(),
        game_type: new.game_type,
        bet_id: new.bet_id,
        metadata: new.metadata.clone(),
        created_at: now,
        completed_at: match status {
            TransactionStatus::Completed => Some(now),
            _ => None,
        },
    }
}

#[async_trait]
impl WalletStore for MemoryWalletStore {
    async fn find_account(&self, account_id: &str) -> Result<Option<Account>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.accounts.get(account_id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn get_or_create_account(&self, seed: AccountSeed) -> Result<Account> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.accounts.get(&seed.account_id) {
            return Ok(existing.clone());
        }

        let email = seed.email.unwrap_or_else(|| {
            format!("user_{}@{}", seed.account_id, PLACEHOLDER_EMAIL_DOMAIN)
        });
        let account = Account {
            account_id: seed.account_id.clone(),
            email,
            first_name: seed.first_name.unwrap_or_else(|| "User".to_string()),
            last_name: seed.last_name.unwrap_or_default(),
            balance: 0,
            currency: seed.currency,
            status: AccountStatus::Active,
            total_deposited: 0,
            total_withdrawn: 0,
            total_wagered: 0,
            total_won: 0,
            created_at: Utc::now(),
        };
        inner.account_order.push(seed.account_id.clone());
        inner.accounts.insert(seed.account_id, account.clone());
        Ok(account)
    }

    async fn update_profile(&self, account_id: &str, patch: ProfilePatch) -> Result<Account> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))?;

        if let Some(email) = patch.email {
            account.email = email;
        }
        if let Some(first_name) = patch.first_name {
            account.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            account.last_name = last_name;
        }
        Ok(account.clone())
    }

    async fn set_account_status(
        &self,
        account_id: &str,
        status: AccountStatus,
    ) -> Result<Account> {
        let mut inner = self.inner.lock().unwrap();
        let account = inner
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))?;
        account.status = status;
        Ok(account.clone())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .account_order
            .iter()
            .rev()
            .filter_map(|id| inner.accounts.get(id).cloned())
            .collect())
    }

    async fn place_bet(&self, placement: BetPlacement) -> Result<PlacementReceipt> {
        let mut inner = self.inner.lock().unwrap();

        let account = inner
            .accounts
            .get(&placement.account_id)
            .ok_or_else(|| AppError::AccountNotFound(placement.account_id.clone()))?;
        require_active(account)?;

        let balance = account.balance;
        let debited = if balance < placement.amount {
            match placement.policy {
                DebitPolicy::Strict => {
                    return Err(AppError::InsufficientFunds {
                        required: placement.amount,
                        available: balance,
                    });
                }
                DebitPolicy::Capped => balance,
            }
        } else {
            placement.amount
        };

        claim_reference(&mut inner, &placement.reference)?;

        let currency = {
            let account = inner.accounts.get_mut(&placement.account_id).unwrap();
            account.balance -= debited;
            apply_aggregate(account, Aggregate::Wagered, placement.amount);
            account.currency
        };
        let new_balance = balance - debited;

        let bet = Bet {
            bet_id: placement.bet_id,
            account_id: placement.account_id.clone(),
            game_id: placement.game_id.clone(),
            game_type: placement.game_type,
            amount: placement.amount,
            debited,
            status: BetStatus::Pending,
            payout: 0,
            details: placement.details.clone(),
            created_at: Utc::now(),
            settled_at: None,
        };
        inner.bet_order.push(bet.bet_id);
        inner.bets.insert(bet.bet_id, bet.clone());

        let entry = build_entry(
            &NewLedgerEntry {
                transaction_id: placement.transaction_id,
                account_id: placement.account_id.clone(),
                tx_type: TransactionType::Bet,
                amount: -debited,
                description: placement.description.clone(),
                reference: placement.reference.clone(),
                game_id: placement.game_id.clone(),
                game_type: Some(placement.game_type),
                bet_id: Some(placement.bet_id),
                metadata: placement.metadata.clone(),
            },
            -debited,
            currency,
            TransactionStatus::Completed,
        );
        insert_entry(&mut inner, entry.clone());

        Ok(PlacementReceipt {
            bet,
            entry,
            new_balance,
        })
    }

    async fn settle_bet(&self, settlement: BetSettlement) -> Result<SettlementReceipt> {
        let mut inner = self.inner.lock().unwrap();

        let bet = inner
            .bets
            .get(&settlement.bet_id)
            .filter(|b| b.account_id == settlement.account_id)
            .cloned()
            .ok_or(AppError::BetNotFound(settlement.bet_id))?;
        if bet.status != BetStatus::Pending {
            return Err(AppError::BetAlreadySettled(settlement.bet_id));
        }

        let account = inner
            .accounts
            .get(&settlement.account_id)
            .ok_or_else(|| AppError::AccountNotFound(settlement.account_id.clone()))?;
        let currency = account.currency;
        let balance = account.balance;

        let (credit, entry_type) = match settlement.outcome {
            BetOutcome::Won => (settlement.payout, TransactionType::Win),
            BetOutcome::Lost => (0, TransactionType::Win),
            BetOutcome::Cancelled => (bet.debited, TransactionType::Refund),
        };

        if credit > 0 {
            claim_reference(&mut inner, &settlement.reference)?;
        }

        let settled = {
            let bet = inner.bets.get_mut(&settlement.bet_id).unwrap();
            bet.status = settlement.outcome.as_status();
            bet.payout = if settlement.outcome == BetOutcome::Won {
                settlement.payout
            } else {
                0
            };
            bet.settled_at = Some(Utc::now());
            bet.clone()
        };

        let mut new_balance = balance;
        let mut entry = None;
        if credit > 0 {
            let account = inner.accounts.get_mut(&settlement.account_id).unwrap();
            account.balance += credit;
            if settlement.outcome == BetOutcome::Won {
                apply_aggregate(account, Aggregate::Won, credit);
            }
            new_balance = account.balance;

            let written = build_entry(
                &NewLedgerEntry {
                    transaction_id: settlement.transaction_id,
                    account_id: settlement.account_id.clone(),
                    tx_type: entry_type,
                    amount: credit,
                    description: settlement.description.clone(),
                    reference: settlement.reference.clone(),
                    game_id: settled.game_id.clone(),
                    game_type: Some(settled.game_type),
                    bet_id: Some(settled.bet_id),
                    metadata: settlement.metadata.clone(),
                },
                credit,
                currency,
                TransactionStatus::Completed,
            );
            insert_entry(&mut inner, written.clone());
            entry = Some(written);
        }

        Ok(SettlementReceipt {
            bet: settled,
            entry,
            new_balance,
        })
    }

    async fn apply_entry(
        &self,
        new: NewLedgerEntry,
        effect: BalanceEffect,
    ) -> Result<EntryReceipt> {
        let mut inner = self.inner.lock().unwrap();

        let account = inner
            .accounts
            .get(&new.account_id)
            .ok_or_else(|| AppError::AccountNotFound(new.account_id.clone()))?;
        require_active(account)?;
        let currency = account.currency;
        let balance = account.balance;

        let (applied, status, aggregate) = match effect {
            BalanceEffect::Hold => (new.amount, TransactionStatus::Pending, Aggregate::None),
            BalanceEffect::Credit(aggregate) => {
                (new.amount, TransactionStatus::Completed, aggregate)
            }
            BalanceEffect::Debit { policy, aggregate } => {
                let need = -new.amount;
                let applied = if balance < need {
                    match policy {
                        DebitPolicy::Strict => {
                            return Err(AppError::InsufficientFunds {
                                required: need,
                                available: balance,
                            });
                        }
                        DebitPolicy::Capped => -balance,
                    }
                } else {
                    new.amount
                };
                (applied, TransactionStatus::Completed, aggregate)
            }
        };

        claim_reference(&mut inner, &new.reference)?;

        let new_balance = match effect {
            BalanceEffect::Hold => balance,
            _ => {
                let account = inner.accounts.get_mut(&new.account_id).unwrap();
                account.balance += applied;
                apply_aggregate(account, aggregate, applied.abs());
                account.balance
            }
        };

        let entry = build_entry(&new, applied, currency, status);
        insert_entry(&mut inner, entry.clone());

        Ok(EntryReceipt { entry, new_balance })
    }

    async fn resolve_entry(
        &self,
        transaction_id: Uuid,
        decision: ApprovalDecision,
    ) -> Result<EntryReceipt> {
        let mut inner = self.inner.lock().unwrap();

        let entry = inner
            .entries
            .get(&transaction_id)
            .cloned()
            .ok_or(AppError::TransactionNotFound(transaction_id))?;
        if entry.status != TransactionStatus::Pending {
            return Err(AppError::TransactionAlreadyProcessed(transaction_id));
        }
        if !matches!(
            entry.tx_type,
            TransactionType::Deposit | TransactionType::Withdrawal
        ) {
            return Err(AppError::invalid_input(
                "Only pending deposits and withdrawals can be resolved",
            ));
        }

        if decision == ApprovalDecision::Reject {
            let balance = inner
                .accounts
                .get(&entry.account_id)
                .map(|a| a.balance)
                .unwrap_or(0);
            let entry = inner.entries.get_mut(&transaction_id).unwrap();
            entry.status = TransactionStatus::Failed;
            entry.completed_at = Some(Utc::now());
            return Ok(EntryReceipt {
                entry: entry.clone(),
                new_balance: balance,
            });
        }

        // Approve: re-validate against the balance as it is NOW, not as it
        // was when the request was made.
        let account = inner
            .accounts
            .get(&entry.account_id)
            .ok_or_else(|| AppError::AccountNotFound(entry.account_id.clone()))?;
        if entry.amount < 0 && account.balance < -entry.amount {
            // Entry stays pending for manual resolution.
            return Err(AppError::InsufficientFunds {
                required: -entry.amount,
                available: account.balance,
            });
        }

        let new_balance = {
            let account = inner.accounts.get_mut(&entry.account_id).unwrap();
            account.balance += entry.amount;
            let aggregate = match entry.tx_type {
                TransactionType::Deposit => Aggregate::Deposited,
                _ => Aggregate::Withdrawn,
            };
            apply_aggregate(account, aggregate, entry.amount.abs());
            account.balance
        };

        let entry = inner.entries.get_mut(&transaction_id).unwrap();
        entry.status = TransactionStatus::Completed;
        entry.completed_at = Some(Utc::now());
        Ok(EntryReceipt {
            entry: entry.clone(),
            new_balance,
        })
    }

    async fn find_entry(&self, transaction_id: Uuid) -> Result<Option<LedgerEntry>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.entries.get(&transaction_id).cloned())
    }

    async fn entries_for_account(
        &self,
        account_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Page<LedgerEntry>> {
        let inner = self.inner.lock().unwrap();
        let matching: Vec<&LedgerEntry> = inner
            .entry_order
            .iter()
            .rev()
            .filter_map(|id| inner.entries.get(id))
            .filter(|e| e.account_id == account_id)
            .collect();
        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok(Page { items, total })
    }

    async fn pending_entries(&self, tx_type: TransactionType) -> Result<Vec<LedgerEntry>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .entry_order
            .iter()
            .rev()
            .filter_map(|id| inner.entries.get(id))
            .filter(|e| e.tx_type == tx_type && e.status == TransactionStatus::Pending)
            .cloned()
            .collect())
    }

    async fn list_entries(&self) -> Result<Vec<LedgerEntry>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .entry_order
            .iter()
            .rev()
            .filter_map(|id| inner.entries.get(id).cloned())
            .collect())
    }

    async fn find_bet(&self, bet_id: Uuid) -> Result<Option<Bet>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.bets.get(&bet_id).cloned())
    }

    async fn bets_for_account(
        &self,
        account_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Bet>> {
        let inner = self.inner.lock().unwrap();
        let matching: Vec<&Bet> = inner
            .bet_order
            .iter()
            .rev()
            .filter_map(|id| inner.bets.get(id))
            .filter(|b| b.account_id == account_id)
            .collect();
        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok(Page { items, total })
    }

    async fn game_stats(&self, account_id: &str, game_type: GameType) -> Result<GameStats> {
        let inner = self.inner.lock().unwrap();
        let mut stats = GameStats::default();
        for bet in inner.bets.values() {
            if bet.account_id != account_id || bet.game_type != game_type {
                continue;
            }
            stats.total_bets += 1;
            match bet.status {
                BetStatus::Won => stats.total_won += 1,
                BetStatus::Lost => stats.total_lost += 1,
                _ => {}
            }
            stats.total_amount += bet.amount;
            stats.total_payout += bet.payout;
        }
        Ok(stats)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
