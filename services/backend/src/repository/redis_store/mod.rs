//! Redis-based WalletStore implementation
//!
//! Accounts, ledger entries and bets are stored as Redis hashes, indexed by
//! sorted sets scored on creation time (newest-first reads are reverse
//! range scans). Reference uniqueness is a plain set. Every mutating
//! operation runs as a Lua script so the balance check, the balance write
//! and the paired ledger/bet writes commit atomically.

mod codec;
mod keys;
mod scripts;

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    Account, AccountStatus, Bet, BetStatus, GameStats, GameType, LedgerEntry, TransactionType,
};
use crate::errors::{AppError, Result};

use super::{
    AccountSeed, Aggregate, ApprovalDecision, BalanceEffect, BetPlacement, BetSettlement,
    DebitPolicy, EntryReceipt, NewLedgerEntry, Page, PlacementReceipt, ProfilePatch,
    SettlementReceipt, WalletStore,
};

pub use codec::*;
pub use keys::*;
pub use scripts::*;

/// Redis-based implementation of WalletStore
pub struct RedisWalletStore {
    redis: ConnectionManager,
}

impl RedisWalletStore {
    /// Create a new RedisWalletStore
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

/// Serialize a metadata/details value for hash storage; Null becomes the
/// empty-string sentinel
fn json_field(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn aggregate_field(aggregate: Aggregate) -> &'static str {
    match aggregate {
        Aggregate::Deposited => "deposited",
        Aggregate::Withdrawn => "withdrawn",
        Aggregate::Wagered => "wagered",
        Aggregate::Won => "won",
        Aggregate::None => "none",
    }
}

fn reply_str(reply: &[String], index: usize) -> &str {
    reply.get(index).map(|s| s.as_str()).unwrap_or("")
}

fn reply_i64(reply: &[String], index: usize) -> i64 {
    reply
        .get(index)
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0)
}

fn unexpected_reply(op: &str, reply: &[String]) -> AppError {
    AppError::Internal(anyhow::anyhow!(
        "Unexpected {} script reply: {:?}",
        op,
        reply
    ))
}

fn inactive_status(reply: &[String]) -> AccountStatus {
    AccountStatus::parse(reply_str(reply, 2)).unwrap_or(AccountStatus::Suspended)
}

#[async_trait]
impl WalletStore for RedisWalletStore {
    async fn find_account(&self, account_id: &str) -> Result<Option<Account>> {
        let mut redis_conn = self.redis.clone();
        load_account_from_hash(&mut redis_conn, account_id).await
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let mut redis_conn = self.redis.clone();
        let account_id: Option<String> = redis_conn.get(email_index_key(email)).await?;
        match account_id {
            Some(id) => load_account_from_hash(&mut redis_conn, &id).await,
            None => Ok(None),
        }
    }

    async fn get_or_create_account(&self, seed: AccountSeed) -> Result<Account> {
        let mut redis_conn = self.redis.clone();
        let now_ms = Utc::now().timestamp_millis();

        let email = seed.email.unwrap_or_else(|| {
            format!("user_{}@{}", seed.account_id, shared::PLACEHOLDER_EMAIL_DOMAIN)
        });

        let script = Script::new(CREATE_ACCOUNT_SCRIPT);
        let _created: i32 = script
            .key(account_key(&seed.account_id))
            .key(email_index_key(&email))
            .key(accounts_index_key())
            .arg(&seed.account_id)
            .arg(&email)
            .arg(seed.first_name.unwrap_or_else(|| "User".to_string()))
            .arg(seed.last_name.unwrap_or_default())
            .arg(seed.currency.as_str())
            .arg(now_ms)
            .invoke_async(&mut redis_conn)
            .await?;

        load_account_from_hash(&mut redis_conn, &seed.account_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "Account {} missing after create",
                    seed.account_id
                ))
            })
    }

    async fn update_profile(&self, account_id: &str, patch: ProfilePatch) -> Result<Account> {
        let mut redis_conn = self.redis.clone();
        let existing = load_account_from_hash(&mut redis_conn, account_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))?;

        let key = account_key(account_id);
        let mut pipe = redis::pipe();
        pipe.atomic();

        if let Some(email) = &patch.email {
            pipe.hset(&key, "email", email).ignore();
            if *email != existing.email {
                if !existing.email.is_empty() {
                    pipe.del(email_index_key(&existing.email)).ignore();
                }
                pipe.set(email_index_key(email), account_id).ignore();
            }
        }
        if let Some(first_name) = &patch.first_name {
            pipe.hset(&key, "first_name", first_name).ignore();
        }
        if let Some(last_name) = &patch.last_name {
            pipe.hset(&key, "last_name", last_name).ignore();
        }

        let _: () = pipe.query_async(&mut redis_conn).await?;

        load_account_from_hash(&mut redis_conn, account_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))
    }

    async fn set_account_status(
        &self,
        account_id: &str,
        status: AccountStatus,
    ) -> Result<Account> {
        let mut redis_conn = self.redis.clone();
        let exists: bool = redis_conn.hexists(account_key(account_id), "account_id").await?;
        if !exists {
            return Err(AppError::AccountNotFound(account_id.to_string()));
        }
        let _: () = redis_conn
            .hset(account_key(account_id), "status", status.as_str())
            .await?;
        load_account_from_hash(&mut redis_conn, account_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut redis_conn = self.redis.clone();
        let ids: Vec<String> = redis_conn.zrevrange(accounts_index_key(), 0, -1).await?;

        let mut accounts = Vec::new();
        for id in ids {
            if let Some(account) = load_account_from_hash(&mut redis_conn, &id).await? {
                accounts.push(account);
            }
        }
        Ok(accounts)
    }

    async fn place_bet(&self, placement: BetPlacement) -> Result<PlacementReceipt> {
        let mut redis_conn = self.redis.clone();
        let now_ms = Utc::now().timestamp_millis();

        let script = Script::new(PLACE_BET_SCRIPT);
        let reply: Vec<String> = script
            .key(account_key(&placement.account_id))
            .key(bet_key(placement.bet_id))
            .key(account_bets_key(&placement.account_id))
            .key(entry_key(placement.transaction_id))
            .key(account_entries_key(&placement.account_id))
            .key(entries_index_key())
            .key(references_key())
            .arg(placement.amount)
            .arg(if placement.policy == DebitPolicy::Strict {
                "1"
            } else {
                "0"
            })
            .arg(placement.bet_id.to_string())
            .arg(placement.transaction_id.to_string())
            .arg(&placement.reference)
            .arg(placement.game_id.clone().unwrap_or_default())
            .arg(placement.game_type.as_str())
            .arg(json_field(&placement.details))
            .arg(&placement.description)
            .arg(json_field(&placement.metadata))
            .arg(now_ms)
            .arg(&placement.account_id)
            .invoke_async(&mut redis_conn)
            .await?;

        if reply_str(&reply, 0) != "OK" {
            return Err(match reply_str(&reply, 1) {
                "account_missing" => AppError::AccountNotFound(placement.account_id.clone()),
                "account_inactive" => AppError::AccountSuspended(
                    placement.account_id.clone(),
                    inactive_status(&reply),
                ),
                "duplicate_reference" => AppError::DuplicateReference(placement.reference.clone()),
                "insufficient_funds" => AppError::InsufficientFunds {
                    required: placement.amount,
                    available: reply_i64(&reply, 2),
                },
                _ => unexpected_reply("place_bet", &reply),
            });
        }

        let new_balance = reply_i64(&reply, 1);
        let bet = load_bet_from_hash(&mut redis_conn, placement.bet_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Bet missing after placement")))?;
        let entry = load_entry_from_hash(&mut redis_conn, placement.transaction_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Entry missing after placement")))?;

        Ok(PlacementReceipt {
            bet,
            entry,
            new_balance,
        })
    }

    async fn settle_bet(&self, settlement: BetSettlement) -> Result<SettlementReceipt> {
        let mut redis_conn = self.redis.clone();
        let now_ms = Utc::now().timestamp_millis();

        let script = Script::new(SETTLE_BET_SCRIPT);
        let reply: Vec<String> = script
            .key(bet_key(settlement.bet_id))
            .key(account_key(&settlement.account_id))
            .key(entry_key(settlement.transaction_id))
            .key(account_entries_key(&settlement.account_id))
            .key(entries_index_key())
            .key(references_key())
            .arg(&settlement.account_id)
            .arg(settlement.outcome.as_status().as_str())
            .arg(settlement.payout)
            .arg(settlement.transaction_id.to_string())
            .arg(&settlement.reference)
            .arg(&settlement.description)
            .arg(json_field(&settlement.metadata))
            .arg(now_ms)
            .invoke_async(&mut redis_conn)
            .await?;

        if reply_str(&reply, 0) != "OK" {
            return Err(match reply_str(&reply, 1) {
                "bet_missing" => AppError::BetNotFound(settlement.bet_id),
                "already_settled" => AppError::BetAlreadySettled(settlement.bet_id),
                "account_missing" => AppError::AccountNotFound(settlement.account_id.clone()),
                "duplicate_reference" => {
                    AppError::DuplicateReference(settlement.reference.clone())
                }
                _ => unexpected_reply("settle_bet", &reply),
            });
        }

        let new_balance = reply_i64(&reply, 1);
        let credit = reply_i64(&reply, 2);
        let bet = load_bet_from_hash(&mut redis_conn, settlement.bet_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Bet missing after settlement")))?;
        let entry = if credit > 0 {
            load_entry_from_hash(&mut redis_conn, settlement.transaction_id).await?
        } else {
            None
        };

        Ok(SettlementReceipt {
            bet,
            entry,
            new_balance,
        })
    }

    async fn apply_entry(
        &self,
        new: NewLedgerEntry,
        effect: BalanceEffect,
    ) -> Result<EntryReceipt> {
        let mut redis_conn = self.redis.clone();
        let now_ms = Utc::now().timestamp_millis();

        let (mode, aggregate) = match effect {
            BalanceEffect::Hold => ("hold", Aggregate::None),
            BalanceEffect::Credit(aggregate) => ("credit", aggregate),
            BalanceEffect::Debit {
                policy: DebitPolicy::Strict,
                aggregate,
            } => ("debit_strict", aggregate),
            BalanceEffect::Debit {
                policy: DebitPolicy::Capped,
                aggregate,
            } => ("debit_capped", aggregate),
        };

        let script = Script::new(APPLY_ENTRY_SCRIPT);
        let reply: Vec<String> = script
            .key(account_key(&new.account_id))
            .key(entry_key(new.transaction_id))
            .key(account_entries_key(&new.account_id))
            .key(entries_index_key())
            .key(pending_index_key(new.tx_type))
            .key(references_key())
            .arg(&new.account_id)
            .arg(new.tx_type.as_str())
            .arg(new.amount)
            .arg(mode)
            .arg(aggregate_field(aggregate))
            .arg(&new.description)
            .arg(&new.reference)
            .arg(json_field(&new.metadata))
            .arg(new.transaction_id.to_string())
            .arg(now_ms)
            .arg(new.game_id.clone().unwrap_or_default())
            .arg(new.game_type.map(|g| g.as_str()).unwrap_or(""))
            .arg(new.bet_id.map(|b| b.to_string()).unwrap_or_default())
            .invoke_async(&mut redis_conn)
            .await?;

        if reply_str(&reply, 0) != "OK" {
            return Err(match reply_str(&reply, 1) {
                "account_missing" => AppError::AccountNotFound(new.account_id.clone()),
                "account_inactive" => {
                    AppError::AccountSuspended(new.account_id.clone(), inactive_status(&reply))
                }
                "duplicate_reference" => AppError::DuplicateReference(new.reference.clone()),
                "insufficient_funds" => AppError::InsufficientFunds {
                    required: -new.amount,
                    available: reply_i64(&reply, 2),
                },
                _ => unexpected_reply("apply_entry", &reply),
            });
        }

        let new_balance = reply_i64(&reply, 1);
        let entry = load_entry_from_hash(&mut redis_conn, new.transaction_id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Entry missing after apply")))?;

        Ok(EntryReceipt { entry, new_balance })
    }

    async fn resolve_entry(
        &self,
        transaction_id: Uuid,
        decision: ApprovalDecision,
    ) -> Result<EntryReceipt> {
        let mut redis_conn = self.redis.clone();

        // Read first to learn the owning account; the script re-verifies
        // everything so a stale read cannot double-apply.
        let entry = load_entry_from_hash(&mut redis_conn, transaction_id)
            .await?
            .ok_or(AppError::TransactionNotFound(transaction_id))?;

        let now_ms = Utc::now().timestamp_millis();
        let script = Script::new(RESOLVE_ENTRY_SCRIPT);
        let reply: Vec<String> = script
            .key(entry_key(transaction_id))
            .key(account_key(&entry.account_id))
            .key(pending_index_key(entry.tx_type))
            .arg(&entry.account_id)
            .arg(match decision {
                ApprovalDecision::Approve => "approve",
                ApprovalDecision::Reject => "reject",
            })
            .arg(now_ms)
            .invoke_async(&mut redis_conn)
            .await?;

        if reply_str(&reply, 0) != "OK" {
            return Err(match reply_str(&reply, 1) {
                "tx_missing" => AppError::TransactionNotFound(transaction_id),
                "already_processed" => AppError::TransactionAlreadyProcessed(transaction_id),
                "wrong_type" => AppError::invalid_input(
                    "Only pending deposits and withdrawals can be resolved",
                ),
                "account_missing" => AppError::AccountNotFound(entry.account_id.clone()),
                "insufficient_funds" => AppError::InsufficientFunds {
                    required: -entry.amount,
                    available: reply_i64(&reply, 2),
                },
                "stale_read" => AppError::Internal(anyhow::anyhow!(
                    "Transaction {} changed owner during resolution",
                    transaction_id
                )),
                _ => unexpected_reply("resolve_entry", &reply),
            });
        }

        let new_balance = reply_i64(&reply, 1);
        let entry = load_entry_from_hash(&mut redis_conn, transaction_id)
            .await?
            .ok_or(AppError::TransactionNotFound(transaction_id))?;

        Ok(EntryReceipt { entry, new_balance })
    }

    async fn find_entry(&self, transaction_id: Uuid) -> Result<Option<LedgerEntry>> {
        let mut redis_conn = self.redis.clone();
        load_entry_from_hash(&mut redis_conn, transaction_id).await
    }

    async fn entries_for_account(
        &self,
        account_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Page<LedgerEntry>> {
        let mut redis_conn = self.redis.clone();
        let key = account_entries_key(account_id);

        let total: i64 = redis_conn.zcard(&key).await?;
        let start = offset.max(0) as isize;
        let end = (offset + limit - 1).max(-1) as isize;
        let ids: Vec<String> = redis_conn.zrevrange(&key, start, end).await?;

        let mut items = Vec::new();
        for id_str in ids {
            if let Ok(id) = Uuid::parse_str(&id_str) {
                if let Some(entry) = load_entry_from_hash(&mut redis_conn, id).await? {
                    items.push(entry);
                }
            }
        }
        Ok(Page { items, total })
    }

    async fn pending_entries(&self, tx_type: TransactionType) -> Result<Vec<LedgerEntry>> {
        let mut redis_conn = self.redis.clone();
        let ids: Vec<String> = redis_conn
            .zrevrange(pending_index_key(tx_type), 0, -1)
            .await?;

        let mut entries = Vec::new();
        for id_str in ids {
            if let Ok(id) = Uuid::parse_str(&id_str) {
                if let Some(entry) = load_entry_from_hash(&mut redis_conn, id).await? {
                    entries.push(entry);
                }
            }
        }
        Ok(entries)
    }

    async fn list_entries(&self) -> Result<Vec<LedgerEntry>> {
        let mut redis_conn = self.redis.clone();
        let ids: Vec<String> = redis_conn.zrevrange(entries_index_key(), 0, -1).await?;

        let mut entries = Vec::new();
        for id_str in ids {
            if let Ok(id) = Uuid::parse_str(&id_str) {
                if let Some(entry) = load_entry_from_hash(&mut redis_conn, id).await? {
                    entries.push(entry);
                }
            }
        }
        Ok(entries)
    }

    async fn find_bet(&self, bet_id: Uuid) -> Result<Option<Bet>> {
        let mut redis_conn = self.redis.clone();
        load_bet_from_hash(&mut redis_conn, bet_id).await
    }

    async fn bets_for_account(
        &self,
        account_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Bet>> {
        let mut redis_conn = self.redis.clone();
        let key = account_bets_key(account_id);

        let total: i64 = redis_conn.zcard(&key).await?;
        let start = offset.max(0) as isize;
        let end = (offset + limit - 1).max(-1) as isize;
        let ids: Vec<String> = redis_conn.zrevrange(&key, start, end).await?;

        let mut items = Vec::new();
        for id_str in ids {
            if let Ok(id) = Uuid::parse_str(&id_str) {
                if let Some(bet) = load_bet_from_hash(&mut redis_conn, id).await? {
                    items.push(bet);
                }
            }
        }
        Ok(Page { items, total })
    }

    async fn game_stats(&self, account_id: &str, game_type: GameType) -> Result<GameStats> {
        let mut redis_conn = self.redis.clone();
        let ids: Vec<String> = redis_conn
            .zrevrange(account_bets_key(account_id), 0, -1)
            .await?;

        let mut stats = GameStats::default();
        for id_str in ids {
            let Ok(id) = Uuid::parse_str(&id_str) else {
                continue;
            };
            let Some(bet) = load_bet_from_hash(&mut redis_conn, id).await? else {
                continue;
            };
            if bet.game_type != game_type {
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
        let mut redis_conn = self.redis.clone();
        let _: Option<String> = redis_conn.get("_health_check").await?;
        Ok(())
    }
}
