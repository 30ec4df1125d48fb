//! Deserialization of wallet records from Redis hash storage
//!
//! Handles parsing Redis hashes back into Account, LedgerEntry and Bet
//! domain objects. Optional fields use the empty string as the absent
//! sentinel.

use chrono::{DateTime, TimeZone, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use shared::Currency;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{
    Account, AccountStatus, Bet, BetStatus, GameType, LedgerEntry, TransactionStatus,
    TransactionType,
};
use crate::errors::{AppError, Result};

use super::keys::{account_key, bet_key, entry_key};

fn parse_ms(map: &HashMap<String, String>, field: &str, what: &str) -> Result<DateTime<Utc>> {
    let ms: i64 = map
        .get(field)
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid {} for {}", field, what)))?;
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid {} timestamp for {}", field, what)))
}

fn parse_opt_ms(map: &HashMap<String, String>, field: &str) -> Option<DateTime<Utc>> {
    map.get(field)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

fn parse_i64(map: &HashMap<String, String>, field: &str) -> i64 {
    map.get(field)
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0)
}

fn parse_json(map: &HashMap<String, String>, field: &str) -> Value {
    map.get(field)
        .filter(|v| !v.is_empty())
        .and_then(|v| serde_json::from_str(v).ok())
        .unwrap_or(Value::Null)
}

fn opt_string(map: &HashMap<String, String>, field: &str) -> Option<String> {
    map.get(field).cloned().filter(|v| !v.is_empty())
}

/// Load an account from Redis hash storage
pub async fn load_account_from_hash(
    redis: &mut ConnectionManager,
    account_id: &str,
) -> Result<Option<Account>> {
    let map: HashMap<String, String> = redis.hgetall(account_key(account_id)).await?;
    if map.is_empty() {
        return Ok(None);
    }

    let status_str = map.get("status").map(|s| s.as_str()).unwrap_or("active");
    let status = AccountStatus::parse(status_str).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "Invalid status '{}' for account {}",
            status_str,
            account_id
        ))
    })?;

    let currency = map
        .get("currency")
        .map(|s| Currency::try_from(s.as_str()))
        .transpose()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Account {}: {}", account_id, e)))?
        .unwrap_or_default();

    Ok(Some(Account {
        account_id: account_id.to_string(),
        email: map.get("email").cloned().unwrap_or_default(),
        first_name: map.get("first_name").cloned().unwrap_or_default(),
        last_name: map.get("last_name").cloned().unwrap_or_default(),
        balance: parse_i64(&map, "balance"),
        currency,
        status,
        total_deposited: parse_i64(&map, "total_deposited"),
        total_withdrawn: parse_i64(&map, "total_withdrawn"),
        total_wagered: parse_i64(&map, "total_wagered"),
        total_won: parse_i64(&map, "total_won"),
        created_at: parse_ms(&map, "created_at_ms", account_id)?,
    }))
}

/// Load a ledger entry from Redis hash storage
pub async fn load_entry_from_hash(
    redis: &mut ConnectionManager,
    transaction_id: Uuid,
) -> Result<Option<LedgerEntry>> {
    let map: HashMap<String, String> = redis.hgetall(entry_key(transaction_id)).await?;
    if map.is_empty() {
        return Ok(None);
    }

    let what = format!("transaction {}", transaction_id);

    let tx_type = map
        .get("tx_type")
        .and_then(|s| TransactionType::parse(s))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid tx_type for {}", what)))?;
    let status = map
        .get("status")
        .and_then(|s| TransactionStatus::parse(s))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid status for {}", what)))?;
    let currency = map
        .get("currency")
        .map(|s| Currency::try_from(s.as_str()))
        .transpose()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("{}: {}", what, e)))?
        .unwrap_or_default();

    Ok(Some(LedgerEntry {
        transaction_id,
        account_id: map.get("account_id").cloned().unwrap_or_default(),
        tx_type,
        amount: parse_i64(&map, "amount"),
        currency,
        status,
        description: map.get("description").cloned().unwrap_or_default(),
        reference: map.get("reference").cloned().unwrap_or_default(),
        game_id: opt_string(&map, "game_id"),
        game_type: map
            .get("game_type")
            .filter(|v| !v.is_empty())
            .and_then(|v| GameType::parse(v)),
        bet_id: map
            .get("bet_id")
            .filter(|v| !v.is_empty())
            .and_then(|v| Uuid::parse_str(v).ok()),
        metadata: parse_json(&map, "metadata"),
        created_at: parse_ms(&map, "created_at_ms", &what)?,
        completed_at: parse_opt_ms(&map, "completed_at_ms"),
    }))
}

/// Load a bet from Redis hash storage
pub async fn load_bet_from_hash(
    redis: &mut ConnectionManager,
    bet_id: Uuid,
) -> Result<Option<Bet>> {
    let map: HashMap<String, String> = redis.hgetall(bet_key(bet_id)).await?;
    if map.is_empty() {
        return Ok(None);
    }

    let what = format!("bet {}", bet_id);

    let status = map
        .get("status")
        .and_then(|s| BetStatus::parse(s))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid status for {}", what)))?;
    let game_type = map
        .get("game_type")
        .and_then(|s| GameType::parse(s))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Invalid game_type for {}", what)))?;

    Ok(Some(Bet {
        bet_id,
        account_id: map.get("account_id").cloned().unwrap_or_default(),
        game_id: opt_string(&map, "game_id"),
        game_type,
        amount: parse_i64(&map, "amount"),
        debited: parse_i64(&map, "debited"),
        status,
        payout: parse_i64(&map, "payout"),
        details: parse_json(&map, "details"),
        created_at: parse_ms(&map, "created_at_ms", &what)?,
        settled_at: parse_opt_ms(&map, "settled_at_ms"),
    }))
}
