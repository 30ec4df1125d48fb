//! Redis key generation functions
//!
//! Centralizes all Redis key patterns used for account, ledger and bet
//! storage and indexing.

use uuid::Uuid;

use crate::domain::TransactionType;

/// Redis key prefix for accounts
const ACCOUNT_KEY_PREFIX: &str = "account:";

/// Redis key prefix for the email -> account id index
const EMAIL_INDEX_PREFIX: &str = "accounts:email:";

/// Redis key for the all-accounts sorted set
const ACCOUNTS_INDEX: &str = "accounts:all";

/// Redis key prefix for ledger entries
const ENTRY_KEY_PREFIX: &str = "tx:";

/// Redis key prefix for per-account ledger index
const ACCOUNT_ENTRIES_PREFIX: &str = "txs:account:";

/// Redis key for the all-entries sorted set
const ENTRIES_INDEX: &str = "txs:all";

/// Redis key prefix for the pending approval queue, one per entry type
const PENDING_INDEX_PREFIX: &str = "txs:pending:";

/// Redis key for the ledger reference uniqueness set
const REFERENCES_SET: &str = "txs:refs";

/// Redis key prefix for bets
const BET_KEY_PREFIX: &str = "bet:";

/// Redis key prefix for per-account bet index
const ACCOUNT_BETS_PREFIX: &str = "bets:account:";

pub fn account_key(account_id: &str) -> String {
    format!("{}{}", ACCOUNT_KEY_PREFIX, account_id)
}

pub fn email_index_key(email: &str) -> String {
    format!("{}{}", EMAIL_INDEX_PREFIX, email)
}

pub fn accounts_index_key() -> &'static str {
    ACCOUNTS_INDEX
}

pub fn entry_key(transaction_id: Uuid) -> String {
    format!("{}{}", ENTRY_KEY_PREFIX, transaction_id)
}

pub fn account_entries_key(account_id: &str) -> String {
    format!("{}{}", ACCOUNT_ENTRIES_PREFIX, account_id)
}

pub fn entries_index_key() -> &'static str {
    ENTRIES_INDEX
}

pub fn pending_index_key(tx_type: TransactionType) -> String {
    format!("{}{}", PENDING_INDEX_PREFIX, tx_type.as_str())
}

pub fn references_key() -> &'static str {
    REFERENCES_SET
}

pub fn bet_key(bet_id: Uuid) -> String {
    format!("{}{}", BET_KEY_PREFIX, bet_id)
}

pub fn account_bets_key(account_id: &str) -> String {
    format!("{}{}", ACCOUNT_BETS_PREFIX, account_id)
}
