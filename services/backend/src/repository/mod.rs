//! Storage layer for accounts, the transaction ledger and bet records
//!
//! The `WalletStore` trait exposes atomic operation primitives: every
//! balance mutation commits together with its paired ledger write (and bet
//! write, where one exists). Implementations must guarantee that two
//! concurrent operations against the same account cannot interleave between
//! the balance read and the balance write.

pub mod memory;
pub mod redis_store;

pub use memory::MemoryWalletStore;
pub use redis_store::RedisWalletStore;

use async_trait::async_trait;
use serde_json::Value;
use shared::Currency;
use uuid::Uuid;

use crate::domain::{
    Account, AccountStatus, Bet, BetOutcome, GameStats, GameType, LedgerEntry, TransactionType,
};
use crate::errors::Result;

/// Seed data for lookup-or-create account resolution
#[derive(Debug, Clone)]
pub struct AccountSeed {
    pub account_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub currency: Currency,
}

impl AccountSeed {
    pub fn bare(account_id: &str, currency: Currency) -> Self {
        Self {
            account_id: account_id.to_string(),
            email: None,
            first_name: None,
            last_name: None,
            currency,
        }
    }
}

/// Partial profile update; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }
}

/// How a debit treats an insufficient balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitPolicy {
    /// Reject with InsufficientFunds
    Strict,
    /// Deduct what is available, flooring the balance at zero
    Capped,
}

/// Which lifetime aggregate a balance effect updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Deposited,
    Withdrawn,
    Wagered,
    Won,
    None,
}

/// Balance effect of a ledger entry being applied
#[derive(Debug, Clone, Copy)]
pub enum BalanceEffect {
    /// Write the entry as pending; the balance is untouched until approval
    Hold,
    /// Credit the entry amount (must be positive)
    Credit(Aggregate),
    /// Debit the entry amount (must be negative)
    Debit {
        policy: DebitPolicy,
        aggregate: Aggregate,
    },
}

/// A ledger entry about to be written. The store stamps currency (from the
/// owning account), timestamps, and — on capped debits — rewrites `amount`
/// to the delta actually applied.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub transaction_id: Uuid,
    pub account_id: String,
    pub tx_type: TransactionType,
    pub amount: i64,
    pub description: String,
    pub reference: String,
    pub game_id: Option<String>,
    pub game_type: Option<GameType>,
    pub bet_id: Option<Uuid>,
    pub metadata: Value,
}

/// A wager about to be placed: debit + bet record + ledger entry, atomically
#[derive(Debug, Clone)]
pub struct BetPlacement {
    pub bet_id: Uuid,
    pub transaction_id: Uuid,
    pub account_id: String,
    pub game_id: Option<String>,
    pub game_type: GameType,
    /// Requested stake, always positive
    pub amount: i64,
    pub policy: DebitPolicy,
    pub details: Value,
    pub description: String,
    pub reference: String,
    pub metadata: Value,
}

/// Settlement of a pending bet: status transition + optional credit + ledger
/// entry, atomically. The credit is the payout for `Won` and the recorded
/// `debited` amount for `Cancelled`.
#[derive(Debug, Clone)]
pub struct BetSettlement {
    pub bet_id: Uuid,
    pub account_id: String,
    pub transaction_id: Uuid,
    pub outcome: BetOutcome,
    pub payout: i64,
    pub description: String,
    pub reference: String,
    pub metadata: Value,
}

/// Approval decision for a pending deposit or withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone)]
pub struct PlacementReceipt {
    pub bet: Bet,
    pub entry: LedgerEntry,
    pub new_balance: i64,
}

#[derive(Debug, Clone)]
pub struct SettlementReceipt {
    pub bet: Bet,
    pub entry: Option<LedgerEntry>,
    pub new_balance: i64,
}

#[derive(Debug, Clone)]
pub struct EntryReceipt {
    pub entry: LedgerEntry,
    pub new_balance: i64,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[async_trait]
pub trait WalletStore: Send + Sync {
    // -- accounts ----------------------------------------------------------

    async fn find_account(&self, account_id: &str) -> Result<Option<Account>>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Resolve an account, creating it with a zero balance if absent.
    /// Creation is race-safe: two concurrent calls for the same id resolve
    /// to a single account.
    async fn get_or_create_account(&self, seed: AccountSeed) -> Result<Account>;

    async fn update_profile(&self, account_id: &str, patch: ProfilePatch) -> Result<Account>;

    /// Suspend, close or reactivate an account. Mutating wallet operations
    /// reject anything but `active`.
    async fn set_account_status(&self, account_id: &str, status: AccountStatus)
        -> Result<Account>;

    async fn list_accounts(&self) -> Result<Vec<Account>>;

    // -- atomic wallet mutations ------------------------------------------

    async fn place_bet(&self, placement: BetPlacement) -> Result<PlacementReceipt>;

    async fn settle_bet(&self, settlement: BetSettlement) -> Result<SettlementReceipt>;

    async fn apply_entry(&self, entry: NewLedgerEntry, effect: BalanceEffect)
        -> Result<EntryReceipt>;

    async fn resolve_entry(
        &self,
        transaction_id: Uuid,
        decision: ApprovalDecision,
    ) -> Result<EntryReceipt>;

    // -- ledger reads ------------------------------------------------------

    async fn find_entry(&self, transaction_id: Uuid) -> Result<Option<LedgerEntry>>;

    async fn entries_for_account(
        &self,
        account_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Page<LedgerEntry>>;

    /// Admin approval queue: pending entries of one type, newest first
    async fn pending_entries(&self, tx_type: TransactionType) -> Result<Vec<LedgerEntry>>;

    async fn list_entries(&self) -> Result<Vec<LedgerEntry>>;

    // -- bet reads ---------------------------------------------------------

    async fn find_bet(&self, bet_id: Uuid) -> Result<Option<Bet>>;

    async fn bets_for_account(&self, account_id: &str, limit: i64, offset: i64)
        -> Result<Page<Bet>>;

    async fn game_stats(&self, account_id: &str, game_type: GameType) -> Result<GameStats>;

    // -- health ------------------------------------------------------------

    async fn ping(&self) -> Result<()>;
}
