use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{Amount, Currency};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Suspended,
    Closed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
            AccountStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(AccountStatus::Active),
            "suspended" => Some(AccountStatus::Suspended),
            "closed" => Some(AccountStatus::Closed),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's identity plus wallet state. Created on first reference,
/// never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub balance: i64,
    pub currency: Currency,
    pub status: AccountStatus,
    pub total_deposited: i64,
    pub total_withdrawn: i64,
    pub total_wagered: i64,
    pub total_won: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Bet,
    Win,
    Refund,
    Bonus,
    Fee,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Bet => "bet",
            TransactionType::Win => "win",
            TransactionType::Refund => "refund",
            TransactionType::Bonus => "bonus",
            TransactionType::Fee => "fee",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(TransactionType::Deposit),
            "withdrawal" => Some(TransactionType::Withdrawal),
            "bet" => Some(TransactionType::Bet),
            "win" => Some(TransactionType::Win),
            "refund" => Some(TransactionType::Refund),
            "bonus" => Some(TransactionType::Bonus),
            "fee" => Some(TransactionType::Fee),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TransactionStatus::Pending),
            "completed" => Some(TransactionStatus::Completed),
            "failed" => Some(TransactionStatus::Failed),
            "cancelled" => Some(TransactionStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An entry in the balance-affecting ledger.
///
/// `amount` is signed: bets, withdrawals and fees are negative, deposits,
/// wins, refunds and bonuses positive. Amount and type never change after
/// creation; only status and completed_at transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub transaction_id: Uuid,
    pub account_id: String,
    pub tx_type: TransactionType,
    pub amount: i64,
    pub currency: Currency,
    pub status: TransactionStatus,
    pub description: String,
    pub reference: String,
    pub game_id: Option<String>,
    pub game_type: Option<GameType>,
    pub bet_id: Option<Uuid>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Slots,
    Blackjack,
    Roulette,
    Baccarat,
    Lottery,
    Sports,
    Casino,
}

impl GameType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::Slots => "slots",
            GameType::Blackjack => "blackjack",
            GameType::Roulette => "roulette",
            GameType::Baccarat => "baccarat",
            GameType::Lottery => "lottery",
            GameType::Sports => "sports",
            GameType::Casino => "casino",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "slots" => Some(GameType::Slots),
            "blackjack" => Some(GameType::Blackjack),
            "roulette" => Some(GameType::Roulette),
            "baccarat" => Some(GameType::Baccarat),
            "lottery" => Some(GameType::Lottery),
            "sports" => Some(GameType::Sports),
            "casino" => Some(GameType::Casino),
            _ => None,
        }
    }
}

impl std::fmt::Display for GameType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Cancelled,
}

impl BetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Pending => "pending",
            BetStatus::Won => "won",
            BetStatus::Lost => "lost",
            BetStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BetStatus::Pending),
            "won" => Some(BetStatus::Won),
            "lost" => Some(BetStatus::Lost),
            "cancelled" => Some(BetStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for BetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Settlement outcome for a pending bet. Each maps to a terminal BetStatus.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BetOutcome {
    Won,
    Lost,
    Cancelled,
}

impl BetOutcome {
    pub fn as_status(&self) -> BetStatus {
        match self {
            BetOutcome::Won => BetStatus::Won,
            BetOutcome::Lost => BetStatus::Lost,
            BetOutcome::Cancelled => BetStatus::Cancelled,
        }
    }
}

/// A wager record, distinct from its ledger entries.
///
/// `amount` is the requested stake; `debited` is what actually left the
/// balance (smaller than `amount` only on the capped casino path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub bet_id: Uuid,
    pub account_id: String,
    pub game_id: Option<String>,
    pub game_type: GameType,
    pub amount: i64,
    pub debited: i64,
    pub status: BetStatus,
    pub payout: i64,
    pub details: Value,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Per-account, per-game aggregate view over the bet store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameStats {
    pub total_bets: i64,
    pub total_won: i64,
    pub total_lost: i64,
    pub total_amount: i64,
    pub total_payout: i64,
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

// Custom deserializer for Amount from u64
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Amount, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let minor = u64::deserialize(deserializer)?;
    Amount::try_from(minor).map_err(|e| serde::de::Error::custom(format!("Invalid amount: {}", e)))
}

fn deserialize_opt_amount<'de, D>(deserializer: D) -> Result<Option<Amount>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let minor = Option::<u64>::deserialize(deserializer)?;
    minor
        .map(|m| {
            Amount::try_from(m)
                .map_err(|e| serde::de::Error::custom(format!("Invalid amount: {}", e)))
        })
        .transpose()
}

/// Profile details attached by callers whose identity layer knows more than
/// the wallet does. Used to seed auto-created accounts and to backfill
/// placeholder emails.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileDetails {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 64))]
    pub first_name: Option<String>,
    #[validate(length(max = 64))]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlaceBetRequest {
    #[validate(length(min = 1, max = 64))]
    pub account_id: String,
    #[validate(length(max = 64))]
    pub game_id: Option<String>,
    pub game_type: GameType,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Amount,
    #[serde(default)]
    pub details: Value,
    #[validate]
    pub profile: Option<ProfileDetails>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceBetResponse {
    pub bet: Bet,
    pub transaction: LedgerEntry,
    pub new_balance: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SettleBetRequest {
    #[validate(length(min = 1, max = 64))]
    pub account_id: String,
    pub outcome: BetOutcome,
    #[serde(default, deserialize_with = "deserialize_opt_amount")]
    pub payout: Option<Amount>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CasinoWinRequest {
    #[validate(length(min = 1, max = 64))]
    pub account_id: String,
    #[serde(deserialize_with = "deserialize_amount")]
    pub payout: Amount,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CasinoLossRequest {
    #[validate(length(min = 1, max = 64))]
    pub account_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettleBetResponse {
    pub bet: Bet,
    pub transaction: Option<LedgerEntry>,
    pub new_balance: i64,
}

/// The two caller-initiated transfer kinds. Bets, wins and adjustments
/// have their own operations and never come through this request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Deposit,
    Withdrawal,
}

impl TransferKind {
    pub fn as_transaction_type(&self) -> TransactionType {
        match self {
            TransferKind::Deposit => TransactionType::Deposit,
            TransferKind::Withdrawal => TransactionType::Withdrawal,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    #[validate(length(min = 1, max = 64))]
    pub account_id: String,
    pub tx_type: TransferKind,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: Amount,
    #[serde(default)]
    pub requires_approval: bool,
    #[validate(length(max = 256))]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    #[validate]
    pub profile: Option<ProfileDetails>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub transaction: LedgerEntry,
    pub new_balance: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdjustBalanceRequest {
    #[validate(length(min = 1, max = 64))]
    pub account_id: String,
    /// Signed delta in minor units; positive books a bonus, negative a fee
    pub amount: i64,
    #[validate(length(max = 256))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdjustBalanceResponse {
    pub old_balance: i64,
    pub new_balance: i64,
    /// Delta actually applied (a negative adjustment floors the balance at zero)
    pub adjustment: i64,
    pub transaction: LedgerEntry,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetAccountStatusRequest {
    pub status: AccountStatus,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SyncAccountRequest {
    #[validate(length(min = 1, max = 64))]
    pub account_id: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 64))]
    pub first_name: Option<String>,
    #[validate(length(max = 64))]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub account_id: String,
    pub balance: i64,
    pub currency: Currency,
    pub stats: AggregateStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateStats {
    pub total_deposited: i64,
    pub total_withdrawn: i64,
    pub total_wagered: i64,
    pub total_won: i64,
}

impl From<&Account> for AggregateStats {
    fn from(account: &Account) -> Self {
        Self {
            total_deposited: account.total_deposited,
            total_withdrawn: account.total_withdrawn,
            total_wagered: account.total_wagered,
            total_won: account.total_won,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionsPage {
    pub transactions: Vec<LedgerEntry>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct BetsPage {
    pub bets: Vec<Bet>,
    pub pagination: Pagination,
}
