/// Type-safe wrappers for domain primitives
///
/// These types prevent common errors by enforcing validation at construction time
/// and providing checked arithmetic operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::*;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Amount out of range: {amount} (min: {min}, max: {max})")]
    AmountOutOfRange { amount: u64, min: u64, max: u64 },

    #[error("Amount overflow in operation")]
    AmountOverflow,

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Account ID too long: {length} chars (max {max})")]
    AccountIdTooLong { length: usize, max: usize },

    #[error("Account ID must not be empty")]
    EmptyAccountId,
}

/// Type-safe monetary amount in currency minor units
///
/// Always positive; the sign of a ledger entry is decided by its type, not
/// by the amount a caller submits. Provides checked arithmetic to prevent
/// integer overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(u64);

impl Amount {
    /// Create a new Amount with range validation
    pub fn new(minor: u64) -> Result<Self, ValidationError> {
        if minor == 0 || minor > MAX_AMOUNT_MINOR {
            return Err(ValidationError::AmountOutOfRange {
                amount: minor,
                min: 1,
                max: MAX_AMOUNT_MINOR,
            });
        }
        Ok(Self(minor))
    }

    /// Create without validation (for internal use)
    pub fn new_unchecked(minor: u64) -> Self {
        Self(minor)
    }

    /// Raw value in minor units
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Raw value as a signed quantity, for ledger arithmetic
    pub fn as_i64(&self) -> i64 {
        self.0 as i64
    }

    /// Checked addition
    pub fn checked_add(&self, other: Amount) -> Result<Self, ValidationError> {
        self.0
            .checked_add(other.0)
            .map(Self::new_unchecked)
            .ok_or(ValidationError::AmountOverflow)
    }

    /// Checked subtraction
    pub fn checked_sub(&self, other: Amount) -> Result<Self, ValidationError> {
        self.0
            .checked_sub(other.0)
            .map(Self::new_unchecked)
            .ok_or(ValidationError::AmountOverflow)
    }

    /// Value in major units (display only, never for arithmetic)
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl TryFrom<u64> for Amount {
    type Error = ValidationError;

    fn try_from(minor: u64) -> Result<Self, Self::Error> {
        Self::new(minor)
    }
}

impl From<Amount> for u64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} minor ({:.2})", self.0, self.to_major())
    }
}

/// Supported wallet currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Inr,
    Usd,
    Eur,
    Gbp,
    Cad,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Cad => "CAD",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::Inr
    }
}

impl TryFrom<&str> for Currency {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "INR" => Ok(Currency::Inr),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "CAD" => Ok(Currency::Cad),
            other => Err(ValidationError::InvalidCurrency(other.to_string())),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validate an opaque account identifier supplied by the identity layer
pub fn validate_account_id(account_id: &str) -> Result<(), ValidationError> {
    if account_id.is_empty() {
        return Err(ValidationError::EmptyAccountId);
    }
    if account_id.len() > MAX_ACCOUNT_ID_LENGTH {
        return Err(ValidationError::AccountIdTooLong {
            length: account_id.len(),
            max: MAX_ACCOUNT_ID_LENGTH,
        });
    }
    Ok(())
}

/// Ledger reference generation
///
/// Every ledger entry carries a globally unique reference string; the store
/// rejects duplicates, which makes the reference double as an idempotency
/// key. References embed the id of the record they anchor to, hyphens
/// stripped to keep them compact.
pub mod reference {
    use super::Uuid;

    pub fn bet(bet_id: Uuid) -> String {
        format!("BET_{}", bet_id.simple())
    }

    pub fn win(bet_id: Uuid) -> String {
        format!("WIN_{}", bet_id.simple())
    }

    pub fn refund(bet_id: Uuid) -> String {
        format!("RFD_{}", bet_id.simple())
    }

    pub fn deposit(transaction_id: Uuid) -> String {
        format!("DEP_{}", transaction_id.simple())
    }

    pub fn withdrawal(transaction_id: Uuid) -> String {
        format!("WDR_{}", transaction_id.simple())
    }

    pub fn adjustment(transaction_id: Uuid) -> String {
        format!("ADJ_{}", transaction_id.simple())
    }
}
