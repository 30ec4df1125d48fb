/// Shared constants for the wallet service
///
/// This module centralizes all magic numbers and configuration defaults
/// to prevent inconsistencies between the engine, the storage layer, and
/// request validation.

/// Minimum bet amount in currency minor units (1.00)
///
/// Rationale: prevents spam wagers below anything the games can pay out.
pub const MIN_BET_MINOR: u64 = 100;

/// Maximum bet amount in currency minor units (1,000,000.00)
///
/// Rationale: anti-whale limit so a single wager cannot drain the float.
pub const MAX_BET_MINOR: u64 = 100_000_000;

/// Maximum amount accepted for any single wallet operation (1,000,000,000.00)
///
/// Applies to deposits, withdrawals and admin adjustments. Amounts above
/// this are rejected at construction time.
pub const MAX_AMOUNT_MINOR: u64 = 100_000_000_000;

/// Default page size for ledger and bet listings
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Maximum page size a caller may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Maximum length of an opaque account identifier
pub const MAX_ACCOUNT_ID_LENGTH: usize = 64;

/// Domain used for auto-generated placeholder emails
///
/// Accounts created on first wallet contact (before the identity provider
/// has synced a real profile) get `user_<id>@example.com`; a later call
/// carrying a real address replaces it.
pub const PLACEHOLDER_EMAIL_DOMAIN: &str = "example.com";
