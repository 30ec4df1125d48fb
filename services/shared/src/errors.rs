/// Shared error types for the wallet service
///
/// Design Philosophy:
/// - Standardized error codes for consistent error handling across the API
/// - Categorized by error domain (Validation, Conflict, NotFound, Internal)
/// - Implements both Display and std::error::Error for compatibility
/// - Includes context fields for debugging (error_code, message, context)
///
/// Usage:
/// - The backend wraps its specific errors in ServiceError for the wire
/// - Error codes follow pattern: <CATEGORY>_<SPECIFIC>_<DETAIL>
/// - Context field used for additional debugging information
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error categories that map to HTTP status codes and logging severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Validation errors (400 Bad Request)
    /// Client provided invalid input
    Validation,

    /// Conflicting state transitions (409 Conflict)
    /// Double settlement, double approval, duplicate references
    Conflict,

    /// Resource not found (404 Not Found)
    NotFound,

    /// Authorization errors (403 Forbidden)
    /// Suspended or closed accounts attempting wallet operations
    Unauthorized,

    /// Internal service errors (500 Internal Server Error)
    /// Unexpected failures, storage issues, programming errors
    Internal,
}

impl ErrorCategory {
    /// Map error category to HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCategory::Validation => 400,
            ErrorCategory::Conflict => 409,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Unauthorized => 403,
            ErrorCategory::Internal => 500,
        }
    }

    /// Map error category to log level
    pub fn log_level(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "warn",
            ErrorCategory::Conflict => "warn",
            ErrorCategory::NotFound => "info",
            ErrorCategory::Unauthorized => "warn",
            ErrorCategory::Internal => "error",
        }
    }
}

/// Standard error codes used across the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    // Validation errors
    pub const VALIDATION_INVALID_INPUT: ErrorCode = ErrorCode("VALIDATION_INVALID_INPUT");
    pub const VALIDATION_MISSING_FIELD: ErrorCode = ErrorCode("VALIDATION_MISSING_FIELD");
    pub const VALIDATION_INVALID_AMOUNT: ErrorCode = ErrorCode("VALIDATION_INVALID_AMOUNT");
    pub const VALIDATION_INSUFFICIENT_BALANCE: ErrorCode =
        ErrorCode("VALIDATION_INSUFFICIENT_BALANCE");

    // Conflict errors
    pub const CONFLICT_BET_SETTLED: ErrorCode = ErrorCode("CONFLICT_BET_SETTLED");
    pub const CONFLICT_TRANSACTION_PROCESSED: ErrorCode =
        ErrorCode("CONFLICT_TRANSACTION_PROCESSED");
    pub const CONFLICT_DUPLICATE_REFERENCE: ErrorCode =
        ErrorCode("CONFLICT_DUPLICATE_REFERENCE");

    // Resource errors
    pub const NOT_FOUND_ACCOUNT: ErrorCode = ErrorCode("NOT_FOUND_ACCOUNT");
    pub const NOT_FOUND_BET: ErrorCode = ErrorCode("NOT_FOUND_BET");
    pub const NOT_FOUND_TRANSACTION: ErrorCode = ErrorCode("NOT_FOUND_TRANSACTION");

    // Authorization errors
    pub const UNAUTHORIZED_ACCOUNT_SUSPENDED: ErrorCode =
        ErrorCode("UNAUTHORIZED_ACCOUNT_SUSPENDED");

    // Internal errors
    pub const INTERNAL_UNEXPECTED: ErrorCode = ErrorCode("INTERNAL_UNEXPECTED");
    pub const INTERNAL_STORAGE: ErrorCode = ErrorCode("INTERNAL_STORAGE");
    pub const INTERNAL_SERIALIZATION: ErrorCode = ErrorCode("INTERNAL_SERIALIZATION");
    pub const INTERNAL_CONFIGURATION: ErrorCode = ErrorCode("INTERNAL_CONFIGURATION");

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Standardized error structure used on the wire
///
/// This provides consistent error reporting with:
/// - Structured error codes for programmatic handling
/// - Human-readable messages
/// - Optional context for debugging
/// - Category-based classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceError {
    /// Error category (determines status code and log level)
    pub category: ErrorCategory,

    /// Structured error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context (e.g., field names, IDs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl ServiceError {
    /// Create a new ServiceError
    pub fn new(category: ErrorCategory, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            category,
            code: code.as_str().to_string(),
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    // Validation error constructors
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_INVALID_INPUT,
            message,
        )
    }

    pub fn invalid_amount(amount: i64, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_INVALID_AMOUNT,
            format!("Invalid amount: {}", amount),
        )
        .with_context(reason)
    }

    pub fn insufficient_balance(required: i64, available: i64) -> Self {
        Self::new(
            ErrorCategory::Validation,
            ErrorCode::VALIDATION_INSUFFICIENT_BALANCE,
            "Insufficient balance",
        )
        .with_context(format!("required: {}, available: {}", required, available))
    }

    // Conflict error constructors
    pub fn bet_settled(bet_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Conflict,
            ErrorCode::CONFLICT_BET_SETTLED,
            format!("Bet already settled: {}", bet_id),
        )
    }

    pub fn transaction_processed(transaction_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Conflict,
            ErrorCode::CONFLICT_TRANSACTION_PROCESSED,
            format!("Transaction already processed: {}", transaction_id),
        )
    }

    pub fn duplicate_reference(reference: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Conflict,
            ErrorCode::CONFLICT_DUPLICATE_REFERENCE,
            format!("Duplicate ledger reference: {}", reference),
        )
    }

    // Resource not found constructors
    pub fn account_not_found(account_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::NotFound,
            ErrorCode::NOT_FOUND_ACCOUNT,
            format!("Account not found: {}", account_id),
        )
    }

    pub fn bet_not_found(bet_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::NotFound,
            ErrorCode::NOT_FOUND_BET,
            format!("Bet not found: {}", bet_id),
        )
    }

    pub fn transaction_not_found(transaction_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::NotFound,
            ErrorCode::NOT_FOUND_TRANSACTION,
            format!("Transaction not found: {}", transaction_id),
        )
    }

    // Authorization constructors
    pub fn account_suspended(account_id: impl fmt::Display, status: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Unauthorized,
            ErrorCode::UNAUTHORIZED_ACCOUNT_SUSPENDED,
            format!("Account {} is {}", account_id, status),
        )
    }

    // Internal error constructors
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            ErrorCategory::Internal,
            ErrorCode::INTERNAL_UNEXPECTED,
            message,
        )
    }

    pub fn storage_error(error: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Internal,
            ErrorCode::INTERNAL_STORAGE,
            "Storage error",
        )
        .with_context(error.to_string())
    }

    pub fn serialization_error(error: impl fmt::Display) -> Self {
        Self::new(
            ErrorCategory::Internal,
            ErrorCode::INTERNAL_SERIALIZATION,
            "Serialization error",
        )
        .with_context(error.to_string())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "[{}] {}: {}", self.code, self.message, context)
        } else {
            write!(f, "[{}] {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ServiceError {}

// Convenience type alias
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_status_codes() {
        assert_eq!(ErrorCategory::Validation.status_code(), 400);
        assert_eq!(ErrorCategory::Conflict.status_code(), 409);
        assert_eq!(ErrorCategory::NotFound.status_code(), 404);
        assert_eq!(ErrorCategory::Unauthorized.status_code(), 403);
        assert_eq!(ErrorCategory::Internal.status_code(), 500);
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(
            ErrorCode::CONFLICT_BET_SETTLED.to_string(),
            "CONFLICT_BET_SETTLED"
        );
    }

    #[test]
    fn test_service_error_creation() {
        let error = ServiceError::bet_not_found("test-123");
        assert_eq!(error.category, ErrorCategory::NotFound);
        assert_eq!(error.code, "NOT_FOUND_BET");
        assert!(error.message.contains("test-123"));
    }

    #[test]
    fn test_service_error_with_context() {
        let error = ServiceError::insufficient_balance(1_000, 250);
        assert!(error.context.is_some());
        assert!(error.to_string().contains("required: 1000"));
    }

    #[test]
    fn test_error_serialization() {
        let error = ServiceError::transaction_processed("abc-123");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("CONFLICT_TRANSACTION_PROCESSED"));
        assert!(json.contains("abc-123"));
    }
}
