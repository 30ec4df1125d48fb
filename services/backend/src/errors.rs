use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::errors::ServiceError;
use uuid::Uuid;

use crate::domain::AccountStatus;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Bet not found: {0}")]
    BetNotFound(Uuid),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("Bet already settled: {0}")]
    BetAlreadySettled(Uuid),

    #[error("Transaction already processed: {0}")]
    TransactionAlreadyProcessed(Uuid),

    #[error("Duplicate ledger reference: {0}")]
    DuplicateReference(String),

    #[error("Account {0} is {1}")]
    AccountSuspended(String, AccountStatus),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    /// Wire representation shared with every other error the API emits
    fn service_error(&self) -> ServiceError {
        match self {
            AppError::Redis(e) => ServiceError::storage_error(e),
            AppError::AccountNotFound(id) => ServiceError::account_not_found(id),
            AppError::BetNotFound(id) => ServiceError::bet_not_found(id),
            AppError::TransactionNotFound(id) => ServiceError::transaction_not_found(id),
            AppError::InvalidInput(msg) => ServiceError::invalid_input(msg.clone()),
            AppError::InsufficientFunds {
                required,
                available,
            } => ServiceError::insufficient_balance(*required, *available),
            AppError::BetAlreadySettled(id) => ServiceError::bet_settled(id),
            AppError::TransactionAlreadyProcessed(id) => ServiceError::transaction_processed(id),
            AppError::DuplicateReference(reference) => ServiceError::duplicate_reference(reference),
            AppError::AccountSuspended(id, status) => ServiceError::account_suspended(id, status),
            AppError::Internal(_) => ServiceError::internal("Internal server error"),
        }
    }
}

impl From<shared::ValidationError> for AppError {
    fn from(e: shared::ValidationError) -> Self {
        AppError::InvalidInput(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Request validation failed: {}", e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = self.service_error();
        let status = StatusCode::from_u16(error.category.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self {
            AppError::Redis(e) => tracing::error!(error = %e, "Redis error"),
            AppError::Internal(e) => tracing::error!(error = ?e, "Internal error"),
            other => tracing::warn!(code = error.code.as_str(), "Request failed: {}", other),
        }

        metrics::counter!(
            "errors_total",
            "category" => format!("{:?}", error.category),
            "code" => error.code.clone()
        )
        .increment(1);

        let body = Json(json!({ "error": error }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories_map_to_status() {
        assert_eq!(
            AppError::BetNotFound(Uuid::nil()).service_error().category.status_code(),
            404
        );
        assert_eq!(
            AppError::BetAlreadySettled(Uuid::nil())
                .service_error()
                .category
                .status_code(),
            409
        );
        assert_eq!(
            AppError::InsufficientFunds {
                required: 200,
                available: 50
            }
            .service_error()
            .category
            .status_code(),
            400
        );
        assert_eq!(
            AppError::AccountSuspended("u".into(), AccountStatus::Suspended)
                .service_error()
                .category
                .status_code(),
            403
        );
    }

    #[test]
    fn test_insufficient_funds_context() {
        let error = AppError::InsufficientFunds {
            required: 1_000,
            available: 250,
        }
        .service_error();
        assert_eq!(error.code, "VALIDATION_INSUFFICIENT_BALANCE");
        assert!(error.context.unwrap().contains("available: 250"));
    }
}
