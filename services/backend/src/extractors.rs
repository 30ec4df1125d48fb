use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::AppError;

/// JSON extractor that validates the body before it reaches a handler
///
/// Wraps axum's Json extractor, converts deserialization failures into the
/// standardized error envelope, and runs the request struct's validator
/// rules. Nothing unvalidated reaches the wallet engine.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    let raw = rejection.to_string();

    // Surface missing-field and custom-deserializer messages instead of a
    // generic parse failure; everything else stays opaque.
    let message = if let Some(field) = raw
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
    {
        format!("Missing required field: {}", field)
    } else if let Some(detail) = raw
        .split("Invalid amount:")
        .nth(1)
        .and_then(|s| s.split(" at line").next())
    {
        format!("Invalid amount:{}", detail)
    } else {
        "Invalid request body".to_string()
    };

    tracing::warn!(
        error_message = %message,
        original_error = %raw,
        "Request validation failed during JSON deserialization"
    );

    AppError::InvalidInput(message)
}
