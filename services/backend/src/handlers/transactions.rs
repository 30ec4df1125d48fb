use axum::{extract::State, Json};

use crate::{
    domain::{CreateTransactionRequest, TransactionResponse, TransactionStatus},
    errors::Result,
    extractors::ValidatedJson,
    state::AppState,
};

/// Record a deposit or withdrawal. With `requires_approval` the entry is
/// held pending until an admin resolves it.
pub async fn create_transaction(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateTransactionRequest>,
) -> Result<Json<TransactionResponse>> {
    let span = tracing::info_span!(
        "create_transaction",
        account_id = %req.account_id,
        tx_type = ?req.tx_type,
        amount = req.amount.as_u64(),
        requires_approval = req.requires_approval,
    );
    let _enter = span.enter();

    let response = state.engine.record_transaction(req).await?;

    tracing::info!(
        transaction_id = %response.transaction.transaction_id,
        status = %response.transaction.status,
        "Transaction recorded"
    );
    if response.transaction.status == TransactionStatus::Pending {
        metrics::counter!("transactions_pending_total").increment(1);
    } else {
        metrics::counter!("transactions_completed_total").increment(1);
    }

    Ok(Json(response))
}
