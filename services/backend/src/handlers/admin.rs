use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    domain::{
        Account, AdjustBalanceRequest, AdjustBalanceResponse, LedgerEntry,
        SetAccountStatusRequest, TransactionResponse, TransferKind,
    },
    errors::Result,
    extractors::ValidatedJson,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    #[serde(rename = "type")]
    pub kind: Option<TransferKind>,
}

/// Approval queue: pending deposits or withdrawals, newest first
pub async fn pending_transactions(
    State(state): State<AppState>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<Vec<LedgerEntry>>> {
    let kind = query.kind.unwrap_or(TransferKind::Deposit);
    let span = tracing::info_span!("pending_transactions", kind = ?kind);
    let _enter = span.enter();

    let entries = state.engine.pending_transactions(kind).await?;
    tracing::debug!(count = entries.len(), "Pending transactions retrieved");
    metrics::gauge!("pending_transactions_count").set(entries.len() as f64);

    Ok(Json(entries))
}

pub async fn approve_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionResponse>> {
    let span = tracing::info_span!("approve_transaction", %transaction_id);
    let _enter = span.enter();

    let response = state.engine.approve_transaction(transaction_id).await?;

    tracing::info!(
        account_id = %response.transaction.account_id,
        amount = response.transaction.amount,
        new_balance = response.new_balance,
        "Transaction approved"
    );
    metrics::counter!("transactions_approved_total").increment(1);

    Ok(Json(response))
}

pub async fn reject_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionResponse>> {
    let span = tracing::info_span!("reject_transaction", %transaction_id);
    let _enter = span.enter();

    let response = state.engine.reject_transaction(transaction_id).await?;

    tracing::info!(
        account_id = %response.transaction.account_id,
        "Transaction rejected"
    );
    metrics::counter!("transactions_rejected_total").increment(1);

    Ok(Json(response))
}

/// Operator balance adjustment: bonus when positive, fee when negative
pub async fn adjust_balance(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AdjustBalanceRequest>,
) -> Result<Json<AdjustBalanceResponse>> {
    let span = tracing::info_span!(
        "adjust_balance",
        account_id = %req.account_id,
        amount = req.amount,
    );
    let _enter = span.enter();

    let response = state.engine.adjust_balance(req).await?;

    tracing::info!(
        old_balance = response.old_balance,
        new_balance = response.new_balance,
        adjustment = response.adjustment,
        "Balance adjusted"
    );
    metrics::counter!("balance_adjustments_total").increment(1);

    Ok(Json(response))
}

/// Suspend, close or reactivate an account
pub async fn set_account_status(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    ValidatedJson(req): ValidatedJson<SetAccountStatusRequest>,
) -> Result<Json<Account>> {
    let span = tracing::info_span!("set_account_status", account_id = %account_id, status = %req.status);
    let _enter = span.enter();

    let account = state.engine.set_account_status(&account_id, req.status).await?;
    tracing::info!(status = %account.status, "Account status changed");
    Ok(Json(account))
}

pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>> {
    let accounts = state.engine.list_accounts().await?;
    tracing::debug!(count = accounts.len(), "Accounts listed");
    Ok(Json(accounts))
}

pub async fn list_transactions(State(state): State<AppState>) -> Result<Json<Vec<LedgerEntry>>> {
    let transactions = state.engine.list_transactions().await?;
    tracing::debug!(count = transactions.len(), "Transactions listed");
    Ok(Json(transactions))
}
