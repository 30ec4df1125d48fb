use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    domain::{Account, BalanceResponse, BetsPage, GameStats, GameType, SyncAccountRequest, TransactionsPage},
    errors::Result,
    extractors::ValidatedJson,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    fn resolve(&self) -> (i64, i64) {
        (
            self.page.unwrap_or(1),
            self.limit.unwrap_or(shared::DEFAULT_PAGE_SIZE),
        )
    }
}

/// Identity-provider sync: create the account or update its profile
pub async fn sync_account(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SyncAccountRequest>,
) -> Result<Json<Account>> {
    let span = tracing::info_span!("sync_account", account_id = %req.account_id);
    let _enter = span.enter();

    let account = state.engine.sync_account(req).await?;
    tracing::debug!(email = %account.email, "Account synced");
    Ok(Json(account))
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<BalanceResponse>> {
    let span = tracing::info_span!("get_balance", account_id = %account_id);
    let _enter = span.enter();

    let balance = state.engine.balance(&account_id).await?;
    tracing::debug!(balance = balance.balance, "Balance retrieved");
    Ok(Json(balance))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<TransactionsPage>> {
    let (page, limit) = query.resolve();
    let span = tracing::info_span!("list_transactions", account_id = %account_id, page, limit);
    let _enter = span.enter();

    let result = state.engine.transactions(&account_id, page, limit).await?;
    tracing::debug!(count = result.transactions.len(), "Retrieved transactions");
    Ok(Json(result))
}

pub async fn list_bets(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<BetsPage>> {
    let (page, limit) = query.resolve();
    let span = tracing::info_span!("list_bets", account_id = %account_id, page, limit);
    let _enter = span.enter();

    let result = state.engine.bets(&account_id, page, limit).await?;
    tracing::debug!(count = result.bets.len(), "Retrieved bets");
    Ok(Json(result))
}

pub async fn game_stats(
    State(state): State<AppState>,
    Path((account_id, game_type)): Path<(String, GameType)>,
) -> Result<Json<GameStats>> {
    let span = tracing::info_span!("game_stats", account_id = %account_id, game_type = %game_type);
    let _enter = span.enter();

    let stats = state.engine.game_stats(&account_id, game_type).await?;
    Ok(Json(stats))
}
