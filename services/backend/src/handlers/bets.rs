use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    domain::{
        Bet, BetOutcome, CasinoLossRequest, CasinoWinRequest, PlaceBetRequest, PlaceBetResponse,
        SettleBetRequest, SettleBetResponse,
    },
    errors::{AppError, Result},
    extractors::ValidatedJson,
    repository::DebitPolicy,
    state::AppState,
};

pub async fn get_bet(
    State(state): State<AppState>,
    Path(bet_id): Path<Uuid>,
) -> Result<Json<Bet>> {
    let span = tracing::info_span!("get_bet", %bet_id);
    let _enter = span.enter();

    let bet = state
        .engine
        .find_bet(bet_id)
        .await?
        .ok_or(AppError::BetNotFound(bet_id))?;

    tracing::debug!(status = %bet.status, "Bet retrieved");
    Ok(Json(bet))
}

/// Strict placement: a wager the balance cannot cover is rejected
pub async fn place_bet(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PlaceBetRequest>,
) -> Result<Json<PlaceBetResponse>> {
    let span = tracing::info_span!(
        "place_bet",
        account_id = %req.account_id,
        bet.amount = req.amount.as_u64(),
        bet.game_type = %req.game_type,
    );
    let _enter = span.enter();

    let response = state.engine.place_bet(req, DebitPolicy::Strict).await?;

    tracing::info!(
        bet_id = %response.bet.bet_id,
        new_balance = response.new_balance,
        "Bet placed"
    );
    metrics::counter!("bets_placed_total").increment(1);

    Ok(Json(response))
}

/// Capped casino placement: insufficient balance never blocks gameplay,
/// the debit floors the balance at zero
pub async fn place_casino_bet(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PlaceBetRequest>,
) -> Result<Json<PlaceBetResponse>> {
    let span = tracing::info_span!(
        "place_casino_bet",
        account_id = %req.account_id,
        bet.amount = req.amount.as_u64(),
        bet.game_type = %req.game_type,
    );
    let _enter = span.enter();

    let response = state.engine.place_bet(req, DebitPolicy::Capped).await?;

    if response.bet.debited < response.bet.amount {
        tracing::warn!(
            bet_id = %response.bet.bet_id,
            requested = response.bet.amount,
            debited = response.bet.debited,
            "Casino bet placed with capped deduction"
        );
    }
    metrics::counter!("casino_bets_placed_total").increment(1);

    Ok(Json(response))
}

pub async fn settle_bet(
    State(state): State<AppState>,
    Path(bet_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<SettleBetRequest>,
) -> Result<Json<SettleBetResponse>> {
    let span = tracing::info_span!(
        "settle_bet",
        %bet_id,
        account_id = %req.account_id,
        outcome = ?req.outcome,
    );
    let _enter = span.enter();

    let response = state.engine.settle_bet(bet_id, req).await?;

    tracing::info!(
        status = %response.bet.status,
        payout = response.bet.payout,
        new_balance = response.new_balance,
        "Bet settled"
    );
    metrics::counter!("bets_settled_total").increment(1);

    Ok(Json(response))
}

/// Casino win callback: settles the bet as won with the given payout
pub async fn casino_win(
    State(state): State<AppState>,
    Path(bet_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CasinoWinRequest>,
) -> Result<Json<SettleBetResponse>> {
    let span = tracing::info_span!(
        "casino_win",
        %bet_id,
        account_id = %req.account_id,
        payout = req.payout.as_u64(),
    );
    let _enter = span.enter();

    let response = state
        .engine
        .settle_bet(
            bet_id,
            SettleBetRequest {
                account_id: req.account_id,
                outcome: BetOutcome::Won,
                payout: Some(req.payout),
            },
        )
        .await?;

    metrics::counter!("bets_settled_total").increment(1);
    Ok(Json(response))
}

/// Casino loss callback: settles the bet as lost
pub async fn casino_loss(
    State(state): State<AppState>,
    Path(bet_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<CasinoLossRequest>,
) -> Result<Json<SettleBetResponse>> {
    let span = tracing::info_span!("casino_loss", %bet_id, account_id = %req.account_id);
    let _enter = span.enter();

    let response = state
        .engine
        .settle_bet(
            bet_id,
            SettleBetRequest {
                account_id: req.account_id,
                outcome: BetOutcome::Lost,
                payout: None,
            },
        )
        .await?;

    metrics::counter!("bets_settled_total").increment(1);
    Ok(Json(response))
}
