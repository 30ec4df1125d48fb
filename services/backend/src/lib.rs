// Library interface for backend - exposes modules for testing

pub mod config;
pub mod domain;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod repository;
pub mod services;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        .route("/health/detailed", get(handlers::health::detailed_health))
        // Accounts
        .route("/api/accounts/sync", post(handlers::accounts::sync_account))
        .route(
            "/api/accounts/:account_id/balance",
            get(handlers::accounts::get_balance),
        )
        .route(
            "/api/accounts/:account_id/transactions",
            get(handlers::accounts::list_transactions),
        )
        .route(
            "/api/accounts/:account_id/bets",
            get(handlers::accounts::list_bets),
        )
        .route(
            "/api/accounts/:account_id/stats/:game_type",
            get(handlers::accounts::game_stats),
        )
        // Bets
        .route("/api/bets", post(handlers::bets::place_bet))
        .route("/api/bets/:bet_id", get(handlers::bets::get_bet))
        .route("/api/bets/:bet_id/settle", post(handlers::bets::settle_bet))
        // Casino entry points (capped debit policy)
        .route("/api/casino/bets", post(handlers::bets::place_casino_bet))
        .route("/api/casino/bets/:bet_id/win", post(handlers::bets::casino_win))
        .route("/api/casino/bets/:bet_id/loss", post(handlers::bets::casino_loss))
        // Deposits / withdrawals
        .route(
            "/api/transactions",
            post(handlers::transactions::create_transaction),
        )
        // Admin
        .route(
            "/api/admin/transactions/pending",
            get(handlers::admin::pending_transactions),
        )
        .route(
            "/api/admin/transactions/:transaction_id/approve",
            post(handlers::admin::approve_transaction),
        )
        .route(
            "/api/admin/transactions/:transaction_id/reject",
            post(handlers::admin::reject_transaction),
        )
        .route("/api/admin/accounts", get(handlers::admin::list_accounts))
        .route(
            "/api/admin/accounts/:account_id/status",
            post(handlers::admin::set_account_status),
        )
        .route(
            "/api/admin/transactions",
            get(handlers::admin::list_transactions),
        )
        .route(
            "/api/admin/balance-adjustments",
            post(handlers::admin::adjust_balance),
        )
        // Metrics
        .route("/metrics", get(handlers::metrics::metrics_handler))
        // State
        .with_state(state)
        // Middleware
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
