//! Router-level tests for the HTTP surface
//!
//! Drives the axum router over the in-memory store and asserts on status
//! codes and the standardized error envelope.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use backend::build_router;
use backend::config::Config;
use backend::repository::MemoryWalletStore;
use backend::state::AppState;

fn server() -> TestServer {
    let state = AppState::new(Config::for_tests(), Arc::new(MemoryWalletStore::new()));
    TestServer::new(build_router(state)).expect("failed to start test server")
}

/// Parse the standardized error envelope
fn parse_error(body: &Value) -> (String, String, String) {
    let error = body.get("error").expect("no error in response");
    (
        error["code"].as_str().unwrap().to_string(),
        error["message"].as_str().unwrap().to_string(),
        error["category"].as_str().unwrap().to_string(),
    )
}

async fn fund(server: &TestServer, account_id: &str, minor: u64) -> Value {
    let response = server
        .post("/api/transactions")
        .json(&json!({
            "account_id": account_id,
            "tx_type": "deposit",
            "amount": minor
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    response.json::<Value>()
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let server = server();
    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body.get("timestamp").is_some());

    let detailed: Value = server.get("/health/detailed").await.json();
    assert_eq!(detailed["components"]["store"], "healthy");
}

#[tokio::test]
async fn deposit_then_balance_round_trip() {
    let server = server();
    let body = fund(&server, "user-1", 5_000).await;
    assert_eq!(body["new_balance"], 5_000);
    assert_eq!(body["transaction"]["status"], "completed");

    let balance: Value = server.get("/api/accounts/user-1/balance").await.json();
    assert_eq!(balance["balance"], 5_000);
    assert_eq!(balance["stats"]["total_deposited"], 5_000);
    assert_eq!(balance["currency"], "INR");
}

#[tokio::test]
async fn strict_bet_insufficient_balance_is_a_validation_error() {
    let server = server();
    fund(&server, "user-1", 100).await;

    let response = server
        .post("/api/bets")
        .json(&json!({
            "account_id": "user-1",
            "game_type": "slots",
            "amount": 200
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let (code, _, category) = parse_error(&response.json());
    assert_eq!(code, "VALIDATION_INSUFFICIENT_BALANCE");
    assert_eq!(category, "Validation");
}

#[tokio::test]
async fn casino_bet_proceeds_on_insufficient_balance() {
    let server = server();
    fund(&server, "user-1", 50).await;

    let response = server
        .post("/api/casino/bets")
        .json(&json!({
            "account_id": "user-1",
            "game_type": "casino",
            "amount": 200
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["new_balance"], 0);
    assert_eq!(body["bet"]["amount"], 200);
    assert_eq!(body["bet"]["debited"], 50);
    assert_eq!(body["transaction"]["amount"], -50);
}

#[tokio::test]
async fn missing_field_yields_validation_envelope() {
    let server = server();

    let response = server
        .post("/api/bets")
        .json(&json!({
            "account_id": "user-1",
            "amount": 200
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let (code, message, category) = parse_error(&response.json());
    assert_eq!(code, "VALIDATION_INVALID_INPUT");
    assert_eq!(category, "Validation");
    assert!(message.contains("game_type") || message.contains("Invalid request body"));
}

#[tokio::test]
async fn unknown_bet_settlement_is_not_found() {
    let server = server();
    fund(&server, "user-1", 500).await;

    let response = server
        .post(&format!("/api/bets/{}/settle", Uuid::new_v4()))
        .json(&json!({
            "account_id": "user-1",
            "outcome": "won",
            "payout": 100
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let (code, _, category) = parse_error(&response.json());
    assert_eq!(code, "NOT_FOUND_BET");
    assert_eq!(category, "NotFound");
}

#[tokio::test]
async fn bet_settles_once_then_conflicts() {
    let server = server();
    fund(&server, "user-1", 500).await;

    let placed: Value = server
        .post("/api/bets")
        .json(&json!({
            "account_id": "user-1",
            "game_type": "blackjack",
            "amount": 200
        }))
        .await
        .json();
    let bet_id = placed["bet"]["bet_id"].as_str().unwrap().to_string();
    assert_eq!(placed["new_balance"], 300);

    let win = server
        .post(&format!("/api/casino/bets/{}/win", bet_id))
        .json(&json!({ "account_id": "user-1", "payout": 600 }))
        .await;
    assert_eq!(win.status_code(), StatusCode::OK);
    let win_body: Value = win.json();
    assert_eq!(win_body["new_balance"], 900);
    assert_eq!(win_body["bet"]["status"], "won");
    assert_eq!(win_body["transaction"]["tx_type"], "win");

    let again = server
        .post(&format!("/api/casino/bets/{}/loss", bet_id))
        .json(&json!({ "account_id": "user-1" }))
        .await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);
    let (code, _, category) = parse_error(&again.json());
    assert_eq!(code, "CONFLICT_BET_SETTLED");
    assert_eq!(category, "Conflict");
}

#[tokio::test]
async fn admin_approval_flow_over_http() {
    let server = server();
    fund(&server, "user-1", 2_000).await;

    let held: Value = server
        .post("/api/transactions")
        .json(&json!({
            "account_id": "user-1",
            "tx_type": "withdrawal",
            "amount": 1_000,
            "requires_approval": true
        }))
        .await
        .json();
    assert_eq!(held["transaction"]["status"], "pending");
    assert_eq!(held["new_balance"], 2_000);
    let transaction_id = held["transaction"]["transaction_id"].as_str().unwrap();

    let queue: Value = server
        .get("/api/admin/transactions/pending?type=withdrawal")
        .await
        .json();
    assert_eq!(queue.as_array().unwrap().len(), 1);

    let approved = server
        .post(&format!(
            "/api/admin/transactions/{}/approve",
            transaction_id
        ))
        .await;
    assert_eq!(approved.status_code(), StatusCode::OK);
    let approved_body: Value = approved.json();
    assert_eq!(approved_body["new_balance"], 1_000);
    assert_eq!(approved_body["transaction"]["status"], "completed");

    let twice = server
        .post(&format!(
            "/api/admin/transactions/{}/approve",
            transaction_id
        ))
        .await;
    assert_eq!(twice.status_code(), StatusCode::CONFLICT);
    let (code, _, _) = parse_error(&twice.json());
    assert_eq!(code, "CONFLICT_TRANSACTION_PROCESSED");
}

#[tokio::test]
async fn unknown_transaction_resolution_is_not_found() {
    let server = server();

    let response = server
        .post(&format!(
            "/api/admin/transactions/{}/reject",
            Uuid::new_v4()
        ))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let (code, _, _) = parse_error(&response.json());
    assert_eq!(code, "NOT_FOUND_TRANSACTION");
}

#[tokio::test]
async fn suspended_account_is_forbidden() {
    let server = server();
    fund(&server, "user-1", 500).await;

    let suspended = server
        .post("/api/admin/accounts/user-1/status")
        .json(&json!({ "status": "suspended" }))
        .await;
    assert_eq!(suspended.status_code(), StatusCode::OK);

    let bet = server
        .post("/api/bets")
        .json(&json!({
            "account_id": "user-1",
            "game_type": "slots",
            "amount": 100
        }))
        .await;
    assert_eq!(bet.status_code(), StatusCode::FORBIDDEN);
    let (code, _, category) = parse_error(&bet.json());
    assert_eq!(code, "UNAUTHORIZED_ACCOUNT_SUSPENDED");
    assert_eq!(category, "Unauthorized");
}

#[tokio::test]
async fn adjustment_endpoint_books_bonus() {
    let server = server();

    let response = server
        .post("/api/admin/balance-adjustments")
        .json(&json!({
            "account_id": "user-1",
            "amount": 750,
            "reason": "Promo credit"
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["old_balance"], 0);
    assert_eq!(body["new_balance"], 750);
    assert_eq!(body["transaction"]["tx_type"], "bonus");
    assert_eq!(body["transaction"]["description"], "Promo credit");
}

#[tokio::test]
async fn listing_endpoints_paginate() {
    let server = server();
    fund(&server, "user-1", 1_000).await;
    for _ in 0..3 {
        let response = server
            .post("/api/bets")
            .json(&json!({
                "account_id": "user-1",
                "game_type": "roulette",
                "amount": 100
            }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let transactions: Value = server
        .get("/api/accounts/user-1/transactions?page=1&limit=2")
        .await
        .json();
    assert_eq!(transactions["transactions"].as_array().unwrap().len(), 2);
    assert_eq!(transactions["pagination"]["total"], 4);
    assert_eq!(transactions["pagination"]["pages"], 2);

    let bets: Value = server.get("/api/accounts/user-1/bets").await.json();
    assert_eq!(bets["pagination"]["total"], 3);

    let stats: Value = server
        .get("/api/accounts/user-1/stats/roulette")
        .await
        .json();
    assert_eq!(stats["total_bets"], 3);
}

#[tokio::test]
async fn sync_creates_then_updates_profile() {
    let server = server();

    let created: Value = server
        .post("/api/accounts/sync")
        .json(&json!({
            "account_id": "user-1",
            "email": "ada@customer.test",
            "first_name": "Ada"
        }))
        .await
        .json();
    assert_eq!(created["email"], "ada@customer.test");
    assert_eq!(created["balance"], 0);

    let updated: Value = server
        .post("/api/accounts/sync")
        .json(&json!({
            "account_id": "user-1",
            "last_name": "Lovelace"
        }))
        .await
        .json();
    assert_eq!(updated["email"], "ada@customer.test");
    assert_eq!(updated["last_name"], "Lovelace");
}
