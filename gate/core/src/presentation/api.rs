//! HTTP surface for the gate.
//!
//! Every endpoint is a stub that always succeeds unless body parsing fails:
//! the gate is fully client-side and the backend is optional by design.
//! Transport failures against these endpoints are non-fatal to callers.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::application::config::GateConfig;

pub struct ApiState {
    pub config: GateConfig,
}

pub fn app(config: GateConfig) -> Router {
    let state = Arc::new(ApiState { config });

    Router::new()
        .route("/api/config", get(get_config))
        .route("/api/health", get(get_health))
        .route("/api/logs", get(get_logs).post(post_log))
        .route("/api/payments/approve", post(approve_payment))
        .route("/api/payments/complete", post(complete_payment))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_config(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(json!({
        "name": state.config.name,
        "domain": state.config.domain,
        "description": state.config.description,
        "mode": "client-side",
        "features": {
            "offlineMode": true,
            "localStorage": true,
            "piWallet": true,
            "testnet": state.config.sandbox,
        },
    }))
}

async fn get_health(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "service": state.config.name,
        "mode": "offline",
        "message": "App is running in client-side mode with local storage",
    }))
}

async fn get_logs() -> impl IntoResponse {
    Json(json!({
        "logs": [],
        "message": "Using client-side local storage. Backend is optional.",
    }))
}

async fn post_log(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    info!(log = %body, "log received");
    Json(json!({
        "success": true,
        "message": "Log received (stored client-side)",
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApprovePaymentRequest {
    payment_id: String,
}

async fn approve_payment(Json(body): Json<ApprovePaymentRequest>) -> impl IntoResponse {
    info!(payment_id = %body.payment_id, "payment approval requested");

    // Testnet auto-approves every payment; production would verify upstream
    Json(json!({
        "success": true,
        "paymentId": body.payment_id,
        "message": "Payment approved for testnet",
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletePaymentRequest {
    payment_id: String,
    txid: String,
}

async fn complete_payment(Json(body): Json<CompletePaymentRequest>) -> impl IntoResponse {
    info!(payment_id = %body.payment_id, txid = %body.txid, "payment completion requested");

    Json(json!({
        "success": true,
        "paymentId": body.payment_id,
        "txid": body.txid,
        "message": "Payment completed for testnet",
    }))
}
