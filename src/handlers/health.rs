// handlers/health.rs - GET / and GET /api/v1/health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::middleware::ApiResponse;
use crate::AppState;

/// Liveness probe. Answers the bare `{status}` object rather than the envelope.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok", "database": "ok" }))),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unavailable" })),
            )
        }
    }
}

pub async fn root() -> ApiResponse<serde_json::Value> {
    ApiResponse::success(json!({
        "name": "Money Bag API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Personal and family ledger: users, categories, transactions, statistics and feedback",
        "endpoints": {
            "health": "/api/v1/health",
            "users": "/api/v1/users[/:id]",
            "login": "/api/v1/users/login",
            "categories": "/api/v1/categories[/:id]",
            "transactions": "/api/v1/transactions[/:id]?user_id=",
            "stats": "/api/v1/transactions/stats?user_id=",
            "summary": "/api/v1/transactions/stats/summary?user_id=",
            "feedbacks": "/api/v1/feedbacks[/:id]",
        }
    }))
}
