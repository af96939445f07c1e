//! Health handlers

use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::json;

use crate::AppState;

/// Liveness probe
pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now(),
    }))
}

/// Readiness probe: verifies database connectivity and reports cache state
pub async fn readiness_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();

    Json(json!({
        "status": if database_ok { "ready" } else { "degraded" },
        "database": database_ok,
        "cache_enabled": state.cache.is_enabled(),
        "realtime_rooms": state.hub.room_count().await,
        "timestamp": Utc::now(),
    }))
}
