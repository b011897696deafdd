//! Health check handlers.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, DetailedHealthResponse, HealthResponse};
use crate::state::AppState;

fn status(state: &AppState) -> String {
    if state.relay.is_shutting_down() {
        "shutting_down".to_string()
    } else {
        "ok".to_string()
    }
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: status(&state),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.relay.uptime_seconds(),
    }))
}

/// GET /api/health/detailed
pub async fn health_detailed(
    State(state): State<AppState>,
) -> Json<ApiResponse<DetailedHealthResponse>> {
    let relay = &state.relay;

    Json(ApiResponse::ok(DetailedHealthResponse {
        status: status(&state),
        ws_connections: relay.connections.connection_count(),
        admins: relay.registry.admin_count().await,
        students: relay.registry.student_count().await,
        relay: relay.metrics.snapshot(),
    }))
}
