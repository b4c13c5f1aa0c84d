/// Health check endpoints
///
/// # Endpoints
///
/// ```text
/// GET /health
/// GET /api/test
/// ```
///
/// # Response (`/health`)
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```

use axum::{extract::State, Json};
use projectdesk_shared::db::pool::{get_pool_stats, health_check as database_health};
use serde::{Deserialize, Serialize};

use super::MessageResponse;
use crate::app::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when the database is unreachable
    pub status: String,

    /// Application version
    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,
}

/// Reports service health, including database connectivity
///
/// Always answers 200; a failing database shows up as `degraded`.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let connected = match database_health(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Health check could not reach the database");
            false
        }
    };

    let pool = get_pool_stats(&state.db);
    tracing::debug!(
        active = pool.active_connections,
        idle = pool.idle_connections,
        total = pool.total_connections,
        "Database pool usage"
    );

    Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
    })
}

/// Liveness probe for the API prefix
pub async fn api_test() -> Json<MessageResponse> {
    Json(MessageResponse::new("ProjectDesk API is running"))
}
