use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tracing::{info, warn};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

/// Liveness plus a shallow database check; the scheduler and external
/// providers are not probed here since a provider outage is expected and
/// handled by the composite provider's own retry/fallback, not surfaced
/// as unhealthy.
async fn health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    info!("GET /health");
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(err) => {
            warn!(error = %err, "health check: database unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, "database unreachable")
        }
    }
}
