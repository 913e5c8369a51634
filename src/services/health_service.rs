use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Probe the catalog; sessions are served from memory either way.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let sessions = state.sessions().session_count();
    match state
        .call_catalog("health_check", state.catalog().health_check())
        .await
    {
        Ok(()) => HealthResponse::ok(sessions),
        Err(err) => {
            warn!(error = %err, "catalog health check failed (degraded mode)");
            HealthResponse::degraded(sessions)
        }
    }
}
