use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub backend_healthy: bool,
    pub data_loaded: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let backend_healthy = match state.ai_backend.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            warn!("{} health check failed: {}", state.ai_backend.name(), e);
            false
        }
    };

    Json(HealthResponse {
        status: if backend_healthy { "ok" } else { "degraded" },
        backend: state.ai_backend.name(),
        backend_healthy,
        data_loaded: state.store.is_loaded(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{get_json, test_app};
    use crate::agents::backend::MockBackend;
    use axum::http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_health_ok() {
        let (status, json) = get_json(test_app(Arc::new(MockBackend::new("ok"))), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["backend"], "mock");
        assert_eq!(json["data_loaded"], true);
    }

    #[tokio::test]
    async fn test_health_degraded() {
        let app = test_app(Arc::new(MockBackend::failing("no credentials")));
        let (status, json) = get_json(app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["backend_healthy"], false);
    }
}
