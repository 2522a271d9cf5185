//! HTTP interface.
//!
//! Axum router serving the team builder page, a small JSON API and the
//! static image assets.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::agents::AgentError;
use crate::storage::StorageError;
use routes::{health, pages, players, team};
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unprocessable(_) => (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE"),
            ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        let message = err.to_string();
        match err {
            StorageError::NotFound(_) => ApiError::ServiceUnavailable(message),
            _ => ApiError::Internal(message),
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        if let AgentError::Storage(storage) = err {
            return storage.into();
        }
        let message = err.to_string();
        match err {
            AgentError::EmptyQuery => ApiError::BadRequest(message),
            AgentError::Validation(_) => ApiError::Unprocessable(message),
            _ => ApiError::Upstream(message),
        }
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            warn!("Invalid CORS origin {:?}, allowing any", origin);
            layer.allow_origin(Any)
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let images = ServeDir::new(state.assets.images_dir());
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/", get(pages::index))
        .route("/generate", post(pages::generate))
        .route("/generate/custom", post(pages::generate_custom))
        .route("/api/team", post(team::generate_team))
        .route("/api/parse", post(team::parse_response))
        .route("/api/players", get(players::list_players))
        .route("/api/health", get(health::health))
        .nest_service("/images", images)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ValidationError;
    use std::path::PathBuf;

    #[test]
    fn test_agent_error_status_mapping() {
        let cases = [
            (AgentError::EmptyQuery, StatusCode::BAD_REQUEST),
            (
                AgentError::Validation(ValidationError::IglCount(2)),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AgentError::BackendUnavailable("timeout".to_string()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AgentError::Storage(StorageError::NotFound(PathBuf::from("x.json"))),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::BadRequest("no query".to_string()).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"]["code"], "BAD_REQUEST");
        assert_eq!(json["error"]["message"], "Bad request: no query");
    }
}
