use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::context::{filter_context, FilteredContext};
use crate::models::TeamCategory;

#[derive(Debug, Deserialize)]
pub struct PlayersParams {
    pub category: Option<String>,
    pub limit: Option<usize>,
}

/// The player pool a prompt would be built from.
pub async fn list_players(
    State(state): State<AppState>,
    Query(params): Query<PlayersParams>,
) -> Result<Json<FilteredContext>, ApiError> {
    let category = match params.category.as_deref() {
        Some(raw) if !raw.trim().is_empty() => {
            raw.parse::<TeamCategory>().map_err(ApiError::BadRequest)?
        }
        _ => TeamCategory::All,
    };
    // Not held to the page's slider minimum; only capped.
    let limit = params
        .limit
        .map(|l| l.clamp(1, state.config.player_limit.max))
        .unwrap_or(state.config.player_limit.default);

    let document = state.store.get()?;
    Ok(Json(filter_context(&document, category, limit)))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{get_json, test_app};
    use crate::agents::backend::MockBackend;
    use axum::http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_players_by_category() {
        let app = test_app(Arc::new(MockBackend::new("")));
        let (status, json) = get_json(app, "/api/players?category=professional").await;

        assert_eq!(status, StatusCode::OK);
        let players = json["players"].as_array().unwrap();
        assert_eq!(players.len(), 5);
        assert_eq!(players[0]["handle"], "aspas");
        assert_eq!(json["input_count"], 6);
    }

    #[tokio::test]
    async fn test_players_default_is_everyone() {
        let app = test_app(Arc::new(MockBackend::new("")));
        let (status, json) = get_json(app, "/api/players").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["players"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_players_limit() {
        let app = test_app(Arc::new(MockBackend::new("")));
        let (status, json) = get_json(app, "/api/players?category=professional&limit=2").await;

        assert_eq!(status, StatusCode::OK);
        let handles: Vec<&str> = json["players"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["handle"].as_str().unwrap())
            .collect();
        assert_eq!(handles, vec!["aspas", "Derke"]);
        assert_eq!(json["eligible_count"], 5);
    }

    #[tokio::test]
    async fn test_players_unknown_category() {
        let app = test_app(Arc::new(MockBackend::new("")));
        let (status, json) = get_json(app, "/api/players?category=amateur").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }
}
