use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::agents::prompt::PromptRequest;
use crate::agents::team_builder::TeamComposition;
use crate::agents::Agent;
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{ParsedTeam, TeamCategory};
use crate::parse::parse_team_response;

#[derive(Debug, Deserialize)]
pub struct TeamRequest {
    #[serde(default)]
    pub category: TeamCategory,
    pub player_limit: Option<usize>,
    /// When set, the category is ignored and the whole pool is considered.
    pub custom_query: Option<String>,
}

impl TeamRequest {
    fn into_prompt_request(self, player_limit: usize) -> PromptRequest {
        match self.custom_query {
            Some(query) => PromptRequest::custom(query, player_limit),
            None => PromptRequest::preset(self.category, player_limit),
        }
    }
}

pub async fn generate_team(
    State(state): State<AppState>,
    Json(request): Json<TeamRequest>,
) -> Result<Json<TeamComposition>, ApiError> {
    let limit = state.config.player_limit.clamp(request.player_limit);
    let composition = state
        .team_builder()
        .execute(request.into_prompt_request(limit))
        .await?;
    Ok(Json(composition))
}

/// Decode a completion supplied by the caller.
pub async fn parse_response(body: String) -> Json<ParsedTeam> {
    Json(parse_team_response(&body))
}
