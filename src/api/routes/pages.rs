use askama::Template;
use axum::extract::State;
use axum::response::Html;
use axum::Form;
use serde::Deserialize;
use tracing::{error, warn};

use crate::agents::prompt::PromptRequest;
use crate::agents::{Agent, AgentError};
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::TeamCategory;
use crate::render::{IndexPage, TeamView};
use crate::storage::StorageError;

const CUSTOM_QUERY_HINT: &str =
    "Try adjusting the player limit or being more specific in your query.";

/// Form fields shared by both submit buttons.
#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    /// Kept as text so a cleared input falls back to the default.
    pub player_limit: Option<String>,
    pub team_type: Option<TeamCategory>,
    #[serde(default)]
    pub custom_query: String,
}

impl GenerateForm {
    fn player_limit(&self) -> Option<usize> {
        self.player_limit
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
    }

    fn team_type(&self) -> TeamCategory {
        self.team_type.unwrap_or(TeamCategory::Professional)
    }
}

fn render(page: IndexPage) -> Result<Html<String>, ApiError> {
    page.render()
        .map(Html)
        .map_err(|e| ApiError::Internal(format!("template error: {}", e)))
}

fn missing_data_message(state: &AppState) -> String {
    let file_name = state
        .store
        .path()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| state.store.path().display().to_string());
    format!(
        "Player data file not found. Please ensure {} exists in the current directory.",
        file_name
    )
}

async fn run_team_builder(state: &AppState, request: PromptRequest, page: IndexPage) -> IndexPage {
    let custom = request.is_custom();
    match state.team_builder().execute(request).await {
        Ok(composition) => page
            .with_context_counts(composition.input_count, composition.context_size)
            .with_team(TeamView::new(
                &composition.team,
                &composition.map_averages,
                &state.assets,
            )),
        Err(AgentError::EmptyQuery) => page.with_warning(AgentError::EmptyQuery.to_string()),
        Err(AgentError::Storage(StorageError::NotFound(_))) => {
            page.with_error(missing_data_message(state))
        }
        Err(e) => {
            if e.is_backend_failure() {
                error!("Team generation failed: {}", e);
            } else {
                warn!("Team generation rejected: {}", e);
            }
            let page = page.with_error(format!("Error: {}", e));
            if custom {
                page.with_warning(CUSTOM_QUERY_HINT)
            } else {
                page
            }
        }
    }
}

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let mut page = IndexPage::new(&state.config.player_limit);
    match state.store.get() {
        Ok(_) => {}
        Err(StorageError::NotFound(_)) => page = page.with_error(missing_data_message(&state)),
        Err(e) => page = page.with_error(format!("Error: {}", e)),
    }
    render(page)
}

pub async fn generate(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<Html<String>, ApiError> {
    let limit = state.config.player_limit.clamp(form.player_limit());
    let category = form.team_type();

    let page = IndexPage::new(&state.config.player_limit)
        .with_selection(category, limit)
        .with_query(form.custom_query.clone());
    let page = run_team_builder(&state, PromptRequest::preset(category, limit), page).await;
    render(page)
}

pub async fn generate_custom(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<Html<String>, ApiError> {
    let limit = state.config.player_limit.clamp(form.player_limit());

    let page = IndexPage::new(&state.config.player_limit)
        .with_selection(form.team_type(), limit)
        .with_query(form.custom_query.clone());
    let request = PromptRequest::custom(form.custom_query, limit);
    let page = run_team_builder(&state, request, page).await;
    render(page)
}
