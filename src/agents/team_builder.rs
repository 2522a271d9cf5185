//! Team Builder Agent.
//!
//! Filters the player pool, prompts the model for a five-player
//! composition and decodes the reply.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::backend::{AiBackend, ChatMessage, ChatRequest};
use super::prompt::{build_prompt, PromptRequest};
use super::{Agent, AgentError};
use crate::calculate::team_map_averages;
use crate::config::AppConfig;
use crate::context::filter_context;
use crate::models::ParsedTeam;
use crate::parse::parse_team_response;
use crate::storage::PlayerStore;
use crate::validate::validate_team_composition;

/// Sampling parameters and checks applied to every generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// Run the role and IGL checks on the decoded team.
    pub strict: bool,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: 0.3,
            top_p: 0.9,
            strict: false,
        }
    }
}

impl From<&AppConfig> for GenerationSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            max_tokens: config.ai.max_tokens,
            temperature: config.ai.temperature,
            top_p: config.ai.top_p,
            strict: config.validation.strict,
        }
    }
}

/// A generated and decoded team.
#[derive(Debug, Clone, Serialize)]
pub struct TeamComposition {
    #[serde(flatten)]
    pub team: ParsedTeam,
    /// Actual average win-rate per map for the chosen players.
    pub map_averages: BTreeMap<String, f64>,
    /// Players offered to the model.
    pub context_size: usize,
    /// Players in the source document.
    pub input_count: usize,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

/// Team Builder agent implementation.
pub struct TeamBuilderAgent {
    backend: Arc<dyn AiBackend>,
    store: Arc<PlayerStore>,
    settings: GenerationSettings,
}

impl TeamBuilderAgent {
    pub fn new(
        backend: Arc<dyn AiBackend>,
        store: Arc<PlayerStore>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            backend,
            store,
            settings,
        }
    }

    fn chat_request(&self, prompt: String) -> ChatRequest {
        ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_max_tokens(self.settings.max_tokens)
            .with_temperature(self.settings.temperature)
            .with_top_p(self.settings.top_p)
    }
}

#[async_trait]
impl Agent for TeamBuilderAgent {
    type Input = PromptRequest;
    type Output = TeamComposition;

    fn name(&self) -> &'static str {
        "team_builder"
    }

    async fn execute(&self, input: Self::Input) -> Result<Self::Output, AgentError> {
        if input
            .custom_query
            .as_deref()
            .is_some_and(|q| q.trim().is_empty())
        {
            return Err(AgentError::EmptyQuery);
        }

        let document = self.store.get()?;
        let context = filter_context(&document, input.category, input.player_limit);

        info!(
            "Running Team Builder via {} ({} players, custom: {})",
            self.backend.name(),
            context.len(),
            input.is_custom()
        );

        let prompt = build_prompt(&context.players, &input);
        debug!("Prompt is {} characters", prompt.len());

        let response = self.backend.chat(self.chat_request(prompt)).await?;
        if response.content.trim().is_empty() {
            warn!("{} returned no text", self.backend.name());
            return Err(AgentError::EmptyResponse);
        }
        debug!("AI response: {}", response.content);

        let team = parse_team_response(&response.content);
        if team.is_empty() {
            warn!("No player blocks recognised in the response");
        }

        if self.settings.strict {
            validate_team_composition(&team.players)?;
        }

        let map_averages = team_map_averages(&document, &team.players);

        info!(
            "Built team: {} players, {} IGL",
            team.players.len(),
            team.igl_count()
        );
        if let Some(usage) = &response.tokens_used {
            info!(
                "{} used {} tokens ({} prompt, {} completion)",
                response.model, usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(TeamComposition {
            team,
            map_averages,
            context_size: context.len(),
            input_count: context.input_count,
            model: response.model,
            tokens_used: response.tokens_used.map(|usage| usage.total_tokens),
        })
    }
}
