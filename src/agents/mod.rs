//! AI-powered team generation.
//!
//! The team builder turns filtered player statistics into a prompt, sends it
//! to an AI backend and decodes the reply. Agents implement the `Agent`
//! trait.

pub mod backend;
pub mod prompt;
pub mod sigv4;
pub mod team_builder;

use async_trait::async_trait;
use thiserror::Error;

use crate::storage::StorageError;
use crate::validate::ValidationError;

/// Errors that can occur during agent execution.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("AI backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("AI response unparseable: {0}")]
    ResponseParseError(String),

    #[error("AI returned an empty response")]
    EmptyResponse,

    #[error("Please enter a query before analyzing.")]
    EmptyQuery,

    #[error("Player data unavailable: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl AgentError {
    /// Whether the error came from the remote service rather than local data
    /// or user input.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            AgentError::BackendUnavailable(_)
                | AgentError::ResponseParseError(_)
                | AgentError::EmptyResponse
        )
    }
}

/// Core trait for all AI agents.
#[async_trait]
pub trait Agent {
    type Input;
    type Output;

    /// Agent identifier for logging.
    fn name(&self) -> &'static str;

    /// Execute the agent's task.
    async fn execute(&self, input: Self::Input) -> Result<Self::Output, AgentError>;
}
