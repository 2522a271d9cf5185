use std::sync::Arc;

use crate::agents::backend::AiBackend;
use crate::agents::team_builder::{GenerationSettings, TeamBuilderAgent};
use crate::config::AppConfig;
use crate::render::AssetResolver;
use crate::storage::PlayerStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<PlayerStore>,
    pub ai_backend: Arc<dyn AiBackend>,
    pub assets: AssetResolver,
}

impl AppState {
    pub fn new(config: AppConfig, store: PlayerStore, ai_backend: Arc<dyn AiBackend>) -> Self {
        let assets = AssetResolver::new(config.assets_dir.clone());
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            ai_backend,
            assets,
        }
    }

    /// A Team Builder sharing this state's backend and store.
    pub fn team_builder(&self) -> TeamBuilderAgent {
        TeamBuilderAgent::new(
            Arc::clone(&self.ai_backend),
            Arc::clone(&self.store),
            GenerationSettings::from(self.config.as_ref()),
        )
    }
}
