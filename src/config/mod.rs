//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Which text-generation service to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Bedrock,
    Anthropic,
    Ollama,
}

impl BackendKind {
    fn default_base_url(&self) -> &'static str {
        match self {
            // Bedrock derives its endpoint from AWS_REGION.
            BackendKind::Bedrock => "",
            BackendKind::Anthropic => "https://api.anthropic.com",
            BackendKind::Ollama => "http://localhost:11434",
        }
    }
}

/// AI backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Backend type: "bedrock", "anthropic" or "ollama"
    #[serde(default)]
    pub backend: BackendKind,

    /// Base URL for the AI service (empty: backend default)
    #[serde(default)]
    pub base_url: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Completion token budget
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling parameter
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_model() -> String {
    "anthropic.claude-3-5-sonnet-20240620-v1:0".to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_top_p() -> f32 {
    0.9
}

fn default_timeout() -> u64 {
    120
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            base_url: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl AiConfig {
    /// Resolve the configured base URL, falling back to the backend's default.
    pub fn resolved(mut self) -> Self {
        if self.base_url.trim().is_empty() {
            self.base_url = self.backend.default_base_url().to_string();
        }
        self
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Player-count selector bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerLimitConfig {
    #[serde(default = "default_min_limit")]
    pub min: usize,

    #[serde(default = "default_max_limit")]
    pub max: usize,

    #[serde(default = "default_min_limit")]
    pub default: usize,

    #[serde(default = "default_limit_step")]
    pub step: usize,
}

fn default_min_limit() -> usize {
    200
}

fn default_max_limit() -> usize {
    1700
}

fn default_limit_step() -> usize {
    10
}

impl Default for PlayerLimitConfig {
    fn default() -> Self {
        Self {
            min: default_min_limit(),
            max: default_max_limit(),
            default: default_min_limit(),
            step: default_limit_step(),
        }
    }
}

impl PlayerLimitConfig {
    /// Clamp a requested limit into the configured range.
    pub fn clamp(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default).clamp(self.min, self.max)
    }
}

/// Post-hoc team validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Reject generated teams that fail the role or IGL checks.
    #[serde(default)]
    pub strict: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Player statistics document
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// Directory holding `images/`
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub player_limit: PlayerLimitConfig,

    #[serde(default)]
    pub validation: ValidationConfig,
}

fn default_data_file() -> PathBuf {
    PathBuf::from("./player_stats_ENHANCED.json")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            assets_dir: default_assets_dir(),
            log_level: default_log_level(),
            ai: AiConfig::default(),
            server: ServerConfig::default(),
            player_limit: PlayerLimitConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            info!("Loading config from {:?}", path);
            Self::from_file(path)
        } else {
            info!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ai.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "AI timeout must be greater than 0".to_string(),
            ));
        }

        if self.ai.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "AI max_tokens must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.ai.temperature) {
            return Err(ConfigError::ValidationError(
                "AI temperature must be between 0 and 1".to_string(),
            ));
        }

        if !(self.ai.top_p > 0.0 && self.ai.top_p <= 1.0) {
            return Err(ConfigError::ValidationError(
                "AI top_p must be in (0, 1]".to_string(),
            ));
        }

        let base_url = self.ai.base_url.trim();
        if !base_url.is_empty() {
            url::Url::parse(base_url).map_err(|e| {
                ConfigError::ValidationError(format!("AI base_url {:?} is invalid: {}", base_url, e))
            })?;
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        let limits = &self.player_limit;
        if limits.min == 0 || limits.min > limits.max {
            return Err(ConfigError::ValidationError(format!(
                "Player limit range {}..={} is invalid",
                limits.min, limits.max
            )));
        }

        Ok(())
    }
}
