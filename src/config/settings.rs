//! Configuration settings for Lektor.

use crate::error::{LektorError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub completion: CompletionSettings,
    pub agent: AgentSettings,
    pub store: StoreSettings,
    pub chat: ChatSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Completion service provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CompletionProvider {
    /// Anthropic Messages API (default).
    #[default]
    Anthropic,
    /// OpenAI chat completions.
    OpenAi,
}

impl CompletionProvider {
    /// Environment variable holding the API key for this provider.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            CompletionProvider::Anthropic => "ANTHROPIC_API_KEY",
            CompletionProvider::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            CompletionProvider::Anthropic => "claude-sonnet-4-20250514",
            CompletionProvider::OpenAi => "gpt-4o-mini",
        }
    }
}

impl std::str::FromStr for CompletionProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(CompletionProvider::Anthropic),
            "openai" => Ok(CompletionProvider::OpenAi),
            _ => Err(format!("Unknown completion provider: {}", s)),
        }
    }
}

impl std::fmt::Display for CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionProvider::Anthropic => write!(f, "anthropic"),
            CompletionProvider::OpenAi => write!(f, "openai"),
        }
    }
}

/// Completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Provider (anthropic, openai).
    pub provider: CompletionProvider,
    /// Model name. Empty means the provider default.
    pub model: String,
    /// Override for the API base URL.
    pub base_url: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Response length cap in tokens.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            provider: CompletionProvider::Anthropic,
            model: String::new(),
            base_url: None,
            temperature: 0.0,
            max_tokens: 800,
            timeout_secs: 300,
        }
    }
}

impl CompletionSettings {
    /// Configured model, falling back to the provider default.
    pub fn model(&self) -> String {
        if self.model.is_empty() {
            self.provider.default_model().to_string()
        } else {
            self.model.clone()
        }
    }
}

/// Orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Maximum number of tool-calling rounds per query.
    pub max_tool_rounds: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self { max_tool_rounds: 2 }
    }
}

/// Course store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path to the JSON course catalog.
    pub catalog_path: String,
    /// Maximum number of chunks returned per search.
    pub max_results: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            catalog_path: "~/.lektor/catalog.json".to_string(),
            max_results: 5,
        }
    }
}

/// Interactive chat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Number of previous exchanges kept as conversation context.
    pub max_history: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { max_history: 2 }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| LektorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lektor")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded course catalog path.
    pub fn catalog_path(&self) -> PathBuf {
        Self::expand_path(&self.store.catalog_path)
    }

    /// Read the API key for the configured provider from the environment.
    pub fn api_key(&self) -> Result<String> {
        let var = self.completion.provider.api_key_var();
        match std::env::var(var) {
            Ok(key) if !key.is_empty() => Ok(key),
            Ok(_) => Err(LektorError::Config(format!(
                "{} is empty. Set it with: export {}='...'",
                var, var
            ))),
            Err(_) => Err(LektorError::Config(format!(
                "{} not set. Set it with: export {}='...'",
                var, var
            ))),
        }
    }
}
