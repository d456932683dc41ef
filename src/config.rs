use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Env var naming an alternate config file.
pub const CONFIG_ENV: &str = "CLIRPIAI_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "clirpiai.toml";

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: crate::llm::Provider,
    #[serde(default = "default_model")]
    pub model: String,
    /// Sent only when set, except to Anthropic where the API requires a limit.
    pub max_tokens: Option<u32>,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: crate::llm::Provider::default(),
            model: default_model(),
            max_tokens: None,
            api_key_env: None,
            base_url: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatConfig {
    /// Seeded as the first transcript entry. Empty disables it.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_true")]
    pub color: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            color: true,
        }
    }
}

// Defaults
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_system_prompt() -> String {
    "You are a helpful assistant".into()
}
fn default_true() -> bool {
    true
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::config(format!("Failed to parse config: {e}")))
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// `$CLIRPIAI_CONFIG`, or `clirpiai.toml` in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn system_prompt(&self) -> Option<&str> {
        let prompt = self.chat.system_prompt.trim();
        (!prompt.is_empty()).then_some(prompt)
    }
}
