use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::core::error::DialogueError;
use crate::services::llm::LlmConfig;
use crate::services::tts::elevenlabs::VoiceServiceConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config.yml";
pub const CONFIG_PATH_ENV: &str = "DIALOGUE_CONFIG";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub llm: LlmConfig,

    #[serde(default)]
    pub voice: VoiceServiceConfig,
}

impl Config {
    /// Loads `config.yml` (or the file named by `DIALOGUE_CONFIG`) and applies
    /// API key overrides from the environment.
    pub fn load() -> Result<Self> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::load_from(Path::new(&path))?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = env::var("ELEVENLABS_API_KEY") {
            self.voice.api_key = Some(key);
        }
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if let Some(openai) = self.llm.openai.as_mut() {
                openai.api_key = key;
            }
        }
        if let Ok(key) = env::var("GEMINI_API_KEY") {
            if let Some(gemini) = self.llm.gemini.as_mut() {
                gemini.api_key = key;
            }
        }
    }

    /// Fails with a configuration error when credentials for either remote
    /// service are missing.
    pub fn validate(&self) -> Result<(), DialogueError> {
        match self.voice.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(DialogueError::Configuration(
                    "voice synthesis API key is not configured".to_string(),
                ))
            }
        }

        let llm_key = match self.llm.provider.as_str() {
            "openai" => self.llm.openai.as_ref().map(|c| c.api_key.as_str()),
            "gemini" => self.llm.gemini.as_ref().map(|c| c.api_key.as_str()),
            other => {
                return Err(DialogueError::Configuration(format!(
                    "unknown LLM provider: {}",
                    other
                )))
            }
        };
        match llm_key {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(DialogueError::Configuration(format!(
                "{} API key is not configured",
                self.llm.provider
            ))),
        }
    }
}
