use anyhow::Result;
use async_trait::async_trait;
use log::info;
use thiserror::Error;

use crate::services::tts::elevenlabs::{ElevenLabsClient, VoiceServiceConfig};

pub mod elevenlabs;
pub mod voices;

/// Why a single synthesis call produced no audio.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SynthesisError {
    #[error("invalid synthesis input: {0}")]
    InvalidInput(String),

    #[error("voice quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("voice service authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("voice service rejected the request: {0}")]
    ValidationError(String),

    #[error("voice synthesis failed: {0}")]
    SynthesisFailed(String),
}

impl SynthesisError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, SynthesisError::QuotaExceeded(_))
    }
}

pub type SynthesisResult<T> = std::result::Result<T, SynthesisError>;

#[async_trait]
pub trait VoiceSynthesizer: Send + Sync {
    /// Returns a non-empty audio payload for `text` spoken with `voice_id`.
    async fn synthesize(&self, text: &str, voice_id: &str) -> SynthesisResult<Vec<u8>>;
}

/// Rejects input that must never reach the network.
pub fn check_synthesis_input(text: &str, voice_id: &str) -> SynthesisResult<()> {
    if text.trim().is_empty() {
        return Err(SynthesisError::InvalidInput("text is empty".to_string()));
    }
    if voice_id.trim().is_empty() {
        return Err(SynthesisError::InvalidInput("voice id is missing".to_string()));
    }
    Ok(())
}

pub fn create_synthesizer(config: &VoiceServiceConfig) -> Result<Box<dyn VoiceSynthesizer>> {
    info!("Initializing voice synthesis client for {}", config.base_url);
    Ok(Box::new(ElevenLabsClient::new(config.clone())?))
}
