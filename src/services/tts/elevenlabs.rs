use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::services::tts::voices::VoiceProfile;
use crate::services::tts::{check_synthesis_input, SynthesisError, SynthesisResult, VoiceSynthesizer};

const VOICE_STABILITY: f32 = 0.5;
const VOICE_SIMILARITY_BOOST: f32 = 0.75;
const VOICE_STYLE: f32 = 0.0;
const VOICE_SPEAKER_BOOST: bool = true;
const ERROR_DETAIL_LIMIT: usize = 200;

// --- Config ---

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct VoiceServiceConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_first_voice")]
    pub first_voice: String,
    #[serde(default = "default_second_voice")]
    pub second_voice: String,
}

impl Default for VoiceServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model_id: default_model_id(),
            first_voice: default_first_voice(),
            second_voice: default_second_voice(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}
fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}
fn default_first_voice() -> String {
    VoiceProfile::ConfidentMale.key().to_string()
}
fn default_second_voice() -> String {
    VoiceProfile::ClearFemale.key().to_string()
}

// --- Wire types ---

#[derive(Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: VOICE_STABILITY,
            similarity_boost: VOICE_SIMILARITY_BOOST,
            style: VOICE_STYLE,
            use_speaker_boost: VOICE_SPEAKER_BOOST,
        }
    }
}

// --- Client ---

pub struct ElevenLabsClient {
    config: VoiceServiceConfig,
    base: Url,
    api_key: HeaderValue,
    client: Client,
}

impl ElevenLabsClient {
    pub fn new(config: VoiceServiceConfig) -> Result<Self> {
        Self::with_http_client(config, Client::new())
    }

    pub fn with_http_client(config: VoiceServiceConfig, client: Client) -> Result<Self> {
        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let base = Url::parse(&base)
            .with_context(|| format!("Invalid voice service base_url: {}", config.base_url))?;
        let mut api_key = HeaderValue::from_str(config.api_key.as_deref().unwrap_or_default())
            .context("Voice service api_key is not a valid HTTP header value")?;
        api_key.set_sensitive(true);
        Ok(Self { config, base, api_key, client })
    }

    fn speech_url(&self, voice_id: &str) -> SynthesisResult<Url> {
        self.base
            .join(&format!("v1/text-to-speech/{}", voice_id))
            .map_err(|e| SynthesisError::InvalidInput(format!("bad voice id {:?}: {}", voice_id, e)))
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("audio/mpeg"));
        headers.insert("xi-api-key", self.api_key.clone());
        headers
    }
}

/// Maps a non-success response onto the error the pipeline branches on.
pub fn classify_status(status: StatusCode, body: &str) -> SynthesisError {
    let detail = error_detail(status, body);
    match status {
        StatusCode::TOO_MANY_REQUESTS => SynthesisError::QuotaExceeded(detail),
        StatusCode::UNAUTHORIZED => SynthesisError::AuthenticationFailed(detail),
        StatusCode::UNPROCESSABLE_ENTITY => SynthesisError::ValidationError(detail),
        _ => SynthesisError::SynthesisFailed(format!("HTTP {}: {}", status.as_u16(), detail)),
    }
}

fn error_detail(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status.canonical_reason().unwrap_or("no details").to_string();
    }
    body.chars().take(ERROR_DETAIL_LIMIT).collect()
}

#[async_trait]
impl VoiceSynthesizer for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice_id: &str) -> SynthesisResult<Vec<u8>> {
        check_synthesis_input(text, voice_id)?;
        let url = self.speech_url(voice_id)?;

        let request = SpeechRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings::default(),
        };

        debug!("POST {} ({} chars)", url, text.chars().count());
        let resp = self
            .client
            .post(url)
            .headers(self.headers())
            .json(&request)
            .send()
            .await
            .map_err(|e| SynthesisError::SynthesisFailed(format!("request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let audio = resp
            .bytes()
            .await
            .map_err(|e| SynthesisError::SynthesisFailed(format!("failed to read audio: {}", e)))?;
        if audio.is_empty() {
            return Err(SynthesisError::SynthesisFailed("empty audio response".to_string()));
        }

        debug!("Received {} bytes of audio", audio.len());
        Ok(audio.to_vec())
    }
}
