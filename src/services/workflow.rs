use crate::core::config::Config;
use crate::core::error::{DialogueError, DialogueResult};
use crate::services::llm::{create_llm, GenerationParams, LlmClient};
use crate::services::script::{
    build_script_prompt, parse_script, strip_code_blocks, strip_stage_directions, ScriptSegment,
    SCRIPT_SYSTEM_PROMPT,
};
use crate::services::tts::voices::{VoicePair, VoiceProfile};
use crate::services::tts::{create_synthesizer, SynthesisError, VoiceSynthesizer};
use crate::utils::audio::fallback_tone;
use base64::prelude::{Engine as _, BASE64_STANDARD};
use log::{info, warn};
use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;
use tokio::time::sleep;

/// Pause after each successful synthesis call to stay under the provider's
/// rate limit.
pub const SEGMENT_PACING: Duration = Duration::from_millis(100);

const QUOTA_SKIP_REASON: &str = "skipped, quota already exhausted in this run; using fallback audio";

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mpeg,
    Wav,
}

/// Result for one script segment. `error` carries the real-synthesis failure
/// even when fallback audio is present.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioSegment {
    #[serde(flatten)]
    pub segment: ScriptSegment,
    pub index: usize,
    #[serde(serialize_with = "serialize_payload")]
    pub audio_payload: Option<Vec<u8>>,
    pub audio_format: Option<AudioFormat>,
    pub voice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AudioSegment {
    fn synthesized(index: usize, segment: &ScriptSegment, audio: Vec<u8>, voice: VoiceProfile) -> Self {
        Self {
            estimated_duration_seconds: Some(estimated_duration_seconds(&segment.text)),
            segment: segment.clone(),
            index,
            audio_payload: Some(audio),
            audio_format: Some(AudioFormat::Mpeg),
            voice_id: Some(voice.voice_id().to_string()),
            error: None,
        }
    }

    fn fallback(index: usize, segment: &ScriptSegment, audio: Option<Vec<u8>>, error: &SynthesisError) -> Self {
        Self {
            segment: segment.clone(),
            index,
            audio_format: audio.as_ref().map(|_| AudioFormat::Wav),
            audio_payload: audio,
            voice_id: None,
            estimated_duration_seconds: None,
            error: Some(error.to_string()),
        }
    }
}

fn serialize_payload<S: Serializer>(payload: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    match payload {
        Some(bytes) => s.serialize_some(&BASE64_STANDARD.encode(bytes)),
        None => s.serialize_none(),
    }
}

/// Whole seconds of speech, one second per started block of ten characters.
pub fn estimated_duration_seconds(text: &str) -> u32 {
    let chars = text.chars().count() as u32;
    chars.div_ceil(10)
}

/// Once the provider has reported an exhausted quota, no further real
/// synthesis is attempted for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuotaState {
    #[default]
    Normal,
    Exhausted,
}

impl QuotaState {
    pub fn allows_synthesis(self) -> bool {
        self == QuotaState::Normal
    }

    pub fn after(self, error: &SynthesisError) -> Self {
        match self {
            QuotaState::Normal if error.is_quota_exceeded() => QuotaState::Exhausted,
            state => state,
        }
    }
}

pub struct SegmentPipeline<'a> {
    synthesizer: &'a dyn VoiceSynthesizer,
    voices: VoicePair,
    pacing: Duration,
}

impl<'a> SegmentPipeline<'a> {
    pub fn new(synthesizer: &'a dyn VoiceSynthesizer, voices: VoicePair) -> Self {
        Self {
            synthesizer,
            voices,
            pacing: SEGMENT_PACING,
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Synthesizes every segment in order, one at a time. Always returns one
    /// entry per input segment.
    pub async fn run(&self, segments: &[ScriptSegment]) -> Vec<AudioSegment> {
        let mut quota = QuotaState::default();
        let mut results = Vec::with_capacity(segments.len());

        for (index, segment) in segments.iter().enumerate() {
            let voice = self.voices.voice_for(segment.is_first_personality);
            let attempt = if quota.allows_synthesis() {
                self.synthesizer.synthesize(&segment.text, voice.voice_id()).await
            } else {
                Err(SynthesisError::QuotaExceeded(QUOTA_SKIP_REASON.to_string()))
            };

            match attempt {
                Ok(audio) => {
                    info!(
                        "Segment {} ({}): {} bytes with voice {}",
                        index,
                        segment.speaker,
                        audio.len(),
                        voice
                    );
                    results.push(AudioSegment::synthesized(index, segment, audio, voice));
                    sleep(self.pacing).await;
                }
                Err(err) => {
                    let next = quota.after(&err);
                    if next != quota {
                        warn!("Voice quota exhausted at segment {}; remaining segments use fallback audio", index);
                    }
                    quota = next;

                    warn!("Segment {} ({}): {}", index, segment.speaker, err);
                    let audio = fallback_tone(&segment.text);
                    results.push(AudioSegment::fallback(index, segment, audio, &err));
                }
            }
        }

        results
    }
}

// --- Request surface ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DialogueRequest {
    pub personality1: String,
    pub personality2: String,
    pub topic: String,
    #[serde(default)]
    pub voice1_key: Option<String>,
    #[serde(default)]
    pub voice2_key: Option<String>,
}

impl DialogueRequest {
    pub fn from_json(body: &str) -> DialogueResult<Self> {
        let request: DialogueRequest = serde_json::from_str(body)
            .map_err(|e| DialogueError::InvalidRequest(format!("malformed request body: {}", e)))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> DialogueResult<()> {
        for (name, value) in [
            ("personality1", &self.personality1),
            ("personality2", &self.personality2),
            ("topic", &self.topic),
        ] {
            if value.trim().is_empty() {
                return Err(DialogueError::InvalidRequest(format!(
                    "missing required field: {}",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DialogueResponse {
    pub script: String,
    pub segments: Vec<ScriptSegment>,
    pub audio_segments: Vec<AudioSegment>,
}

pub struct DialogueService {
    llm: Box<dyn LlmClient>,
    synthesizer: Box<dyn VoiceSynthesizer>,
    params: GenerationParams,
    first_voice: String,
    second_voice: String,
    pacing: Duration,
}

impl DialogueService {
    pub fn new(llm: Box<dyn LlmClient>, synthesizer: Box<dyn VoiceSynthesizer>) -> Self {
        Self {
            llm,
            synthesizer,
            params: GenerationParams::default(),
            first_voice: VoiceProfile::default_for(VoicePair::FIRST_SLOT_GENDER).key().to_string(),
            second_voice: VoiceProfile::default_for(VoicePair::SECOND_SLOT_GENDER).key().to_string(),
            pacing: SEGMENT_PACING,
        }
    }

    /// Builds the remote clients. Missing credentials fail here, before any
    /// request is looked at.
    pub fn from_config(config: &Config) -> DialogueResult<Self> {
        config.validate()?;
        let llm = create_llm(&config.llm)
            .map_err(|e| DialogueError::Configuration(format!("{:#}", e)))?;
        let synthesizer = create_synthesizer(&config.voice)
            .map_err(|e| DialogueError::Configuration(format!("{:#}", e)))?;

        Ok(Self::new(llm, synthesizer)
            .with_params(GenerationParams::from_config(&config.llm))
            .with_default_voices(&config.voice.first_voice, &config.voice.second_voice))
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_default_voices(mut self, first: &str, second: &str) -> Self {
        self.first_voice = first.to_string();
        self.second_voice = second.to_string();
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn voices_for(&self, request: &DialogueRequest) -> VoicePair {
        VoicePair::from_keys(
            Some(request.voice1_key.as_deref().unwrap_or(&self.first_voice)),
            Some(request.voice2_key.as_deref().unwrap_or(&self.second_voice)),
        )
    }

    /// Asks the model for a script and cleans it up for parsing.
    pub async fn generate_script(&self, request: &DialogueRequest) -> DialogueResult<String> {
        let prompt = build_script_prompt(&request.personality1, &request.personality2, &request.topic);
        let raw = self
            .llm
            .chat(SCRIPT_SYSTEM_PROMPT, &prompt, &self.params)
            .await
            .map_err(|e| DialogueError::ScriptGeneration(format!("{:#}", e)))?;

        let script = strip_stage_directions(&strip_code_blocks(&raw)).trim().to_string();
        if script.is_empty() {
            return Err(DialogueError::ScriptGeneration(
                "language model returned an empty script".to_string(),
            ));
        }
        Ok(script)
    }

    pub async fn generate(&self, request: &DialogueRequest) -> DialogueResult<DialogueResponse> {
        request.validate()?;

        info!(
            "Generating dialogue between {} and {} about {:?}",
            request.personality1, request.personality2, request.topic
        );
        let script = self.generate_script(request).await?;
        let segments = parse_script(&script, &request.personality1, &request.personality2);

        let voices = self.voices_for(request);
        info!("Synthesizing {} segments with voices {} / {}", segments.len(), voices.first, voices.second);
        let audio_segments = SegmentPipeline::new(self.synthesizer.as_ref(), voices)
            .with_pacing(self.pacing)
            .run(&segments)
            .await;

        let fallbacks = audio_segments.iter().filter(|s| s.error.is_some()).count();
        info!("Dialogue complete: {} segments, {} with fallback audio", audio_segments.len(), fallbacks);

        Ok(DialogueResponse {
            script,
            segments,
            audio_segments,
        })
    }
}

/// Full request path: configuration, body validation, then generation.
pub async fn handle_request(config: &Config, body: &str) -> DialogueResult<DialogueResponse> {
    let service = DialogueService::from_config(config)?;
    let request = DialogueRequest::from_json(body)?;
    service.generate(&request).await
}
