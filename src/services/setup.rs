use crate::core::config::Config;
use crate::services::tts::voices::{Gender, VoicePair, VoiceProfile};
use crate::services::workflow::DialogueRequest;
use anyhow::{anyhow, Result};
use inquire::{Select, Text};

/// Interactively collects a dialogue request when none was given on the
/// command line.
pub fn prompt_request(config: &Config) -> Result<DialogueRequest> {
    let personality1 = prompt_required("First personality:")?;
    let personality2 = prompt_required("Second personality:")?;
    let topic = prompt_required("Topic:")?;

    let first = select_voice(
        &format!("Voice for {}:", personality1),
        VoicePair::FIRST_SLOT_GENDER,
        &config.voice.first_voice,
    )?;
    let second = select_voice(
        &format!("Voice for {}:", personality2),
        VoicePair::SECOND_SLOT_GENDER,
        &config.voice.second_voice,
    )?;

    Ok(DialogueRequest {
        personality1,
        personality2,
        topic,
        voice1_key: Some(first.key().to_string()),
        voice2_key: Some(second.key().to_string()),
    })
}

fn prompt_required(prompt: &str) -> Result<String> {
    let answer = Text::new(prompt).prompt()?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(anyhow!("{} is required", prompt.trim_end_matches(':')));
    }
    Ok(answer.to_string())
}

fn select_voice(prompt: &str, gender: Gender, configured: &str) -> Result<VoiceProfile> {
    let options = voice_options(gender);
    let preferred = VoiceProfile::resolve(Some(configured), gender);
    let cursor = options.iter().position(|v| *v == preferred).unwrap_or(0);

    Ok(Select::new(prompt, options).with_starting_cursor(cursor).prompt()?)
}

/// Every profile, the slot's own gender listed first.
fn voice_options(gender: Gender) -> Vec<VoiceProfile> {
    let (mut options, others): (Vec<_>, Vec<_>) =
        VoiceProfile::ALL.into_iter().partition(|v| v.gender() == gender);
    options.extend(others);
    options
}
