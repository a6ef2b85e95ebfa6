use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// Symbolic voice profiles offered to callers, each bound to one premade
/// voice of the synthesis provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceProfile {
    ConfidentMale,
    DeepMale,
    FriendlyMale,
    YoungMale,
    ClearFemale,
    SoftFemale,
    EnergeticFemale,
    YoungFemale,
}

impl VoiceProfile {
    pub const ALL: [VoiceProfile; 8] = [
        VoiceProfile::ConfidentMale,
        VoiceProfile::DeepMale,
        VoiceProfile::FriendlyMale,
        VoiceProfile::YoungMale,
        VoiceProfile::ClearFemale,
        VoiceProfile::SoftFemale,
        VoiceProfile::EnergeticFemale,
        VoiceProfile::YoungFemale,
    ];

    pub fn key(self) -> &'static str {
        match self {
            VoiceProfile::ConfidentMale => "confident_male",
            VoiceProfile::DeepMale => "deep_male",
            VoiceProfile::FriendlyMale => "friendly_male",
            VoiceProfile::YoungMale => "young_male",
            VoiceProfile::ClearFemale => "clear_female",
            VoiceProfile::SoftFemale => "soft_female",
            VoiceProfile::EnergeticFemale => "energetic_female",
            VoiceProfile::YoungFemale => "young_female",
        }
    }

    pub fn voice_id(self) -> &'static str {
        match self {
            VoiceProfile::ConfidentMale => "pNInz6obpgDQGcFmaJgB",
            VoiceProfile::DeepMale => "VR6AewLTigWG4xSOukaG",
            VoiceProfile::FriendlyMale => "ErXwobaYiN019PkySvjV",
            VoiceProfile::YoungMale => "TxGEqnHWrfWFTfGW9XjX",
            VoiceProfile::ClearFemale => "21m00Tcm4TlvDq8ikWAM",
            VoiceProfile::SoftFemale => "EXAVITQu4vr4xnJW60fG",
            VoiceProfile::EnergeticFemale => "AZnzlk1XvdvUeBnXmlld",
            VoiceProfile::YoungFemale => "MF3mGyEYCl7XYWbV9V6O",
        }
    }

    pub fn gender(self) -> Gender {
        match self {
            VoiceProfile::ConfidentMale
            | VoiceProfile::DeepMale
            | VoiceProfile::FriendlyMale
            | VoiceProfile::YoungMale => Gender::Male,
            VoiceProfile::ClearFemale
            | VoiceProfile::SoftFemale
            | VoiceProfile::EnergeticFemale
            | VoiceProfile::YoungFemale => Gender::Female,
        }
    }

    pub fn default_for(gender: Gender) -> Self {
        match gender {
            Gender::Male => VoiceProfile::ConfidentMale,
            Gender::Female => VoiceProfile::ClearFemale,
        }
    }

    /// Case-insensitive; spaces and hyphens count as underscores.
    pub fn from_key(key: &str) -> Option<Self> {
        let normalized: String = key
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        Self::ALL.into_iter().find(|p| p.key() == normalized)
    }

    /// Looks the key up, falling back to the default voice of `gender` when
    /// the key is absent or unknown.
    pub fn resolve(key: Option<&str>, gender: Gender) -> Self {
        key.and_then(Self::from_key)
            .unwrap_or_else(|| Self::default_for(gender))
    }
}

impl fmt::Display for VoiceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The two voices of one dialogue: the first personality speaks with a male
/// default, the second with a female default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoicePair {
    pub first: VoiceProfile,
    pub second: VoiceProfile,
}

impl VoicePair {
    pub const FIRST_SLOT_GENDER: Gender = Gender::Male;
    pub const SECOND_SLOT_GENDER: Gender = Gender::Female;

    pub fn from_keys(first: Option<&str>, second: Option<&str>) -> Self {
        Self {
            first: VoiceProfile::resolve(first, Self::FIRST_SLOT_GENDER),
            second: VoiceProfile::resolve(second, Self::SECOND_SLOT_GENDER),
        }
    }

    pub fn voice_for(&self, is_first_personality: bool) -> VoiceProfile {
        if is_first_personality {
            self.first
        } else {
            self.second
        }
    }
}

impl Default for VoicePair {
    fn default() -> Self {
        Self::from_keys(None, None)
    }
}
