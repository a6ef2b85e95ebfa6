use serde::Serialize;
use thiserror::Error;

/// Request-level failures. Everything that happens to a single segment is
/// absorbed into the response instead; see [`crate::services::tts::SynthesisError`].
#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("server configuration error: {0}")]
    Configuration(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("script generation failed: {0}")]
    ScriptGeneration(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DialogueError {
    /// HTTP-style status for the outer request surface.
    pub fn status_code(&self) -> u16 {
        match self {
            DialogueError::InvalidRequest(_) => 400,
            DialogueError::Configuration(_)
            | DialogueError::ScriptGeneration(_)
            | DialogueError::Other(_) => 500,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            status: self.status_code(),
            error: self.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub error: String,
}

pub type DialogueResult<T> = Result<T, DialogueError>;
