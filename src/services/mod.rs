pub mod llm;
pub mod script;
pub mod setup;
pub mod tts;
pub mod workflow;
