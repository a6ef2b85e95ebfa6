pub mod core;
pub mod services;
pub mod utils;

pub use crate::core::config::Config;
pub use crate::core::error::{DialogueError, DialogueResult};
pub use crate::services::script::ScriptSegment;
pub use crate::services::workflow::{
    handle_request, AudioSegment, DialogueRequest, DialogueResponse, DialogueService,
    SegmentPipeline,
};
