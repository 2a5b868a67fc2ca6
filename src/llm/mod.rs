pub mod advisor;
pub mod client;
pub mod types;

pub use advisor::{AGRIBOT_SYSTEM_PROMPT, Advisor};
pub use client::{LlmClient, OpenAiClient};
pub use types::*;
