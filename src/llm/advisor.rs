//! Farmer-facing advice generation on top of an [`LlmClient`].

use super::{ChatCompletionRequest, ChatMessage, LlmClient};
use crate::{Error, Result, config::LlmConfig};
use std::sync::Arc;
use tracing::{debug, info};

pub const AGRIBOT_SYSTEM_PROMPT: &str = "You are AgriBot, an intelligent agricultural assistant.
- Help farmers identify and manage crop pests and diseases.
- Suggest remedies, preventive measures, and eco-friendly solutions.
- Give recommendations on fertilizers, irrigation, and best farming practices.
- Explain concepts in simple terms.
- Support multiple Indian languages (Hindi, Telugu, Tamil, Kannada, Bengali, etc).
Always be clear, concise, and farmer-friendly.
";

pub struct Advisor {
    client: Arc<dyn LlmClient>,
    system_prompt: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Advisor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            system_prompt: AGRIBOT_SYSTEM_PROMPT.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn from_config(client: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        let mut advisor = Self::new(client);
        if let Some(prompt) = config
            .system_prompt
            .as_ref()
            .filter(|p| !p.trim().is_empty())
        {
            advisor.system_prompt = prompt.clone();
        }
        advisor.temperature = config.temperature;
        advisor.max_tokens = config.max_tokens;
        advisor
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Send one user query under the AgriBot system prompt and return the reply text.
    pub async fn ask(&self, query: &str) -> Result<String> {
        debug!("Asking LLM ({} chars)", query.len());

        let request = ChatCompletionRequest {
            messages: vec![
                ChatMessage::system(self.system_prompt.as_str()),
                ChatMessage::user(query),
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self.client.create_chat_completion(request).await?;

        if let Some(usage) = &response.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "LLM completion {} from {}",
                response.id,
                response.model
            );
        }

        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| Error::llm("LLM returned an empty response"))
    }
}
