use super::types::*;
use crate::{Error, Result, config::LlmConfig};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{self as openai_types, Role},
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn create_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse>;
}

/// Backoff that gives up after the first attempt, so upstream errors surface immediately.
fn no_retry() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Chat completions against any OpenAI-compatible endpoint (Together AI by default).
///
/// Each call is a single HTTP request bounded by `timeout_secs`; 5xx and 429
/// responses are returned as errors rather than retried.
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let mut openai_config = OpenAIConfig::new().with_api_key(config.api_key);

        if !config.base_url.is_empty() {
            openai_config = openai_config.with_api_base(config.base_url);
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::llm(format!("Failed to build HTTP client: {e}")))?;

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(no_retry());

        Ok(Self {
            client,
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn role_name(role: &Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
        Role::Function => "function",
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn create_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        debug!(
            "Creating chat completion with {} messages",
            request.messages.len()
        );

        let mut messages = Vec::with_capacity(request.messages.len());
        for msg in &request.messages {
            messages.push(msg.to_openai_message()?);
        }

        let mut request_builder = openai_types::CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model).messages(messages);

        if let Some(temperature) = request.temperature {
            request_builder.temperature(temperature);
        }

        if let Some(max_tokens) = request.max_tokens {
            request_builder.max_tokens(max_tokens);
        }

        let openai_request = request_builder.build()?;

        let response = self.client.chat().create(openai_request).await?;

        debug!(
            "Received chat completion response with {} choices",
            response.choices.len()
        );

        let choices: Vec<Choice> = response
            .choices
            .into_iter()
            .map(|choice| Choice {
                index: choice.index,
                message: ChatMessage {
                    role: role_name(&choice.message.role).to_string(),
                    content: choice.message.content.unwrap_or_default(),
                },
                finish_reason: choice.finish_reason.map(|fr| format!("{fr:?}")),
            })
            .collect();

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ChatCompletionResponse {
            id: response.id,
            model: response.model,
            choices,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::ChatCompletionRequestMessage;
    use pretty_assertions::assert_eq;

    fn create_test_config() -> LlmConfig {
        LlmConfig {
            base_url: "https://api.together.xyz/v1".to_string(),
            api_key: "test-api-key".to_string(),
            model: "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo".to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_openai_client_creation() {
        let client = OpenAiClient::new(create_test_config()).unwrap();
        assert_eq!(client.model(), "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo");
    }

    #[test]
    fn test_openai_client_with_empty_base_url() {
        let mut config = create_test_config();
        config.base_url = String::new();

        let client = OpenAiClient::new(config).unwrap();
        assert_eq!(client.model(), "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo");
    }

    #[test]
    fn test_backoff_allows_no_retry() {
        use backoff::backoff::Backoff;

        let mut backoff = no_retry();
        assert_eq!(backoff.next_backoff(), None);
    }

    #[test]
    fn test_chat_message_to_openai_system() {
        let openai_msg = ChatMessage::system("You are AgriBot")
            .to_openai_message()
            .unwrap();
        assert!(matches!(
            openai_msg,
            ChatCompletionRequestMessage::System(_)
        ));
    }

    #[test]
    fn test_chat_message_to_openai_user() {
        let openai_msg = ChatMessage::user("My tomato leaves have brown spots")
            .to_openai_message()
            .unwrap();
        assert!(matches!(openai_msg, ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_chat_message_to_openai_assistant() {
        let openai_msg = ChatMessage::assistant("Remove the infected leaves.")
            .to_openai_message()
            .unwrap();
        assert!(matches!(
            openai_msg,
            ChatCompletionRequestMessage::Assistant(_)
        ));
    }

    #[test]
    fn test_chat_message_invalid_role() {
        let msg = ChatMessage {
            role: "tool".to_string(),
            content: "unsupported".to_string(),
        };

        let result = msg.to_openai_message();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Unknown message role")
        );
    }

    #[test]
    fn test_role_names() {
        assert_eq!(role_name(&Role::Assistant), "assistant");
        assert_eq!(role_name(&Role::System), "system");
    }

    #[test]
    fn test_first_content_skips_blank_output() {
        let response = ChatCompletionResponse {
            id: "chatcmpl-1".to_string(),
            model: "test-model".to_string(),
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::assistant("   "),
                finish_reason: Some("Stop".to_string()),
            }],
            usage: None,
        };
        assert_eq!(response.first_content(), None);

        let response = ChatCompletionResponse {
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::assistant(" Spray neem oil. "),
                finish_reason: None,
            }],
            ..response
        };
        assert_eq!(response.first_content(), Some("Spray neem oil."));
    }
}
