use agribot::{
    Error, Result,
    llm::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, LlmClient},
    vision::{ImageClassifier, Prediction, Predictions},
};
use async_trait::async_trait;
use image::DynamicImage;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

/// Mock LLM client for testing
#[derive(Debug)]
pub struct MockLlmClient {
    pub responses: Arc<Mutex<Vec<ChatCompletionResponse>>>,
    pub requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
    pub error: Option<String>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            error: None,
        }
    }

    pub fn with_responses(self, responses: Vec<ChatCompletionResponse>) -> Self {
        *self.responses.lock().unwrap() = responses;
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    pub fn get_requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Content of the user message of every recorded request.
    pub fn user_prompts(&self) -> Vec<String> {
        self.get_requests()
            .into_iter()
            .filter_map(|request| {
                request
                    .messages
                    .into_iter()
                    .find(|m| m.role == "user")
                    .map(|m| m.content)
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn create_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.requests.lock().unwrap().push(request);

        if let Some(ref error) = self.error {
            return Err(Error::llm(error.clone()));
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(Error::llm("No more mock responses available"));
        }

        Ok(responses.remove(0))
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock classifier returning fixed predictions
#[derive(Debug)]
pub struct MockClassifier {
    pub predictions: Vec<Prediction>,
    pub calls: AtomicUsize,
    pub last_top_k: AtomicUsize,
    pub last_size: Mutex<Option<(u32, u32)>>,
    pub error: Option<String>,
}

impl MockClassifier {
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self {
            predictions,
            calls: AtomicUsize::new(0),
            last_top_k: AtomicUsize::new(0),
            last_size: Mutex::new(None),
            error: None,
        }
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageClassifier for MockClassifier {
    fn classify(&self, image: &DynamicImage, top_k: usize) -> Result<Predictions> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_top_k.store(top_k, Ordering::SeqCst);
        *self.last_size.lock().unwrap() = Some((image.width(), image.height()));

        if let Some(ref error) = self.error {
            return Err(Error::vision(error.clone()));
        }

        let mut predictions = self.predictions.clone();
        predictions.truncate(top_k);
        Ok(Predictions::new(predictions))
    }
}

// Helper functions for creating test data

pub fn create_mock_chat_response(content: &str) -> ChatCompletionResponse {
    ChatCompletionResponse {
        id: "test-id".to_string(),
        model: "test-model".to_string(),
        choices: vec![Choice {
            index: 0,
            message: ChatMessage::assistant(content),
            finish_reason: Some("stop".to_string()),
        }],
        usage: None,
    }
}

pub fn create_blight_predictions() -> Vec<Prediction> {
    vec![
        Prediction {
            label: "Tomato___Late_blight".to_string(),
            confidence: 0.9,
        },
        Prediction {
            label: "Tomato___Early_blight".to_string(),
            confidence: 0.06,
        },
        Prediction {
            label: "Tomato___healthy".to_string(),
            confidence: 0.04,
        },
    ]
}
