use super::mocks::{MockClassifier, MockLlmClient};
use agribot::{
    config::{Config, LlmConfig, LogsConfig, ServerConfig, VisionConfig},
    llm::Advisor,
    server::{self, AppState},
    vision::ImageClassifier,
};
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat, RgbImage};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;

/// Create a test configuration with sensible defaults
pub fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            logs: LogsConfig {
                level: "debug".to_string(),
            },
            max_body_bytes: 1024 * 1024,
            default_language: "en".to_string(),
        },
        llm: LlmConfig {
            api_key: "test-api-key".to_string(),
            model: "test-model".to_string(),
            ..LlmConfig::default()
        },
        vision: VisionConfig {
            model_dir: "./model".to_string(),
            top_k: 3,
            required: false,
            max_image_dimension: 1024,
        },
    }
}

/// Build the router around mock collaborators
pub fn create_test_app(
    llm: Arc<MockLlmClient>,
    classifier: Option<Arc<MockClassifier>>,
) -> Router {
    let config = create_test_config();
    let advisor = Advisor::from_config(llm, &config.llm);

    let classifier = classifier.map(|c| c as Arc<dyn ImageClassifier>);
    let mut state = AppState::new(Arc::new(advisor), classifier);
    state.top_k = config.vision.top_k;
    state.max_image_dimension = config.vision.max_image_dimension;
    state.default_language = config.server.default_language.clone();

    server::router(state, config.server.max_body_bytes)
}

/// A small green leaf-coloured PNG, base64 encoded
pub fn png_base64(width: u32, height: u32) -> String {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
        width,
        height,
        image::Rgb([60, 140, 40]),
    ));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode test PNG");
    STANDARD.encode(bytes)
}

pub fn json_post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body is not JSON")
}
