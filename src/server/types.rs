use crate::vision::Prediction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Language code for the reply, e.g. `hi` or `ta`.
    #[serde(default)]
    pub language: Option<String>,
    /// Base64 image, optionally as a `data:image/...;base64,` URL.
    #[serde(default)]
    pub image: Option<String>,
}

impl PredictRequest {
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|i| !i.trim().is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub response: String,
    /// Top prediction, in the shape the mobile client renders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_analysis: Option<VisionAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictions: Option<Vec<Prediction>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionAnalysis {
    pub detected_pest: String,
    /// Probability in `[0, 1]`.
    pub confidence: f32,
}

impl From<&Prediction> for VisionAnalysis {
    fn from(prediction: &Prediction) -> Self {
        Self {
            detected_pest: prediction.label.clone(),
            confidence: prediction.confidence,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub classifier_loaded: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
