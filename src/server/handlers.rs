use super::error::ApiError;
use super::types::{HealthResponse, PredictRequest, PredictResponse, VisionAnalysis};
use crate::{
    Error, Result,
    llm::Advisor,
    query::{InputKind, Query, language_name},
    vision::{ImageClassifier, Predictions, decode_base64_image},
};
use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use std::{sync::Arc, time::Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub advisor: Arc<Advisor>,
    /// `None` when no model directory could be loaded; image requests then fail with 503.
    pub classifier: Option<Arc<dyn ImageClassifier>>,
    pub top_k: usize,
    pub max_image_dimension: u32,
    pub default_language: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(advisor: Arc<Advisor>, classifier: Option<Arc<dyn ImageClassifier>>) -> Self {
        Self {
            advisor,
            classifier,
            top_k: 5,
            max_image_dimension: 4096,
            default_language: "en".to_string(),
            started_at: Instant::now(),
        }
    }
}

pub async fn predict(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PredictRequest>, JsonRejection>,
) -> std::result::Result<Json<PredictResponse>, ApiError> {
    let request_id = Uuid::new_v4();

    let Json(request) = payload.map_err(|rejection| {
        warn!(%request_id, "Rejected predict body: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    match handle_predict(&state, request, request_id).await {
        Ok(response) => {
            info!(%request_id, "Successfully answered predict request");
            Ok(Json(response))
        }
        Err(e) => {
            error!(%request_id, "Failed to process predict request: {}", e);
            Err(ApiError::from(e))
        }
    }
}

async fn handle_predict(
    state: &AppState,
    request: PredictRequest,
    request_id: Uuid,
) -> Result<PredictResponse> {
    let kind = InputKind::detect(request.message.as_deref(), request.has_image())?;
    info!(%request_id, %kind, "Received predict request");

    let predictions = match request.image {
        Some(encoded) if kind.needs_image() => Some(classify(state, encoded).await?),
        _ => None,
    };

    if let Some(top) = predictions.as_ref().and_then(Predictions::top) {
        info!(
            %request_id,
            label = %top.label,
            confidence = top.confidence,
            "Image classified"
        );
    }

    let query = Query::from_parts(request.message.as_deref(), predictions)?;
    let language = language_name(request.language.as_deref(), &state.default_language);
    let prompt = query.prompt(&language);

    let response = state.advisor.ask(&prompt).await?;

    let predictions = query.predictions();
    Ok(PredictResponse {
        response,
        vision_analysis: predictions
            .and_then(Predictions::top)
            .map(VisionAnalysis::from),
        predictions: predictions.cloned().map(Predictions::into_vec),
    })
}

/// Decode and classify on the blocking pool; both steps are CPU bound.
async fn classify(state: &AppState, encoded: String) -> Result<Predictions> {
    let classifier = state.classifier.clone();
    let top_k = state.top_k;
    let max_dimension = state.max_image_dimension;

    tokio::task::spawn_blocking(move || {
        let image = decode_base64_image(&encoded, max_dimension)?;
        let classifier = classifier.ok_or(Error::ClassifierUnavailable)?;
        classifier.classify(&image, top_k)
    })
    .await
    .map_err(|e| Error::internal(format!("Classifier task failed: {e}")))?
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        classifier_loaded: state.classifier.is_some(),
    })
}
