pub mod error;
pub mod handlers;
pub mod types;

pub use error::ApiError;
pub use handlers::AppState;

use crate::{
    Result,
    config::Config,
    llm::{Advisor, OpenAiClient},
    vision::{ImageClassifier, OnnxClassifier},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn load_classifier(config: &Config) -> Result<Option<Arc<dyn ImageClassifier>>> {
    match OnnxClassifier::load(&config.vision.model_dir) {
        Ok(classifier) => {
            info!(
                "Loaded image classifier from {} ({} labels)",
                config.vision.model_dir,
                classifier.num_labels()
            );
            let classifier: Arc<dyn ImageClassifier> = Arc::new(classifier);
            Ok(Some(classifier))
        }
        Err(e) if config.vision.required => Err(e),
        Err(e) => {
            warn!(
                "Image classifier unavailable, serving text-only requests: {}",
                e
            );
            Ok(None)
        }
    }
}

pub async fn run(config: Config) -> Result<()> {
    let classifier = load_classifier(&config)?;

    let client = Arc::new(OpenAiClient::new(config.llm.clone())?);
    info!(
        "Using LLM model {} at {} (timeout {}s)",
        client.model(),
        config.llm.base_url,
        config.llm.timeout_secs
    );
    let advisor = Advisor::from_config(client, &config.llm);

    let mut app_state = AppState::new(Arc::new(advisor), classifier);
    app_state.top_k = config.vision.top_k;
    app_state.max_image_dimension = config.vision.max_image_dimension;
    app_state.default_language = config.server.default_language.clone();

    let app = router(app_state, config.server.max_body_bytes);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
