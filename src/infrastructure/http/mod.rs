pub mod request_id;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controllers::{health, speech::SpeechController};
use crate::infrastructure::config::Config;
use request_id::request_id_middleware;

/// Build the application router with all routes and middleware.
pub fn build_router(speech_controller: Arc<SpeechController>) -> Router {
    let speech_routes = Router::new()
        .route(
            "/v1/audio/speech",
            post(SpeechController::create_speech),
        )
        .with_state(speech_controller);

    Router::new()
        .route("/health", get(health::health))
        .merge(speech_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: Arc<Config>,
    speech_controller: Arc<SpeechController>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(speech_controller);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
