use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use speechpipe_backend::controllers::speech::SpeechController;
use speechpipe_backend::domain::speech::SpeechService;
use speechpipe_backend::infrastructure::audio::FfmpegJoiner;
use speechpipe_backend::infrastructure::config::{Config, LogFormat};
use speechpipe_backend::infrastructure::http::start_http_server;
use speechpipe_backend::infrastructure::synthesis::EdgeSpeechClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting SpeechPipe Backend on {}:{}",
        config.host,
        config.port
    );

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    tracing::info!("Instantiating synthesis client...");
    let synthesis_client = Arc::new(EdgeSpeechClient::new());

    tracing::info!(ffmpeg_bin = %config.ffmpeg_bin, "Instantiating audio joiner...");
    let joiner = Arc::new(FfmpegJoiner::new(config.ffmpeg_bin.clone()));

    tracing::info!(
        shared_limit = config.shared_synthesis_limit,
        max_concurrent = config.synthesis.max_concurrent,
        "Instantiating services..."
    );
    let speech_service = Arc::new(SpeechService::new(
        synthesis_client,
        joiner,
        config.voice_map.clone(),
        config.synthesis.clone(),
        config.shared_synthesis_limit,
    ));

    let speech_controller = Arc::new(SpeechController::new(speech_service));

    // Start HTTP server with all routes
    start_http_server(config, speech_controller).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "speechpipe_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "speechpipe_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
