use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;

use crate::{
    domain::speech::{SpeechOutput, SpeechRequest, SpeechService},
    error::{AppError, AppResult},
};

/// Fixed MIME type of every audio response; per-chunk segments are
/// byte-concatenable MP3, so the streamed body carries the same type.
pub const AUDIO_MIME: &str = "audio/mpeg";

const MAX_INPUT_CHARS: usize = 10_000;

pub struct SpeechController {
    speech_service: Arc<SpeechService>,
}

impl SpeechController {
    pub fn new(speech_service: Arc<SpeechService>) -> Self {
        Self { speech_service }
    }

    /// POST /v1/audio/speech - Convert text to one audio response
    pub async fn create_speech(
        State(controller): State<Arc<SpeechController>>,
        Json(request): Json<SpeechRequest>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let char_count = request.input.chars().count();
        if char_count > MAX_INPUT_CHARS {
            return Err(AppError::PayloadTooLarge(format!(
                "Input must be {} characters or less",
                MAX_INPUT_CHARS
            )));
        }

        let output = controller
            .speech_service
            .synthesize(request)
            .await
            .map_err(AppError::from)?;

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, AUDIO_MIME.parse().unwrap());

        match output {
            SpeechOutput::Full { audio, summary } => {
                headers.insert("X-Total-Chunks", summary.total.to_string().parse().unwrap());
                headers.insert(
                    "X-Failed-Chunks",
                    summary.fallback.to_string().parse().unwrap(),
                );
                headers.insert(
                    "X-Synthesis-Millis",
                    (summary.elapsed.as_millis() as u64)
                        .to_string()
                        .parse()
                        .unwrap(),
                );
                Ok((StatusCode::OK, headers, Body::from(audio)))
            }
            SpeechOutput::Stream(receiver) => {
                let body_stream = ReceiverStream::new(receiver)
                    .map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk.audio)));
                Ok((StatusCode::OK, headers, Body::from_stream(body_stream)))
            }
        }
    }
}
