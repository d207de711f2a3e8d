pub mod cleaner;
pub mod error;
pub mod retry;
pub mod scheduler;
pub mod segmenter;
pub mod service;
pub mod silence;

#[cfg(test)]
pub(crate) mod testing;

pub use cleaner::{clean_text, CleaningOptions};
pub use error::SpeechServiceError;
pub use retry::{ChunkAudio, ChunkOutcome, RetryPolicy};
pub use service::{SpeechOutput, SpeechService, SynthesisSummary};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request body for POST /v1/audio/speech
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub input: String,
    pub voice: String,
    #[serde(default)]
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_requests: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning_options: Option<CleaningOptions>,
}

/// One speakable unit of a request's text, in final playback order. Indices
/// are dense and 0-based; chunks are never reordered after creation.
#[derive(Debug, Clone)]
pub struct TextChunk {
    pub index: usize,
    pub content: String,
    pub voice: String,
}

/// Everything the scheduler needs to run one request's chunks. Built at
/// request entry from the config snapshot plus request overrides; owned by
/// the request and gone when it finishes.
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    pub chunks: Vec<TextChunk>,
    pub policy: RetryPolicy,
    /// Number of leading chunks synthesized strictly sequentially in
    /// streamed delivery, to minimize time to first byte.
    pub sync_chunks: usize,
    /// How often the in-order emitter rechecks for a ready chunk (and for a
    /// disconnected consumer).
    pub emit_poll: Duration,
}
