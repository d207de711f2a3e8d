pub mod edge;

pub use edge::EdgeSpeechClient;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// One frame of a synthesis session. The remote service interleaves audio
/// payloads with bookkeeping messages; consumers only accumulate audio.
#[derive(Debug, Clone)]
pub enum SynthesisFrame {
    Audio(Vec<u8>),
    Metadata,
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

pub type FrameStream = Pin<Box<dyn Stream<Item = Result<SynthesisFrame, SynthesisError>> + Send>>;

/// Client for the remote streaming synthesis service.
/// Abstracts the underlying provider (Edge read-aloud, or a fake in tests).
///
/// Implementations open one session per text unit and yield frames until the
/// service signals end of turn. Any stream error, or a session that yields no
/// audio bytes at all, is treated by callers as a failed attempt.
#[async_trait]
pub trait SynthesisClient: Send + Sync {
    /// Start synthesis of `text` with the given provider voice id and return
    /// the resulting frame stream.
    async fn open(&self, text: &str, voice: &str) -> Result<FrameStream, SynthesisError>;
}
