use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use super::silence;
use super::TextChunk;
use crate::infrastructure::synthesis::{SynthesisClient, SynthesisError, SynthesisFrame};

/// How a chunk's audio came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkOutcome {
    Synthesized,
    /// Every attempt failed; the audio is the fixed silence clip.
    SilenceFallback,
}

/// Audio for one chunk, exactly one produced per submitted chunk.
#[derive(Debug, Clone)]
pub struct ChunkAudio {
    pub index: usize,
    pub audio: Vec<u8>,
    pub outcome: ChunkOutcome,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl ChunkAudio {
    pub fn fallback(index: usize, attempts: u32, elapsed: Duration) -> Self {
        Self {
            index,
            audio: silence::fallback_clip(),
            outcome: ChunkOutcome::SilenceFallback,
            attempts,
            elapsed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base_secs: f64,
    pub backoff_cap_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff_base_secs: 2.0,
            backoff_cap_secs: 8.0,
        }
    }
}

impl RetryPolicy {
    /// Sleep before the attempt after `attempt` failed: base^attempt seconds,
    /// capped.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let secs = self
            .backoff_base_secs
            .powi(attempt as i32)
            .min(self.backoff_cap_secs);
        Duration::from_secs_f64(secs.max(0.0))
    }
}

/// Synthesize one chunk with bounded retries, falling back to silence once
/// attempts are exhausted so downstream assembly never sees a missing
/// segment.
///
/// The concurrency permit is held only while a synthesis call is in flight;
/// backoff sleeps happen with the permit released so a retrying chunk never
/// starves its siblings.
pub async fn synthesize_chunk(
    client: &dyn SynthesisClient,
    chunk: &TextChunk,
    policy: &RetryPolicy,
    permits: &Semaphore,
) -> ChunkAudio {
    let started = Instant::now();

    for attempt in 1..=policy.max_attempts {
        let result = {
            let permit = match permits.acquire().await {
                Ok(permit) => permit,
                // ceiling closed: the request is going away
                Err(_) => break,
            };
            let result = collect_audio(client, &chunk.content, &chunk.voice).await;
            drop(permit);
            result
        };

        match result {
            Ok(audio) if !audio.is_empty() => {
                tracing::debug!(
                    chunk_index = chunk.index,
                    attempts = attempt,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    audio_size = audio.len(),
                    "Chunk synthesized"
                );
                return ChunkAudio {
                    index: chunk.index,
                    audio,
                    outcome: ChunkOutcome::Synthesized,
                    attempts: attempt,
                    elapsed: started.elapsed(),
                };
            }
            Ok(_) => {
                tracing::warn!(
                    chunk_index = chunk.index,
                    attempt = attempt,
                    "Synthesis returned no audio"
                );
            }
            Err(e) => {
                tracing::warn!(
                    chunk_index = chunk.index,
                    attempt = attempt,
                    error = %e,
                    "Synthesis attempt failed"
                );
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.backoff_after(attempt)).await;
        }
    }

    tracing::error!(
        chunk_index = chunk.index,
        attempts = policy.max_attempts,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Chunk exhausted all attempts, substituting silence"
    );
    ChunkAudio::fallback(chunk.index, policy.max_attempts, started.elapsed())
}

/// Drain one synthesis session, concatenating its audio frames.
async fn collect_audio(
    client: &dyn SynthesisClient,
    text: &str,
    voice: &str,
) -> Result<Vec<u8>, SynthesisError> {
    let mut frames = client.open(text, voice).await?;
    let mut audio = Vec::new();
    while let Some(frame) = frames.next().await {
        match frame? {
            SynthesisFrame::Audio(bytes) => audio.extend_from_slice(&bytes),
            SynthesisFrame::Metadata => {}
        }
    }
    Ok(audio)
}
