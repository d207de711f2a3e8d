use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};

use crate::infrastructure::audio::AudioJoiner;
use crate::infrastructure::config::{SynthesisSettings, VoiceMap};
use crate::infrastructure::synthesis::SynthesisClient;

use super::error::SpeechServiceError;
use super::retry::{ChunkAudio, ChunkOutcome, RetryPolicy};
use super::{cleaner, scheduler, segmenter, SpeechRequest, SynthesisJob, TextChunk};

/// Ceiling for per-request concurrency overrides.
const MAX_CONCURRENCY_OVERRIDE: usize = 64;

/// Per-request synthesis outcome counts, reported in response headers and
/// logs.
#[derive(Debug, Clone)]
pub struct SynthesisSummary {
    pub total: usize,
    pub synthesized: usize,
    pub fallback: usize,
    pub elapsed: Duration,
}

impl SynthesisSummary {
    pub fn from_results(results: &[ChunkAudio], elapsed: Duration) -> Self {
        let synthesized = results
            .iter()
            .filter(|r| r.outcome == ChunkOutcome::Synthesized)
            .count();
        Self {
            total: results.len(),
            synthesized,
            fallback: results.len() - synthesized,
            elapsed,
        }
    }
}

/// Result of one synthesis request: either a fully assembled payload or a
/// live channel of in-order chunk audio.
#[derive(Debug)]
pub enum SpeechOutput {
    Full {
        audio: Vec<u8>,
        summary: SynthesisSummary,
    },
    Stream(mpsc::Receiver<ChunkAudio>),
}

pub struct SpeechService {
    client: Arc<dyn SynthesisClient>,
    joiner: Arc<dyn AudioJoiner>,
    voice_map: Arc<VoiceMap>,
    defaults: SynthesisSettings,
    /// Present when one process-wide ceiling bounds synthesis across all
    /// requests; otherwise each request gets its own semaphore.
    shared_permits: Option<Arc<Semaphore>>,
}

impl SpeechService {
    pub fn new(
        client: Arc<dyn SynthesisClient>,
        joiner: Arc<dyn AudioJoiner>,
        voice_map: Arc<VoiceMap>,
        defaults: SynthesisSettings,
        shared_limit: bool,
    ) -> Self {
        let shared_permits =
            shared_limit.then(|| Arc::new(Semaphore::new(defaults.max_concurrent.max(1))));
        Self {
            client,
            joiner,
            voice_map,
            defaults,
            shared_permits,
        }
    }

    /// Synthesize one request end to end.
    ///
    /// This operation:
    /// - validates input and resolves the voice alias
    /// - cleans and segments the text into speakable chunks
    /// - runs the chunks through the scheduler under the concurrency ceiling
    /// - assembles one payload (buffered) or hands back the in-order stream
    pub async fn synthesize(
        &self,
        request: SpeechRequest,
    ) -> Result<SpeechOutput, SpeechServiceError> {
        let started = Instant::now();

        let voice_alias = request.voice.trim();
        if voice_alias.is_empty() {
            return Err(SpeechServiceError::Invalid(
                "Parameter 'voice' is required".to_string(),
            ));
        }
        if request.input.trim().is_empty() {
            return Err(SpeechServiceError::Invalid(
                "Parameter 'input' is required".to_string(),
            ));
        }

        // Voice map snapshot is consulted exactly once per request.
        let voice = self.voice_map.resolve(voice_alias);

        let options = request.cleaning_options.unwrap_or_default();
        let cleaned = cleaner::clean_text(&request.input, &options);

        let chunk_size = request
            .chunk_size
            .unwrap_or(self.defaults.chunk_size)
            .max(1);
        let contents = segmenter::segment(&cleaned, chunk_size);
        if contents.is_empty() {
            return Err(SpeechServiceError::Invalid(
                "No speakable text left after cleaning".to_string(),
            ));
        }

        tracing::info!(
            voice_alias = voice_alias,
            voice = %voice,
            input_chars = request.input.chars().count(),
            chunk_count = contents.len(),
            stream = request.stream,
            "Speech synthesis request"
        );

        let chunks: Vec<TextChunk> = contents
            .into_iter()
            .enumerate()
            .map(|(index, content)| TextChunk {
                index,
                content,
                voice: voice.clone(),
            })
            .collect();

        let max_concurrent = request
            .max_concurrent_requests
            .unwrap_or(self.defaults.max_concurrent)
            .clamp(1, MAX_CONCURRENCY_OVERRIDE);
        let permits = match &self.shared_permits {
            // process-wide ceiling configured: per-request overrides are
            // ignored so one request cannot widen it
            Some(shared) => Arc::clone(shared),
            None => Arc::new(Semaphore::new(max_concurrent)),
        };

        let job = SynthesisJob {
            chunks,
            policy: RetryPolicy {
                max_attempts: self.defaults.max_attempts.max(1),
                backoff_base_secs: self.defaults.backoff_base_secs,
                backoff_cap_secs: self.defaults.backoff_cap_secs,
            },
            sync_chunks: request.sync_chunks.unwrap_or(self.defaults.sync_chunks),
            emit_poll: Duration::from_millis(self.defaults.emit_poll_ms.max(1)),
        };

        if request.stream {
            let receiver = scheduler::run_streamed(Arc::clone(&self.client), job, permits);
            return Ok(SpeechOutput::Stream(receiver));
        }

        let results = scheduler::run_buffered(Arc::clone(&self.client), job, permits).await;
        let summary = SynthesisSummary::from_results(&results, started.elapsed());

        if summary.synthesized == 0 {
            return Err(SpeechServiceError::NoAudio(format!(
                "all {} chunks failed synthesis",
                summary.total
            )));
        }

        let parts: Vec<Vec<u8>> = results.into_iter().map(|r| r.audio).collect();
        let audio = self
            .joiner
            .join(&parts)
            .await
            .map_err(|e| SpeechServiceError::Assembly(e.to_string()))?;

        tracing::info!(
            total_chunks = summary.total,
            synthesized = summary.synthesized,
            fallback = summary.fallback,
            audio_size = audio.len(),
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Speech synthesis completed"
        );

        Ok(SpeechOutput::Full { audio, summary })
    }
}
