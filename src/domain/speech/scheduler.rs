//! Runs a request's chunks through the synthesis client under a concurrency
//! ceiling, producing results in original chunk order regardless of
//! completion order.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use super::retry::{synthesize_chunk, ChunkAudio, ChunkOutcome};
use super::SynthesisJob;
use crate::infrastructure::synthesis::SynthesisClient;

/// Synthesize every chunk concurrently and wait for all of them.
///
/// Returns exactly one result per chunk, indexed in original order. A worker
/// that dies without reporting (task panic) is replaced by a silence
/// fallback so the invariant holds.
pub async fn run_buffered(
    client: Arc<dyn SynthesisClient>,
    job: SynthesisJob,
    permits: Arc<Semaphore>,
) -> Vec<ChunkAudio> {
    let SynthesisJob { chunks, policy, .. } = job;
    let total = chunks.len();
    let mut slots: Vec<Option<ChunkAudio>> = (0..total).map(|_| None).collect();

    let mut workers = JoinSet::new();
    for chunk in chunks {
        let client = Arc::clone(&client);
        let permits = Arc::clone(&permits);
        let policy = policy.clone();
        workers
            .spawn(async move { synthesize_chunk(client.as_ref(), &chunk, &policy, &permits).await });
    }

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(result) => {
                let index = result.index;
                slots[index] = Some(result);
            }
            Err(e) => {
                tracing::error!(error = %e, "Synthesis worker died");
            }
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                tracing::error!(chunk_index = index, "Missing chunk result, substituting silence");
                ChunkAudio::fallback(index, 0, Duration::ZERO)
            })
        })
        .collect()
}

/// Synthesize chunks for live delivery: the first `sync_chunks` run strictly
/// sequentially for a fast first byte, the rest fan out under the ceiling.
///
/// The returned channel yields results in strictly ascending chunk order;
/// out-of-order completions are parked until their predecessors have been
/// emitted. Dropping the receiver cancels the remaining work.
pub fn run_streamed(
    client: Arc<dyn SynthesisClient>,
    job: SynthesisJob,
    permits: Arc<Semaphore>,
) -> mpsc::Receiver<ChunkAudio> {
    let (out_tx, out_rx) = mpsc::channel(8);
    tokio::spawn(emit_in_order(client, job, permits, out_tx));
    out_rx
}

async fn emit_in_order(
    client: Arc<dyn SynthesisClient>,
    job: SynthesisJob,
    permits: Arc<Semaphore>,
    out_tx: mpsc::Sender<ChunkAudio>,
) {
    let started = Instant::now();
    let SynthesisJob {
        chunks,
        policy,
        sync_chunks,
        emit_poll,
    } = job;
    let total = chunks.len();
    let lead = sync_chunks.min(total);
    let mut synthesized = 0usize;
    let mut fallback = 0usize;

    let mut tally = |result: &ChunkAudio| match result.outcome {
        ChunkOutcome::Synthesized => synthesized += 1,
        ChunkOutcome::SilenceFallback => fallback += 1,
    };

    let mut chunks = chunks.into_iter();

    for chunk in chunks.by_ref().take(lead) {
        let result = synthesize_chunk(client.as_ref(), &chunk, &policy, &permits).await;
        tally(&result);
        if out_tx.send(result).await.is_err() {
            tracing::debug!("Consumer went away during lead chunks");
            return;
        }
    }

    let (done_tx, mut done_rx) = mpsc::channel::<ChunkAudio>(total.max(1));
    for chunk in chunks {
        let client = Arc::clone(&client);
        let permits = Arc::clone(&permits);
        let policy = policy.clone();
        let done_tx = done_tx.clone();
        tokio::spawn(async move {
            let result = synthesize_chunk(client.as_ref(), &chunk, &policy, &permits).await;
            let _ = done_tx.send(result).await;
        });
    }
    drop(done_tx);

    // Reorder buffer: completions park here until the emit cursor reaches
    // them, then release in a burst.
    let mut parked: BTreeMap<usize, ChunkAudio> = BTreeMap::new();
    let mut next_index = lead;

    while next_index < total {
        match tokio::time::timeout(emit_poll, done_rx.recv()).await {
            Ok(Some(result)) => {
                parked.insert(result.index, result);
            }
            Ok(None) => {
                // every worker is gone; fill any holes so the emitted count
                // stays deterministic
                for index in next_index..total {
                    parked
                        .entry(index)
                        .or_insert_with(|| ChunkAudio::fallback(index, 0, Duration::ZERO));
                }
            }
            Err(_) => {
                if out_tx.is_closed() {
                    tracing::debug!("Consumer went away, abandoning remaining chunks");
                    return;
                }
                continue;
            }
        }

        while let Some(result) = parked.remove(&next_index) {
            tally(&result);
            if out_tx.send(result).await.is_err() {
                tracing::debug!("Consumer went away mid-stream");
                return;
            }
            next_index += 1;
        }
    }

    tracing::info!(
        total_chunks = total,
        synthesized = synthesized,
        fallback = fallback,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Streamed synthesis finished"
    );
}
