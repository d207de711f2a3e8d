use async_trait::async_trait;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use uuid::Uuid;

use super::{FrameStream, SynthesisClient, SynthesisError, SynthesisFrame};

const WSS_ENDPOINT: &str =
    "wss://speech.platform.bing.com/consumer/speech/synthesize/readaloud/edge/v1";
const TRUSTED_CLIENT_TOKEN: &str = "6A5AA1D4EAFF4E9FB37E23D68491D6F4";

/// Output format requested from the service. Downstream assembly relies on
/// MP3 segments being byte-concatenable, so this must stay an MP3 variant.
pub const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

/// Client for the Edge read-aloud websocket service.
///
/// One websocket session per text unit: a `speech.config` message selects the
/// output format, an SSML message carries the text, then the service streams
/// binary audio frames until a `turn.end` marker.
pub struct EdgeSpeechClient {
    endpoint: String,
}

impl EdgeSpeechClient {
    pub fn new() -> Self {
        Self {
            endpoint: WSS_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for EdgeSpeechClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisClient for EdgeSpeechClient {
    async fn open(&self, text: &str, voice: &str) -> Result<FrameStream, SynthesisError> {
        let url = format!(
            "{}?TrustedClientToken={}&ConnectionId={}",
            self.endpoint,
            TRUSTED_CLIENT_TOKEN,
            message_id()
        );

        let (mut socket, _) = connect_async(url.as_str())
            .await
            .map_err(|e| SynthesisError::Connect(e.to_string()))?;

        socket
            .send(Message::Text(speech_config_message()))
            .await
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        let request_id = message_id();
        socket
            .send(Message::Text(ssml_message(
                &request_id,
                &build_ssml(voice, text),
            )))
            .await
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            while let Some(message) = socket.next().await {
                match message {
                    Ok(Message::Binary(data)) => {
                        let frame = match audio_payload(&data) {
                            Some(audio) => SynthesisFrame::Audio(audio),
                            None => SynthesisFrame::Metadata,
                        };
                        if tx.send(Ok(frame)).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Text(text)) => {
                        if is_turn_end(&text) {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Err(e) => {
                        let _ = tx
                            .send(Err(SynthesisError::Transport(e.to_string())))
                            .await;
                        break;
                    }
                    _ => {}
                }
            }
            let _ = socket.close(None).await;
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

fn message_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn speech_config_message() -> String {
    format!(
        "X-Timestamp:{}\r\nContent-Type:application/json; charset=utf-8\r\nPath:speech.config\r\n\r\n\
         {{\"context\":{{\"synthesis\":{{\"audio\":{{\"metadataoptions\":\
         {{\"sentenceBoundaryEnabled\":\"false\",\"wordBoundaryEnabled\":\"false\"}},\
         \"outputFormat\":\"{}\"}}}}}}}}",
        timestamp(),
        OUTPUT_FORMAT
    )
}

fn ssml_message(request_id: &str, ssml: &str) -> String {
    format!(
        "X-RequestId:{}\r\nContent-Type:application/ssml+xml\r\nX-Timestamp:{}\r\nPath:ssml\r\n\r\n{}",
        request_id,
        timestamp(),
        ssml
    )
}

fn build_ssml(voice: &str, text: &str) -> String {
    format!(
        "<speak version=\"1.0\" xmlns=\"http://www.w3.org/2001/10/synthesis\" xml:lang=\"en-US\">\
         <voice name=\"{}\">{}</voice></speak>",
        voice,
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Binary frames carry a big-endian u16 header length, the header itself,
/// then the payload. Only frames whose header names the audio path carry
/// synthesized bytes.
fn audio_payload(frame: &[u8]) -> Option<Vec<u8>> {
    if frame.len() < 2 {
        return None;
    }
    let header_len = u16::from_be_bytes([frame[0], frame[1]]) as usize;
    let payload_start = 2 + header_len;
    if frame.len() <= payload_start {
        return None;
    }
    let header = &frame[2..payload_start];
    if header.windows(10).any(|w| w == b"Path:audio") {
        Some(frame[payload_start..].to_vec())
    } else {
        None
    }
}

fn is_turn_end(text: &str) -> bool {
    text.contains("Path:turn.end")
}
