use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    /// Binary used to join batch-mode segments.
    pub ffmpeg_bin: String,
    /// When true, one process-wide ceiling bounds synthesis calls across all
    /// requests; otherwise each request gets its own ceiling.
    pub shared_synthesis_limit: bool,
    pub synthesis: SynthesisSettings,
    /// Alias -> provider voice id mapping, loaded once at startup. Handlers
    /// take an `Arc` snapshot per request; a restart (or future reload hook)
    /// swaps the snapshot for subsequent requests only.
    pub voice_map: Arc<VoiceMap>,
}

/// Per-request synthesis defaults; individual requests may override the
/// chunking and concurrency knobs within documented bounds.
#[derive(Debug, Clone)]
pub struct SynthesisSettings {
    pub chunk_size: usize,
    pub sync_chunks: usize,
    pub max_concurrent: usize,
    pub max_attempts: u32,
    pub backoff_base_secs: f64,
    pub backoff_cap_secs: f64,
    pub emit_poll_ms: u64,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            sync_chunks: 1,
            max_concurrent: 20,
            max_attempts: 10,
            backoff_base_secs: 2.0,
            backoff_cap_secs: 8.0,
            emit_poll_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let voice_map = match env::var("VOICE_MAP_PATH") {
            Ok(path) => VoiceMap::from_file(&path)?,
            Err(_) => VoiceMap::default(),
        };

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            ffmpeg_bin: env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()),
            shared_synthesis_limit: env::var("SHARED_SYNTHESIS_LIMIT")
                .map(|s| s.to_lowercase() == "true")
                .unwrap_or(false),
            synthesis: SynthesisSettings {
                chunk_size: env::var("CHUNK_SIZE")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()?,
                sync_chunks: env::var("SYNC_CHUNKS")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()?,
                max_concurrent: env::var("MAX_CONCURRENT_REQUESTS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()?,
                max_attempts: env::var("SYNTHESIS_MAX_ATTEMPTS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
                backoff_base_secs: env::var("SYNTHESIS_BACKOFF_BASE_SECS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()?,
                backoff_cap_secs: env::var("SYNTHESIS_BACKOFF_CAP_SECS")
                    .unwrap_or_else(|_| "8".to_string())
                    .parse()?,
                emit_poll_ms: env::var("EMIT_POLL_MS")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse()?,
            },
            voice_map: Arc::new(voice_map),
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

/// Read-only mapping from public voice aliases (OpenAI-style names) to the
/// provider's voice identifiers. Unknown names pass through unchanged so
/// callers can address provider voices directly.
#[derive(Debug, Clone)]
pub struct VoiceMap {
    aliases: HashMap<String, String>,
}

impl VoiceMap {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let raw = std::fs::read_to_string(path)?;
        let aliases: HashMap<String, String> = serde_json::from_str(&raw)?;
        Ok(Self { aliases })
    }

    pub fn resolve(&self, name: &str) -> String {
        self.aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

impl Default for VoiceMap {
    fn default() -> Self {
        let aliases = [
            ("alloy", "en-US-AriaNeural"),
            ("echo", "zh-CN-YunyangNeural"),
            ("fable", "zh-CN-shaanxi-XiaoniNeural"),
            ("nova", "en-US-AvaNeural"),
            ("onyx", "en-US-ChristopherNeural"),
            ("shimmer", "zh-CN-XiaoxiaoNeural"),
        ]
        .into_iter()
        .map(|(alias, voice)| (alias.to_string(), voice.to_string()))
        .collect();

        Self { aliases }
    }
}
