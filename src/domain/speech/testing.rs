//! Scripted synthesis client for unit tests: per-text failure scripts,
//! artificial latency, and instrumentation for concurrency assertions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;

use crate::infrastructure::synthesis::{
    FrameStream, SynthesisClient, SynthesisError, SynthesisFrame,
};

#[derive(Debug, Clone, Copy, Default)]
struct Script {
    fail_first: u32,
    fail_always: bool,
    empty_first: u32,
    delay: Option<Duration>,
}

pub(crate) struct ScriptedClient {
    scripts: Mutex<HashMap<String, Script>>,
    attempts: Mutex<HashMap<String, u32>>,
    voices: Mutex<Vec<String>>,
    events: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            attempts: Mutex::new(HashMap::new()),
            voices: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn with_script(self, text: &str, update: impl FnOnce(&mut Script)) -> Self {
        {
            let mut scripts = self.scripts.lock().unwrap();
            update(scripts.entry(text.to_string()).or_default());
        }
        self
    }

    /// Every attempt for `text` fails.
    pub fn fail_always(self, text: &str) -> Self {
        self.with_script(text, |s| s.fail_always = true)
    }

    /// The first `n` attempts for `text` fail, later ones succeed.
    pub fn fail_first(self, text: &str, n: u32) -> Self {
        self.with_script(text, |s| s.fail_first = n)
    }

    /// After any scripted failures, the next `n` attempts yield zero audio
    /// bytes (a success-looking empty response).
    pub fn empty_first(self, text: &str, n: u32) -> Self {
        self.with_script(text, |s| s.empty_first = n)
    }

    /// Every call for `text` takes this long.
    pub fn delay(self, text: &str, delay: Duration) -> Self {
        self.with_script(text, |s| s.delay = Some(delay))
    }

    pub fn attempts(&self, text: &str) -> u32 {
        self.attempts
            .lock()
            .unwrap()
            .get(text)
            .copied()
            .unwrap_or(0)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn voices(&self) -> Vec<String> {
        self.voices.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisClient for ScriptedClient {
    async fn open(&self, text: &str, voice: &str) -> Result<FrameStream, SynthesisError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("start {}", text));
        self.voices.lock().unwrap().push(voice.to_string());

        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let entry = attempts.entry(text.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(text)
            .copied()
            .unwrap_or_default();

        if let Some(delay) = script.delay {
            tokio::time::sleep(delay).await;
        }

        self.events.lock().unwrap().push(format!("end {}", text));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if script.fail_always || attempt <= script.fail_first {
            return Err(SynthesisError::Transport("scripted failure".to_string()));
        }

        let payload = if attempt <= script.fail_first + script.empty_first {
            Vec::new()
        } else {
            text.as_bytes().to_vec()
        };

        let frames = vec![
            Ok(SynthesisFrame::Metadata),
            Ok(SynthesisFrame::Audio(payload)),
        ];
        Ok(Box::pin(stream::iter(frames)))
    }
}
