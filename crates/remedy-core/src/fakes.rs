//! In-memory fakes for the backend trait (testing only)
//!
//! `ScriptedBackend` answers each prompt from a list of substring rules,
//! records every request and tracks peak concurrency.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{AnalysisBackend, BackendError, GenerationRequest};
use crate::prompt::SUMMARY_PREAMBLE;

/// What the fake does for a matching prompt.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(BackendError),
    Panic(String),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Reply::Fail(BackendError::Unavailable(message.into()))
    }
}

/// Backend that replies from substring rules, first match wins.
#[derive(Debug)]
pub struct ScriptedBackend {
    rules: Vec<(String, Reply)>,
    fallback: Reply,
    delay: Option<Duration>,
    requests: Mutex<Vec<GenerationRequest>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedBackend {
    /// Backend that answers every prompt with `fallback`.
    pub fn new(fallback: Reply) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
            delay: None,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Answer prompts containing `needle` with `reply`.
    pub fn when(mut self, needle: impl Into<String>, reply: Reply) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    /// Answer the summary pass with `reply`.
    pub fn on_summary(self, reply: Reply) -> Self {
        self.when(SUMMARY_PREAMBLE, reply)
    }

    /// Sleep before replying, to make concurrency observable.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of summary prompts received.
    pub fn summary_calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.prompt.starts_with(SUMMARY_PREAMBLE))
            .count()
    }

    /// Highest number of calls observed running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn reply_for(&self, prompt: &str) -> Reply {
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AnalysisBackend for ScriptedBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<String, BackendError> {
        let reply = self.reply_for(&request.prompt);
        self.requests.lock().unwrap().push(request);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail(err) => Err(err),
            Reply::Panic(message) => panic!("{message}"),
        }
    }
}
