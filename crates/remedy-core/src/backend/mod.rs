//! Analysis backend client.
//!
//! The backend is an opaque text-generation service: one prompt in, raw
//! generated text out. Callers own timeouts and retries; an implementation
//! must not retry on its own because calls are not idempotent in cost.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GenerationParams;

pub use http::HttpBackend;

/// Errors from a single backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Http(String),

    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("backend response could not be decoded: {0}")]
    Decode(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Http(err.to_string())
    }
}

/// One generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub stop_sequences: Vec<String>,
}

impl GenerationRequest {
    /// Request for a per-batch analysis call.
    pub fn analysis(prompt: String, params: &GenerationParams) -> Self {
        Self::with_budget(prompt, params.analysis_max_tokens, params)
    }

    /// Request for the run-level summary call.
    pub fn summary(prompt: String, params: &GenerationParams) -> Self {
        Self::with_budget(prompt, params.summary_max_tokens, params)
    }

    fn with_budget(prompt: String, max_tokens: u32, params: &GenerationParams) -> Self {
        Self {
            prompt,
            max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            stop_sequences: params.stop_sequences.clone(),
        }
    }
}

/// Text-generation backend.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Run one generation and return the raw text.
    async fn generate(&self, request: GenerationRequest) -> Result<String, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_use_their_own_token_budget() {
        let params = GenerationParams::default();
        let analysis = GenerationRequest::analysis("p".to_string(), &params);
        let summary = GenerationRequest::summary("p".to_string(), &params);
        assert_eq!(analysis.max_tokens, 8000);
        assert_eq!(summary.max_tokens, 4096);
        assert_eq!(analysis.top_k, 50);
        assert_eq!(summary.stop_sequences, vec!["\n\nHuman:"]);
    }

    #[test]
    fn test_status_error_display() {
        let err = BackendError::Status {
            status: 429,
            body: "throttled".to_string(),
        };
        assert_eq!(err.to_string(), "backend returned status 429: throttled");
    }
}
