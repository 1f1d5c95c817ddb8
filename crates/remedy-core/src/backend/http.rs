//! HTTP backend speaking a messages-style generation API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AnalysisBackend, BackendError, GenerationRequest};
use crate::config::PipelineConfig;
use crate::domain::error::{RemedyError, Result};

const API_VERSION: &str = "2023-06-01";
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    stop_sequences: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

/// Backend client over HTTP.
pub struct HttpBackend {
    endpoint: String,
    model_id: String,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Build a client from pipeline configuration.
    ///
    /// The configured backend timeout applies to every call.
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("remedy/", env!("CARGO_PKG_VERSION")))
            .timeout(config.backend_timeout)
            .build()
            .map_err(|e| RemedyError::BackendSetup(e.to_string()))?;

        Ok(Self {
            endpoint: config.backend_url.clone(),
            model_id: config.model_id.clone(),
            api_key: config.api_key.clone(),
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn generate(&self, request: GenerationRequest) -> std::result::Result<String, BackendError> {
        let body = MessagesBody {
            model: &self.model_id,
            max_tokens: request.max_tokens,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            top_p: request.top_p,
            top_k: request.top_k,
            stop_sequences: &request.stop_sequences,
        };

        let mut builder = self
            .http_client
            .post(&self.endpoint)
            .header("anthropic-version", API_VERSION)
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }

        debug!(model = %self.model_id, prompt_chars = request.prompt.len(), "calling backend");
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let mut text = response.text().await.unwrap_or_default();
            if text.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| text.is_char_boundary(*i))
                    .unwrap_or(0);
                text.truncate(cut);
            }
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .unwrap_or_default())
    }
}
