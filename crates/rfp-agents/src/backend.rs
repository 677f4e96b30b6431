//! Inference backend client (Ollama HTTP API).
//!
//! `GET  <base>/api/tags`     → liveness probe
//! `POST <base>/api/generate` → one non-streaming completion with
//! deterministic decoding options.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BackendConfig;
use crate::errors::AnalysisError;

/// Returned when the backend answers 200 without any generated text.
pub const NO_RESPONSE_TEXT: &str = "No response generated.";

/// A text-generation backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Whether the backend is reachable. Never fails; errors collapse to `false`.
    async fn probe(&self) -> bool;

    /// One complete (non-streamed) generation for `prompt` with model `model`.
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, AnalysisError>;

    /// Base URL, used in user-facing `Unavailable` messages.
    fn base_url(&self) -> String;
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    top_k: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 0.9,
            top_k: 40,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// reqwest-based client for an Ollama-compatible server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    config: BackendConfig,
}

impl OllamaClient {
    pub fn new(config: BackendConfig) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AnalysisError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl InferenceBackend for OllamaClient {
    async fn probe(&self) -> bool {
        match self
            .http
            .get(self.endpoint("/api/tags"))
            .timeout(self.config.probe_timeout())
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Backend probe failed");
                false
            }
        }
    }

    async fn complete(&self, prompt: &str, model: &str) -> Result<String, AnalysisError> {
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions::default(),
        };

        let resp = self
            .http
            .post(self.endpoint("/api/generate"))
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalysisError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let data: GenerateResponse = resp.json().await?;
        debug!(model, prompt_chars = prompt.len(), "Generation completed");
        Ok(data
            .response
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| NO_RESPONSE_TEXT.to_string()))
    }

    fn base_url(&self) -> String {
        self.config.base_url.clone()
    }
}
