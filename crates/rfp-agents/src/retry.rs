//! Bounded retry around one backend round trip.
//!
//! Each attempt probes the backend and, if it is reachable, issues the
//! completion. Only connection-class failures ([`RetryCategory::Connection`])
//! are retried, with linear backoff `attempt * backoff_step` (1 s, 2 s, 3 s by
//! default). Everything else propagates on first occurrence. After the last
//! retry the final error is returned to the caller.
//!
//! [`RetryCategory::Connection`]: crate::errors::RetryCategory::Connection

use tracing::warn;

use crate::backend::InferenceBackend;
use crate::config::RetryConfig;
use crate::errors::AnalysisError;

#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    async fn attempt<B>(backend: &B, prompt: &str, model: &str) -> Result<String, AnalysisError>
    where
        B: InferenceBackend + ?Sized,
    {
        if !backend.probe().await {
            return Err(AnalysisError::Unavailable {
                base_url: backend.base_url(),
            });
        }
        backend.complete(prompt, model).await
    }

    /// Probe + complete, retrying connection-class failures.
    pub async fn complete<B>(
        &self,
        backend: &B,
        prompt: &str,
        model: &str,
    ) -> Result<String, AnalysisError>
    where
        B: InferenceBackend + ?Sized,
    {
        let max_retries = self.config.max_retries;
        let mut retries = 0;
        loop {
            match Self::attempt(backend, prompt, model).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retriable() && retries < max_retries => {
                    retries += 1;
                    let backoff = self.config.backoff_for(retries);
                    warn!(
                        attempt = retries,
                        max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        category = %e.retry_category(),
                        error = %e,
                        "Connection error talking to backend, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
