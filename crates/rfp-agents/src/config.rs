//! Runtime configuration for the analyzer.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. Environment variables (`RFP_OLLAMA_BASE_URL`, `RFP_OLLAMA_MODEL`)
//! 2. Values from an optional TOML file (`--config`)
//! 3. Built-in defaults (`http://localhost:11434`, `llama3.2:3b`)

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default Ollama base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
/// Default generation model.
pub const DEFAULT_MODEL: &str = "llama3.2:3b";

const ENV_BASE_URL: &str = "RFP_OLLAMA_BASE_URL";
const ENV_MODEL: &str = "RFP_OLLAMA_MODEL";

/// Inference backend endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub model: String,
    /// Timeout of the liveness probe.
    pub probe_timeout_secs: u64,
    /// Timeout of one generation request. Local models can be slow.
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            probe_timeout_secs: 5,
            request_timeout_secs: 120,
        }
    }
}

impl BackendConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Bounded linear-backoff retry for connection-class failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    /// Backoff before retry `n` is `n * backoff_step_ms`.
    pub backoff_step_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_step_ms: 1_000,
        }
    }
}

impl RetryConfig {
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_step_ms.saturating_mul(u64::from(attempt)))
    }
}

/// Spacing between consecutive items of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub inter_item_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            inter_item_delay_ms: 2_000,
        }
    }
}

impl PacingConfig {
    pub fn inter_item_delay(&self) -> Duration {
        Duration::from_millis(self.inter_item_delay_ms)
    }
}

/// Top-level analyzer configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub backend: BackendConfig,
    pub retry: RetryConfig,
    pub pacing: PacingConfig,
}

impl AnalyzerConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// Load a TOML file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut cfg: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        cfg.apply_env();
        Ok(cfg)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = env::var(ENV_BASE_URL) {
            self.backend.base_url = url;
        }
        if let Ok(model) = env::var(ENV_MODEL) {
            self.backend.model = model;
        }
    }

    /// Validate all sub-configs; returns an error string if invalid.
    pub fn validate(&self) -> Result<(), String> {
        let url = self.backend.base_url.trim();
        if url.is_empty() {
            return Err("backend.base_url must not be empty".to_string());
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!("backend.base_url must be http(s), got {url}"));
        }
        if self.backend.model.trim().is_empty() {
            return Err("backend.model must not be empty".to_string());
        }
        if self.backend.probe_timeout_secs == 0 || self.backend.request_timeout_secs == 0 {
            return Err("backend timeouts must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::*;

    /// Environment variables are process-global; serialize tests touching them.
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn default_config_validates() {
        let cfg = AnalyzerConfig::default();
        cfg.validate().expect("default config should be valid");
        assert_eq!(cfg.backend.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.retry.max_retries, 3);
        assert_eq!(cfg.pacing.inter_item_delay(), Duration::from_millis(2_000));
    }

    #[test]
    fn backoff_is_linear() {
        let retry = RetryConfig::default();
        assert_eq!(retry.backoff_for(1), Duration::from_secs(1));
        assert_eq!(retry.backoff_for(2), Duration::from_secs(2));
        assert_eq!(retry.backoff_for(3), Duration::from_secs(3));
    }

    #[test]
    fn invalid_urls_rejected() {
        let mut cfg = AnalyzerConfig::default();
        cfg.backend.base_url = "localhost:11434".into();
        assert!(cfg.validate().is_err());

        cfg.backend.base_url = "  ".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_model_rejected() {
        let mut cfg = AnalyzerConfig::default();
        cfg.backend.model = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let _guard = ENV_LOCK.lock().unwrap();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[backend]\nbase_url = \"http://file-host:11434\"\nmodel = \"qwen2.5:7b\"\n\n[pacing]\ninter_item_delay_ms = 500"
        )
        .unwrap();

        env::remove_var(ENV_BASE_URL);
        env::set_var(ENV_MODEL, "mistral:7b");
        let cfg = AnalyzerConfig::load(file.path()).unwrap();
        env::remove_var(ENV_MODEL);

        assert_eq!(cfg.backend.base_url, "http://file-host:11434");
        assert_eq!(cfg.backend.model, "mistral:7b");
        assert_eq!(cfg.pacing.inter_item_delay_ms, 500);
        // untouched sections keep defaults
        assert_eq!(cfg.retry, RetryConfig::default());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AnalyzerConfig::load(Path::new("/nonexistent/rfp.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
