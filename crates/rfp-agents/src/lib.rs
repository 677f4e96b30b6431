//! Backend-facing half of the RFP compliance analyzer.
//!
//! - `prompts`: instruction text for one requirement
//! - `backend`: `InferenceBackend` trait and the Ollama HTTP client
//! - `parser`: tolerant extraction of verdict / model / link / description
//! - `retry`: bounded linear backoff for connection-class failures
//! - `analyzer`: prompt → backend → parse for a single item
//! - `orchestrator`: paced, cancellable batch runs with hardware-lock propagation

pub mod analyzer;
pub mod backend;
pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod retry;

pub use analyzer::RequirementAnalyzer;
pub use backend::{InferenceBackend, OllamaClient};
pub use config::AnalyzerConfig;
pub use errors::{AnalysisError, RetryCategory, RunError};
pub use orchestrator::{BatchOrchestrator, RunEvent, RunReport};
pub use prompts::PromptBuilder;
pub use retry::RetryPolicy;
