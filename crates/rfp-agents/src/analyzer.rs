//! Single-requirement analysis: prompt → backend (with retry) → parse.

use std::sync::Arc;

use requirements::{AnalysisResult, Language, VendorContext};
use tracing::debug;

use crate::backend::InferenceBackend;
use crate::errors::AnalysisError;
use crate::parser::parse_analysis;
use crate::prompts::{PromptBuilder, PROMPT_VERSION};
use crate::retry::RetryPolicy;

pub struct RequirementAnalyzer<B: ?Sized> {
    backend: Arc<B>,
    prompts: PromptBuilder,
    retry: RetryPolicy,
    model: String,
}

impl<B> RequirementAnalyzer<B>
where
    B: InferenceBackend + ?Sized,
{
    pub fn new(backend: Arc<B>, model: impl Into<String>) -> Self {
        Self {
            backend,
            prompts: PromptBuilder::new(),
            retry: RetryPolicy::default(),
            model: model.into(),
        }
    }

    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Analyze one requirement against `context`.
    ///
    /// `locked_model`, when set, constrains the verdict to that hardware
    /// model. The returned result's manufacturer is the context vendor.
    pub async fn analyze(
        &self,
        requirement: &str,
        context: &VendorContext,
        lang: Language,
        locked_model: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let prompt = self.prompts.build(requirement, context, lang, locked_model);
        debug!(
            prompt_version = PROMPT_VERSION,
            prompt_chars = prompt.len(),
            vendor = context.vendor(),
            locked = locked_model.is_some(),
            "Built analysis prompt"
        );

        let reply = self
            .retry
            .complete(self.backend.as_ref(), &prompt, &self.model)
            .await?;
        Ok(parse_analysis(&reply, context.vendor()))
    }
}
