//! Content generator seam.
//!
//! The pipeline sees narrative generation as a black box behind
//! `ContentGenerator`. The production implementation goes through
//! `llm_client`; tests substitute deterministic stubs.

use async_trait::async_trait;

use crate::errors::ReportError;
use crate::llm_client::prompts::{NARRATIVE_PROMPT_TEMPLATE, NARRATIVE_SYSTEM};
use crate::llm_client::LlmClient;
use crate::pipeline::context::GenerationContext;

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Turns a generation context into narrative report text.
    async fn generate(&self, context: &GenerationContext) -> Result<String, ReportError>;

    /// Identifier of the model producing the narrative.
    fn model_id(&self) -> &str;
}

pub struct LlmContentGenerator {
    llm: LlmClient,
}

impl LlmContentGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    async fn generate(&self, context: &GenerationContext) -> Result<String, ReportError> {
        let context_json = serde_json::to_string_pretty(&context.variables())
            .map_err(|e| ReportError::Internal(anyhow::anyhow!("context serialization: {e}")))?;
        let prompt = NARRATIVE_PROMPT_TEMPLATE
            .replace("{report_type}", context.report_type.as_str())
            .replace("{context_json}", &context_json);

        self.llm
            .call_text(&prompt, NARRATIVE_SYSTEM)
            .await
            .map_err(|e| ReportError::Generation(e.to_string()))
    }

    fn model_id(&self) -> &str {
        crate::llm_client::MODEL
    }
}
