//! Story content generation
//!
//! The session core only sees [`ContentGenerator`]. The production
//! implementation asks an LLM for structured JSON and validates the shape
//! before handing anything back.

mod prompt;
mod schema;

use crate::llm::{LlmError, LlmErrorKind, LlmRequest, LlmService};
use crate::story::{AnalysisResult, ChoiceRecord, Scene, SchemaError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;

/// Any failure to produce content: transport, non-success status, empty
/// payload, or JSON/schema mismatch. Callers do not distinguish.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct GenerationError {
    pub message: String,
    /// Provider classification when the failure came from the LLM call
    pub llm_kind: Option<LlmErrorKind>,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            llm_kind: None,
        }
    }
}

impl From<LlmError> for GenerationError {
    fn from(e: LlmError) -> Self {
        Self {
            message: e.message,
            llm_kind: Some(e.kind),
        }
    }
}

impl From<SchemaError> for GenerationError {
    fn from(e: SchemaError) -> Self {
        Self::new(format!("Malformed content: {e}"))
    }
}

/// Produces scenes and the final analysis
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_scene(
        &self,
        turn: usize,
        history: &[ChoiceRecord],
    ) -> Result<Scene, GenerationError>;

    async fn generate_analysis(
        &self,
        history: &[ChoiceRecord],
    ) -> Result<AnalysisResult, GenerationError>;
}

/// [`ContentGenerator`] backed by an LLM with structured output
pub struct LlmContentGenerator {
    llm: Arc<dyn LlmService>,
}

impl LlmContentGenerator {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        request: LlmRequest,
        what: &str,
    ) -> Result<T, GenerationError> {
        let response = self.llm.complete(&request).await?;
        parse_payload(&response.text, what)
    }
}

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    async fn generate_scene(
        &self,
        turn: usize,
        history: &[ChoiceRecord],
    ) -> Result<Scene, GenerationError> {
        let request = LlmRequest::new(prompt::scene_prompt(turn, history))
            .with_system(prompt::NARRATOR_SYSTEM)
            .with_json_schema(schema::scene_schema());

        let scene: Scene = self.request_json(request, "scene").await?;
        scene.validate()?;
        Ok(scene)
    }

    async fn generate_analysis(
        &self,
        history: &[ChoiceRecord],
    ) -> Result<AnalysisResult, GenerationError> {
        let request = LlmRequest::new(prompt::analysis_prompt(history))
            .with_system(prompt::ANALYST_SYSTEM)
            .with_json_schema(schema::analysis_schema());

        let result: AnalysisResult = self.request_json(request, "analysis").await?;
        result.validate()?;
        Ok(result)
    }
}

/// Parse generated JSON, tolerating a Markdown code fence around it
fn parse_payload<T: DeserializeOwned>(text: &str, what: &str) -> Result<T, GenerationError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim);

    if body.is_empty() {
        return Err(GenerationError::new(format!("No {what} returned")));
    }

    serde_json::from_str(body)
        .map_err(|e| GenerationError::new(format!("Failed to parse {what}: {e}")))
}
