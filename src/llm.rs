//! LLM provider layer
//!
//! Story content is produced by one text model asked for structured JSON.
//! The generator only depends on [`LlmService`]; the Gemini client and the
//! logging wrapper are chosen by [`LlmConfig`] at startup.

mod error;
mod gemini;
mod registry;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use registry::LlmConfig;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// API name of the backing model
    fn model_id(&self) -> &str;
}

/// Finish reason reported when the model stopped on its own
const NATURAL_STOP: &str = "STOP";

/// Wraps a service and records every call
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let started = Instant::now();
        let outcome = self.inner.complete(request).await;
        let duration_ms = started.elapsed().as_millis();
        let structured = request.response_schema.is_some();

        match &outcome {
            Ok(response) => {
                let finish_reason = response.finish_reason.as_deref().unwrap_or("unknown");
                // A truncated JSON body will fail to parse downstream
                if finish_reason != NATURAL_STOP {
                    tracing::warn!(
                        model = self.model_id(),
                        duration_ms,
                        finish_reason,
                        output_tokens = response.usage.output_tokens,
                        "LLM response did not finish normally"
                    );
                } else {
                    tracing::info!(
                        model = self.model_id(),
                        duration_ms,
                        structured,
                        input_tokens = response.usage.input_tokens,
                        output_tokens = response.usage.output_tokens,
                        "LLM request completed"
                    );
                }
            }
            Err(e) => tracing::error!(
                model = self.model_id(),
                duration_ms,
                structured,
                kind = ?e.kind,
                retryable = e.kind.is_retryable(),
                error = %e.message,
                "LLM request failed"
            ),
        }

        outcome
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
