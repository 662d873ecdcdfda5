//! Provider configuration and construction

use super::gemini::{GeminiModel, GeminiService};
use super::{LlmError, LlmService, LoggingService};
use std::sync::Arc;

/// Configuration for the LLM provider
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub gemini_api_key: Option<String>,
    /// Gateway URL (e.g., `http://169.254.169.254/gateway/llm`)
    pub gateway: Option<String>,
    /// Model API name, e.g. `gemini-2.5-flash`
    pub model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .ok(),
            gateway: std::env::var("LLM_GATEWAY").ok(),
            model: std::env::var("N109_MODEL").ok(),
        }
    }

    fn resolve_model(&self) -> Result<GeminiModel, LlmError> {
        match self.model.as_deref() {
            None => Ok(GeminiModel::Gemini25Flash),
            Some(name) => GeminiModel::from_api_name(name).ok_or_else(|| {
                LlmError::invalid_request(format!("Unknown model `{name}`"))
            }),
        }
    }

    /// Build the configured service, wrapped with logging
    pub fn build_service(&self) -> Result<Arc<dyn LlmService>, LlmError> {
        let model = self.resolve_model()?;

        // In gateway mode, use "implicit" as the API key
        let api_key = if self.gateway.is_some() {
            "implicit".to_string()
        } else {
            match self.gemini_api_key.as_deref() {
                Some(key) if !key.is_empty() => key.to_string(),
                _ => {
                    return Err(LlmError::auth(
                        "Set GEMINI_API_KEY (or API_KEY) or LLM_GATEWAY",
                    ))
                }
            }
        };

        let service = GeminiService::new(api_key, model, self.gateway.as_deref())?;
        Ok(Arc::new(LoggingService::new(Arc::new(service))))
    }
}
