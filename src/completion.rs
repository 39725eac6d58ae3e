//! Single-prompt text generation, the capability the tools call into.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::error::InferenceError;
use crate::inference::InferenceProvider;
use crate::types::{InferenceRequest, StopReason};

/// A one-shot prompt for a named model.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
}

/// Generated text. Some backends only hand back a string; others report why
/// generation stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Text(String),
    Structured {
        text: String,
        finish_reason: StopReason,
    },
}

impl Completion {
    pub fn text(&self) -> &str {
        match self {
            Completion::Text(text) => text,
            Completion::Structured { text, .. } => text,
        }
    }

    /// A bare string carries no reason and counts as a natural stop.
    pub fn finish_reason(&self) -> StopReason {
        match self {
            Completion::Text(_) => StopReason::EndTurn,
            Completion::Structured { finish_reason, .. } => finish_reason.clone(),
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: CompletionRequest) -> Result<Completion, InferenceError>;
}

/// Runs completions through a chat provider: one user message, no tools.
pub struct ProviderGenerator {
    provider: Arc<dyn InferenceProvider>,
    max_tokens: u32,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn InferenceProvider>) -> Self {
        Self {
            provider,
            max_tokens: 1024,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl TextGenerator for ProviderGenerator {
    async fn generate(&self, request: CompletionRequest) -> Result<Completion, InferenceError> {
        debug!(model = %request.model, prompt_chars = request.prompt.len(), "text completion");

        let response = self
            .provider
            .infer(InferenceRequest {
                model: request.model,
                max_tokens: self.max_tokens,
                system: None,
                tools: vec![],
                messages: vec![json!({
                    "role": "user",
                    "content": request.prompt,
                })],
            })
            .await?;

        Ok(Completion::Structured {
            text: response.text(),
            finish_reason: response.stop_reason,
        })
    }
}
