use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::outcome::TranslationResult;
use super::Tool;
use crate::completion::{CompletionRequest, TextGenerator};
use crate::language::is_source_language;

pub const TRANSLATE_TEXT: &str = "translateText";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateInput {
    pub text: String,
    pub target_language: String,
}

#[derive(Debug, thiserror::Error)]
enum TranslateError {
    #[error("Translation failed. AI model did not provide a valid translation. Reason: {0}")]
    InvalidCompletion(String),
    #[error(
        "Translation to {0} might have failed or returned original text. \
         The language might be unsupported or the text too short/ambiguous."
    )]
    SuspectedEcho(String),
    #[error("Translation failed due to an internal error: {0}")]
    Model(String),
}

/// Translates text into a target language code with one completion.
///
/// A reply identical to the input (ignoring case and surrounding whitespace)
/// is treated as a failure unless the target is the source language. Short
/// or language-neutral text ("OK", names, numbers) trips this too.
pub struct TranslateTextTool {
    generator: Arc<dyn TextGenerator>,
    model: String,
}

impl TranslateTextTool {
    pub fn new(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    async fn translate(&self, input: &TranslateInput) -> Result<String, TranslateError> {
        let completion = self
            .generator
            .generate(CompletionRequest {
                model: self.model.clone(),
                prompt: translation_prompt(&input.text, &input.target_language),
            })
            .await
            .map_err(|e| TranslateError::Model(e.to_string()))?;

        let finish_reason = completion.finish_reason();
        let translated = completion.text().trim();
        if !finish_reason.is_stop() || translated.is_empty() {
            return Err(TranslateError::InvalidCompletion(finish_reason.to_string()));
        }

        if translated.to_lowercase() == input.text.trim().to_lowercase() {
            if is_source_language(&input.target_language) {
                return Ok(input.text.clone());
            }
            return Err(TranslateError::SuspectedEcho(input.target_language.clone()));
        }

        Ok(translated.to_string())
    }
}

fn translation_prompt(text: &str, target: &str) -> String {
    format!(
        "Translate the following text into the language with code \"{target}\". \
         Reply with the translation only: no quotes, notes or explanations.\n\n{text}"
    )
}

#[async_trait]
impl Tool for TranslateTextTool {
    const NAME: &'static str = TRANSLATE_TEXT;

    type Input = TranslateInput;
    type Output = TranslationResult;

    fn description(&self) -> &'static str {
        "Translate text into the language identified by a language code such as 'es' or 'fr'."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Text to translate"
                },
                "targetLanguage": {
                    "type": "string",
                    "minLength": 2,
                    "description": "Language code to translate into, e.g. 'es'"
                }
            },
            "required": ["text", "targetLanguage"]
        })
    }

    async fn execute(&self, input: TranslateInput) -> TranslationResult {
        match self.translate(&input).await {
            Ok(translated_text) => {
                info!(language = %input.target_language, "text translated");
                TranslationResult::Success { translated_text }
            }
            Err(e) => {
                warn!(language = %input.target_language, error = %e, "translation failed");
                TranslationResult::Failure {
                    error: e.to_string(),
                }
            }
        }
    }
}
