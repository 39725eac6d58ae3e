//! Message shapes handed to the rendering layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::language::is_source_language;
use crate::tools::{ToolInvocation, ToolOutcome, TranslationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    Text { text: String },
    ToolInvocation(ToolInvocation),
}

/// A chat message as the UI sees it. `content` is what gets displayed; for a
/// translated reply the original is kept in `original_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiMessage {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_error: Option<String>,
}

impl UiMessage {
    fn new(role: Role, content: String, parts: Vec<MessagePart>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            parts,
            created_at: Utc::now(),
            original_text: None,
            target_language: None,
            translation_error: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(
            Role::User,
            text.clone(),
            vec![MessagePart::Text { text }],
        )
    }

    pub fn assistant(content: impl Into<String>, parts: Vec<MessagePart>) -> Self {
        Self::new(Role::Assistant, content.into(), parts)
    }

    pub fn tool_invocations(&self) -> impl Iterator<Item = &ToolInvocation> {
        self.parts.iter().filter_map(|p| match p {
            MessagePart::ToolInvocation(inv) => Some(inv),
            MessagePart::Text { .. } => None,
        })
    }

    /// Show the translation instead of the original. A no-op when the
    /// target is the source language.
    pub fn apply_translation(&mut self, translation: &TranslatedMessage) {
        if translation.is_passthrough() {
            return;
        }
        self.content = translation.displayed_text().to_string();
        self.original_text = Some(translation.original_text.clone());
        self.target_language = Some(translation.target_language_code.clone());
        self.translation_error = translation.translation_error.clone();
    }
}

/// An assistant reply paired with its translation attempt. Derived, never
/// stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedMessage {
    pub original_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    pub target_language_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_error: Option<String>,
}

impl TranslatedMessage {
    /// Target is the source language: nothing to translate.
    pub fn passthrough(original_text: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            original_text: original_text.into(),
            translated_text: None,
            target_language_code: target.into(),
            translation_error: None,
        }
    }

    /// Build from a translate call's outcome. Exactly one of the translation
    /// and the error is set.
    pub fn from_outcome(
        original_text: impl Into<String>,
        target: impl Into<String>,
        outcome: &ToolOutcome,
    ) -> Self {
        let (translated_text, translation_error) = match outcome {
            ToolOutcome::Translate(TranslationResult::Success { translated_text }) => {
                (Some(translated_text.clone()), None)
            }
            ToolOutcome::Translate(TranslationResult::Failure { error })
            | ToolOutcome::Rejected { error } => (None, Some(error.clone())),
            ToolOutcome::Summarize(_) => {
                (None, Some("translation produced an unexpected result".to_string()))
            }
        };
        Self {
            original_text: original_text.into(),
            translated_text,
            target_language_code: target.into(),
            translation_error,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        is_source_language(&self.target_language_code)
    }

    /// Translation when there is one, the original otherwise.
    pub fn displayed_text(&self) -> &str {
        self.translated_text.as_deref().unwrap_or(&self.original_text)
    }
}
