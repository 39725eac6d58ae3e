//! Projection of tool invocations into what the user sees.

use std::fmt;

use crate::language::{display_name, SOURCE_LANGUAGE};
use crate::tools::{
    InvocationState, SummaryResult, ToolInvocation, ToolOutcome, TranslationResult, SUMMARIZE_URL,
    TRANSLATE_TEXT,
};

/// A tool invocation as displayed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolView {
    InProgress { tool: String, message: String },
    Summary { url: String, summary: String },
    Translation { translated_text: String, note: String },
    Error { tool: String, message: String },
}

impl ToolView {
    pub fn is_error(&self) -> bool {
        matches!(self, ToolView::Error { .. })
    }
}

/// Pure projection: reads the invocation, never runs or changes it.
pub fn render(invocation: &ToolInvocation) -> ToolView {
    let tool = invocation.tool_name.clone();
    let url = invocation.arg("url").unwrap_or_default();
    let target = invocation.arg("targetLanguage").unwrap_or_default();

    let outcome = match &invocation.state {
        InvocationState::Pending => {
            let message = match tool.as_str() {
                SUMMARIZE_URL => format!("Summarizing {url}…"),
                TRANSLATE_TEXT => format!("Translating to {}…", display_name(target)),
                other => format!("Running {other}…"),
            };
            return ToolView::InProgress { tool, message };
        }
        InvocationState::Result(outcome) => outcome,
    };

    match outcome {
        ToolOutcome::Summarize(SummaryResult::Success { summary }) => ToolView::Summary {
            url: url.to_string(),
            summary: summary.clone(),
        },
        ToolOutcome::Summarize(SummaryResult::Failure { error }) => ToolView::Error {
            tool,
            message: format!("Error summarizing URL: {error}"),
        },
        ToolOutcome::Translate(TranslationResult::Success { translated_text }) => {
            ToolView::Translation {
                translated_text: translated_text.clone(),
                note: format!(
                    "Translated from {} to {}.",
                    display_name(SOURCE_LANGUAGE),
                    display_name(target)
                ),
            }
        }
        ToolOutcome::Translate(TranslationResult::Failure { error }) => ToolView::Error {
            tool,
            message: format!("Translation to {} failed: {error}", display_name(target)),
        },
        ToolOutcome::Rejected { error } => {
            let message = format!("Error running {tool}: {error}");
            ToolView::Error { tool, message }
        }
    }
}

impl fmt::Display for ToolView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolView::InProgress { message, .. } => f.write_str(message),
            ToolView::Summary { url, summary } => write!(f, "Summary of {url}:\n{summary}"),
            ToolView::Translation {
                translated_text,
                note,
            } => write!(f, "{translated_text}\n({note})"),
            ToolView::Error { message, .. } => f.write_str(message),
        }
    }
}
