use serde::Serialize;
use serde_json::{Map, Value};

use super::summarize::SUMMARIZE_URL;
use super::translate::TRANSLATE_TEXT;

/// Result of the summarize tool. Serializes as `{summary}` or `{error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SummaryResult {
    Success { summary: String },
    Failure { error: String },
}

/// Result of the translate tool. Serializes as `{translatedText}` or `{error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TranslationResult {
    Success {
        #[serde(rename = "translatedText")]
        translated_text: String,
    },
    Failure { error: String },
}

/// Outcome of any tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ToolOutcome {
    Summarize(SummaryResult),
    Translate(TranslationResult),
    /// The call never ran: unknown tool or invalid input.
    Rejected { error: String },
}

impl From<SummaryResult> for ToolOutcome {
    fn from(result: SummaryResult) -> Self {
        ToolOutcome::Summarize(result)
    }
}

impl From<TranslationResult> for ToolOutcome {
    fn from(result: TranslationResult) -> Self {
        ToolOutcome::Translate(result)
    }
}

impl ToolOutcome {
    pub fn error(&self) -> Option<&str> {
        match self {
            ToolOutcome::Summarize(SummaryResult::Failure { error })
            | ToolOutcome::Translate(TranslationResult::Failure { error })
            | ToolOutcome::Rejected { error } => Some(error),
            ToolOutcome::Summarize(SummaryResult::Success { .. })
            | ToolOutcome::Translate(TranslationResult::Success { .. }) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            Value::Object(Map::from_iter([("error".to_string(), Value::String(e.to_string()))]))
        })
    }

    /// Rebuild an outcome from its wire form. The tool name picks the
    /// success key; exactly one of that key and `error` must be a string.
    pub fn from_wire(tool_name: &str, value: &Value) -> Result<Self, String> {
        let obj = value
            .as_object()
            .ok_or_else(|| format!("result for {tool_name} must be an object"))?;
        let error = obj.get("error").and_then(Value::as_str).map(str::to_string);

        let success_key = match tool_name {
            SUMMARIZE_URL => Some("summary"),
            TRANSLATE_TEXT => Some("translatedText"),
            _ => None,
        };
        let success = success_key
            .and_then(|key| obj.get(key))
            .and_then(Value::as_str)
            .map(str::to_string);

        match (tool_name, success, error) {
            (_, Some(_), Some(_)) => Err(format!(
                "result for {tool_name} carries both a value and an error"
            )),
            (SUMMARIZE_URL, Some(summary), None) => {
                Ok(SummaryResult::Success { summary }.into())
            }
            (SUMMARIZE_URL, None, Some(error)) => {
                Ok(SummaryResult::Failure { error }.into())
            }
            (TRANSLATE_TEXT, Some(translated_text), None) => {
                Ok(TranslationResult::Success { translated_text }.into())
            }
            (TRANSLATE_TEXT, None, Some(error)) => {
                Ok(TranslationResult::Failure { error }.into())
            }
            (_, None, Some(error)) => Ok(ToolOutcome::Rejected { error }),
            _ => Err(format!("result for {tool_name} has neither a value nor an error")),
        }
    }
}
