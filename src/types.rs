use std::fmt;

use serde_json::Value;

/// Fully-formed request. The provider sends it as is.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub model: String,
    pub max_tokens: u32,
    pub system: Option<String>,
    pub tools: Vec<Value>,
    pub messages: Vec<Value>,
}

/// What came back from the LLM.
#[derive(Debug, Clone)]
pub struct InferenceResponse {
    pub stop_reason: StopReason,
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

impl InferenceResponse {
    /// All text blocks joined by newlines.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text(t) => Some(t.as_str()),
                ContentBlock::ToolUse { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    ContentFilter,
    /// A provider-specific reason we have no mapping for, kept verbatim.
    Other(String),
}

impl StopReason {
    /// The finish reason as reported to tools and the UI.
    pub fn as_finish_reason(&self) -> &str {
        match self {
            StopReason::EndTurn => "stop",
            StopReason::ToolUse => "tool-calls",
            StopReason::MaxTokens => "length",
            StopReason::ContentFilter => "content-filter",
            StopReason::Other(raw) => raw,
        }
    }

    /// True only for natural completion.
    pub fn is_stop(&self) -> bool {
        matches!(self, StopReason::EndTurn)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_finish_reason())
    }
}

/// A content block in the model's response.
#[derive(Debug, Clone)]
pub enum ContentBlock {
    Text(String),
    ToolUse { id: String, name: String, input: Value },
}

/// Token usage for a single inference call.
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn accumulate(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn finish_reasons_use_sdk_names() {
        assert_eq!(StopReason::EndTurn.to_string(), "stop");
        assert_eq!(StopReason::MaxTokens.to_string(), "length");
        assert_eq!(StopReason::ToolUse.to_string(), "tool-calls");
        assert_eq!(StopReason::Other("pause_turn".into()).to_string(), "pause_turn");
        assert!(StopReason::EndTurn.is_stop());
        assert!(!StopReason::ContentFilter.is_stop());
    }

    #[test]
    fn response_text_skips_tool_blocks() {
        let resp = InferenceResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![
                ContentBlock::Text("one".into()),
                ContentBlock::ToolUse {
                    id: "c1".into(),
                    name: "x".into(),
                    input: json!({}),
                },
                ContentBlock::Text("two".into()),
            ],
            usage: Usage::default(),
        };
        assert_eq!(resp.text(), "one\ntwo");
    }
}
