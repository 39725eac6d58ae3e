use serde_json::{json, Value};
use tracing::debug;

use crate::language::LanguageSelection;
use crate::tools::{SUMMARIZE_URL, TRANSLATE_TEXT};
use crate::types::{ContentBlock, InferenceRequest, InferenceResponse};

/// Conversation history in provider-neutral JSON blocks, plus what every
/// request carries: model, system prompt and tool schemas.
pub struct Conversation {
    model: String,
    max_tokens: u32,
    system: Option<String>,
    messages: Vec<Value>,
    tool_schemas: Vec<Value>,
}

impl Conversation {
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            system: None,
            messages: Vec::new(),
            tool_schemas: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_tools(mut self, schemas: Vec<Value>) -> Self {
        self.tool_schemas = schemas;
        self
    }

    pub fn messages(&self) -> &[Value] {
        &self.messages
    }

    /// The next request. The system prompt tells the model which language
    /// the user has selected.
    pub fn build_request(&self, language: &LanguageSelection) -> InferenceRequest {
        InferenceRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(self.system_prompt(language)),
            tools: self.tool_schemas.clone(),
            messages: self.messages.clone(),
        }
    }

    fn system_prompt(&self, language: &LanguageSelection) -> String {
        let mut prompt = String::new();
        if let Some(system) = &self.system {
            prompt.push_str(system);
            prompt.push_str("\n\n");
        }
        prompt.push_str(&format!(
            "You are a helpful assistant. Use {SUMMARIZE_URL} to summarize web pages \
             and {TRANSLATE_TEXT} to translate text. Always reply in English."
        ));
        if !language.is_source() {
            prompt.push_str(&format!(
                " The user has selected {} ({}) as their language; your reply is translated \
                 for them afterwards. When they ask for a translation without naming a \
                 language, translate into {}.",
                language.display_name, language.code, language.code
            ));
        }
        prompt
    }

    pub fn add_prompt(&mut self, prompt: &str) {
        self.messages.push(json!({
            "role": "user",
            "content": prompt,
        }));
    }

    pub fn record_response(&mut self, response: &InferenceResponse) {
        let content: Vec<Value> = response
            .content
            .iter()
            .map(|block| match block {
                ContentBlock::Text(text) => json!({
                    "type": "text",
                    "text": text,
                }),
                ContentBlock::ToolUse { id, name, input } => json!({
                    "type": "tool_use",
                    "id": id,
                    "name": name,
                    "input": input,
                }),
            })
            .collect();

        self.messages.push(json!({
            "role": "assistant",
            "content": content,
        }));
    }

    /// Results of one turn's tool calls share a single user message.
    pub fn record_tool_result(&mut self, call_id: &str, result: &str, is_error: bool) {
        let mut tool_result = json!({
            "type": "tool_result",
            "tool_use_id": call_id,
            "content": result,
        });
        if is_error {
            tool_result["is_error"] = json!(true);
        }

        if let Some(last) = self.messages.last_mut() {
            let is_tool_result_msg = last["role"] == "user"
                && last["content"]
                    .as_array()
                    .and_then(|a| a.first())
                    .and_then(|c| c.get("type"))
                    .and_then(Value::as_str)
                    == Some("tool_result");

            if is_tool_result_msg {
                if let Some(arr) = last.get_mut("content").and_then(Value::as_array_mut) {
                    arr.push(tool_result);
                    return;
                }
            }
        }

        debug!(call_id, "starting tool result message");
        self.messages.push(json!({
            "role": "user",
            "content": [tool_result],
        }));
    }
}
