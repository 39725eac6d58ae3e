use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::InferenceProvider;
use crate::error::InferenceError;
use crate::types::{ContentBlock, InferenceRequest, InferenceResponse, StopReason, Usage};

/// OpenAI-compatible provider. Works with vLLM, LM Studio, OpenRouter,
/// or any server that implements the `/v1/chat/completions` endpoint.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    /// Set an API key (required for OpenAI, OpenRouter, etc.).
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Tool schemas are kept as `{name, description, input_schema}`;
    /// OpenAI wants them wrapped as functions.
    fn convert_tools(tools: &[Value]) -> Vec<Value> {
        tools
            .iter()
            .filter_map(|tool| {
                let name = tool["name"].as_str()?;
                Some(json!({
                    "type": "function",
                    "function": {
                        "name": name,
                        "description": tool.get("description").cloned().unwrap_or(Value::Null),
                        "parameters": tool
                            .get("input_schema")
                            .cloned()
                            .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
                    }
                }))
            })
            .collect()
    }

    /// Flatten block-structured history into chat-completions messages.
    /// Tool results become `role: tool` messages, tool uses become `tool_calls`.
    fn convert_messages(system: Option<&str>, messages: &[Value]) -> Vec<Value> {
        let mut out = Vec::new();

        if let Some(sys) = system {
            out.push(json!({ "role": "system", "content": sys }));
        }

        for msg in messages {
            match (msg["role"].as_str().unwrap_or("user"), &msg["content"]) {
                (role, Value::String(text)) => {
                    out.push(json!({ "role": role, "content": text }));
                }
                ("user", Value::Array(blocks)) => {
                    out.extend(blocks.iter().filter(|b| b["type"] == "tool_result").map(
                        |b| {
                            json!({
                                "role": "tool",
                                "tool_call_id": b["tool_use_id"],
                                "content": b["content"],
                            })
                        },
                    ));
                }
                ("assistant", Value::Array(blocks)) => {
                    let text = blocks
                        .iter()
                        .filter(|b| b["type"] == "text")
                        .filter_map(|b| b["text"].as_str())
                        .collect::<Vec<_>>()
                        .join("\n");
                    let tool_calls: Vec<Value> = blocks
                        .iter()
                        .filter(|b| b["type"] == "tool_use")
                        .map(|b| {
                            json!({
                                "id": b["id"],
                                "type": "function",
                                "function": {
                                    "name": b["name"],
                                    "arguments": b["input"].to_string(),
                                }
                            })
                        })
                        .collect();

                    let mut assistant_msg = json!({ "role": "assistant", "content": text });
                    if !tool_calls.is_empty() {
                        assistant_msg["tool_calls"] = Value::Array(tool_calls);
                    }
                    out.push(assistant_msg);
                }
                _ => out.push(msg.clone()),
            }
        }

        out
    }

    fn parse_response(parsed: &Value) -> InferenceResponse {
        let choice = &parsed["choices"][0];

        let stop_reason = match choice["finish_reason"].as_str().unwrap_or("stop") {
            "stop" => StopReason::EndTurn,
            "tool_calls" | "function_call" => StopReason::ToolUse,
            "length" => StopReason::MaxTokens,
            "content_filter" => StopReason::ContentFilter,
            other => StopReason::Other(other.to_string()),
        };

        let message = &choice["message"];
        let mut content = Vec::new();

        if let Some(text) = message["content"].as_str() {
            if !text.is_empty() {
                content.push(ContentBlock::Text(text.to_string()));
            }
        }

        if let Some(tool_calls) = message["tool_calls"].as_array() {
            for tc in tool_calls {
                let args = tc["function"]["arguments"].as_str().unwrap_or("{}");
                content.push(ContentBlock::ToolUse {
                    id: tc["id"].as_str().unwrap_or("").to_string(),
                    name: tc["function"]["name"].as_str().unwrap_or("").to_string(),
                    // Unparseable arguments are passed on as a raw string so
                    // schema validation rejects them with a useful message.
                    input: serde_json::from_str(args)
                        .unwrap_or_else(|_| Value::String(args.to_string())),
                });
            }
        }

        let usage = Usage {
            input_tokens: parsed["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: parsed["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        };

        InferenceResponse {
            stop_reason,
            content,
            usage,
        }
    }
}

#[async_trait]
impl InferenceProvider for OpenAiProvider {
    async fn infer(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let messages = Self::convert_messages(request.system.as_deref(), &request.messages);

        debug!(
            model = %request.model,
            messages = messages.len(),
            "openai inference request"
        );

        let mut body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "messages": messages,
        });

        if !request.tools.is_empty() {
            body["tools"] = Value::Array(Self::convert_tools(&request.tools));
        }

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("content-type", "application/json");

        if let Some(ref key) = self.api_key {
            req = req.header("authorization", format!("Bearer {key}"));
        }

        let resp = req
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Request(e.to_string()))?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| InferenceError::Request(e.to_string()))?;

        if status != 200 {
            return Err(InferenceError::ApiError { status, body: text });
        }

        let parsed: Value =
            serde_json::from_str(&text).map_err(|e| InferenceError::Parse(e.to_string()))?;

        Ok(Self::parse_response(&parsed))
    }
}
