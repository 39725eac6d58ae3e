use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::handler::{ToolDefinition, ToolHandler};
use super::outcome::ToolOutcome;
use super::summarize::SummarizeUrlTool;
use super::translate::TranslateTextTool;
use crate::completion::TextGenerator;
use crate::config::ChatConfig;
use crate::error::ToolError;

/// Catalog of available tools. Stores handlers, provides schemas and
/// dispatches calls by name.
pub struct ToolRegistry {
    tools: Vec<Box<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// The summarize and translate tools, both completing through `generator`
    /// with the configured model.
    pub fn with_defaults(generator: Arc<dyn TextGenerator>, config: &ChatConfig) -> Self {
        Self::new()
            .add(
                SummarizeUrlTool::new(generator.clone(), &config.model)
                    .with_char_limit(config.summary_char_limit),
            )
            .add(TranslateTextTool::new(generator, &config.model))
    }

    /// Register a tool. A tool with the same name is replaced.
    pub fn add(mut self, handler: impl ToolHandler + 'static) -> Self {
        let name = handler.definition().name;
        if let Some(pos) = self.position(&name) {
            warn!(tool = %name, "replacing registered tool");
            self.tools.remove(pos);
        }
        self.tools.push(Box::new(handler));
        self
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.tools.iter().position(|t| t.definition().name == name)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// All tool schemas for the LLM API request.
    pub fn schemas(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.definition().to_schema()).collect()
    }

    /// Schema for a specific tool by name.
    pub fn schema(&self, name: &str) -> Option<Value> {
        self.get(name).map(|t| t.definition().to_schema())
    }

    pub fn get(&self, name: &str) -> Option<&dyn ToolHandler> {
        self.position(name).map(|pos| self.tools[pos].as_ref())
    }

    /// Validate the input and run the named tool.
    pub async fn execute(&self, name: &str, input: &Value) -> Result<ToolOutcome, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.call(input).await
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.definition().name).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
