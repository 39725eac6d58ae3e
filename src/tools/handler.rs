use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::outcome::ToolOutcome;
use crate::error::ToolError;

/// What the model is told about a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Provider-ready schema: `{name, description, input_schema}`.
    pub fn to_schema(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema,
        })
    }
}

/// A strongly-typed tool. Input is checked against [`Tool::input_schema`]
/// and deserialized before [`Tool::execute`] ever sees it.
#[async_trait]
pub trait Tool: Send + Sync {
    const NAME: &'static str;

    type Input: DeserializeOwned + Send;
    type Output: Into<ToolOutcome> + Send;

    fn description(&self) -> &'static str;

    fn input_schema(&self) -> Value;

    /// Runtime failures belong in `Output`; this never errors.
    async fn execute(&self, input: Self::Input) -> Self::Output;
}

/// Object-safe face of a tool, as stored in the registry.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn call(&self, input: &Value) -> Result<ToolOutcome, ToolError>;
}

#[async_trait]
impl<T: Tool> ToolHandler for T {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: T::NAME.to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }

    async fn call(&self, input: &Value) -> Result<ToolOutcome, ToolError> {
        let parsed: T::Input = validate_input(T::NAME, &self.input_schema(), input)?;
        Ok(self.execute(parsed).await.into())
    }
}

/// Check `input` against a JSON Schema, then deserialize it.
///
/// Both steps count as validation: a value can satisfy the schema and still
/// fail to deserialize (e.g. a string that is not an absolute URL).
pub fn validate_input<I: DeserializeOwned>(
    tool: &str,
    schema: &Value,
    input: &Value,
) -> Result<I, ToolError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ToolError::InvalidSchema {
        tool: tool.to_string(),
        reason: e.to_string(),
    })?;

    let violations: Vec<String> = validator.iter_errors(input).map(|e| e.to_string()).collect();
    if !violations.is_empty() {
        return Err(ToolError::InvalidInput {
            tool: tool.to_string(),
            reason: violations.join("; "),
        });
    }

    serde_json::from_value(input.clone()).map_err(|e| ToolError::InvalidInput {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}
