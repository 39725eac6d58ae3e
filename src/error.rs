#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("inference error: {0}")]
    Inference(#[from] InferenceError),
    #[error("chat cancelled")]
    Cancelled,
    #[error("unknown language code: {0}")]
    UnknownLanguage(String),
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("API returned {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// Failures that keep a tool from running at all. Failures that happen while
/// a tool runs are part of its outcome, not this type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid input for {tool}: {reason}")]
    InvalidInput { tool: String, reason: String },
    #[error("tool {tool} has an invalid input schema: {reason}")]
    InvalidSchema { tool: String, reason: String },
    #[error("tool call {0} already has a result")]
    AlreadyResolved(String),
}
