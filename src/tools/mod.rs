pub mod handler;
pub mod html;
pub mod invocation;
pub mod outcome;
pub mod pipeline;
pub mod registry;
pub mod summarize;
pub mod translate;

pub use handler::{validate_input, Tool, ToolDefinition, ToolHandler};
pub use invocation::{InvocationState, ToolCall, ToolInvocation};
pub use outcome::{SummaryResult, ToolOutcome, TranslationResult};
pub use pipeline::ToolPipeline;
pub use registry::ToolRegistry;
pub use summarize::{SummarizeInput, SummarizeUrlTool, SUMMARIZE_URL};
pub use translate::{TranslateInput, TranslateTextTool, TRANSLATE_TEXT};
